//! Tree builder: groups file records into the aggregation tree

use crate::{
    DomainError, DomainResult,
    entities::{NodeId, NodeSnapshot, Tree},
    path::{basename, cut_is_synthetic, dirname},
    value_objects::{ContainerKind, FileEntry, SymbolType, TypeFilter},
};
use std::collections::HashMap;

/// Parent used for nodes whose id path is empty
pub const NO_PATH: &str = "(No path)";

/// Component label for files without a (known) component
pub const NO_COMPONENT: &str = "(No component)";

/// Marker joining a component name and a source path
pub const COMPONENT_MARKER: &str = ">";

/// How file records map to the id path used to build the hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    /// By source path: `base/strings/x.cc`
    #[default]
    SourcePath,
    /// By component, then source path: `Internals>Core>base/strings/x.cc`
    Component,
}

impl GroupBy {
    /// Parse the wire name (`source_path`, `component`)
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "source_path" => Some(GroupBy::SourcePath),
            "component" => Some(GroupBy::Component),
            _ => None,
        }
    }

    /// Wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            GroupBy::SourcePath => "source_path",
            GroupBy::Component => "component",
        }
    }

    /// Separator used when none is configured
    pub fn default_separator(&self) -> &'static str {
        match self {
            GroupBy::SourcePath => "/",
            GroupBy::Component => COMPONENT_MARKER,
        }
    }

    /// Id path of a file record
    pub fn id_path(&self, entry: &FileEntry, components: &[String]) -> String {
        match self {
            GroupBy::SourcePath => entry.source_path.clone(),
            GroupBy::Component => {
                let component = entry
                    .component_index
                    .and_then(|idx| components.get(idx))
                    .filter(|name| !name.is_empty())
                    .map_or(NO_COMPONENT, String::as_str);
                format!("{component}{COMPONENT_MARKER}{}", entry.source_path)
            }
        }
    }
}

/// What happens to the tree when building finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinalizePolicy {
    /// Merge single-child chains of same-typed containers into one node
    pub collapse_chains: bool,
    /// Mark containers with exactly one child for automatic expansion
    pub expand_sole_child: bool,
}

impl Default for FinalizePolicy {
    fn default() -> Self {
        Self {
            collapse_chains: false,
            expand_sole_child: true,
        }
    }
}

/// Builder configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuilderConfig {
    /// Grouping key; required
    pub grouping: Option<GroupBy>,
    /// Path separator; defaults to the grouping's own separator
    pub separator: Option<String>,
    /// Symbol types admitted into the tree
    pub types: TypeFilter,
    /// Count symbols instead of summing their sizes
    pub count_mode: bool,
    /// Finalisation policy
    pub finalize: FinalizePolicy,
}

impl BuilderConfig {
    /// Configuration with the given grouping and defaults otherwise
    pub fn new(grouping: GroupBy) -> Self {
        Self {
            grouping: Some(grouping),
            ..Self::default()
        }
    }

    /// Override the separator
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = Some(separator.into());
        self
    }

    /// Replace the type filter
    pub fn with_types(mut self, types: TypeFilter) -> Self {
        self.types = types;
        self
    }

    /// Enable or disable count mode
    pub fn with_count_mode(mut self, count_mode: bool) -> Self {
        self.count_mode = count_mode;
        self
    }

    /// Replace the finalisation policy
    pub fn with_finalize(mut self, finalize: FinalizePolicy) -> Self {
        self.finalize = finalize;
        self
    }
}

/// Result of adding one file record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    /// At least one symbol survived the filter and is now in the tree
    Added {
        /// Symbols attached or merged
        symbols: usize,
        /// Symbols dropped by the type filter
        filtered: usize,
    },
    /// Every symbol was filtered out; the tree is unchanged
    Skipped {
        /// Symbols dropped by the type filter
        filtered: usize,
    },
}

/// Counters collected while building
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// File records that contributed to the tree
    pub files: usize,
    /// File records dropped because no symbol survived the filter
    pub skipped_files: usize,
    /// Symbols that contributed to the tree
    pub symbols: usize,
    /// Symbols dropped by the type filter
    pub filtered_symbols: usize,
    /// Symbols folded into an existing leaf with the same id path
    pub merged_symbols: usize,
    /// Directory and component nodes created
    pub containers: usize,
}

/// Incrementally builds the aggregation tree from file records
///
/// Every call to [`TreeBuilder::add_entry`] leaves the tree consistent:
/// container sizes already include everything added so far, so a snapshot
/// can be taken at any time.
#[derive(Debug)]
pub struct TreeBuilder {
    tree: Tree,
    separator: String,
    grouping: GroupBy,
    types: TypeFilter,
    count_mode: bool,
    finalize: FinalizePolicy,
    components: Vec<String>,
    /// Directory, component and file nodes by id path
    containers: HashMap<String, NodeId>,
    /// Symbol leaves by untyped id path, one per symbol type
    leaves: HashMap<String, Vec<(SymbolType, NodeId)>>,
    stats: BuildStats,
}

impl TreeBuilder {
    /// Create a builder; fails if the configuration is unusable
    pub fn new(config: BuilderConfig) -> DomainResult<Self> {
        let grouping = config.grouping.ok_or(DomainError::MissingGrouping)?;
        let separator = config
            .separator
            .unwrap_or_else(|| grouping.default_separator().to_string());
        if separator.is_empty() {
            return Err(DomainError::InvalidSeparator(
                "separator must not be empty".to_string(),
            ));
        }

        Ok(Self {
            tree: Tree::new(separator.clone()),
            separator,
            grouping,
            types: config.types,
            count_mode: config.count_mode,
            finalize: config.finalize,
            components: Vec::new(),
            containers: HashMap::new(),
            leaves: HashMap::new(),
            stats: BuildStats::default(),
        })
    }

    /// Install the component lookup table used by component grouping
    pub fn set_components(&mut self, components: Vec<String>) {
        self.components = components;
    }

    /// Active separator
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Active grouping
    pub fn grouping(&self) -> GroupBy {
        self.grouping
    }

    /// Finalisation policy this builder was configured with
    pub fn finalize_policy(&self) -> FinalizePolicy {
        self.finalize
    }

    /// In-progress tree
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Size aggregated at the root so far
    pub fn root_size(&self) -> f64 {
        self.tree.root_node().size()
    }

    /// Counters so far
    pub fn stats(&self) -> BuildStats {
        self.stats
    }

    /// Owned copy of the in-progress tree, in attach order
    pub fn snapshot(&self) -> NodeSnapshot {
        self.tree.snapshot(self.finalize.expand_sole_child)
    }

    /// Add one file record and its symbols.
    ///
    /// Symbols are filtered before anything is created. A record with no
    /// surviving symbol leaves no trace, not even ancestor directories.
    pub fn add_entry(&mut self, entry: &FileEntry) -> DomainResult<EntryOutcome> {
        let survivors: Vec<_> = entry
            .symbols
            .iter()
            .filter_map(|symbol| {
                let symbol_type = symbol.symbol_type();
                self.types
                    .admits(symbol_type)
                    .then_some((symbol, symbol_type))
            })
            .collect();
        let filtered = entry.symbols.len() - survivors.len();
        self.stats.filtered_symbols += filtered;

        if survivors.is_empty() {
            self.stats.skipped_files += 1;
            return Ok(EntryOutcome::Skipped { filtered });
        }

        let id_path = self.grouping.id_path(entry, &self.components);
        let file = match self.containers.get(&id_path) {
            Some(&existing) => {
                // a path that names a file record is a file, even if it was
                // first created as a directory on behalf of another record
                self.tree.set_kind(existing, ContainerKind::File);
                existing
            }
            None => {
                let short_name = basename(&id_path, &self.separator).to_string();
                let file = self
                    .tree
                    .create_container(id_path.clone(), short_name, ContainerKind::File);
                self.containers.insert(id_path.clone(), file);
                file
            }
        };

        let symbols = survivors.len();
        for (symbol, symbol_type) in survivors {
            let size = if self.count_mode { 1.0 } else { symbol.size };
            let leaf_path = format!("{id_path}:{}", symbol.name);
            self.add_symbol(file, leaf_path, &symbol.name, symbol_type, size)?;
        }
        self.stats.symbols += symbols;
        self.stats.files += 1;

        let mut orphan = file;
        while !self.tree.is_linked(orphan) {
            orphan = self.link_to_parent(orphan)?;
        }

        Ok(EntryOutcome::Added { symbols, filtered })
    }

    /// Attach a symbol leaf under `file`, folding it into an existing leaf
    /// with the same name and type.
    ///
    /// A name used by more than one type gets one leaf per type, each with
    /// a `#<code>` suffix; the first leaf is renamed when the second type
    /// shows up, so the final id paths do not depend on arrival order.
    fn add_symbol(
        &mut self,
        file: NodeId,
        leaf_path: String,
        name: &str,
        symbol_type: SymbolType,
        size: f64,
    ) -> DomainResult<()> {
        let variants = self
            .leaves
            .get(&leaf_path)
            .map(Vec::as_slice)
            .unwrap_or_default();
        if let Some(&(_, existing)) = variants.iter().find(|(known, _)| *known == symbol_type) {
            self.stats.merged_symbols += 1;
            return self.tree.grow(existing, size);
        }

        let id_path = match *variants {
            [] => leaf_path.clone(),
            [(first_type, first)] => {
                self.tree.rename(first, typed_leaf_path(&leaf_path, first_type));
                typed_leaf_path(&leaf_path, symbol_type)
            }
            _ => typed_leaf_path(&leaf_path, symbol_type),
        };
        let leaf = self.tree.create_symbol(id_path, name, symbol_type, size);
        self.tree.attach(leaf, file)?;
        self.leaves
            .entry(leaf_path)
            .or_default()
            .push((symbol_type, leaf));
        Ok(())
    }

    /// Fetch or create the parent container of `node`, attach `node` to it
    /// and return the parent.
    fn link_to_parent(&mut self, node: NodeId) -> DomainResult<NodeId> {
        let (parent_path, synthetic) = {
            let id_path = self
                .tree
                .get(node)
                .ok_or_else(|| DomainError::invariant_violation(format!("unknown node {node}")))?
                .id_path();
            let parent_path = if id_path.is_empty() {
                NO_PATH
            } else {
                dirname(id_path, &self.separator)
            };
            (
                parent_path.to_string(),
                cut_is_synthetic(id_path, &self.separator),
            )
        };

        let parent = if parent_path.is_empty() {
            self.tree.root()
        } else if let Some(&existing) = self.containers.get(&parent_path) {
            existing
        } else {
            let kind = if synthetic {
                ContainerKind::Component
            } else {
                ContainerKind::Directory
            };
            let short_name = basename(&parent_path, &self.separator).to_string();
            let created = self
                .tree
                .create_container(parent_path.clone(), short_name, kind);
            self.containers.insert(parent_path, created);
            self.stats.containers += 1;
            created
        };

        self.tree.attach(node, parent)?;
        Ok(parent)
    }

    /// Finish building: sort by magnitude and apply the finalisation policy
    pub fn build(mut self) -> Tree {
        self.finish()
    }

    /// Same as [`TreeBuilder::build`], but leaves the builder holding an
    /// empty tree so it can outlive the result. Counters are kept.
    pub fn finish(&mut self) -> Tree {
        self.containers.clear();
        self.leaves.clear();
        let mut tree = std::mem::replace(&mut self.tree, Tree::new(self.separator.clone()));
        tree.sort_by_size();
        if self.finalize.collapse_chains {
            tree.collapse_chains();
        }
        tree
    }
}

fn typed_leaf_path(leaf_path: &str, symbol_type: SymbolType) -> String {
    format!("{leaf_path}#{}", symbol_type.code())
}
