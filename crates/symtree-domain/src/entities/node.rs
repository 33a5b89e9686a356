//! Tree node entity

use crate::value_objects::{ChildSizes, ContainerKind, NodeType, SymbolType};
use std::fmt;

/// Index of a node inside its [`Tree`](super::Tree) arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Position in the arena
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A directory, component, file or symbol in the aggregation tree
///
/// Nodes are owned by the tree arena and only mutated through it, which
/// keeps the upward size invariant in one place.
#[derive(Debug, Clone, PartialEq)]
pub struct TreeNode {
    pub(crate) id_path: String,
    pub(crate) short_name: String,
    pub(crate) node_type: NodeType,
    pub(crate) size: f64,
    pub(crate) child_sizes: ChildSizes,
    pub(crate) children: Vec<NodeId>,
    pub(crate) parent: Option<NodeId>,
}

impl TreeNode {
    pub(crate) fn container(
        id_path: impl Into<String>,
        short_name: impl Into<String>,
        kind: ContainerKind,
    ) -> Self {
        Self {
            id_path: id_path.into(),
            short_name: short_name.into(),
            node_type: NodeType::container(kind),
            size: 0.0,
            child_sizes: ChildSizes::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub(crate) fn symbol(
        id_path: impl Into<String>,
        short_name: impl Into<String>,
        symbol_type: SymbolType,
        size: f64,
    ) -> Self {
        Self {
            id_path: id_path.into(),
            short_name: short_name.into(),
            node_type: NodeType::Symbol(symbol_type),
            size,
            child_sizes: ChildSizes::new(),
            children: Vec::new(),
            parent: None,
        }
    }

    /// Fully-qualified identifier, unique within the tree
    pub fn id_path(&self) -> &str {
        &self.id_path
    }

    /// Display label
    pub fn short_name(&self) -> &str {
        &self.short_name
    }

    /// Node type, including the dominant child type for containers
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }

    /// Own size for symbols, signed sum of descendant symbols for containers
    pub fn size(&self) -> f64 {
        self.size
    }

    /// Per-type breakdown of the size below this node
    pub fn child_sizes(&self) -> &ChildSizes {
        &self.child_sizes
    }

    /// Child ids in current order
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Owning node; `None` for the root and for nodes not linked yet
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// What this node contributes to the breakdown of its ancestors
    pub(crate) fn contribution(&self) -> ChildSizes {
        match self.node_type {
            NodeType::Symbol(symbol_type) => ChildSizes::single(symbol_type, self.size),
            NodeType::Container { .. } => self.child_sizes,
        }
    }

    /// Add a contribution and re-derive the dominant child type
    pub(crate) fn absorb(&mut self, size: f64, contribution: &ChildSizes) {
        self.size += size;
        self.child_sizes.merge(contribution);
        if let NodeType::Container { dominant, .. } = &mut self.node_type {
            *dominant = self.child_sizes.dominant();
        }
    }
}
