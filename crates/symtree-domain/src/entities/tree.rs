//! Node arena with eager upward aggregation

use super::{NodeId, NodeSnapshot, TreeNode};
use crate::{
    DomainError, DomainResult,
    value_objects::{ChildSizes, ContainerKind, NodeType, SymbolType},
};
use std::cmp::Ordering;

/// Relative tolerance used when checking float aggregates
const SIZE_EPSILON: f64 = 1e-6;

/// Aggregation tree stored as an arena of [`TreeNode`]s
///
/// The root exists from construction. Every attach walks the ancestor chain
/// once, so container sizes and per-type breakdowns are correct after each
/// operation, not only after finalisation.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<TreeNode>,
    root: NodeId,
    separator: String,
}

impl Tree {
    /// Create a tree holding only its root
    ///
    /// The root is a directory whose id path and name are the separator.
    pub fn new(separator: impl Into<String>) -> Self {
        let separator = separator.into();
        let root = TreeNode::container(
            separator.clone(),
            separator.clone(),
            ContainerKind::Directory,
        );
        Self {
            nodes: vec![root],
            root: NodeId(0),
            separator,
        }
    }

    /// Root node id
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Active path separator
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Root node
    pub fn root_node(&self) -> &TreeNode {
        &self.nodes[self.root.0]
    }

    /// Look up a node by id
    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// Number of nodes reachable from the root, root included
    pub fn len(&self) -> usize {
        self.walk().count()
    }

    /// True when the root has no children
    pub fn is_empty(&self) -> bool {
        self.root_node().children.is_empty()
    }

    /// Children of `id` in current order
    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &TreeNode> + '_ {
        self.nodes[id.0]
            .children
            .iter()
            .map(move |child| &self.nodes[child.0])
    }

    /// True for the root and for every node with an owner
    pub fn is_linked(&self, id: NodeId) -> bool {
        id == self.root || self.nodes[id.0].parent.is_some()
    }

    /// Depth-first pre-order over all nodes reachable from the root
    pub fn walk(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> + '_ {
        let mut stack = vec![self.root];
        std::iter::from_fn(move || {
            let id = stack.pop()?;
            let node = &self.nodes[id.0];
            stack.extend(node.children.iter().rev().copied());
            Some((id, node))
        })
    }

    /// Find a reachable node by id path
    pub fn find(&self, id_path: &str) -> Option<NodeId> {
        self.walk()
            .find(|(_, node)| node.id_path == id_path)
            .map(|(id, _)| id)
    }

    pub(crate) fn create_container(
        &mut self,
        id_path: impl Into<String>,
        short_name: impl Into<String>,
        kind: ContainerKind,
    ) -> NodeId {
        self.push(TreeNode::container(id_path, short_name, kind))
    }

    pub(crate) fn create_symbol(
        &mut self,
        id_path: impl Into<String>,
        short_name: impl Into<String>,
        symbol_type: SymbolType,
        size: f64,
    ) -> NodeId {
        self.push(TreeNode::symbol(id_path, short_name, symbol_type, size))
    }

    /// Give a node a new id path; its position in the tree is unchanged
    pub(crate) fn rename(&mut self, id: NodeId, id_path: impl Into<String>) {
        self.nodes[id.0].id_path = id_path.into();
    }

    /// Change what a container groups, keeping its dominant type
    pub(crate) fn set_kind(&mut self, id: NodeId, new_kind: ContainerKind) {
        if let NodeType::Container { kind, .. } = &mut self.nodes[id.0].node_type {
            *kind = new_kind;
        }
    }

    fn push(&mut self, node: TreeNode) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Link `child` under `parent` and propagate its size to every ancestor.
    ///
    /// Ancestors above a parent that is itself not linked yet are updated
    /// when that parent gets attached, because a container carries its whole
    /// breakdown along.
    pub(crate) fn attach(&mut self, child: NodeId, parent: NodeId) -> DomainResult<()> {
        if child == self.root {
            return Err(DomainError::invariant_violation("the root cannot be attached"));
        }
        if child == parent {
            return Err(DomainError::invariant_violation(format!(
                "node {child} cannot own itself"
            )));
        }
        if let Some(owner) = self.nodes[child.0].parent {
            return Err(DomainError::invariant_violation(format!(
                "node {child} already owned by {owner}"
            )));
        }
        if !self.nodes[parent.0].node_type.is_container() {
            return Err(DomainError::invariant_violation(format!(
                "symbol {} cannot own children",
                self.nodes[parent.0].id_path
            )));
        }

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);

        let size = self.nodes[child.0].size;
        let contribution = self.nodes[child.0].contribution();
        self.propagate(parent, size, &contribution);
        Ok(())
    }

    /// Add `delta` to an existing symbol leaf and to all of its ancestors
    pub(crate) fn grow(&mut self, leaf: NodeId, delta: f64) -> DomainResult<()> {
        let NodeType::Symbol(symbol_type) = self.nodes[leaf.0].node_type else {
            return Err(DomainError::invariant_violation(format!(
                "only symbols can grow, {} is a container",
                self.nodes[leaf.0].id_path
            )));
        };
        self.nodes[leaf.0].size += delta;
        if let Some(parent) = self.nodes[leaf.0].parent {
            self.propagate(parent, delta, &ChildSizes::single(symbol_type, delta));
        }
        Ok(())
    }

    fn propagate(&mut self, from: NodeId, size: f64, contribution: &ChildSizes) {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = &mut self.nodes[id.0];
            node.absorb(size, contribution);
            current = node.parent;
        }
    }

    /// Order every node's children by descending magnitude.
    ///
    /// Size decreases sort as prominently as increases. Equal magnitudes
    /// fall back to ascending id path so the order never depends on the
    /// order nodes were attached in.
    pub fn sort_by_size(&mut self) {
        for idx in 0..self.nodes.len() {
            let mut children = std::mem::take(&mut self.nodes[idx].children);
            children.sort_by(|a, b| compare_nodes(&self.nodes[a.0], &self.nodes[b.0]));
            self.nodes[idx].children = children;
        }
    }

    /// Merge every container whose only child has the same type into that
    /// container, so `java` → `com` → `google` becomes `java/com/google`.
    ///
    /// The root is never merged. Running this twice is the same as running
    /// it once.
    pub fn collapse_chains(&mut self) {
        let mut stack: Vec<NodeId> = self.nodes[self.root.0].children.clone();
        while let Some(id) = stack.pop() {
            while let Some(child) = self.sole_same_type_child(id) {
                self.merge_into_parent(id, child);
            }
            stack.extend(self.nodes[id.0].children.iter().copied());
        }
    }

    fn sole_same_type_child(&self, id: NodeId) -> Option<NodeId> {
        let node = &self.nodes[id.0];
        match node.children.as_slice() {
            [child] if node.node_type.is_container()
                && self.nodes[child.0].node_type == node.node_type =>
            {
                Some(*child)
            }
            _ => None,
        }
    }

    fn merge_into_parent(&mut self, id: NodeId, child: NodeId) {
        let grandchildren = std::mem::take(&mut self.nodes[child.0].children);
        for grandchild in &grandchildren {
            self.nodes[grandchild.0].parent = Some(id);
        }

        let joiner = self.joiner(id, child).to_string();
        let child_node = &mut self.nodes[child.0];
        child_node.parent = None;
        let child_name = child_node.short_name.clone();
        let child_path = child_node.id_path.clone();

        let node = &mut self.nodes[id.0];
        node.short_name = format!("{}{}{}", node.short_name, joiner, child_name);
        node.id_path = child_path;
        node.children = grandchildren;
    }

    /// Separator text between a parent id path and its child's name
    fn joiner(&self, parent: NodeId, child: NodeId) -> &str {
        let parent_path = &self.nodes[parent.0].id_path;
        let child_node = &self.nodes[child.0];
        child_node
            .id_path
            .strip_prefix(parent_path.as_str())
            .and_then(|rest| rest.strip_suffix(child_node.short_name.as_str()))
            .filter(|joiner| !joiner.is_empty())
            .unwrap_or(self.separator.as_str())
    }

    /// Owned copy of the tree for handing to another execution context
    ///
    /// With `expand_sole_child`, containers that have exactly one child are
    /// marked so a viewer can open them automatically.
    pub fn snapshot(&self, expand_sole_child: bool) -> NodeSnapshot {
        // post-order: a node is copied once all of its children are, which
        // leaves their copies in order on top of `copied`
        let mut pending = vec![(self.root, false)];
        let mut copied: Vec<NodeSnapshot> = Vec::new();
        while let Some((id, children_copied)) = pending.pop() {
            let node = &self.nodes[id.0];
            if !children_copied {
                pending.push((id, true));
                pending.extend(node.children.iter().rev().map(|child| (*child, false)));
                continue;
            }
            let children = copied.split_off(copied.len() - node.children.len());
            copied.push(NodeSnapshot {
                id_path: node.id_path.clone(),
                short_name: node.short_name.clone(),
                node_type: node.node_type,
                size: node.size,
                child_sizes: node.child_sizes,
                expand: expand_sole_child && node.children.len() == 1,
                children,
            });
        }
        debug_assert_eq!(copied.len(), 1);
        copied.swap_remove(0)
    }

    /// Verify parent links, unique id paths and size aggregates of every
    /// reachable node.
    pub fn check_invariants(&self) -> DomainResult<()> {
        let mut seen = std::collections::HashSet::new();
        for (id, node) in self.walk() {
            if !seen.insert(node.id_path.as_str()) {
                return Err(DomainError::invariant_violation(format!(
                    "duplicate id path `{}`",
                    node.id_path
                )));
            }
            for child in &node.children {
                if self.nodes[child.0].parent != Some(id) {
                    return Err(DomainError::invariant_violation(format!(
                        "`{}` does not point back to `{}`",
                        self.nodes[child.0].id_path, node.id_path
                    )));
                }
            }
            if !node.node_type.is_container() {
                continue;
            }
            let children_total: f64 = node.children.iter().map(|c| self.nodes[c.0].size).sum();
            if !approx_eq(children_total, node.size) {
                return Err(DomainError::invariant_violation(format!(
                    "`{}` has size {} but its children sum to {}",
                    node.id_path, node.size, children_total
                )));
            }
            if !approx_eq(node.child_sizes.total(), node.size) {
                return Err(DomainError::invariant_violation(format!(
                    "`{}` has size {} but its breakdown sums to {}",
                    node.id_path,
                    node.size,
                    node.child_sizes.total()
                )));
            }
            if node.node_type.leaf_type() != node.child_sizes.dominant() {
                return Err(DomainError::invariant_violation(format!(
                    "`{}` has a stale dominant type",
                    node.id_path
                )));
            }
        }
        Ok(())
    }
}

fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    b.size
        .abs()
        .total_cmp(&a.size.abs())
        .then_with(|| a.id_path.cmp(&b.id_path))
}

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= SIZE_EPSILON * a.abs().max(b.abs()).max(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir(tree: &mut Tree, path: &str, name: &str) -> NodeId {
        tree.create_container(path, name, ContainerKind::Directory)
    }

    #[test]
    fn test_new_tree_has_root() {
        let tree = Tree::new("/");
        let root = tree.root_node();
        assert_eq!(root.id_path(), "/");
        assert_eq!(root.short_name(), "/");
        assert_eq!(root.node_type().to_string(), "D");
        assert_eq!(root.size(), 0.0);
        assert!(tree.is_empty());
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_attach_propagates_to_all_ancestors() {
        let mut tree = Tree::new("/");
        let a = dir(&mut tree, "a", "a");
        tree.attach(a, tree.root()).unwrap();
        let file = tree.create_container("a/x.cc", "x.cc", ContainerKind::File);
        tree.attach(file, a).unwrap();

        let sym = tree.create_symbol("a/x.cc:Foo", "Foo", SymbolType::Code, 10.0);
        tree.attach(sym, file).unwrap();
        let sym = tree.create_symbol("a/x.cc:kData", "kData", SymbolType::ReadOnly, 25.0);
        tree.attach(sym, file).unwrap();

        assert_eq!(tree.root_node().size(), 35.0);
        assert_eq!(tree.get(a).unwrap().size(), 35.0);
        assert_eq!(tree.root_node().node_type().to_string(), "Dr");
        assert_eq!(tree.get(file).unwrap().node_type().to_string(), "Fr");
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_detached_subtree_carries_breakdown() {
        let mut tree = Tree::new("/");
        let file = tree.create_container("x.cc", "x.cc", ContainerKind::File);
        let sym = tree.create_symbol("x.cc:a", "a", SymbolType::Bss, 4.0);
        tree.attach(sym, file).unwrap();
        let sym = tree.create_symbol("x.cc:b", "b", SymbolType::Data, 6.0);
        tree.attach(sym, file).unwrap();
        assert_eq!(tree.root_node().size(), 0.0);

        tree.attach(file, tree.root()).unwrap();
        let root = tree.root_node();
        assert_eq!(root.size(), 10.0);
        assert_eq!(root.child_sizes().get(SymbolType::Bss), Some(4.0));
        assert_eq!(root.child_sizes().get(SymbolType::Data), Some(6.0));
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_attach_rejects_double_ownership() {
        let mut tree = Tree::new("/");
        let a = dir(&mut tree, "a", "a");
        tree.attach(a, tree.root()).unwrap();
        assert!(tree.attach(a, tree.root()).is_err());
        assert!(tree.attach(tree.root(), a).is_err());
        assert!(tree.attach(a, a).is_err());

        let sym = tree.create_symbol("s", "s", SymbolType::Code, 1.0);
        let other = tree.create_symbol("t", "t", SymbolType::Code, 1.0);
        assert!(tree.attach(other, sym).is_err());
    }

    #[test]
    fn test_grow_updates_ancestors() {
        let mut tree = Tree::new("/");
        let file = tree.create_container("x.cc", "x.cc", ContainerKind::File);
        tree.attach(file, tree.root()).unwrap();
        let sym = tree.create_symbol("x.cc:a", "a", SymbolType::Code, 4.0);
        tree.attach(sym, file).unwrap();
        tree.grow(sym, 6.0).unwrap();
        assert_eq!(tree.root_node().size(), 10.0);
        assert!(tree.grow(file, 1.0).is_err());
        tree.check_invariants().unwrap();
    }

    #[test]
    fn test_sort_uses_magnitude_then_path() {
        let mut tree = Tree::new("/");
        let file = tree.create_container("f", "f", ContainerKind::File);
        tree.attach(file, tree.root()).unwrap();
        for (name, size) in [("small", 5.0), ("shrink", -50.0), ("b", 20.0), ("a", -20.0)] {
            let sym = tree.create_symbol(format!("f:{name}"), name, SymbolType::Code, size);
            tree.attach(sym, file).unwrap();
        }
        tree.sort_by_size();
        let names: Vec<_> = tree.children(file).map(|n| n.short_name().to_string()).collect();
        assert_eq!(names, ["shrink", "a", "b", "small"]);
    }

    #[test]
    fn test_collapse_merges_chain_but_not_root() {
        let mut tree = Tree::new("/");
        let java = dir(&mut tree, "java", "java");
        let com = dir(&mut tree, "java/com", "com");
        let google = dir(&mut tree, "java/com/google", "google");
        let file = tree.create_container("java/com/google/A.java", "A.java", ContainerKind::File);
        let sym = tree.create_symbol("java/com/google/A.java:run", "run", SymbolType::DexMethod, 1.0);
        tree.attach(sym, file).unwrap();
        tree.attach(file, google).unwrap();
        tree.attach(google, com).unwrap();
        tree.attach(com, java).unwrap();
        tree.attach(java, tree.root()).unwrap();

        tree.collapse_chains();
        let top: Vec<_> = tree.children(tree.root()).collect();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].short_name(), "java/com/google");
        assert_eq!(top[0].id_path(), "java/com/google");
        assert_eq!(tree.root_node().id_path(), "/");
        assert!(tree.find("java/com/google/A.java").is_some());
        tree.check_invariants().unwrap();

        let before = tree.snapshot(false);
        tree.collapse_chains();
        assert_eq!(tree.snapshot(false), before);
    }

    #[test]
    fn test_snapshot_expand_hint() {
        let mut tree = Tree::new("/");
        let a = dir(&mut tree, "a", "a");
        tree.attach(a, tree.root()).unwrap();
        let snapshot = tree.snapshot(true);
        assert!(snapshot.expand);
        assert!(!snapshot.children[0].expand);
        assert!(!tree.snapshot(false).expand);
    }

    #[test]
    fn test_snapshot_keeps_child_order_and_depth() {
        let mut tree = Tree::new("/");
        let mut parent = tree.root();
        let mut path = String::new();
        for depth in 0..2_000 {
            path = if path.is_empty() { "d".to_string() } else { format!("{path}/d") };
            let next = dir(&mut tree, &path, "d");
            tree.attach(next, parent).unwrap();
            if depth == 0 {
                for name in ["x", "y", "z"] {
                    let sym = tree.create_symbol(format!("d:{name}"), name, SymbolType::Code, 1.0);
                    tree.attach(sym, next).unwrap();
                }
            }
            parent = next;
        }

        let snapshot = tree.snapshot(false);
        let top = &snapshot.children[0];
        let names: Vec<_> = top.children.iter().map(|n| n.short_name.as_str()).collect();
        assert_eq!(names, ["x", "y", "z", "d"]);
        assert_eq!(top.size, 3.0);
        assert_eq!(snapshot.node_count(), tree.len());
        assert_eq!(snapshot.find(&path).map(|n| n.children.len()), Some(0));
    }

    #[test]
    fn test_rename_and_set_kind() {
        let mut tree = Tree::new("/");
        let a = dir(&mut tree, "a", "a");
        tree.attach(a, tree.root()).unwrap();
        let sym = tree.create_symbol("a:s", "s", SymbolType::Data, 2.0);
        tree.attach(sym, a).unwrap();

        tree.rename(sym, "a:s#d");
        tree.set_kind(a, ContainerKind::File);
        assert!(tree.find("a:s").is_none());
        assert_eq!(tree.get(sym).unwrap().short_name(), "s");
        assert_eq!(tree.get(a).unwrap().node_type().to_string(), "Fd");
        tree.check_invariants().unwrap();
    }
}
