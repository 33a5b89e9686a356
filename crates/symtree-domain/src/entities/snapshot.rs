//! Owned, serialisable copies of a tree

use crate::value_objects::{ChildSizes, NodeType};
use serde::{Deserialize, Serialize};

/// Deep copy of a tree node and its subtree
///
/// Snapshots are what crosses the boundary to a consumer: they own their
/// data and carry no back references, so the builder can keep mutating its
/// arena while a viewer renders an earlier state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSnapshot {
    /// Fully-qualified identifier
    pub id_path: String,
    /// Display label
    pub short_name: String,
    /// Rendered type string (`"t"`, `"Dt"`, `"F"`)
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Signed size
    pub size: f64,
    /// Per-type breakdown, empty for symbols
    #[serde(default, skip_serializing_if = "ChildSizes::is_empty")]
    pub child_sizes: ChildSizes,
    /// Hint that a viewer should open this node right away
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub expand: bool,
    /// Children in tree order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSnapshot>,
}

impl NodeSnapshot {
    /// Find a node in this subtree by id path
    pub fn find(&self, id_path: &str) -> Option<&NodeSnapshot> {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.id_path == id_path {
                return Some(node);
            }
            stack.extend(node.children.iter());
        }
        None
    }

    /// Direct child with the given display name
    pub fn child(&self, short_name: &str) -> Option<&NodeSnapshot> {
        self.children.iter().find(|child| child.short_name == short_name)
    }

    /// Number of nodes in this subtree, self included
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.iter());
        }
        count
    }

    /// Symbol leaves in this subtree, depth-first
    pub fn leaves(&self) -> Vec<&NodeSnapshot> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.node_type.is_container() {
                stack.extend(node.children.iter().rev());
            } else {
                leaves.push(node);
            }
        }
        leaves
    }
}
