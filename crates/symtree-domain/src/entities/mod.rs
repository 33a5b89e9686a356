//! Domain entities with identity

mod node;
mod snapshot;
mod tree;

pub use node::{NodeId, TreeNode};
pub use snapshot::NodeSnapshot;
pub use tree::Tree;
