//! symtree Domain Layer - Pure Tree Building Logic
//!
//! This crate turns a flat list of size-annotated binary symbols into a
//! hierarchical aggregation tree. It has no I/O and no async code, so it can
//! be driven by any ingest loop (see the `symtree` crate for the streaming
//! driver).
//!
//! ## Architecture
//!
//! - **Path**: pure `basename`/`dirname` decomposition of id paths
//! - **Value Objects**: symbol type codes, type filters, per-type size
//!   breakdowns and the input record shapes
//! - **Entities**: the node arena ([`Tree`]) with eager upward aggregation
//! - **Services**: the [`TreeBuilder`] that groups file records into the tree

#![warn(missing_docs)]

pub mod entities;
pub mod path;
pub mod services;
pub mod value_objects;

// Re-export core types
pub use entities::{NodeId, NodeSnapshot, Tree, TreeNode};
pub use services::{BuildStats, BuilderConfig, EntryOutcome, FinalizePolicy, GroupBy, TreeBuilder};
pub use value_objects::{
    ChildSizes, ContainerKind, FileEntry, MetaRecord, NodeType, SymbolEntry, SymbolType,
    TypeFilter,
};

/// Domain Result type
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-specific errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[non_exhaustive]
pub enum DomainError {
    /// No grouping function was configured for the builder
    #[error("Missing grouping key: a builder needs `source_path` or `component` grouping")]
    MissingGrouping,

    /// The path separator is unusable
    #[error("Invalid separator: {0}")]
    InvalidSeparator(String),

    /// An input record could not be interpreted
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// Tree invariant violation
    #[error("Tree invariant violation: {0}")]
    InvariantViolation(String),
}

impl DomainError {
    /// Create an invariant violation error
    pub fn invariant_violation(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }

    /// Create an invalid record error
    pub fn invalid_record(message: impl Into<String>) -> Self {
        Self::InvalidRecord(message.into())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(error: serde_json::Error) -> Self {
        Self::InvalidRecord(error.to_string())
    }
}
