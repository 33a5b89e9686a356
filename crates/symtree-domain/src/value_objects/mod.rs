//! Domain Value Objects
//!
//! Immutable objects that describe symbols, their types and the input
//! records, with no identity of their own.

mod child_sizes;
mod records;
mod symbol_type;
mod type_filter;

pub use child_sizes::ChildSizes;
pub use records::{FileEntry, MetaRecord, SymbolEntry};
pub use symbol_type::{ContainerKind, NodeType, SymbolType};
pub use type_filter::TypeFilter;
