//! Domain services
//!
//! Stateful operations that coordinate entities and value objects.

mod builder;

pub use builder::{
    BuildStats, BuilderConfig, COMPONENT_MARKER, EntryOutcome, FinalizePolicy, GroupBy,
    NO_COMPONENT, NO_PATH, TreeBuilder,
};
