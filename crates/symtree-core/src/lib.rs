//! # symtree
//!
//! Streaming front end for the symtree domain layer. Reads a
//! line-delimited JSON feed (a metadata record followed by one record per
//! source file), builds the aggregation tree incrementally and posts
//! progress snapshots to a consumer while the feed is still arriving.
//!
//! ```no_run
//! use symtree::{BuildCoordinator, BuildOptions, IngestConfig, source::file_source};
//!
//! # async fn demo() -> symtree::Result<()> {
//! let (coordinator, mut snapshots) = BuildCoordinator::new(IngestConfig::default())?;
//! let options = BuildOptions::from_query("group_by=component&types=tdr");
//! let build = coordinator.start(&options, file_source("size-info.ndjson"))?;
//!
//! while let Some(snapshot) = snapshots.recv_current().await {
//!     println!("{:.0}% - {} bytes", snapshot.percent * 100.0, snapshot.root.size);
//!     if snapshot.is_final() {
//!         break;
//!     }
//! }
//! let _tree = build.join().await?;
//! # Ok(())
//! # }
//! ```

#![warn(rust_2018_idioms)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod ingest;
pub mod ndjson;
pub mod session;
pub mod snapshot;
pub mod source;

// Domain layer exports
pub use symtree_domain::{
    BuildStats, BuilderConfig, ChildSizes, ContainerKind, DomainError, DomainResult, EntryOutcome,
    FileEntry, FinalizePolicy, GroupBy, MetaRecord, NodeId, NodeSnapshot, NodeType, SymbolEntry,
    SymbolType, Tree, TreeBuilder, TreeNode, TypeFilter, path,
};

// Ingest exports
pub use config::{BuildOptions, IngestConfig};
pub use error::{Error, Result};
pub use ingest::{IngestDriver, IngestState};
pub use ndjson::{Line, LineDecoder};
pub use session::{BuildCoordinator, BuildHandle, SnapshotReceiver};
pub use snapshot::{Snapshot, progress_fraction};
