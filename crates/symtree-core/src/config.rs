//! Ingest and build configuration
//!
//! [`BuildOptions`] is the query-string view of a build (`group_by`,
//! `method_count`, `types`, ...). [`IngestConfig`] tunes the driver itself.
//!
//! # Tuning
//!
//! - **DEFAULT_SNAPSHOT_INTERVAL**: lower it for snappier progress on slow
//!   feeds. Every snapshot is a deep copy of the tree built so far.
//! - **DEFAULT_CHANNEL_CAPACITY**: progress snapshots are dropped when the
//!   channel is full, so a small capacity only costs intermediate frames.

use crate::{Error, Result};
use std::time::Duration;
use symtree_domain::{BuilderConfig, FinalizePolicy, GroupBy, TypeFilter};
use tracing::debug;
use url::form_urlencoded;

/// Time between two progress snapshots.
pub const DEFAULT_SNAPSHOT_INTERVAL: Duration = Duration::from_secs(5);

/// Lower bound of the reported progress fraction.
///
/// Keeps a progress bar visible before the first size arrives.
pub const MIN_PROGRESS: f64 = 0.1;

/// Snapshots buffered between a driver and its consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// Bytes requested per read from file and reader sources.
pub const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Driver settings
#[derive(Debug, Clone, PartialEq)]
pub struct IngestConfig {
    /// Time between two progress snapshots
    pub snapshot_interval: Duration,
    /// Lower bound of the reported progress fraction
    pub min_progress: f64,
    /// Capacity of the snapshot channel
    pub channel_capacity: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            min_progress: MIN_PROGRESS,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl IngestConfig {
    /// Set the progress snapshot interval
    pub fn with_snapshot_interval(mut self, interval: Duration) -> Self {
        self.snapshot_interval = interval;
        self
    }

    /// Set the progress floor
    pub fn with_min_progress(mut self, min_progress: f64) -> Self {
        self.min_progress = min_progress;
        self
    }

    /// Set the snapshot channel capacity
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity;
        self
    }

    /// Check that the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.snapshot_interval.is_zero() {
            return Err(Error::config("snapshot interval must be positive"));
        }
        if !(self.min_progress > 0.0 && self.min_progress <= 1.0) {
            return Err(Error::config(format!(
                "progress floor must be in (0, 1], got {}",
                self.min_progress
            )));
        }
        if self.channel_capacity == 0 {
            return Err(Error::config("channel capacity must be positive"));
        }
        Ok(())
    }
}

/// Build options as carried by a query string
#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    /// Grouping; `None` when an unknown grouping was requested
    pub group_by: Option<GroupBy>,
    /// Count dex methods instead of summing sizes
    pub method_count: bool,
    /// Explicit type set; replaces the default set when present
    pub types: Option<TypeFilter>,
    /// Separator override
    pub separator: Option<String>,
    /// Collapse single-child chains when finishing
    pub collapse: bool,
    /// Mark sole children for automatic expansion
    pub expand: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        let finalize = FinalizePolicy::default();
        Self {
            group_by: Some(GroupBy::SourcePath),
            method_count: false,
            types: None,
            separator: None,
            collapse: finalize.collapse_chains,
            expand: finalize.expand_sole_child,
        }
    }
}

impl BuildOptions {
    /// Parse a query string such as `group_by=component&types=tv`.
    ///
    /// A leading `?` is ignored. `types` may repeat; every character of
    /// every value is one type code. Flags are on when present unless their
    /// value is `0`, `false` or `off`. Unknown keys are ignored.
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut options = Self::default();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "group_by" => options.group_by = GroupBy::parse(&value),
                "method_count" => options.method_count = flag(&value),
                "types" => {
                    let types = options.types.get_or_insert_with(TypeFilter::empty);
                    *types |= TypeFilter::from_codes(&value);
                }
                "sep" => options.separator = Some(value.into_owned()),
                "collapse" => options.collapse = flag(&value),
                "expand" => options.expand = flag(&value),
                other => debug!(key = other, "ignoring unknown query parameter"),
            }
        }
        options
    }

    /// Render back to a query string
    pub fn to_query(&self) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(group_by) = self.group_by {
            query.append_pair("group_by", group_by.as_str());
        }
        if self.method_count {
            query.append_pair("method_count", "on");
        }
        if let Some(types) = self.types {
            query.append_pair("types", &types.codes());
        }
        if let Some(separator) = &self.separator {
            query.append_pair("sep", separator);
        }
        query.append_pair("collapse", if self.collapse { "on" } else { "off" });
        query.append_pair("expand", if self.expand { "on" } else { "off" });
        query.finish()
    }

    /// Type filter in effect: method count mode forces dex methods only
    pub fn effective_types(&self) -> TypeFilter {
        if self.method_count {
            TypeFilter::method_count()
        } else {
            self.types.unwrap_or_default()
        }
    }

    /// Builder configuration for these options
    pub fn builder_config(&self) -> BuilderConfig {
        BuilderConfig {
            grouping: self.group_by,
            separator: self.separator.clone(),
            types: self.effective_types(),
            count_mode: self.method_count,
            finalize: FinalizePolicy {
                collapse_chains: self.collapse,
                expand_sole_child: self.expand,
            },
        }
    }
}

fn flag(value: &str) -> bool {
    !matches!(value, "0" | "false" | "off")
}
