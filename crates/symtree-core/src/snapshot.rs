//! Progress snapshots handed to consumers

use serde::{Deserialize, Serialize};
use symtree_domain::NodeSnapshot;

/// State of one build at one point in time
///
/// A snapshot owns its tree copy, so it can cross task boundaries freely.
/// An error snapshot is terminal for its generation; whatever tree it
/// carries is the partial result built before the failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Build this snapshot belongs to
    pub generation: u64,
    /// Tree built so far
    pub root: NodeSnapshot,
    /// Completion fraction in `(0, 1]`
    pub percent: f64,
    /// Set on the last snapshot of a build, complete or failed
    #[serde(default)]
    pub done: bool,
    /// Failure message; present only on the last snapshot of a failed build
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Snapshot {
    /// Intermediate snapshot
    pub fn progress(generation: u64, root: NodeSnapshot, percent: f64) -> Self {
        Self {
            generation,
            root,
            percent,
            done: false,
            error: None,
        }
    }

    /// Final snapshot of a completed build
    pub fn complete(generation: u64, root: NodeSnapshot) -> Self {
        Self {
            done: true,
            ..Self::progress(generation, root, 1.0)
        }
    }

    /// Final snapshot of a failed build
    pub fn failed(
        generation: u64,
        root: NodeSnapshot,
        percent: f64,
        error: impl Into<String>,
    ) -> Self {
        Self {
            generation,
            root,
            percent,
            done: true,
            error: Some(error.into()),
        }
    }

    /// True if this is the last snapshot of its build.
    ///
    /// Progress may already read 1 before the stream ends; only the
    /// snapshot posted after finalisation is final.
    pub fn is_final(&self) -> bool {
        self.done
    }

    /// True if the build failed
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Completion fraction of `done` out of `total`, clamped to `[floor, 1]`.
///
/// Unknown, zero or negative totals report the floor.
pub fn progress_fraction(done: f64, total: f64, floor: f64) -> f64 {
    if total <= 0.0 || !total.is_finite() {
        return floor;
    }
    let fraction = done / total;
    if fraction.is_nan() {
        return floor;
    }
    fraction.clamp(floor, 1.0)
}
