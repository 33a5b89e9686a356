//! Build coordination across re-builds
//!
//! Changing the grouping or filter starts a new build instead of mutating
//! the running one. Every build gets a generation number; all builds post
//! into one channel, and the receiver drops anything that belongs to a
//! build older than the latest one started.

use crate::{
    Error, Result,
    config::{BuildOptions, IngestConfig},
    ingest::IngestDriver,
    snapshot::Snapshot,
};
use bytes::Bytes;
use futures::Stream;
use std::{
    fmt::Display,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};
use symtree_domain::{Tree, TreeBuilder};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info};

/// Starts builds and numbers them
#[derive(Debug)]
pub struct BuildCoordinator {
    config: IngestConfig,
    sender: mpsc::Sender<Snapshot>,
    latest: Arc<AtomicU64>,
}

/// Consumer side of a [`BuildCoordinator`]
#[derive(Debug)]
pub struct SnapshotReceiver {
    receiver: mpsc::Receiver<Snapshot>,
    latest: Arc<AtomicU64>,
}

/// A build running on its own task
#[derive(Debug)]
pub struct BuildHandle {
    generation: u64,
    task: JoinHandle<Result<Tree>>,
}

impl BuildCoordinator {
    /// Create a coordinator and the receiver its builds post to
    pub fn new(config: IngestConfig) -> Result<(Self, SnapshotReceiver)> {
        config.validate()?;
        let (sender, receiver) = mpsc::channel(config.channel_capacity);
        let latest = Arc::new(AtomicU64::new(0));
        Ok((
            Self {
                config,
                sender,
                latest: Arc::clone(&latest),
            },
            SnapshotReceiver { receiver, latest },
        ))
    }

    /// Generation of the most recently started build, 0 before the first
    pub fn latest_generation(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    /// Start a build of `source` with `options` on a new task.
    ///
    /// Configuration errors are returned before anything is spawned. The
    /// new build supersedes every earlier one; those keep running but
    /// their snapshots are no longer delivered by
    /// [`SnapshotReceiver::recv_current`].
    pub fn start<S, E>(&self, options: &BuildOptions, source: S) -> Result<BuildHandle>
    where
        S: Stream<Item = std::result::Result<Bytes, E>> + Send + 'static,
        E: Display + Send + 'static,
    {
        let builder = TreeBuilder::new(options.builder_config())?;
        let generation = self.latest.fetch_add(1, Ordering::AcqRel) + 1;
        info!(generation, query = %options.to_query(), "starting build");

        let driver = IngestDriver::new(builder, self.config.clone(), self.sender.clone())
            .with_generation(generation);
        let task = tokio::spawn(driver.run(source));
        Ok(BuildHandle { generation, task })
    }
}

impl BuildHandle {
    /// Generation of this build
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True once the build task has ended
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the finished tree
    pub async fn join(self) -> Result<Tree> {
        self.task
            .await
            .map_err(|err| Error::Task(err.to_string()))?
    }
}

impl SnapshotReceiver {
    /// Next snapshot of any build
    pub async fn recv(&mut self) -> Option<Snapshot> {
        self.receiver.recv().await
    }

    /// Next snapshot of the latest build; older generations are dropped
    pub async fn recv_current(&mut self) -> Option<Snapshot> {
        loop {
            let snapshot = self.receiver.recv().await?;
            if self.is_current(&snapshot) {
                return Some(snapshot);
            }
        }
    }

    /// Like [`SnapshotReceiver::recv_current`] without waiting
    pub fn try_recv_current(&mut self) -> Option<Snapshot> {
        while let Ok(snapshot) = self.receiver.try_recv() {
            if self.is_current(&snapshot) {
                return Some(snapshot);
            }
        }
        None
    }

    fn is_current(&self, snapshot: &Snapshot) -> bool {
        let latest = self.latest.load(Ordering::Acquire);
        if snapshot.generation >= latest {
            return true;
        }
        debug!(
            generation = snapshot.generation,
            latest, "dropping snapshot of superseded build"
        );
        false
    }
}
