//! Streaming ingest driver
//!
//! Feeds a line-delimited byte stream into a [`TreeBuilder`]: the first
//! record is the metadata record, every later one a file record. While the
//! stream is arriving the driver periodically posts progress snapshots;
//! when it ends, the tree is finalised and a last snapshot is posted.

use crate::{
    Error, Result,
    config::IngestConfig,
    ndjson::{Line, LineDecoder},
    snapshot::{Snapshot, progress_fraction},
};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt::Display;
use symtree_domain::{BuildStats, FileEntry, MetaRecord, Tree, TreeBuilder};
use tokio::{
    sync::mpsc::{self, error::TrySendError},
    time::{Instant, MissedTickBehavior, interval_at},
};
use tracing::{debug, error, info, warn};

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestState {
    /// Waiting for the metadata record
    AwaitingMeta,
    /// Adding file records
    Streaming,
    /// The stream ended and the tree was finalised
    Complete,
    /// The source failed or a record was malformed
    Failed,
}

impl IngestState {
    /// True for `Complete` and `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::Failed)
    }
}

/// Drives one build from a byte stream to a finished [`Tree`]
#[derive(Debug)]
pub struct IngestDriver {
    builder: TreeBuilder,
    decoder: LineDecoder,
    state: IngestState,
    config: IngestConfig,
    generation: u64,
    total: f64,
    sender: mpsc::Sender<Snapshot>,
}

impl IngestDriver {
    /// Create a driver posting snapshots to `sender`
    pub fn new(builder: TreeBuilder, config: IngestConfig, sender: mpsc::Sender<Snapshot>) -> Self {
        Self {
            builder,
            decoder: LineDecoder::new(),
            state: IngestState::AwaitingMeta,
            config,
            generation: 0,
            total: 0.0,
            sender,
        }
    }

    /// Tag every snapshot with `generation`
    pub fn with_generation(mut self, generation: u64) -> Self {
        self.generation = generation;
        self
    }

    /// Current state
    pub fn state(&self) -> IngestState {
        self.state
    }

    /// Generation carried by this driver's snapshots
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Completion fraction of the tree built so far
    pub fn percent(&self) -> f64 {
        progress_fraction(self.builder.root_size(), self.total, self.config.min_progress)
    }

    /// Builder counters so far
    pub fn stats(&self) -> BuildStats {
        self.builder.stats()
    }

    /// Consume the whole `source`, posting progress along the way.
    ///
    /// Returns the finished tree. On failure an error snapshot carrying the
    /// partial tree is posted before the error is returned; there is no
    /// retry.
    pub async fn run<S, E>(mut self, source: S) -> Result<Tree>
    where
        S: Stream<Item = std::result::Result<Bytes, E>>,
        E: Display,
    {
        tokio::pin!(source);
        let period = self.config.snapshot_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(generation = self.generation, "ingest started");
        loop {
            tokio::select! {
                biased;
                _ = ticker.tick(), if self.state == IngestState::Streaming => {
                    self.post_progress();
                }
                chunk = source.next() => match chunk {
                    Some(Ok(bytes)) => {
                        let awaiting_meta = self.state == IngestState::AwaitingMeta;
                        if let Err(err) = self.process_chunk(&bytes) {
                            return Err(self.fail(err).await);
                        }
                        // progress period starts with the metadata record
                        if awaiting_meta && self.state == IngestState::Streaming {
                            ticker.reset();
                        }
                    }
                    Some(Err(err)) => {
                        return Err(self.fail(Error::source(err.to_string())).await);
                    }
                    None => break,
                },
            }
        }
        self.finish().await
    }

    /// Decode and apply every complete line in `chunk`.
    ///
    /// The driver is left in `Failed` on error; posting the error snapshot
    /// is up to the caller ([`IngestDriver::run`] does it).
    pub fn process_chunk(&mut self, chunk: &[u8]) -> Result<()> {
        if self.state.is_terminal() {
            return Err(Error::Finished);
        }
        self.decoder.push(chunk);
        let result = self.drain_lines();
        if result.is_err() {
            self.state = IngestState::Failed;
        }
        result
    }

    fn drain_lines(&mut self) -> Result<()> {
        while let Some(line) = self.decoder.next_line()? {
            self.process_line(line)?;
        }
        Ok(())
    }

    /// Flush the trailing line, finalise the tree and post the last
    /// snapshot with `percent = 1`.
    pub async fn finish(&mut self) -> Result<Tree> {
        if self.state.is_terminal() {
            return Err(Error::Finished);
        }
        loop {
            let line = match self.decoder.finish() {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => return Err(self.fail(err).await),
            };
            if let Err(err) = self.process_line(line) {
                return Err(self.fail(err).await);
            }
        }
        if self.state == IngestState::AwaitingMeta {
            debug!(generation = self.generation, "stream ended before metadata");
        }

        let stats = self.builder.stats();
        let expand = self.builder.finalize_policy().expand_sole_child;
        let tree = self.builder.finish();
        self.state = IngestState::Complete;
        info!(
            generation = self.generation,
            lines = self.decoder.lines_read(),
            files = stats.files,
            skipped_files = stats.skipped_files,
            symbols = stats.symbols,
            filtered_symbols = stats.filtered_symbols,
            size = tree.root_node().size(),
            "ingest complete"
        );

        let snapshot = Snapshot::complete(self.generation, tree.snapshot(expand));
        if self.sender.send(snapshot).await.is_err() {
            debug!(generation = self.generation, "consumer gone before final snapshot");
        }
        Ok(tree)
    }

    fn process_line(&mut self, line: Line) -> Result<()> {
        match self.state {
            IngestState::AwaitingMeta => {
                let meta: MetaRecord = line.parse()?;
                debug!(
                    generation = self.generation,
                    total = meta.total,
                    components = meta.components.len(),
                    "metadata received"
                );
                self.total = meta.total;
                self.builder.set_components(meta.components);
                self.state = IngestState::Streaming;
                self.post_progress();
            }
            IngestState::Streaming => {
                let entry: FileEntry = line.parse()?;
                self.builder.add_entry(&entry)?;
            }
            IngestState::Complete | IngestState::Failed => return Err(Error::Finished),
        }
        Ok(())
    }

    /// Post a progress snapshot without waiting; a full channel drops it
    fn post_progress(&self) {
        if self.sender.is_closed() {
            return;
        }
        let snapshot = Snapshot::progress(self.generation, self.builder.snapshot(), self.percent());
        let percent = snapshot.percent;
        match self.sender.try_send(snapshot) {
            Ok(()) => debug!(generation = self.generation, percent, "progress snapshot posted"),
            Err(TrySendError::Full(_)) => warn!(
                generation = self.generation,
                "progress snapshot dropped, consumer is behind"
            ),
            Err(TrySendError::Closed(_)) => {
                debug!(generation = self.generation, "consumer gone")
            }
        }
    }

    /// Enter `Failed`, post the error snapshot and hand the error back
    async fn fail(&mut self, err: Error) -> Error {
        self.state = IngestState::Failed;
        error!(generation = self.generation, error = %err, "ingest failed");
        let snapshot = Snapshot::failed(
            self.generation,
            self.builder.snapshot(),
            self.percent(),
            err.to_string(),
        );
        if self.sender.send(snapshot).await.is_err() {
            debug!(generation = self.generation, "consumer gone before error snapshot");
        }
        err
    }
}
