//! Stream writer
//!
//! Writes the elements of one source into a sequence of committed chunks on
//! a dedicated background thread named `streamsnap-stream-<index>`.
//!
//! # Write Loop
//!
//! 1. Recover: restore the source from the latest checkpoint and reconcile
//!    uncommitted chunks (see [`crate::recovery`])
//! 2. Write chunk `i` until it reaches the size threshold or the source is
//!    exhausted, then fsync it
//! 3. If the source is not exhausted, save checkpoint `i`
//! 4. Commit chunk `i` by renaming it into `committed_chunks/`
//! 5. Repeat from 2 with `i + 1` until end of source, error or cancellation
//!
//! Invariant: every committed chunk except the final one has a checkpoint
//! at or after its index, so recovery never rewinds the source past a
//! committed element.
//!
//! Committed chunks are never modified, with one exception: the final chunk
//! is committed without a checkpoint, so restarting a stream that already
//! finished restores the last checkpoint and writes the final chunk again.
//! The rename replaces the committed file with identical content when the
//! source is deterministic.
//!
//! # Cancellation
//!
//! [`StreamWriter::cancel`] only sets the status. The background thread
//! checks it before starting a chunk, before pulling each element and before
//! checkpointing and committing a finished chunk. A chunk interrupted this
//! way is fsynced but stays uncommitted, and is discarded by the next
//! recovery.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};
use streamsnap_core::{ElementSource, Error, Result};
use tracing::{debug, info, warn};

use crate::checkpoint::CheckpointManager;
use crate::chunk_writer::{commit_chunk, ChunkWriter};
use crate::codec::{codec_for, StorageCodec};
use crate::config::{ConfigError, StreamWriterConfig};
use crate::fs::FileStore;
use crate::paths::StreamPaths;
use crate::recovery::{RecoveryCoordinator, RecoveryOutcome};

/// Cumulative stream writer counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamWriterStats {
    /// Chunks renamed into the committed directory
    pub chunks_committed: u64,
    /// Elements appended to chunk files
    pub elements_written: u64,
    /// Estimated element bytes appended to chunk files
    pub bytes_written: u64,
    /// Checkpoints saved
    pub checkpoints_saved: u64,
}

#[derive(Default)]
struct StatsCounters {
    chunks_committed: AtomicU64,
    elements_written: AtomicU64,
    bytes_written: AtomicU64,
    checkpoints_saved: AtomicU64,
}

impl StatsCounters {
    fn snapshot(&self) -> StreamWriterStats {
        StreamWriterStats {
            chunks_committed: self.chunks_committed.load(Ordering::Relaxed),
            elements_written: self.elements_written.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            checkpoints_saved: self.checkpoints_saved.load(Ordering::Relaxed),
        }
    }
}

struct StreamState {
    status: Result<()>,
    end_of_source: bool,
    finished: bool,
    recovery: Option<RecoveryOutcome>,
}

struct Shared {
    state: Mutex<StreamState>,
    finished_cond: Condvar,
    stats: StatsCounters,
}

impl Shared {
    /// Current status, or `Ok(end_of_source)` while healthy
    fn check(&self) -> Result<bool> {
        let state = self.state.lock();
        state.status.clone()?;
        Ok(state.end_of_source)
    }

    fn is_ok(&self) -> bool {
        self.state.lock().status.is_ok()
    }

    fn set_end_of_source(&self) {
        self.state.lock().end_of_source = true;
    }

    fn set_recovery(&self, outcome: RecoveryOutcome) {
        self.state.lock().recovery = Some(outcome);
    }

    /// Record the loop result and wake every waiter
    ///
    /// A status that is already non-ok (cancellation) is kept.
    fn finish(&self, result: Result<()>) {
        let mut state = self.state.lock();
        if state.status.is_ok() {
            state.status = result;
        }
        state.finished = true;
        self.finished_cond.notify_all();
    }
}

/// Background writer for one stream of a snapshot
///
/// Dropping the writer blocks until the background thread exits. Call
/// [`cancel`](Self::cancel) first to stop it early.
pub struct StreamWriter {
    config: StreamWriterConfig,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl StreamWriter {
    /// Validate `config` and start writing `source` on a background thread
    pub fn new<F, S>(
        config: StreamWriterConfig,
        store: F,
        source: S,
    ) -> std::result::Result<Self, ConfigError>
    where
        F: FileStore + 'static,
        S: ElementSource + 'static,
    {
        config.validate()?;

        let shared = Arc::new(Shared {
            state: Mutex::new(StreamState {
                status: Ok(()),
                end_of_source: false,
                finished: false,
                recovery: None,
            }),
            finished_cond: Condvar::new(),
            stats: StatsCounters::default(),
        });

        let mut task = WriteTask {
            paths: config.paths(),
            checkpoints: CheckpointManager::new(
                Arc::new(store),
                config.paths(),
                codec_for(config.compression),
            ),
            codec: codec_for(config.compression),
            config: config.clone(),
            source: Box::new(source),
            shared: Arc::clone(&shared),
        };

        let handle = std::thread::Builder::new()
            .name(format!("streamsnap-stream-{}", config.stream_index))
            .spawn(move || task.run())
            .map_err(|e| ConfigError::Spawn(e.to_string()))?;

        Ok(StreamWriter {
            config,
            shared,
            handle: Some(handle),
        })
    }

    /// Configuration the writer was started with
    pub fn config(&self) -> &StreamWriterConfig {
        &self.config
    }

    /// Request cancellation
    ///
    /// Has no effect once the writer has finished or failed.
    pub fn cancel(&self) {
        let mut state = self.shared.state.lock();
        if state.finished || state.status.is_err() {
            return;
        }
        state.status = Err(Error::cancelled(format!(
            "The stream writer for stream {} is cancelled",
            self.config.stream_index
        )));
        info!(
            target: "streamsnap::stream",
            stream = self.config.stream_index,
            "Cancellation requested"
        );
    }

    /// Block until the writer has finished and return its final status
    ///
    /// `Ok(())` means every element was written and committed. Repeated
    /// calls return the same status.
    pub fn wait(&self) -> Result<()> {
        let mut state = self.shared.state.lock();
        while !state.finished {
            self.shared.finished_cond.wait(&mut state);
        }
        state.status.clone()
    }

    /// Whether the background thread has finished
    pub fn is_finished(&self) -> bool {
        self.shared.state.lock().finished
    }

    /// Cumulative counters
    pub fn stats(&self) -> StreamWriterStats {
        self.shared.stats.snapshot()
    }

    /// What startup recovery did, once it has completed
    pub fn recovery_outcome(&self) -> Option<RecoveryOutcome> {
        self.shared.state.lock().recovery.clone()
    }
}

impl Drop for StreamWriter {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

/// State owned by the background thread
struct WriteTask {
    config: StreamWriterConfig,
    paths: StreamPaths,
    checkpoints: CheckpointManager,
    codec: Box<dyn StorageCodec>,
    source: Box<dyn ElementSource>,
    shared: Arc<Shared>,
}

impl WriteTask {
    fn run(&mut self) {
        info!(
            target: "streamsnap::stream",
            stream = self.config.stream_index,
            root = %self.config.snapshot_root.display(),
            max_chunk_size_bytes = self.config.max_chunk_size_bytes,
            "Stream writer started"
        );

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.write_all()))
            .unwrap_or_else(|_| {
                Err(Error::element_source(format!(
                    "The stream writer thread for stream {} panicked",
                    self.config.stream_index
                )))
            });

        let stats = self.shared.stats.snapshot();
        match &result {
            Ok(()) => info!(
                target: "streamsnap::stream",
                stream = self.config.stream_index,
                chunks_committed = stats.chunks_committed,
                elements_written = stats.elements_written,
                "Stream writer finished"
            ),
            Err(e) if e.is_cancelled() => info!(
                target: "streamsnap::stream",
                stream = self.config.stream_index,
                chunks_committed = stats.chunks_committed,
                "Stream writer cancelled"
            ),
            Err(e) => warn!(
                target: "streamsnap::stream",
                stream = self.config.stream_index,
                error = %e,
                "Stream writer failed"
            ),
        }

        self.shared.finish(result);
    }

    fn write_all(&mut self) -> Result<()> {
        let store = Arc::clone(self.checkpoints.store());
        let outcome = RecoveryCoordinator::new(
            store.as_ref(),
            &self.checkpoints,
            self.config.start_chunk_index,
        )
        .recover(self.source.as_mut())?;

        let mut chunk_index = outcome.next_chunk_index;
        self.shared.set_recovery(outcome);

        while !self.shared.check()? {
            self.write_chunk(store.as_ref(), chunk_index)?;
            chunk_index += 1;
        }
        Ok(())
    }

    fn write_chunk(&mut self, store: &dyn FileStore, chunk_index: u64) -> Result<()> {
        let stats = &self.shared.stats;
        let mut writer = ChunkWriter::create(store, &self.paths, chunk_index, self.codec.as_ref())?;

        while writer.size_bytes() < self.config.max_chunk_size_bytes && self.shared.is_ok() {
            match self.source.next()? {
                Some(element) => {
                    writer.append(&element)?;
                    stats.elements_written.fetch_add(1, Ordering::Relaxed);
                    stats
                        .bytes_written
                        .fetch_add(element.estimated_size_bytes(), Ordering::Relaxed);
                }
                None => {
                    self.shared.set_end_of_source();
                    break;
                }
            }
        }
        let summary = writer.finish()?;

        // Checkpoint before commit. Skipped at end of source: nothing
        // remains to resume.
        let end_of_source = self.shared.check()?;
        if !end_of_source {
            self.checkpoints.save(chunk_index, self.source.as_ref())?;
            stats.checkpoints_saved.fetch_add(1, Ordering::Relaxed);
        }

        self.shared.check()?;
        commit_chunk(store, &self.paths, chunk_index)?;
        stats.chunks_committed.fetch_add(1, Ordering::Relaxed);

        debug!(
            target: "streamsnap::stream",
            stream = self.config.stream_index,
            chunk_index,
            elements = summary.elements,
            size_bytes = summary.size_bytes,
            end_of_source,
            "Chunk committed"
        );
        Ok(())
    }
}
