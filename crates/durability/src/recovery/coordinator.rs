//! Recovery coordinator
//!
//! Recovery algorithm:
//! 1. Ensure the uncommitted, checkpoint, temp and committed directories
//!    exist, and delete checkpoint temp files left by an interrupted save
//! 2. Find the latest checkpoint `k`
//! 3. If none: start at the configured chunk index, nothing to reconcile
//! 4. Otherwise restore the source from checkpoint `k`, then for every
//!    uncommitted chunk `i`: commit it if `i <= k`, delete it if `i > k`
//! 5. Resume at chunk `k + 1`
//!
//! # Recovery Properties
//!
//! - **Idempotent**: recovering twice in a row performs no further action
//! - **Conservative**: a chunk is committed only when a checkpoint taken
//!   after it was fully written exists
//!
//! A checkpoint `k` is saved after chunk `k` is fsynced and before it is
//! renamed. Finding uncommitted chunk `k` next to checkpoint `k` therefore
//! means the process stopped between the two steps, and the chunk is
//! complete. Uncommitted chunks above `k` were written after the source
//! position in the checkpoint and are regenerated.

use streamsnap_core::{parse_file_index, ElementSource, IoResultExt, Result, CHUNK_PREFIX};
use tracing::{debug, info, warn};

use crate::checkpoint::CheckpointManager;
use crate::chunk_writer::commit_chunk;
use crate::fs::FileStore;
use crate::paths::StreamPaths;

/// What startup recovery did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryOutcome {
    /// Checkpoint the source was restored from, if any
    pub checkpoint_index: Option<u64>,
    /// Chunk index the writer resumes at
    pub next_chunk_index: u64,
    /// Uncommitted chunks that were committed
    pub committed: Vec<u64>,
    /// Uncommitted chunks that were deleted
    pub discarded: Vec<u64>,
}

/// Recovery coordinator
///
/// Restores the element source and repairs the uncommitted directory of
/// one stream.
pub struct RecoveryCoordinator<'a> {
    store: &'a dyn FileStore,
    checkpoints: &'a CheckpointManager,
    start_chunk_index: u64,
}

impl<'a> RecoveryCoordinator<'a> {
    /// Create a new recovery coordinator
    ///
    /// `start_chunk_index` is used when no checkpoint exists.
    pub fn new(
        store: &'a dyn FileStore,
        checkpoints: &'a CheckpointManager,
        start_chunk_index: u64,
    ) -> Self {
        RecoveryCoordinator {
            store,
            checkpoints,
            start_chunk_index,
        }
    }

    fn paths(&self) -> &StreamPaths {
        self.checkpoints.paths()
    }

    /// Perform recovery, restoring `source` from the latest checkpoint
    pub fn recover(&self, source: &mut dyn ElementSource) -> Result<RecoveryOutcome> {
        let paths = self.paths();
        paths.create_directories(self.store)?;
        self.remove_temp_files()?;

        let Some(checkpoint_index) = self.checkpoints.find_latest()? else {
            info!(
                target: "streamsnap::recovery",
                stream = paths.stream_index(),
                start_chunk_index = self.start_chunk_index,
                "No checkpoint found, starting fresh"
            );
            return Ok(RecoveryOutcome {
                checkpoint_index: None,
                next_chunk_index: self.start_chunk_index,
                committed: Vec::new(),
                discarded: Vec::new(),
            });
        };

        self.checkpoints.restore(checkpoint_index, source)?;
        let (committed, discarded) = self.reconcile(checkpoint_index)?;

        let outcome = RecoveryOutcome {
            checkpoint_index: Some(checkpoint_index),
            next_chunk_index: checkpoint_index + 1,
            committed,
            discarded,
        };
        info!(
            target: "streamsnap::recovery",
            stream = paths.stream_index(),
            checkpoint_index,
            next_chunk_index = outcome.next_chunk_index,
            committed = outcome.committed.len(),
            discarded = outcome.discarded.len(),
            "Recovered from checkpoint"
        );
        Ok(outcome)
    }

    /// Delete everything in the stream's temp directory
    ///
    /// Temp files only exist between allocation and rename of a checkpoint,
    /// so any found at startup belong to a save that never completed.
    fn remove_temp_files(&self) -> Result<()> {
        let paths = self.paths();
        let dir = paths.temp_dir();
        let names = self.store.list_children(&dir).fs_context("list", &dir)?;
        for name in &names {
            let path = dir.join(name);
            self.store.delete(&path).fs_context("delete", &path)?;
        }
        if !names.is_empty() {
            debug!(
                target: "streamsnap::recovery",
                stream = paths.stream_index(),
                removed = names.len(),
                "Removed leftover checkpoint temp files"
            );
        }
        Ok(())
    }

    /// Commit uncommitted chunks up to `checkpoint_index`, delete the rest
    fn reconcile(&self, checkpoint_index: u64) -> Result<(Vec<u64>, Vec<u64>)> {
        let paths = self.paths();
        let dir = paths.uncommitted_chunks_dir();
        let names = self.store.list_children(&dir).fs_context("list", &dir)?;

        let mut indices = names
            .iter()
            .map(|name| parse_file_index(name, CHUNK_PREFIX))
            .collect::<Result<Vec<_>>>()?;
        indices.sort_unstable();

        let mut committed = Vec::new();
        let mut discarded = Vec::new();
        for chunk_index in indices {
            if chunk_index <= checkpoint_index {
                commit_chunk(self.store, paths, chunk_index)?;
                committed.push(chunk_index);
            } else {
                let path = paths.uncommitted_chunk_path(chunk_index);
                self.store.delete(&path).fs_context("delete", &path)?;
                warn!(
                    target: "streamsnap::recovery",
                    stream = paths.stream_index(),
                    chunk_index,
                    checkpoint_index,
                    "Discarded uncommitted chunk written after the latest checkpoint"
                );
                discarded.push(chunk_index);
            }
        }
        Ok((committed, discarded))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::IdentityCodec;
    use crate::fs::LocalFileStore;
    use crate::testing::SequenceSource;
    use std::sync::Arc;
    use streamsnap_core::ErrorKind;
    use tempfile::tempdir;

    #[test]
    fn test_first_run_no_action() {
        let dir = tempdir().unwrap();
        let paths = StreamPaths::new(dir.path(), 0);
        let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new());
        let checkpoints =
            CheckpointManager::new(store.clone(), paths.clone(), Box::new(IdentityCodec));

        let mut source = SequenceSource::new(5);
        let outcome = RecoveryCoordinator::new(store.as_ref(), &checkpoints, 7)
            .recover(&mut source)
            .unwrap();

        assert_eq!(
            outcome,
            RecoveryOutcome {
                checkpoint_index: None,
                next_chunk_index: 7,
                committed: vec![],
                discarded: vec![],
            }
        );
        assert_eq!(source.position(), 0);
        assert!(paths.uncommitted_chunks_dir().is_dir());
        assert!(paths.checkpoints_dir().is_dir());
        assert!(paths.committed_chunks_dir().is_dir());
    }

    #[test]
    fn test_leftover_temp_files_removed() {
        let dir = tempdir().unwrap();
        let paths = StreamPaths::new(dir.path(), 0);
        let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new());
        paths.create_directories(store.as_ref()).unwrap();
        let checkpoints =
            CheckpointManager::new(store.clone(), paths.clone(), Box::new(IdentityCodec));
        checkpoints.save(2, &SequenceSource::new(5)).unwrap();
        let leftover = store.allocate_temp_path(&paths.temp_dir()).unwrap();
        std::fs::write(&leftover, b"torn checkpoint").unwrap();

        let outcome = RecoveryCoordinator::new(store.as_ref(), &checkpoints, 0)
            .recover(&mut SequenceSource::new(5))
            .unwrap();

        assert_eq!(outcome.checkpoint_index, Some(2));
        assert!(store.list_children(&paths.temp_dir()).unwrap().is_empty());
        assert!(paths.checkpoint_path(2).exists());
    }

    #[test]
    fn test_malformed_uncommitted_name_fails() {
        let dir = tempdir().unwrap();
        let paths = StreamPaths::new(dir.path(), 0);
        let store: Arc<dyn FileStore> = Arc::new(LocalFileStore::new());
        paths.create_directories(store.as_ref()).unwrap();
        let checkpoints =
            CheckpointManager::new(store.clone(), paths.clone(), Box::new(IdentityCodec));
        checkpoints.save(0, &SequenceSource::new(5)).unwrap();
        std::fs::write(paths.uncommitted_chunks_dir().join("chunk_x"), b"").unwrap();

        let err = RecoveryCoordinator::new(store.as_ref(), &checkpoints, 0)
            .recover(&mut SequenceSource::new(5))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedState);
    }
}
