//! Checkpoint manager
//!
//! A checkpoint records the element source position right after chunk
//! `chunk_index` was fully written, and is named `checkpoint_<chunk_index>`.
//!
//! # Crash Safety
//!
//! Checkpoints are saved with the write-fsync-rename pattern:
//! 1. Write header and state record to a fresh temp file
//! 2. fsync the temp file
//! 3. Atomic rename to `checkpoints/checkpoint_<chunk_index>`
//! 4. Delete every checkpoint with a smaller index
//!
//! A crash before step 3 leaves the previous checkpoint as the latest one. A
//! crash during step 4 leaves extra older checkpoints, which only cost disk
//! space: recovery always picks the highest index.

use std::io::Write;
use std::sync::Arc;

use streamsnap_core::{
    parse_file_index, ElementSource, Error, IoResultExt, Result, CHECKPOINT_PREFIX,
};
use tracing::debug;

use crate::codec::StorageCodec;
use crate::format::{decode_checkpoint, encode_checkpoint};
use crate::fs::FileStore;
use crate::paths::StreamPaths;

/// Saves, restores and prunes the checkpoints of one stream
pub struct CheckpointManager {
    store: Arc<dyn FileStore>,
    paths: StreamPaths,
    codec: Box<dyn StorageCodec>,
}

impl CheckpointManager {
    /// Create a manager for the stream at `paths`
    ///
    /// `codec` is used for new checkpoints. Existing checkpoints are decoded
    /// with the codec recorded in their header.
    pub fn new(
        store: Arc<dyn FileStore>,
        paths: StreamPaths,
        codec: Box<dyn StorageCodec>,
    ) -> Self {
        CheckpointManager {
            store,
            paths,
            codec,
        }
    }

    /// Paths of the stream
    pub fn paths(&self) -> &StreamPaths {
        &self.paths
    }

    /// Store checkpoints are written to
    pub fn store(&self) -> &Arc<dyn FileStore> {
        &self.store
    }

    /// Save the position of `source` as checkpoint `chunk_index`
    ///
    /// On success every older checkpoint has been deleted.
    pub fn save(&self, chunk_index: u64, source: &dyn ElementSource) -> Result<()> {
        let state = source.save()?;
        let bytes = encode_checkpoint(
            chunk_index,
            self.paths.stream_index(),
            self.codec.as_ref(),
            &state,
        )?;

        let temp_dir = self.paths.temp_dir();
        let temp_path = self
            .store
            .allocate_temp_path(&temp_dir)
            .fs_context("allocate temp file", &temp_dir)?;
        {
            let mut file = self
                .store
                .create(&temp_path)
                .fs_context("create", &temp_path)?;
            file.write_all(&bytes).fs_context("write", &temp_path)?;
            file.sync_all().fs_context("sync", &temp_path)?;
        }

        let path = self.paths.checkpoint_path(chunk_index);
        self.store
            .rename(&temp_path, &path)
            .fs_context("rename", &path)?;

        debug!(
            target: "streamsnap::checkpoint",
            stream = self.paths.stream_index(),
            chunk_index,
            state_bytes = state.len(),
            "Checkpoint saved"
        );

        self.delete_outdated(chunk_index)?;
        Ok(())
    }

    /// Restore `source` from checkpoint `chunk_index`
    ///
    /// Fails with [`Error::MalformedState`] unless the file holds exactly one
    /// valid record for this chunk index.
    pub fn restore(&self, chunk_index: u64, source: &mut dyn ElementSource) -> Result<()> {
        let path = self.paths.checkpoint_path(chunk_index);
        let bytes = self.store.read(&path).fs_context("read checkpoint", &path)?;

        let (header, state) = decode_checkpoint(&bytes).map_err(|e| {
            Error::malformed(format!("Invalid checkpoint file {}: {}", path.display(), e))
        })?;
        if header.chunk_index != chunk_index {
            return Err(Error::malformed(format!(
                "Checkpoint file {} is for chunk {}, expected {}",
                path.display(),
                header.chunk_index,
                chunk_index
            )));
        }

        source.restore(&state)?;

        debug!(
            target: "streamsnap::checkpoint",
            stream = self.paths.stream_index(),
            chunk_index,
            "Checkpoint restored"
        );
        Ok(())
    }

    /// Sorted indices of all checkpoints on disk
    pub fn list(&self) -> Result<Vec<u64>> {
        let dir = self.paths.checkpoints_dir();
        let names = self
            .store
            .list_children(&dir)
            .fs_context("list", &dir)?;

        let mut indices = names
            .iter()
            .map(|name| parse_file_index(name, CHECKPOINT_PREFIX))
            .collect::<Result<Vec<_>>>()?;
        indices.sort_unstable();
        Ok(indices)
    }

    /// Index of the most recent checkpoint, or `None` if there is none
    pub fn find_latest(&self) -> Result<Option<u64>> {
        Ok(self.list()?.last().copied())
    }

    /// Delete every checkpoint with an index smaller than `chunk_index`
    ///
    /// Returns the number of deleted checkpoints.
    pub fn delete_outdated(&self, chunk_index: u64) -> Result<usize> {
        let mut deleted = 0;
        for index in self.list()? {
            if index >= chunk_index {
                continue;
            }
            let path = self.paths.checkpoint_path(index);
            self.store.delete(&path).fs_context("delete", &path)?;
            deleted += 1;
        }

        if deleted > 0 {
            debug!(
                target: "streamsnap::checkpoint",
                stream = self.paths.stream_index(),
                chunk_index,
                deleted,
                "Deleted outdated checkpoints"
            );
        }
        Ok(deleted)
    }
}
