//! Snapshot directory structure
//!
//! A snapshot root is shared by every stream writing into it; each stream
//! owns its own subtree under `streams/`:
//!
//! ```text
//! snapshot/
//! ├── committed_chunks/         # Immutable, visible to readers
//! │   ├── chunk_0
//! │   └── ...
//! └── streams/
//!     └── 0/
//!         ├── uncommitted_chunks/   # At most one in-flight chunk
//!         │   └── chunk_3
//!         ├── checkpoints/          # Source positions, tagged by chunk index
//!         │   └── checkpoint_2
//!         └── tmp/                  # Checkpoint temp files before rename
//! ```

use std::path::{Path, PathBuf};

use streamsnap_core::{checkpoint_file_name, chunk_file_name, IoResultExt, Result};

use crate::fs::FileStore;

/// Paths of one stream within a snapshot root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamPaths {
    root: PathBuf,
    stream_index: u64,
}

impl StreamPaths {
    /// Create paths for `stream_index` under the snapshot `root`
    pub fn new(root: impl AsRef<Path>, stream_index: u64) -> Self {
        StreamPaths {
            root: root.as_ref().to_path_buf(),
            stream_index,
        }
    }

    /// Snapshot root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Index of the stream
    pub fn stream_index(&self) -> u64 {
        self.stream_index
    }

    /// Directory of committed chunks, shared by all streams
    pub fn committed_chunks_dir(&self) -> PathBuf {
        self.root.join("committed_chunks")
    }

    /// Directory owned by this stream
    pub fn stream_dir(&self) -> PathBuf {
        self.root.join("streams").join(self.stream_index.to_string())
    }

    /// Directory of this stream's uncommitted chunks
    pub fn uncommitted_chunks_dir(&self) -> PathBuf {
        self.stream_dir().join("uncommitted_chunks")
    }

    /// Directory of this stream's checkpoints
    pub fn checkpoints_dir(&self) -> PathBuf {
        self.stream_dir().join("checkpoints")
    }

    /// Scratch directory for temporary files
    ///
    /// Lives under the stream directory so a temp file can be renamed into
    /// `checkpoints/` atomically.
    pub fn temp_dir(&self) -> PathBuf {
        self.stream_dir().join("tmp")
    }

    /// Path of uncommitted chunk `chunk_index`
    pub fn uncommitted_chunk_path(&self, chunk_index: u64) -> PathBuf {
        self.uncommitted_chunks_dir()
            .join(chunk_file_name(chunk_index))
    }

    /// Path of committed chunk `chunk_index`
    pub fn committed_chunk_path(&self, chunk_index: u64) -> PathBuf {
        self.committed_chunks_dir().join(chunk_file_name(chunk_index))
    }

    /// Path of checkpoint `chunk_index`
    pub fn checkpoint_path(&self, chunk_index: u64) -> PathBuf {
        self.checkpoints_dir()
            .join(checkpoint_file_name(chunk_index))
    }

    /// Create the uncommitted, checkpoint, temp and committed directories
    pub fn create_directories(&self, store: &dyn FileStore) -> Result<()> {
        for dir in [
            self.uncommitted_chunks_dir(),
            self.checkpoints_dir(),
            self.temp_dir(),
            self.committed_chunks_dir(),
        ] {
            store.create_dir_all(&dir).fs_context("create directory", &dir)?;
        }
        Ok(())
    }
}
