//! Error types for the snapshot stream writer
//!
//! Every failure the writer can hit falls into one of four kinds:
//! filesystem, element source, malformed on-disk state, or cancellation.
//! We use `thiserror` for automatic `Display` and `Error` trait implementations.
//!
//! `Error` is `Clone` because the terminal status of a stream is stored once
//! and handed out to every caller of `wait()`.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Result type alias for streamsnap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Create/list/rename/delete/read/write failure
    Filesystem,
    /// Element pull, save or restore failure
    Source,
    /// Unexpected file name or corrupted checkpoint/chunk contents
    MalformedState,
    /// Writer was cancelled by its owner
    Cancelled,
}

/// Error types for the snapshot stream writer
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Filesystem operation failed
    #[error("Filesystem error during {op} of {}: {source}", .path.display())]
    Filesystem {
        /// Operation that failed (`rename`, `delete`, ...)
        op: &'static str,
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: Arc<io::Error>,
    },

    /// The element source failed to produce, save or restore
    #[error("Element source error: {0}")]
    Source(String),

    /// On-disk state does not match the expected layout
    #[error("Malformed state: {0}")]
    MalformedState(String),

    /// The writer was cancelled
    #[error("Cancelled: {0}")]
    Cancelled(String),
}

impl Error {
    /// Wrap an I/O error with the operation and path it came from
    pub fn filesystem(op: &'static str, path: impl AsRef<Path>, source: io::Error) -> Self {
        Error::Filesystem {
            op,
            path: path.as_ref().to_path_buf(),
            source: Arc::new(source),
        }
    }

    /// Create an element source error
    pub fn element_source(msg: impl Into<String>) -> Self {
        Error::Source(msg.into())
    }

    /// Create a malformed state error
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedState(msg.into())
    }

    /// Create a cancellation error
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Error::Cancelled(msg.into())
    }

    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Filesystem { .. } => ErrorKind::Filesystem,
            Error::Source(_) => ErrorKind::Source,
            Error::MalformedState(_) => ErrorKind::MalformedState,
            Error::Cancelled(_) => ErrorKind::Cancelled,
        }
    }

    /// Whether this is the cancellation status
    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

/// Extension for attaching operation/path context to raw I/O results
pub trait IoResultExt<T> {
    /// Map an `io::Error` into [`Error::Filesystem`]
    fn fs_context(self, op: &'static str, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn fs_context(self, op: &'static str, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| Error::filesystem(op, path, e))
    }
}
