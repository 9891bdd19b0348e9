//! File store abstraction
//!
//! All filesystem access of the writer goes through [`FileStore`] so crash
//! and fault scenarios can be simulated by wrapping the real store (see
//! [`crate::testing::FaultInjectingStore`]).
//!
//! Implementations:
//! - `LocalFileStore`: local filesystem, write-fsync-rename semantics

mod local;

pub use local::LocalFileStore;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// A file opened for writing through a [`FileStore`]
pub trait WritableFile: Write + Send {
    /// Flush buffered data and fsync the file
    fn sync_all(&mut self) -> io::Result<()>;
}

/// Filesystem operations used by the stream writer
///
/// Every method fails with an `io::Error`; callers attach the operation and
/// path (see [`streamsnap_core::IoResultExt`]).
pub trait FileStore: Send + Sync {
    /// Create `dir` and all missing parents
    fn create_dir_all(&self, dir: &Path) -> io::Result<()>;

    /// Names (not paths) of the entries directly under `dir`
    fn list_children(&self, dir: &Path) -> io::Result<Vec<String>>;

    /// Atomically rename `from` to `to`, replacing `to` if it exists
    ///
    /// Must be atomic when both paths are on the same filesystem.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Delete the file at `path`
    fn delete(&self, path: &Path) -> io::Result<()>;

    /// Allocate a fresh, unused path for a temporary file inside `dir`
    ///
    /// The file is not created. Callers pass a directory on the same
    /// filesystem as the rename destination.
    fn allocate_temp_path(&self, dir: &Path) -> io::Result<PathBuf>;

    /// Create (or truncate) a file for writing
    fn create(&self, path: &Path) -> io::Result<Box<dyn WritableFile>>;

    /// Read a whole file
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;
}

impl<S: FileStore + ?Sized> FileStore for std::sync::Arc<S> {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        (**self).create_dir_all(dir)
    }

    fn list_children(&self, dir: &Path) -> io::Result<Vec<String>> {
        (**self).list_children(dir)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        (**self).rename(from, to)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        (**self).delete(path)
    }

    fn allocate_temp_path(&self, dir: &Path) -> io::Result<PathBuf> {
        (**self).allocate_temp_path(dir)
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn WritableFile>> {
        (**self).create(path)
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        (**self).read(path)
    }
}
