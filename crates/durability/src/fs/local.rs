//! Local filesystem store
//!
//! Files are written through a buffered writer and fsynced on
//! [`WritableFile::sync_all`]. Renames fsync the destination's parent
//! directory so a committed rename survives a power loss:
//!
//! 1. Write to the source file
//! 2. fsync the source file
//! 3. Atomic rename to final path
//! 4. fsync the parent directory

use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use super::{FileStore, WritableFile};

/// Local filesystem [`FileStore`]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileStore;

impl LocalFileStore {
    /// Create a local filesystem store
    pub fn new() -> Self {
        LocalFileStore
    }

    fn sync_dir(dir: &Path) -> io::Result<()> {
        // Directories cannot be opened for fsync on every platform.
        #[cfg(unix)]
        {
            File::open(dir)?.sync_all()?;
        }
        #[cfg(not(unix))]
        {
            let _ = dir;
        }
        Ok(())
    }
}

struct LocalFile {
    inner: BufWriter<File>,
}

impl Write for LocalFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl WritableFile for LocalFile {
    fn sync_all(&mut self) -> io::Result<()> {
        self.inner.flush()?;
        self.inner.get_ref().sync_all()
    }
}

impl FileStore for LocalFileStore {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        std::fs::create_dir_all(dir)
    }

    fn list_children(&self, dir: &Path) -> io::Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::rename(from, to)?;
        if let Some(parent) = to.parent() {
            Self::sync_dir(parent)?;
        }
        Ok(())
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()), // Already deleted
            Err(e) => Err(e),
        }
    }

    fn allocate_temp_path(&self, dir: &Path) -> io::Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        Ok(dir.join(format!(".tmp-{}", uuid::Uuid::new_v4().simple())))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn WritableFile>> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(Box::new(LocalFile {
            inner: BufWriter::new(file),
        }))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }
}
