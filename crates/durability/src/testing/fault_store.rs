//! Fault-injecting file store for crash testing.
//!
//! Every store call and every write/sync on a file it created counts as one
//! operation. Once the configured number of operations has succeeded, every
//! later call fails without touching the inner store. From the writer's
//! point of view the process stopped at that operation: whatever reached
//! the inner store is exactly what a crash would have left on disk.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::fs::{FileStore, WritableFile};

#[derive(Debug)]
struct FaultState {
    operations: AtomicU64,
    fail_after: Option<u64>,
}

impl FaultState {
    fn tick(&self, op: &str) -> io::Result<()> {
        let count = self.operations.fetch_add(1, Ordering::SeqCst);
        match self.fail_after {
            Some(limit) if count >= limit => Err(io::Error::new(
                io::ErrorKind::Other,
                format!("injected fault at operation {} ({})", count, op),
            )),
            _ => Ok(()),
        }
    }
}

/// [`FileStore`] wrapper that fails every operation after the first `n`
#[derive(Debug, Clone)]
pub struct FaultInjectingStore<S> {
    inner: S,
    state: Arc<FaultState>,
}

impl<S: FileStore> FaultInjectingStore<S> {
    /// Wrap `inner`; `fail_after: None` never fails and only counts
    pub fn new(inner: S, fail_after: Option<u64>) -> Self {
        FaultInjectingStore {
            inner,
            state: Arc::new(FaultState {
                operations: AtomicU64::new(0),
                fail_after,
            }),
        }
    }

    /// Wrap `inner`, only counting operations
    pub fn counting(inner: S) -> Self {
        Self::new(inner, None)
    }

    /// Wrap `inner`, failing from operation `n` (zero-based) on
    pub fn failing_after(inner: S, n: u64) -> Self {
        Self::new(inner, Some(n))
    }

    /// Operations attempted so far, including failed ones
    pub fn operations(&self) -> u64 {
        self.state.operations.load(Ordering::SeqCst)
    }

    /// Whether a fault has been injected
    pub fn is_tripped(&self) -> bool {
        matches!(self.state.fail_after, Some(limit) if self.operations() > limit)
    }
}

struct FaultInjectingFile {
    inner: Box<dyn WritableFile>,
    state: Arc<FaultState>,
}

impl Write for FaultInjectingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.state.tick("write")?;
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl WritableFile for FaultInjectingFile {
    fn sync_all(&mut self) -> io::Result<()> {
        self.state.tick("sync")?;
        self.inner.sync_all()
    }
}

impl<S: FileStore> FileStore for FaultInjectingStore<S> {
    fn create_dir_all(&self, dir: &Path) -> io::Result<()> {
        self.state.tick("create_dir_all")?;
        self.inner.create_dir_all(dir)
    }

    fn list_children(&self, dir: &Path) -> io::Result<Vec<String>> {
        self.state.tick("list_children")?;
        self.inner.list_children(dir)
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.state.tick("rename")?;
        self.inner.rename(from, to)
    }

    fn delete(&self, path: &Path) -> io::Result<()> {
        self.state.tick("delete")?;
        self.inner.delete(path)
    }

    fn allocate_temp_path(&self, dir: &Path) -> io::Result<PathBuf> {
        self.state.tick("allocate_temp_path")?;
        self.inner.allocate_temp_path(dir)
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn WritableFile>> {
        self.state.tick("create")?;
        let inner = self.inner.create(path)?;
        Ok(Box::new(FaultInjectingFile {
            inner,
            state: Arc::clone(&self.state),
        }))
    }

    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        self.state.tick("read")?;
        self.inner.read(path)
    }
}
