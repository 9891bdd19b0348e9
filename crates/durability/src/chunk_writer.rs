//! Uncommitted chunk files
//!
//! A chunk is written to `uncommitted_chunks/chunk_<i>`, fsynced, and then
//! committed by renaming it to `committed_chunks/chunk_<i>`. The rename is
//! the commit point: readers never observe a partially written chunk.

use std::io::Write;
use std::path::{Path, PathBuf};

use streamsnap_core::{Element, IoResultExt, Result};

use crate::codec::StorageCodec;
use crate::format::{chunk_header, encode_element};
use crate::fs::{FileStore, WritableFile};
use crate::paths::StreamPaths;

/// Summary of a finished chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkSummary {
    /// Chunk index
    pub chunk_index: u64,
    /// Number of elements in the chunk
    pub elements: u64,
    /// Estimated element bytes in the chunk
    pub size_bytes: u64,
}

/// Writer for one uncommitted chunk file
pub struct ChunkWriter<'a> {
    file: Box<dyn WritableFile>,
    path: PathBuf,
    codec: &'a dyn StorageCodec,
    chunk_index: u64,
    elements: u64,
    size_bytes: u64,
}

impl<'a> ChunkWriter<'a> {
    /// Create `uncommitted_chunks/chunk_<chunk_index>` and write its header
    ///
    /// A leftover file with the same name is truncated.
    pub fn create(
        store: &dyn FileStore,
        paths: &StreamPaths,
        chunk_index: u64,
        codec: &'a dyn StorageCodec,
    ) -> Result<Self> {
        let path = paths.uncommitted_chunk_path(chunk_index);
        let mut file = store.create(&path).fs_context("create", &path)?;

        let header = chunk_header(chunk_index, paths.stream_index(), codec.codec_tag());
        file.write_all(&header.to_bytes())
            .fs_context("write", &path)?;

        Ok(ChunkWriter {
            file,
            path,
            codec,
            chunk_index,
            elements: 0,
            size_bytes: 0,
        })
    }

    /// Append one element
    pub fn append(&mut self, element: &Element) -> Result<()> {
        let record = encode_element(element, self.codec)?;
        self.file
            .write_all(&record)
            .fs_context("write", &self.path)?;
        self.elements += 1;
        self.size_bytes += element.estimated_size_bytes();
        Ok(())
    }

    /// Estimated element bytes written so far
    ///
    /// This is the declared element size, not the bytes on disk.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Number of elements written so far
    pub fn element_count(&self) -> u64 {
        self.elements
    }

    /// Chunk index
    pub fn chunk_index(&self) -> u64 {
        self.chunk_index
    }

    /// Path of the uncommitted file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush and fsync the file
    pub fn finish(mut self) -> Result<ChunkSummary> {
        self.file.sync_all().fs_context("sync", &self.path)?;
        Ok(ChunkSummary {
            chunk_index: self.chunk_index,
            elements: self.elements,
            size_bytes: self.size_bytes,
        })
    }
}

/// Commit chunk `chunk_index` by renaming it into the committed directory
///
/// An existing committed chunk with the same index is replaced.
pub fn commit_chunk(store: &dyn FileStore, paths: &StreamPaths, chunk_index: u64) -> Result<()> {
    let from = paths.uncommitted_chunk_path(chunk_index);
    let to = paths.committed_chunk_path(chunk_index);
    store.rename(&from, &to).fs_context("rename", &from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{IdentityCodec, ZstdCodec};
    use crate::format::read_chunk;
    use crate::fs::LocalFileStore;
    use tempfile::tempdir;

    #[test]
    fn test_write_finish_commit() {
        let dir = tempdir().unwrap();
        let paths = StreamPaths::new(dir.path(), 0);
        let store = LocalFileStore::new();
        paths.create_directories(&store).unwrap();

        let elements = vec![
            Element::single(b"hello".to_vec()),
            Element::new(vec![b"a".to_vec(), b"bc".to_vec()]),
        ];

        let codec = IdentityCodec;
        let mut writer = ChunkWriter::create(&store, &paths, 2, &codec).unwrap();
        for element in &elements {
            writer.append(element).unwrap();
        }
        assert_eq!(writer.size_bytes(), 8);
        assert_eq!(writer.element_count(), 2);

        let summary = writer.finish().unwrap();
        assert_eq!(
            summary,
            ChunkSummary {
                chunk_index: 2,
                elements: 2,
                size_bytes: 8
            }
        );
        assert!(paths.uncommitted_chunk_path(2).exists());

        commit_chunk(&store, &paths, 2).unwrap();
        assert!(!paths.uncommitted_chunk_path(2).exists());
        assert_eq!(
            read_chunk(&store, &paths.committed_chunk_path(2)).unwrap(),
            elements
        );
    }

    #[test]
    fn test_empty_chunk_is_valid() {
        let dir = tempdir().unwrap();
        let paths = StreamPaths::new(dir.path(), 0);
        let store = LocalFileStore::new();
        paths.create_directories(&store).unwrap();

        let codec = IdentityCodec;
        ChunkWriter::create(&store, &paths, 0, &codec)
            .unwrap()
            .finish()
            .unwrap();
        commit_chunk(&store, &paths, 0).unwrap();

        assert!(read_chunk(&store, &paths.committed_chunk_path(0))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_create_truncates_leftover() {
        let dir = tempdir().unwrap();
        let paths = StreamPaths::new(dir.path(), 0);
        let store = LocalFileStore::new();
        paths.create_directories(&store).unwrap();
        std::fs::write(paths.uncommitted_chunk_path(1), vec![0xAB; 4096]).unwrap();

        let codec = ZstdCodec::default();
        let mut writer = ChunkWriter::create(&store, &paths, 1, &codec).unwrap();
        writer.append(&Element::single(b"fresh".to_vec())).unwrap();
        writer.finish().unwrap();

        commit_chunk(&store, &paths, 1).unwrap();
        assert_eq!(
            read_chunk(&store, &paths.committed_chunk_path(1)).unwrap(),
            vec![Element::single(b"fresh".to_vec())]
        );
    }

    #[test]
    fn test_commit_missing_chunk_fails() {
        let dir = tempdir().unwrap();
        let paths = StreamPaths::new(dir.path(), 0);
        let store = LocalFileStore::new();
        paths.create_directories(&store).unwrap();

        assert!(commit_chunk(&store, &paths, 9).is_err());
    }
}
