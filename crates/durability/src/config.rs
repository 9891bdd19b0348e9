//! Stream writer configuration
//!
//! Controls where a stream writes, how large its chunks grow and how record
//! payloads are compressed.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::codec::Compression;
use crate::paths::StreamPaths;

/// Default chunk size threshold (10GB)
pub const DEFAULT_MAX_CHUNK_SIZE_BYTES: u64 = 10 * 1024 * 1024 * 1024;

/// Stream writer configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamWriterConfig {
    /// Snapshot root directory
    pub snapshot_root: PathBuf,

    /// Index of the stream within the snapshot
    pub stream_index: u64,

    /// Chunk size threshold in estimated element bytes (default: 10GB).
    ///
    /// No new element is started once a chunk reaches this size, so a chunk
    /// may exceed it by at most one element.
    pub max_chunk_size_bytes: u64,

    /// Chunk index to start from when no checkpoint exists (default: 0)
    pub start_chunk_index: u64,

    /// Compression of chunk and checkpoint records
    pub compression: Compression,
}

impl Default for StreamWriterConfig {
    fn default() -> Self {
        StreamWriterConfig {
            snapshot_root: PathBuf::new(),
            stream_index: 0,
            max_chunk_size_bytes: DEFAULT_MAX_CHUNK_SIZE_BYTES,
            start_chunk_index: 0,
            compression: Compression::None,
        }
    }
}

impl StreamWriterConfig {
    /// Create a configuration writing under `snapshot_root` with defaults
    pub fn new(snapshot_root: impl Into<PathBuf>) -> Self {
        StreamWriterConfig {
            snapshot_root: snapshot_root.into(),
            ..Default::default()
        }
    }

    /// Create config for testing
    ///
    /// Uses 1KB chunks so tests produce many chunks from little data.
    pub fn for_testing(snapshot_root: impl Into<PathBuf>) -> Self {
        StreamWriterConfig {
            snapshot_root: snapshot_root.into(),
            max_chunk_size_bytes: 1024,
            ..Default::default()
        }
    }

    /// Set stream index
    pub fn with_stream_index(mut self, stream_index: u64) -> Self {
        self.stream_index = stream_index;
        self
    }

    /// Set chunk size threshold
    pub fn with_max_chunk_size_bytes(mut self, bytes: u64) -> Self {
        self.max_chunk_size_bytes = bytes;
        self
    }

    /// Set the chunk index used when starting without a checkpoint
    pub fn with_start_chunk_index(mut self, index: u64) -> Self {
        self.start_chunk_index = index;
        self
    }

    /// Set compression
    pub fn with_compression(mut self, compression: Compression) -> Self {
        self.compression = compression;
        self
    }

    /// Paths of the configured stream
    pub fn paths(&self) -> StreamPaths {
        StreamPaths::new(&self.snapshot_root, self.stream_index)
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.snapshot_root.as_os_str().is_empty() {
            return Err(ConfigError::EmptySnapshotRoot);
        }
        if self.max_chunk_size_bytes == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if let Compression::Zstd { level } = self.compression {
            if !(1..=22).contains(&level) {
                return Err(ConfigError::InvalidCompressionLevel(level));
            }
        }
        Ok(())
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// No snapshot root configured
    #[error("Snapshot root must not be empty")]
    EmptySnapshotRoot,

    /// Chunk size threshold is zero
    #[error("Max chunk size must be greater than zero")]
    ZeroChunkSize,

    /// zstd level out of range
    #[error("zstd compression level must be in 1..=22, got {0}")]
    InvalidCompressionLevel(i32),

    /// Background thread could not be spawned
    #[error("Failed to spawn stream writer thread: {0}")]
    Spawn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StreamWriterConfig::default();
        assert_eq!(config.max_chunk_size_bytes, 10 * 1024 * 1024 * 1024);
        assert_eq!(config.start_chunk_index, 0);
        assert_eq!(config.compression, Compression::None);
        // Default has no root and is not usable as-is
        assert_eq!(config.validate(), Err(ConfigError::EmptySnapshotRoot));
    }

    #[test]
    fn test_builder_pattern() {
        let config = StreamWriterConfig::new("/snap")
            .with_stream_index(4)
            .with_max_chunk_size_bytes(4096)
            .with_start_chunk_index(10)
            .with_compression(Compression::Zstd { level: 5 });

        assert_eq!(config.stream_index, 4);
        assert_eq!(config.max_chunk_size_bytes, 4096);
        assert_eq!(config.start_chunk_index, 10);
        assert_eq!(config.compression, Compression::Zstd { level: 5 });
        assert!(config.validate().is_ok());
        assert_eq!(config.paths(), StreamPaths::new("/snap", 4));
    }

    #[test]
    fn test_validation_zero_chunk_size() {
        let config = StreamWriterConfig::new("/snap").with_max_chunk_size_bytes(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroChunkSize));
    }

    #[test]
    fn test_validation_compression_level() {
        let config =
            StreamWriterConfig::new("/snap").with_compression(Compression::Zstd { level: 40 });
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidCompressionLevel(40))
        );
    }

    #[test]
    fn test_testing_config() {
        let config = StreamWriterConfig::for_testing("/snap");
        assert!(config.validate().is_ok());
        assert!(config.max_chunk_size_bytes < StreamWriterConfig::default().max_chunk_size_bytes);
    }

    #[test]
    fn test_serde_roundtrip() {
        let config = StreamWriterConfig::new("/snap")
            .with_stream_index(2)
            .with_compression(Compression::Zstd { level: 3 });

        let json = serde_json::to_string(&config).unwrap();
        let parsed: StreamWriterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_serde_missing_fields_use_defaults() {
        let parsed: StreamWriterConfig =
            serde_json::from_str(r#"{"snapshot_root": "/snap", "compression": {"type": "none"}}"#)
                .unwrap();
        assert_eq!(parsed.snapshot_root, PathBuf::from("/snap"));
        assert_eq!(parsed.max_chunk_size_bytes, DEFAULT_MAX_CHUNK_SIZE_BYTES);
    }
}
