//! Durability layer for streamsnap
//!
//! This crate handles everything that touches disk:
//!
//! - Stream writer: background write loop with checkpoint-before-commit
//! - Chunk files: uncommitted writes committed by atomic rename
//! - Checkpoints: element source positions, pruned as chunks commit
//! - Recovery: checkpoint restore and reconciliation of uncommitted chunks
//! - Binary on-disk formats (file headers, checksummed records)
//! - Storage codec abstraction (identity, zstd)
//! - File store abstraction (local filesystem, fault injection)
//! - Crash testing utilities

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod checkpoint; // Checkpoint save/restore/prune
pub mod chunk_writer; // Uncommitted chunk files and commit
pub mod codec; // Storage codec abstraction (identity, zstd)
pub mod config; // StreamWriterConfig
pub mod format; // Binary on-disk formats (headers, records, chunks, checkpoints)
pub mod fs; // File store abstraction
pub mod paths; // Snapshot directory layout
pub mod recovery; // Startup recovery
pub mod stream_writer; // Background write loop
pub mod testing; // Deterministic source and fault-injecting store

// === Re-exports ===
pub use checkpoint::CheckpointManager;
pub use chunk_writer::{commit_chunk, ChunkSummary, ChunkWriter};
pub use codec::{
    codec_for, codec_for_tag, CodecError, Compression, IdentityCodec, StorageCodec, ZstdCodec,
};
pub use config::{ConfigError, StreamWriterConfig, DEFAULT_MAX_CHUNK_SIZE_BYTES};
pub use format::{read_chunk, FormatError};
pub use fs::{FileStore, LocalFileStore, WritableFile};
pub use paths::StreamPaths;
pub use recovery::{RecoveryCoordinator, RecoveryOutcome};
pub use stream_writer::{StreamWriter, StreamWriterStats};
