//! streamsnap - crash-safe single-stream snapshot writer
//!
//! Pulls elements from a sequential source and persists them as an ordered
//! series of immutable chunk files. A process crash at any point loses no
//! committed element and duplicates none.
//!
//! # Quick Start
//!
//! ```ignore
//! use streamsnap::{LocalFileStore, StreamWriter, StreamWriterConfig};
//!
//! let config = StreamWriterConfig::new("/data/snapshot").with_stream_index(0);
//! let store = LocalFileStore::new();
//! let writer = StreamWriter::new(config, store, my_source)?;
//!
//! // Blocks until the source is exhausted, the writer fails or is cancelled
//! writer.wait()?;
//! ```
//!
//! # Architecture
//!
//! Each chunk is written to a per-stream uncommitted directory, the source
//! position is checkpointed, and only then is the chunk renamed into the
//! shared committed directory. On startup the latest checkpoint is restored
//! and leftover uncommitted chunks are committed or discarded against it.

pub use streamsnap_core::{
    checkpoint_file_name, chunk_file_name, parse_file_index, Element, ElementSource, Error,
    ErrorKind, Result,
};
pub use streamsnap_durability::testing;
pub use streamsnap_durability::{
    read_chunk, Compression, ConfigError, FileStore, LocalFileStore, RecoveryOutcome, StreamPaths,
    StreamWriter, StreamWriterConfig, StreamWriterStats, WritableFile,
};
