//! On-disk byte formats for chunks and checkpoints.
//!
//! This module centralizes all serialization logic for persistent storage,
//! separate from the logic that decides when files are written, committed
//! or pruned.
//!
//! # Module Structure
//!
//! - `header`: 32-byte header shared by chunk and checkpoint files
//! - `record`: length-prefixed, CRC32-checked record framing
//! - `chunk`: chunk file encoding and reader
//! - `checkpoint`: single-record checkpoint file

pub mod checkpoint;
pub mod chunk;
pub mod header;
pub mod record;

pub use checkpoint::{decode_checkpoint, encode_checkpoint, CHECKPOINT_MAGIC};
pub use chunk::{chunk_header, decode_chunk, encode_element, read_chunk, CHUNK_MAGIC};
pub use header::{FileHeader, HeaderError, FILE_FORMAT_VERSION, FILE_HEADER_SIZE};
pub use record::{read_records, Record, RecordError, RECORD_FORMAT_VERSION, RECORD_OVERHEAD};

use crate::codec::CodecError;

/// Errors decoding or encoding chunk and checkpoint files.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// Bad file header
    #[error("Header error: {0}")]
    Header(#[from] HeaderError),

    /// Bad record framing
    #[error("Record error: {0}")]
    Record(#[from] RecordError),

    /// Payload codec failure
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// Element could not be serialized
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Element could not be deserialized
    #[error("Deserialization error: {0}")]
    Deserialize(String),

    /// Unexpected number of records
    #[error("Expected {expected} record(s), found {found}")]
    RecordCount {
        /// Records the file kind requires
        expected: usize,
        /// Records actually present
        found: usize,
    },
}

impl From<FormatError> for streamsnap_core::Error {
    fn from(e: FormatError) -> Self {
        streamsnap_core::Error::malformed(e.to_string())
    }
}
