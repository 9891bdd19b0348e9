//! Chunk file format.
//!
//! ```text
//! ┌────────────────────────────────────┐
//! │ File Header (32 bytes, "SSCK")     │
//! ├────────────────────────────────────┤
//! │ Record: element 1                  │
//! ├────────────────────────────────────┤
//! │ Record: element 2                  │
//! ├────────────────────────────────────┤
//! │ ...                                │
//! └────────────────────────────────────┘
//! ```
//!
//! Each record payload is the codec-encoded MessagePack form of one
//! [`Element`]. A chunk with zero records is valid.

use std::path::Path;

use streamsnap_core::{Element, Error, IoResultExt};

use super::header::FileHeader;
use super::record::{read_records, Record};
use super::FormatError;
use crate::codec::{codec_for_tag, StorageCodec};
use crate::fs::FileStore;

/// Magic bytes identifying a chunk file: "SSCK"
pub const CHUNK_MAGIC: [u8; 4] = *b"SSCK";

/// Header for a chunk file.
pub fn chunk_header(chunk_index: u64, stream_index: u64, codec_tag: u8) -> FileHeader {
    FileHeader::new(CHUNK_MAGIC, chunk_index, stream_index, codec_tag)
}

/// Encode one element as a framed record.
pub fn encode_element(
    element: &Element,
    codec: &dyn StorageCodec,
) -> Result<Vec<u8>, FormatError> {
    let raw = rmp_serde::to_vec(element).map_err(|e| FormatError::Serialize(e.to_string()))?;
    let payload = codec.encode(&raw)?;
    Ok(Record::new(payload).to_bytes()?)
}

/// Decode a whole chunk file.
pub fn decode_chunk(bytes: &[u8]) -> Result<(FileHeader, Vec<Element>), FormatError> {
    let (header, body) = FileHeader::parse(bytes, CHUNK_MAGIC)?;
    let codec = codec_for_tag(header.codec_tag)?;

    let mut elements = Vec::new();
    for record in read_records(body)? {
        let raw = codec.decode(&record.payload)?;
        let element: Element =
            rmp_serde::from_slice(&raw).map_err(|e| FormatError::Deserialize(e.to_string()))?;
        elements.push(element);
    }
    Ok((header, elements))
}

/// Read and validate the chunk file at `path`.
///
/// Checks the header, every record checksum and the codec tag. Malformed
/// content is reported as [`Error::MalformedState`].
pub fn read_chunk(store: &dyn FileStore, path: &Path) -> streamsnap_core::Result<Vec<Element>> {
    let bytes = store.read(path).fs_context("read chunk", path)?;
    let (_, elements) = decode_chunk(&bytes).map_err(|e| {
        Error::malformed(format!("Invalid chunk file {}: {}", path.display(), e))
    })?;
    Ok(elements)
}
