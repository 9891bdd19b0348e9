//! Checkpoint file format.
//!
//! A checkpoint file is a header (magic "SSCP") followed by exactly one
//! record holding the codec-encoded source position. Any other record count
//! means the file is malformed.

use super::header::FileHeader;
use super::record::{read_records, Record};
use super::FormatError;
use crate::codec::{codec_for_tag, StorageCodec};

/// Magic bytes identifying a checkpoint file: "SSCP"
pub const CHECKPOINT_MAGIC: [u8; 4] = *b"SSCP";

/// Encode a checkpoint file holding `state`.
pub fn encode_checkpoint(
    chunk_index: u64,
    stream_index: u64,
    codec: &dyn StorageCodec,
    state: &[u8],
) -> Result<Vec<u8>, FormatError> {
    let header = FileHeader::new(CHECKPOINT_MAGIC, chunk_index, stream_index, codec.codec_tag());
    let record = Record::new(codec.encode(state)?).to_bytes()?;

    let mut bytes = Vec::with_capacity(header.to_bytes().len() + record.len());
    bytes.extend_from_slice(&header.to_bytes());
    bytes.extend_from_slice(&record);
    Ok(bytes)
}

/// Decode a checkpoint file, returning its header and the source state.
pub fn decode_checkpoint(bytes: &[u8]) -> Result<(FileHeader, Vec<u8>), FormatError> {
    let (header, body) = FileHeader::parse(bytes, CHECKPOINT_MAGIC)?;
    let codec = codec_for_tag(header.codec_tag)?;

    let mut records = read_records(body)?;
    if records.len() != 1 {
        return Err(FormatError::RecordCount {
            expected: 1,
            found: records.len(),
        });
    }

    let record = records.remove(0);
    let state = codec.decode(&record.payload)?;
    Ok((header, state))
}
