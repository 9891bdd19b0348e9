//! Self-delimiting record framing.
//!
//! # Record Layout
//!
//! ```text
//! ┌─────────────────┬──────────────────┬─────────────────────────┬──────────┐
//! │ Length (4 bytes)│ Format Ver (1)   │ Payload (variable)      │ CRC32 (4)│
//! └─────────────────┴──────────────────┴─────────────────────────┴──────────┘
//! ```
//!
//! The length field covers format version, payload and CRC. The CRC is
//! computed over format version and payload.

use crc32fast::Hasher;

/// Current record format version
pub const RECORD_FORMAT_VERSION: u8 = 1;

/// Bytes of framing around a payload (length + version + crc)
pub const RECORD_OVERHEAD: usize = 9;

/// A framed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Codec-encoded payload
    pub payload: Vec<u8>,
}

impl Record {
    /// Create a record around an already-encoded payload.
    pub fn new(payload: Vec<u8>) -> Self {
        Record { payload }
    }

    /// Serialize record to bytes.
    ///
    /// Fails with [`RecordError::TooLarge`] when the framed length does not
    /// fit the 32-bit length field.
    pub fn to_bytes(&self) -> Result<Vec<u8>, RecordError> {
        let total_len = frame_len(self.payload.len())?;

        let mut body = Vec::with_capacity(1 + self.payload.len());
        body.push(RECORD_FORMAT_VERSION);
        body.extend_from_slice(&self.payload);

        let crc = compute_crc(&body);

        let mut record = Vec::with_capacity(4 + total_len as usize);
        record.extend_from_slice(&total_len.to_le_bytes());
        record.extend_from_slice(&body);
        record.extend_from_slice(&crc.to_le_bytes());
        Ok(record)
    }

    /// Deserialize the record at the start of `bytes`.
    ///
    /// Returns (record, bytes_consumed) on success.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), RecordError> {
        if bytes.len() < 4 {
            return Err(RecordError::InsufficientData);
        }

        let length = read_u32(&bytes[0..4]) as usize;

        // Minimum: 1 byte format version + 4 bytes CRC
        if length < 5 {
            return Err(RecordError::InvalidFormat);
        }

        if bytes.len() < 4 + length {
            return Err(RecordError::InsufficientData);
        }

        let body = &bytes[4..4 + length - 4];
        let stored_crc = read_u32(&bytes[4 + length - 4..4 + length]);

        let computed_crc = compute_crc(body);
        if computed_crc != stored_crc {
            return Err(RecordError::ChecksumMismatch {
                expected: stored_crc,
                computed: computed_crc,
            });
        }

        let format_version = body[0];
        if format_version != RECORD_FORMAT_VERSION {
            return Err(RecordError::UnsupportedVersion(format_version));
        }

        Ok((Record::new(body[1..].to_vec()), 4 + length))
    }
}

/// Parse every record in `bytes`.
///
/// Trailing bytes that do not form a whole record are an error: files are
/// fsynced before they become visible, so a torn tail means corruption.
pub fn read_records(bytes: &[u8]) -> Result<Vec<Record>, RecordError> {
    let mut records = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let (record, consumed) = Record::from_bytes(&bytes[offset..])?;
        records.push(record);
        offset += consumed;
    }
    Ok(records)
}

/// Value of the length field for a payload of `payload_len` bytes
fn frame_len(payload_len: usize) -> Result<u32, RecordError> {
    payload_len
        .checked_add(RECORD_OVERHEAD - 4)
        .and_then(|len| u32::try_from(len).ok())
        .ok_or(RecordError::TooLarge(payload_len))
}

fn compute_crc(data: &[u8]) -> u32 {
    let mut hasher = Hasher::new();
    hasher.update(data);
    hasher.finalize()
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

/// Record parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordError {
    /// Not enough data to parse record
    #[error("Insufficient data to parse record")]
    InsufficientData,

    /// Record format is invalid
    #[error("Invalid record format")]
    InvalidFormat,

    /// Checksum verification failed
    #[error("Checksum mismatch: expected {expected:08x}, computed {computed:08x}")]
    ChecksumMismatch {
        /// Expected checksum from record
        expected: u32,
        /// Computed checksum
        computed: u32,
    },

    /// Unsupported format version
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u8),

    /// Payload too large for the 32-bit length field
    #[error("Record payload of {0} bytes exceeds the maximum record size")]
    TooLarge(usize),
}
