//! Fixed-size file header shared by chunk and checkpoint files.
//!
//! # Layout
//!
//! ```text
//! ┌───────────┬──────────────┬───────────────┬────────────────┬───────────┬──────────────┐
//! │ Magic (4) │ Version (4)  │ Chunk idx (8) │ Stream idx (8) │ Codec (1) │ Reserved (7) │
//! └───────────┴──────────────┴───────────────┴────────────────┴───────────┴──────────────┘
//! ```
//!
//! All integers are little-endian.

/// Size of a file header in bytes
pub const FILE_HEADER_SIZE: usize = 32;

/// Current header format version
pub const FILE_FORMAT_VERSION: u32 = 1;

/// Header at the start of every chunk and checkpoint file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileHeader {
    /// Magic bytes identifying the file kind
    pub magic: [u8; 4],

    /// Format version for forward compatibility
    pub format_version: u32,

    /// Chunk index the file belongs to
    pub chunk_index: u64,

    /// Stream that wrote the file
    pub stream_index: u64,

    /// Codec tag of every record payload in the file
    pub codec_tag: u8,
}

impl FileHeader {
    /// Create a header with the current format version.
    pub fn new(magic: [u8; 4], chunk_index: u64, stream_index: u64, codec_tag: u8) -> Self {
        FileHeader {
            magic,
            format_version: FILE_FORMAT_VERSION,
            chunk_index,
            stream_index,
            codec_tag,
        }
    }

    /// Serialize header to bytes.
    pub fn to_bytes(&self) -> [u8; FILE_HEADER_SIZE] {
        let mut bytes = [0u8; FILE_HEADER_SIZE];
        bytes[0..4].copy_from_slice(&self.magic);
        bytes[4..8].copy_from_slice(&self.format_version.to_le_bytes());
        bytes[8..16].copy_from_slice(&self.chunk_index.to_le_bytes());
        bytes[16..24].copy_from_slice(&self.stream_index.to_le_bytes());
        bytes[24] = self.codec_tag;
        bytes
    }

    /// Parse the header at the start of `bytes`, checking magic and version.
    ///
    /// Returns the header and the remaining bytes.
    pub fn parse(bytes: &[u8], expected_magic: [u8; 4]) -> Result<(Self, &[u8]), HeaderError> {
        if bytes.len() < FILE_HEADER_SIZE {
            return Err(HeaderError::Truncated { len: bytes.len() });
        }

        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[0..4]);
        if magic != expected_magic {
            return Err(HeaderError::InvalidMagic {
                expected: expected_magic,
                found: magic,
            });
        }

        let format_version = read_u32(&bytes[4..8]);
        if format_version != FILE_FORMAT_VERSION {
            return Err(HeaderError::UnsupportedVersion(format_version));
        }

        let header = FileHeader {
            magic,
            format_version,
            chunk_index: read_u64(&bytes[8..16]),
            stream_index: read_u64(&bytes[16..24]),
            codec_tag: bytes[24],
        };
        Ok((header, &bytes[FILE_HEADER_SIZE..]))
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Header parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// File shorter than a header
    #[error("File too short for header: {len} bytes")]
    Truncated {
        /// Length of the file
        len: usize,
    },

    /// Magic bytes do not match the expected file kind
    #[error("Invalid magic bytes: expected {expected:?}, found {found:?}")]
    InvalidMagic {
        /// Expected magic
        expected: [u8; 4],
        /// Magic found in the file
        found: [u8; 4],
    },

    /// Unsupported format version
    #[error("Unsupported format version: {0}")]
    UnsupportedVersion(u32),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_roundtrip() {
        let header = FileHeader::new(*b"TEST", 12345, 7, 1);
        let bytes = header.to_bytes();

        let (parsed, rest) = FileHeader::parse(&bytes, *b"TEST").unwrap();
        assert_eq!(parsed, header);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_header_returns_trailing_bytes() {
        let mut bytes = FileHeader::new(*b"TEST", 0, 0, 0).to_bytes().to_vec();
        bytes.extend_from_slice(b"records");

        let (_, rest) = FileHeader::parse(&bytes, *b"TEST").unwrap();
        assert_eq!(rest, b"records");
    }

    #[test]
    fn test_header_wrong_magic() {
        let bytes = FileHeader::new(*b"AAAA", 0, 0, 0).to_bytes();
        assert!(matches!(
            FileHeader::parse(&bytes, *b"BBBB"),
            Err(HeaderError::InvalidMagic { .. })
        ));
    }

    #[test]
    fn test_header_truncated() {
        let bytes = FileHeader::new(*b"TEST", 0, 0, 0).to_bytes();
        assert_eq!(
            FileHeader::parse(&bytes[..10], *b"TEST").unwrap_err(),
            HeaderError::Truncated { len: 10 }
        );
    }

    #[test]
    fn test_header_unsupported_version() {
        let mut header = FileHeader::new(*b"TEST", 0, 0, 0);
        header.format_version = 99;
        assert_eq!(
            FileHeader::parse(&header.to_bytes(), *b"TEST").unwrap_err(),
            HeaderError::UnsupportedVersion(99)
        );
    }
}
