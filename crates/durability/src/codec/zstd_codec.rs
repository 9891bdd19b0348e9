//! zstd compression codec.

use super::{CodecError, StorageCodec, ZSTD_CODEC_TAG};

/// Default zstd level
pub const DEFAULT_ZSTD_LEVEL: i32 = 3;

/// Codec that zstd-compresses every payload.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    /// Create a zstd codec with the given compression level
    pub fn new(level: i32) -> Self {
        ZstdCodec { level }
    }

    /// Compression level used for encoding
    pub fn level(&self) -> i32 {
        self.level
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        ZstdCodec::new(DEFAULT_ZSTD_LEVEL)
    }
}

impl StorageCodec for ZstdCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        zstd::bulk::compress(data, self.level).map_err(|e| CodecError::encode(e.to_string(), "zstd"))
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        zstd::stream::decode_all(data)
            .map_err(|e| CodecError::decode(e.to_string(), "zstd", data.len()))
    }

    fn codec_id(&self) -> &str {
        "zstd"
    }

    fn codec_tag(&self) -> u8 {
        ZSTD_CODEC_TAG
    }
}
