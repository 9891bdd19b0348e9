//! Storage codec trait definitions.

/// Storage codec trait.
///
/// Every record payload written to a chunk or checkpoint file goes through
/// the codec. The codec tag is stored in the file header so a reader always
/// decodes with the codec the file was written with, regardless of the
/// current writer configuration.
///
/// # Thread Safety
///
/// Codecs must be `Send + Sync` so a writer owning one can be moved onto the
/// background thread.
pub trait StorageCodec: Send + Sync {
    /// Encode bytes for storage.
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes from storage.
    ///
    /// Reverses the encode operation. Returns an error if the data
    /// cannot be decoded (e.g. truncated or corrupted frame).
    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Unique codec identifier (for diagnostics).
    fn codec_id(&self) -> &str;

    /// Tag written into file headers.
    fn codec_tag(&self) -> u8;
}

/// Codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// Encoding failed.
    #[error("Encode error (codec={codec_id}): {detail}")]
    EncodeError {
        /// Human-readable error description
        detail: String,
        /// Codec ID that attempted the encode
        codec_id: String,
    },

    /// Decoding failed.
    ///
    /// Carries the codec identity and data length so callers can
    /// distinguish a wrong-codec error from data corruption.
    #[error("Decode error (codec={codec_id}, data_len={data_len}): {detail}")]
    DecodeError {
        /// Human-readable error description
        detail: String,
        /// Codec ID that attempted the decode
        codec_id: String,
        /// Length of the data that failed to decode
        data_len: usize,
    },

    /// Unknown codec tag found in a file header.
    #[error("Unknown codec tag: {0}")]
    UnknownCodec(u8),
}

impl CodecError {
    /// Create an encode error.
    pub fn encode(detail: impl Into<String>, codec_id: impl Into<String>) -> Self {
        CodecError::EncodeError {
            detail: detail.into(),
            codec_id: codec_id.into(),
        }
    }

    /// Create a decode error with full diagnostic context.
    pub fn decode(detail: impl Into<String>, codec_id: impl Into<String>, data_len: usize) -> Self {
        CodecError::DecodeError {
            detail: detail.into(),
            codec_id: codec_id.into(),
            data_len,
        }
    }
}

impl From<CodecError> for streamsnap_core::Error {
    fn from(e: CodecError) -> Self {
        streamsnap_core::Error::malformed(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{IdentityCodec, ZstdCodec};

    // Test that trait is object-safe
    fn _accepts_box_dyn_codec(_codec: Box<dyn StorageCodec>) {}

    #[test]
    fn test_codec_trait_object_safe() {
        let codec: Box<dyn StorageCodec> = Box::new(IdentityCodec);

        let data = b"test data";
        let encoded = codec.encode(data).unwrap();
        let decoded = codec.decode(&encoded).unwrap();

        assert_eq!(decoded, data);
    }

    #[test]
    fn test_codec_error_display() {
        let err = CodecError::decode("truncated frame", "zstd", 42);
        let msg = err.to_string();
        assert!(msg.contains("truncated frame"));
        assert!(msg.contains("zstd"));
        assert!(msg.contains("42"));

        let err = CodecError::UnknownCodec(9);
        assert!(err.to_string().contains('9'));
    }

    #[test]
    fn test_codec_error_maps_to_malformed_state() {
        let err: streamsnap_core::Error = CodecError::decode("bad", "zstd", 1).into();
        assert_eq!(err.kind(), streamsnap_core::ErrorKind::MalformedState);
    }

    #[test]
    fn test_zstd_roundtrip_binary_data() {
        let codec: Box<dyn StorageCodec> = Box::new(ZstdCodec::new(3));

        let data: Vec<u8> = (0..=255).cycle().take(64 * 1024).collect();
        let encoded = codec.encode(&data).unwrap();
        assert!(encoded.len() < data.len());
        let decoded = codec.decode(&encoded).unwrap();

        assert_eq!(decoded, data);
    }

    #[test]
    fn test_zstd_rejects_garbage() {
        let codec = ZstdCodec::new(3);
        let err = codec.decode(b"definitely not zstd").unwrap_err();
        assert!(matches!(err, CodecError::DecodeError { .. }));
    }
}
