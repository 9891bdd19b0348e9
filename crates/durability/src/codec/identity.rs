//! Identity codec: no transformation.

use super::{CodecError, StorageCodec, IDENTITY_CODEC_TAG};

/// Codec that stores bytes unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCodec;

impl StorageCodec for IdentityCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }

    fn decode(&self, data: &[u8]) -> Result<Vec<u8>, CodecError> {
        Ok(data.to_vec())
    }

    fn codec_id(&self) -> &str {
        "identity"
    }

    fn codec_tag(&self) -> u8 {
        IDENTITY_CODEC_TAG
    }
}
