//! Storage codec abstraction
//!
//! - `IdentityCodec`: bytes are stored as-is (tag 0)
//! - `ZstdCodec`: zstd-compressed payloads (tag 1)
//!
//! The writer picks a codec from [`Compression`]; readers pick one from the
//! tag stored in the file header via [`codec_for_tag`].

mod identity;
mod traits;
mod zstd_codec;

pub use identity::IdentityCodec;
pub use traits::{CodecError, StorageCodec};
pub use zstd_codec::ZstdCodec;

use serde::{Deserialize, Serialize};

/// Header tag of [`IdentityCodec`]
pub const IDENTITY_CODEC_TAG: u8 = 0;

/// Header tag of [`ZstdCodec`]
pub const ZSTD_CODEC_TAG: u8 = 1;

/// Compression applied to chunk and checkpoint records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Compression {
    /// Store records uncompressed
    #[default]
    None,
    /// zstd with the given level
    Zstd {
        /// Compression level (1..=22)
        level: i32,
    },
}

/// Build the codec for a compression setting
pub fn codec_for(compression: Compression) -> Box<dyn StorageCodec> {
    match compression {
        Compression::None => Box::new(IdentityCodec),
        Compression::Zstd { level } => Box::new(ZstdCodec::new(level)),
    }
}

/// Build the codec identified by a file header tag
///
/// The zstd level only matters for encoding, so readers get the default.
pub fn codec_for_tag(tag: u8) -> Result<Box<dyn StorageCodec>, CodecError> {
    match tag {
        IDENTITY_CODEC_TAG => Ok(Box::new(IdentityCodec)),
        ZSTD_CODEC_TAG => Ok(Box::new(ZstdCodec::default())),
        other => Err(CodecError::UnknownCodec(other)),
    }
}
