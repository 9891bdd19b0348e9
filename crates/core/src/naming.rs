//! File name grammar for chunks and checkpoints
//!
//! Every file the writer creates is named `<prefix>_<index>` where `index`
//! is a non-negative decimal integer:
//!
//! ```text
//! chunk_0, chunk_1, ...            (uncommitted and committed chunks)
//! checkpoint_0, checkpoint_7, ...  (source checkpoints)
//! ```
//!
//! A name that does not follow this grammar inside a directory owned by the
//! writer is never skipped: it means something outside the writer touched
//! the directory, and it is reported as [`Error::MalformedState`].

use crate::error::{Error, Result};

/// Prefix of chunk file names
pub const CHUNK_PREFIX: &str = "chunk";

/// Prefix of checkpoint file names
pub const CHECKPOINT_PREFIX: &str = "checkpoint";

/// Build `<prefix>_<index>`
pub fn file_name(prefix: &str, index: u64) -> String {
    format!("{}_{}", prefix, index)
}

/// Name of the chunk file with the given index
pub fn chunk_file_name(index: u64) -> String {
    file_name(CHUNK_PREFIX, index)
}

/// Name of the checkpoint file with the given index
pub fn checkpoint_file_name(index: u64) -> String {
    file_name(CHECKPOINT_PREFIX, index)
}

/// Extract the index from `<prefix>_<index>`
///
/// The part after the prefix must be `_` followed by one or more ASCII
/// digits and nothing else.
pub fn parse_file_index(filename: &str, prefix: &str) -> Result<u64> {
    let malformed = || {
        Error::malformed(format!(
            "Failed to extract the index for file `{}` with prefix `{}`",
            filename, prefix
        ))
    };

    let digits = filename
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .ok_or_else(malformed)?;

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed());
    }

    digits.parse::<u64>().map_err(|_| malformed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn test_file_names() {
        assert_eq!(chunk_file_name(0), "chunk_0");
        assert_eq!(chunk_file_name(42), "chunk_42");
        assert_eq!(checkpoint_file_name(7), "checkpoint_7");
    }

    #[test]
    fn test_parse_valid() {
        assert_eq!(parse_file_index("chunk_0", CHUNK_PREFIX).unwrap(), 0);
        assert_eq!(parse_file_index("chunk_123", CHUNK_PREFIX).unwrap(), 123);
        assert_eq!(parse_file_index("checkpoint_5", CHECKPOINT_PREFIX).unwrap(), 5);
        assert_eq!(parse_file_index("checkpoint_007", CHECKPOINT_PREFIX).unwrap(), 7);
    }

    #[test]
    fn test_parse_rejects_non_digits() {
        let err = parse_file_index("checkpoint_abc", CHECKPOINT_PREFIX).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedState);
        assert!(err.to_string().contains("checkpoint_abc"));
    }

    #[test]
    fn test_parse_rejects_wrong_prefix() {
        assert!(parse_file_index("chunk_5", CHECKPOINT_PREFIX).is_err());
        assert!(parse_file_index("checkpoint_5", CHUNK_PREFIX).is_err());
        assert!(parse_file_index("chunks_5", CHUNK_PREFIX).is_err());
    }

    #[test]
    fn test_parse_rejects_missing_or_trailing() {
        assert!(parse_file_index("chunk_", CHUNK_PREFIX).is_err());
        assert!(parse_file_index("chunk", CHUNK_PREFIX).is_err());
        assert!(parse_file_index("chunk_5.tmp", CHUNK_PREFIX).is_err());
        assert!(parse_file_index("chunk_-1", CHUNK_PREFIX).is_err());
        assert!(parse_file_index("chunk_+1", CHUNK_PREFIX).is_err());
    }

    #[test]
    fn test_parse_rejects_overflow() {
        let name = format!("chunk_{}0", u64::MAX);
        assert!(parse_file_index(&name, CHUNK_PREFIX).is_err());
    }

    proptest! {
        #[test]
        fn name_then_parse_returns_index(index in any::<u64>()) {
            prop_assert_eq!(parse_file_index(&chunk_file_name(index), CHUNK_PREFIX).unwrap(), index);
            prop_assert_eq!(
                parse_file_index(&checkpoint_file_name(index), CHECKPOINT_PREFIX).unwrap(),
                index
            );
        }
    }
}
