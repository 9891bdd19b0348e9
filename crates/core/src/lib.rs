//! Core types and traits for streamsnap
//!
//! This crate defines the foundational types shared by the writer crates:
//! - Element: one unit of data pulled from a source
//! - ElementSource: sequential producer with checkpoint support
//! - Error: error kinds (filesystem, source, malformed state, cancelled)
//! - Naming: `<prefix>_<index>` file name grammar

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod naming;
pub mod traits;
pub mod types;

pub use error::{Error, ErrorKind, IoResultExt, Result};
pub use naming::{
    checkpoint_file_name, chunk_file_name, parse_file_index, CHECKPOINT_PREFIX, CHUNK_PREFIX,
};
pub use traits::ElementSource;
pub use types::Element;
