//! Testing utilities for the stream writer
//!
//! - **SequenceSource**: deterministic element source with checkpointable
//!   position and optional injected failure
//! - **FaultInjectingStore**: file store wrapper that simulates a crash at a
//!   chosen filesystem operation
//!
//! # Example
//!
//! ```ignore
//! use streamsnap_durability::testing::{FaultInjectingStore, SequenceSource};
//!
//! // Crash at the 12th filesystem operation, then restart normally
//! let store = FaultInjectingStore::failing_after(LocalFileStore::new(), 12);
//! let writer = StreamWriter::new(config.clone(), store, SequenceSource::new(100))?;
//! assert!(writer.wait().is_err());
//! ```

mod fault_store;
mod sequence_source;

pub use fault_store::FaultInjectingStore;
pub use sequence_source::SequenceSource;
