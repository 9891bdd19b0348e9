//! Recovery module
//!
//! - `coordinator`: startup recovery (checkpoint restore + reconciliation of
//!   uncommitted chunks)

pub mod coordinator;

pub use coordinator::{RecoveryCoordinator, RecoveryOutcome};
