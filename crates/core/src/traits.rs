//! Core trait definitions
//!
//! This module defines the contract between the stream writer and the
//! pipeline that produces elements:
//! - ElementSource: sequential element producer with save/restore support

use crate::error::Result;
use crate::types::Element;

/// Sequential producer of elements whose position can be checkpointed
///
/// The writer drives a source from a single background thread, so
/// implementations only need to be `Send`.
///
/// # Exhaustion
///
/// `next()` returning `Ok(None)` signals permanent exhaustion. Once a
/// source has reported end-of-source the writer never calls `next()` again.
///
/// # Checkpointing
///
/// `save()` must capture enough state that `restore()` on a freshly
/// constructed source resumes at exactly the element following the last
/// one returned before the save. The byte format is private to the source.
pub trait ElementSource: Send {
    /// Pull the next element, or `None` at end of source
    ///
    /// Failures should be reported as [`Error::Source`](crate::Error::Source).
    fn next(&mut self) -> Result<Option<Element>>;

    /// Serialize the current position
    fn save(&self) -> Result<Vec<u8>>;

    /// Restore a position previously produced by `save()`
    ///
    /// Fails with [`Error::Source`](crate::Error::Source) if the state is
    /// incompatible with this source.
    fn restore(&mut self, state: &[u8]) -> Result<()>;
}

impl<T: ElementSource + ?Sized> ElementSource for Box<T> {
    fn next(&mut self) -> Result<Option<Element>> {
        (**self).next()
    }

    fn save(&self) -> Result<Vec<u8>> {
        (**self).save()
    }

    fn restore(&mut self, state: &[u8]) -> Result<()> {
        (**self).restore(state)
    }
}
