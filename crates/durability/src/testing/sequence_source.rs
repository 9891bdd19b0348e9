//! Deterministic in-memory element source.

use serde::{Deserialize, Serialize};
use streamsnap_core::{Element, ElementSource, Error, Result};

/// Position state written into checkpoints
#[derive(Debug, Serialize, Deserialize)]
struct SourceState {
    position: u64,
    len: u64,
}

/// Source producing `len` deterministic elements
///
/// Element `i` is a single component of `element_size` bytes starting with
/// `i` in little-endian, so two runs over the same source produce identical
/// chunks. Positions are checkpointed as MessagePack.
#[derive(Debug, Clone)]
pub struct SequenceSource {
    len: u64,
    position: u64,
    element_size: usize,
    fail_at: Option<u64>,
}

impl SequenceSource {
    /// Minimum element size: the index prefix
    pub const MIN_ELEMENT_SIZE: usize = 8;

    /// Source of `len` elements of the minimum size
    pub fn new(len: u64) -> Self {
        SequenceSource {
            len,
            position: 0,
            element_size: Self::MIN_ELEMENT_SIZE,
            fail_at: None,
        }
    }

    /// Set the size of every element (at least 8 bytes)
    pub fn with_element_size(mut self, element_size: usize) -> Self {
        self.element_size = element_size.max(Self::MIN_ELEMENT_SIZE);
        self
    }

    /// Fail with a source error when element `index` is pulled
    pub fn with_failure_at(mut self, index: u64) -> Self {
        self.fail_at = Some(index);
        self
    }

    /// Index of the next element
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Total number of elements
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the source has no elements at all
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The element produced at `index` by a source with `element_size`
    pub fn element(index: u64, element_size: usize) -> Element {
        let size = element_size.max(Self::MIN_ELEMENT_SIZE);
        let mut bytes = Vec::with_capacity(size);
        bytes.extend_from_slice(&index.to_le_bytes());
        bytes.resize(size, (index % 251) as u8);
        Element::single(bytes)
    }
}

impl ElementSource for SequenceSource {
    fn next(&mut self) -> Result<Option<Element>> {
        if self.fail_at == Some(self.position) {
            return Err(Error::element_source(format!(
                "Injected failure at element {}",
                self.position
            )));
        }
        if self.position >= self.len {
            return Ok(None);
        }
        let element = Self::element(self.position, self.element_size);
        self.position += 1;
        Ok(Some(element))
    }

    fn save(&self) -> Result<Vec<u8>> {
        let state = SourceState {
            position: self.position,
            len: self.len,
        };
        rmp_serde::to_vec(&state).map_err(|e| Error::element_source(e.to_string()))
    }

    fn restore(&mut self, state: &[u8]) -> Result<()> {
        let state: SourceState = rmp_serde::from_slice(state)
            .map_err(|e| Error::element_source(format!("Invalid source state: {}", e)))?;
        if state.len != self.len || state.position > self.len {
            return Err(Error::element_source(format!(
                "Source state at {}/{} does not match a source of {} elements",
                state.position, state.len, self.len
            )));
        }
        self.position = state.position;
        Ok(())
    }
}
