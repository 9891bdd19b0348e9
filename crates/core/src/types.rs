//! Element type written into chunk files
//!
//! An element is one unit pulled from an [`ElementSource`](crate::ElementSource):
//! an ordered list of opaque byte components (one per tensor/column in the
//! producing pipeline). The writer never looks inside the components.

use serde::{Deserialize, Serialize};

/// One element produced by an element source
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Element {
    /// Opaque encoded components, in order
    pub components: Vec<Vec<u8>>,
}

impl Element {
    /// Create an element from its components
    pub fn new(components: Vec<Vec<u8>>) -> Self {
        Element { components }
    }

    /// Create a single-component element
    pub fn single(component: impl Into<Vec<u8>>) -> Self {
        Element {
            components: vec![component.into()],
        }
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Whether the element has no components
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Declared size of this element in bytes
    ///
    /// Sum of component lengths. This is what the chunk size policy counts,
    /// not the number of bytes that end up on disk after framing/compression.
    pub fn estimated_size_bytes(&self) -> u64 {
        self.components.iter().map(|c| c.len() as u64).sum()
    }
}

impl From<Vec<Vec<u8>>> for Element {
    fn from(components: Vec<Vec<u8>>) -> Self {
        Element::new(components)
    }
}
