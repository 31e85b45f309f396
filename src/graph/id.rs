use std::fmt;

/// A strong type identifying an object or array node within one decoded
/// graph. Handles are assigned in pre-order the moment a node's shape is
/// known, so a back-reference always points at an earlier (possibly still
/// partially read) node.
///
/// This is the logical index; the wire representation offsets it by
/// [`crate::wire::HANDLE_BASE`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(u32); // u32 is sufficient for 4 billion nodes per payload.

impl Handle {
    /// Creates a handle from its logical index.
    ///
    /// Public because external [`crate::view::EditableView`] implementations
    /// need to build back-references when parsing their text form.
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw numeric value.
    pub fn index(&self) -> u32 {
        self.0
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.0)
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{}", self.0)
    }
}
