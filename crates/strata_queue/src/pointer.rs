//! Queue entry pointers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of one entry in a queue's shared stream.
///
/// Pointers are assigned from the queue's current write pointer, which
/// increments monotonically on every enqueue. The big-endian byte form is
/// used as a row-key suffix so lexicographic row order equals numeric
/// pointer order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct EntryPointer(pub u64);

impl EntryPointer {
    /// Creates a pointer from its raw value.
    #[must_use]
    pub const fn new(p: u64) -> Self {
        Self(p)
    }

    /// Returns the raw pointer value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the following pointer.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the order-preserving row-key byte form.
    #[must_use]
    pub const fn to_key_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Display for EntryPointer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ptr:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_bytes_preserve_order() {
        let a = EntryPointer::new(255).to_key_bytes();
        let b = EntryPointer::new(256).to_key_bytes();
        assert!(a < b);
    }

    #[test]
    fn next_increments() {
        assert_eq!(EntryPointer::new(5).next(), EntryPointer::new(6));
    }

    #[test]
    fn display() {
        assert_eq!(format!("{}", EntryPointer::new(9)), "ptr:9");
    }
}
