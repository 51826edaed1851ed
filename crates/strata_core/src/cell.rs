//! Tombstone wrapping and resolved lookup results.
//!
//! A delete is persisted as a tombstone at the deleting transaction's write
//! pointer, so later scans of history still reveal that a deletion occurred
//! at that point in time. In storage a tombstone is just bytes - backends
//! cannot tell it from a live value. Readers unwrap every payload through
//! this module before returning it.

use crate::error::{CoreError, CoreResult};
use bytes::{BufMut, Bytes, BytesMut};

/// Tag prefix of a live value payload.
const VALUE_TAG: u8 = 0x00;
/// Tag prefix of a tombstone payload.
const TOMBSTONE_TAG: u8 = 0x01;

/// Wraps a live value for storage.
#[must_use]
pub fn wrap_value(value: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(1 + value.len());
    buf.put_u8(VALUE_TAG);
    buf.put_slice(value);
    buf.freeze()
}

/// Wraps a logical delete for storage.
#[must_use]
pub fn wrap_delete() -> Bytes {
    Bytes::from_static(&[TOMBSTONE_TAG])
}

/// Unwraps a stored payload.
///
/// Returns `Some(value)` for a live value and `None` for a tombstone.
///
/// # Errors
///
/// Returns [`CoreError::UnsupportedTag`] for an empty payload or an
/// unrecognized tag byte; an unreadable stored cell is fatal for the
/// operation, never silently skipped.
pub fn unwrap_payload(payload: &Bytes) -> CoreResult<Option<Bytes>> {
    match payload.first() {
        Some(&VALUE_TAG) => Ok(Some(payload.slice(1..))),
        Some(&TOMBSTONE_TAG) => Ok(None),
        Some(&tag) => Err(CoreError::UnsupportedTag { tag }),
        None => Err(CoreError::UnsupportedTag { tag: 0xFF }),
    }
}

/// The resolved logical value of one (row, column) under a transaction's
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// A live value is visible.
    Value(Bytes),
    /// The newest visible version is a tombstone: logically deleted.
    ///
    /// Distinct from [`Lookup::Absent`] - a deletion happened at some
    /// visible point in time.
    Deleted,
    /// No visible version exists: never written as far as this snapshot
    /// can tell.
    Absent,
}

impl Lookup {
    /// Unwraps a stored payload into a lookup result.
    ///
    /// # Errors
    ///
    /// Returns an error for an unrecognized encoding tag.
    pub fn from_wrapped(payload: &Bytes) -> CoreResult<Self> {
        Ok(match unwrap_payload(payload)? {
            Some(value) => Self::Value(value),
            None => Self::Deleted,
        })
    }

    /// Returns the live value, if any.
    #[must_use]
    pub fn value(self) -> Option<Bytes> {
        match self {
            Self::Value(value) => Some(value),
            Self::Deleted | Self::Absent => None,
        }
    }

    /// Returns `true` if a live value is visible.
    #[must_use]
    pub fn is_value(&self) -> bool {
        matches!(self, Self::Value(_))
    }

    /// Returns `true` if the column is logically deleted.
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        matches!(self, Self::Deleted)
    }

    /// Returns `true` if no visible version exists.
    #[must_use]
    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }
}
