//! Transaction descriptors.

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use strata_store::Version;

/// An immutable snapshot token supplied by the external transaction
/// coordinator before each operation batch.
///
/// The core never originates these values:
/// - `write_pointer` is the globally monotonic identifier assigned once at
///   transaction start; every cell the transaction writes is stamped with it
/// - `read_pointer` is the highest write pointer committed before or at
///   transaction start
/// - `excluded` holds write pointers of transactions that must be treated
///   as if they never happened (aborted, or in-flight and undecided), even
///   where their stamp is `<=` the read pointer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionDescriptor {
    write_pointer: Version,
    read_pointer: Version,
    excluded: BTreeSet<u64>,
}

impl TransactionDescriptor {
    /// Creates a descriptor from coordinator-supplied values.
    #[must_use]
    pub fn new(write_pointer: Version, read_pointer: Version, excluded: BTreeSet<u64>) -> Self {
        Self {
            write_pointer,
            read_pointer,
            excluded,
        }
    }

    /// Returns the write pointer stamping this transaction's writes.
    #[must_use]
    pub fn write_pointer(&self) -> Version {
        self.write_pointer
    }

    /// Returns the highest version visible to this transaction.
    #[must_use]
    pub fn read_pointer(&self) -> Version {
        self.read_pointer
    }

    /// Returns the excluded write pointers.
    #[must_use]
    pub fn excluded(&self) -> &BTreeSet<u64> {
        &self.excluded
    }

    /// Returns `true` if no writers are excluded.
    #[must_use]
    pub fn has_exclusions(&self) -> bool {
        !self.excluded.is_empty()
    }

    /// Returns whether a stored version is visible to this transaction.
    #[must_use]
    pub fn is_visible(&self, version: Version) -> bool {
        version <= self.read_pointer && !self.excluded.contains(&version.as_u64())
    }

    /// Returns how many versions per column must be fetched to guarantee
    /// finding the visible one, if any exists.
    ///
    /// With `k` excluded writers, at most `k` of the most-recent in-range
    /// versions can be hidden before a non-excluded one is reached, so
    /// `k + 1` versions always suffice. With no exclusions this is 1: the
    /// single newest version at or below the read pointer.
    #[must_use]
    pub fn fetch_bound(&self) -> usize {
        self.excluded.len() + 1
    }
}

/// Wire form of a transaction descriptor as exchanged with the
/// coordinator.
///
/// All fields are optional on the wire; conversion to a
/// [`TransactionDescriptor`] fails with an invalid-argument error naming
/// the first missing field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DescriptorPayload {
    /// Write pointer, required.
    pub write_pointer: Option<u64>,
    /// Read pointer, required.
    pub read_pointer: Option<u64>,
    /// Excluded write pointers; absent means none.
    #[serde(default)]
    pub excluded: Vec<u64>,
}

impl TryFrom<DescriptorPayload> for TransactionDescriptor {
    type Error = CoreError;

    fn try_from(payload: DescriptorPayload) -> CoreResult<Self> {
        let write_pointer = payload
            .write_pointer
            .ok_or_else(|| CoreError::invalid_argument("write_pointer"))?;
        let read_pointer = payload
            .read_pointer
            .ok_or_else(|| CoreError::invalid_argument("read_pointer"))?;
        Ok(Self::new(
            Version::new(write_pointer),
            Version::new(read_pointer),
            payload.excluded.into_iter().collect(),
        ))
    }
}
