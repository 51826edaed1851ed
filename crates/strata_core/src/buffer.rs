//! Per-transaction write buffer.

use crate::cell::{wrap_delete, wrap_value};
use bytes::Bytes;
use std::collections::BTreeMap;
use strata_store::{Column, Row, WriteBatch};

/// Staging area for one transaction's pending writes.
///
/// Writes and deletes accumulate here until commit; nothing reaches the
/// store earlier. The buffer is exclusively owned by its transaction and
/// must never be shared between concurrent callers.
///
/// A delete stores the tombstone wrapper rather than removing the key, so
/// a later read within the same transaction observes "deleted" instead of
/// falling through to an older committed version. Within the buffer at
/// most one pending payload exists per (row, column): later writes
/// overwrite earlier ones.
#[derive(Debug, Default)]
pub struct WriteBuffer {
    rows: BTreeMap<Row, BTreeMap<Column, Bytes>>,
    approximate_bytes: usize,
}

impl WriteBuffer {
    /// Creates an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages a value write.
    pub fn put(&mut self, row: &[u8], column: &[u8], value: &[u8]) {
        self.stage(row, column, wrap_value(value));
    }

    /// Stages a logical delete.
    pub fn delete(&mut self, row: &[u8], column: &[u8]) {
        self.stage(row, column, wrap_delete());
    }

    fn stage(&mut self, row: &[u8], column: &[u8], payload: Bytes) {
        let columns = self.rows.entry(row.to_vec()).or_default();
        let added = payload.len();
        match columns.insert(column.to_vec(), payload) {
            Some(previous) => {
                self.approximate_bytes = self.approximate_bytes - previous.len() + added;
            }
            None => {
                self.approximate_bytes += row.len() + column.len() + added;
            }
        }
    }

    /// Returns the pending wrapped payload for a cell, if any.
    #[must_use]
    pub fn pending(&self, row: &[u8], column: &[u8]) -> Option<&Bytes> {
        self.rows.get(row)?.get(column)
    }

    /// Returns all pending wrapped payloads for a row, if any.
    #[must_use]
    pub fn pending_row(&self, row: &[u8]) -> Option<&BTreeMap<Column, Bytes>> {
        self.rows.get(row)
    }

    /// Returns `true` if no writes are staged.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the number of staged cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(BTreeMap::len).sum()
    }

    /// Returns the approximate staged size in bytes (keys plus payloads).
    #[must_use]
    pub fn approximate_size(&self) -> usize {
        self.approximate_bytes
    }

    /// Empties the buffer into a write batch.
    ///
    /// Destructive; called exactly once, at commit.
    #[must_use]
    pub fn drain(&mut self) -> WriteBatch {
        self.approximate_bytes = 0;
        WriteBatch::from_rows(std::mem::take(&mut self.rows))
    }

    /// Discards all staged writes.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.approximate_bytes = 0;
    }
}
