//! In-memory versioned store for testing and ephemeral use.

use crate::cell::{Column, ColumnFamily, ColumnVersions, Row, Version, VersionedCell, WriteBatch};
use crate::error::StoreResult;
use crate::store::{RowScanner, VersionedStore};
use bytes::Bytes;
use parking_lot::RwLock;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::ops::Bound;

/// Versions keyed descending so iteration yields newest first.
type VersionMap = BTreeMap<Reverse<u64>, Bytes>;
type ColumnMap = BTreeMap<Column, VersionMap>;
type RowMap = BTreeMap<Row, ColumnMap>;

/// An in-memory versioned column store.
///
/// The reference [`VersionedStore`] backend. Suitable for:
/// - Unit and integration tests
/// - Ephemeral data that does not need persistence
///
/// # Thread Safety
///
/// Concurrent readers and writers are supported via an internal
/// reader-writer lock; share the store across clients with `Arc`.
///
/// # Example
///
/// ```rust
/// use strata_store::{InMemoryStore, Version, VersionedStore, WriteBatch};
///
/// let store = InMemoryStore::new();
/// let mut batch = WriteBatch::new();
/// batch.insert(b"r".to_vec(), b"c".to_vec(), b"x".as_ref().into());
/// store.persist(&batch, Version::new(1)).unwrap();
/// assert_eq!(store.cell_count(), 1);
/// ```
#[derive(Debug, Default)]
pub struct InMemoryStore {
    family: ColumnFamily,
    rows: RwLock<RowMap>,
}

impl InMemoryStore {
    /// Creates a new empty store over the default data family.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new empty store confined to the given data family.
    #[must_use]
    pub fn with_family(family: ColumnFamily) -> Self {
        Self {
            family,
            rows: RwLock::new(RowMap::new()),
        }
    }

    /// Returns the data column family this store is confined to.
    #[must_use]
    pub fn family(&self) -> &ColumnFamily {
        &self.family
    }

    /// Returns the total number of stored versioned cells.
    ///
    /// Useful for testing; every retained version counts.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.rows
            .read()
            .values()
            .flat_map(ColumnMap::values)
            .map(BTreeMap::len)
            .sum()
    }

    /// Returns a copy of every stored cell, in (row, column, descending
    /// version) order.
    ///
    /// Useful for testing and debugging: two stores hold the same logical
    /// state exactly when their cell dumps are equal.
    #[must_use]
    pub fn cells(&self) -> Vec<VersionedCell> {
        let rows = self.rows.read();
        let mut out = Vec::new();
        for (row, columns) in rows.iter() {
            for (column, versions) in columns {
                for (Reverse(v), payload) in versions {
                    out.push(VersionedCell {
                        row: row.clone(),
                        column: column.clone(),
                        version: Version::new(*v),
                        payload: payload.clone(),
                    });
                }
            }
        }
        out
    }

    /// Clears all data from the store.
    pub fn clear(&self) {
        self.rows.write().clear();
    }

    fn collect_columns(
        columns: &ColumnMap,
        selected: Option<&[Column]>,
        upper: Version,
        max_versions: usize,
    ) -> ColumnVersions {
        let mut out = ColumnVersions::new();
        let mut push = |name: &Column, versions: &VersionMap| {
            let collected: Vec<(Version, Bytes)> = versions
                .range((Bound::Included(Reverse(upper.as_u64())), Bound::Unbounded))
                .take(max_versions)
                .map(|(Reverse(v), payload)| (Version::new(*v), payload.clone()))
                .collect();
            if !collected.is_empty() {
                out.insert(name.clone(), collected);
            }
        };

        match selected {
            Some(names) => {
                for name in names {
                    if let Some(versions) = columns.get(name) {
                        push(name, versions);
                    }
                }
            }
            None => {
                for (name, versions) in columns {
                    push(name, versions);
                }
            }
        }
        out
    }
}

impl VersionedStore for InMemoryStore {
    fn persist(&self, batch: &WriteBatch, version: Version) -> StoreResult<()> {
        let mut rows = self.rows.write();
        for (row, columns) in batch.rows() {
            let row_entry = rows.entry(row.clone()).or_default();
            for (column, payload) in columns {
                // Same stamp overwrites: commit replay is a no-op.
                row_entry
                    .entry(column.clone())
                    .or_default()
                    .insert(Reverse(version.as_u64()), payload.clone());
            }
        }
        Ok(())
    }

    fn get_versions(
        &self,
        row: &[u8],
        columns: Option<&[Column]>,
        upper: Version,
        max_versions: usize,
    ) -> StoreResult<ColumnVersions> {
        let rows = self.rows.read();
        Ok(rows
            .get(row)
            .map(|cols| Self::collect_columns(cols, columns, upper, max_versions))
            .unwrap_or_default())
    }

    fn get_latest(
        &self,
        row: &[u8],
        columns: Option<&[Column]>,
    ) -> StoreResult<BTreeMap<Column, Bytes>> {
        let versions = self.get_versions(row, columns, Version::MAX, 1)?;
        Ok(versions
            .into_iter()
            .filter_map(|(name, mut list)| {
                (!list.is_empty()).then(|| (name, list.remove(0).1))
            })
            .collect())
    }

    fn scan(
        &self,
        start_row: &[u8],
        stop_row: &[u8],
        upper: Version,
        max_versions: usize,
    ) -> StoreResult<RowScanner> {
        // Snapshot the range under the read lock; iteration itself is
        // lock-free and forward-only.
        let rows = self.rows.read();
        let collected: Vec<StoreResult<(Row, ColumnVersions)>> = rows
            .range::<[u8], _>((Bound::Included(start_row), Bound::Excluded(stop_row)))
            .filter_map(|(row, cols)| {
                let versions = Self::collect_columns(cols, None, upper, max_versions);
                (!versions.is_empty()).then(|| Ok((row.clone(), versions)))
            })
            .collect();
        Ok(Box::new(collected.into_iter()))
    }
}
