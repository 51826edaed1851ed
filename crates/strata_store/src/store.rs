//! Versioned store trait definition.

use crate::cell::{Column, ColumnVersions, Row, Version, WriteBatch};
use crate::error::StoreResult;
use bytes::Bytes;
use std::collections::BTreeMap;

/// A lazy, forward-only sequence of rows produced by [`VersionedStore::scan`].
///
/// Yields rows in ascending key order, each with its per-column version
/// lists (newest first). A scanner is not restartable; to resume, open a
/// fresh scan.
pub type RowScanner = Box<dyn Iterator<Item = StoreResult<(Row, ColumnVersions)>> + Send>;

/// A multi-version column store.
///
/// A row key maps to columns, each column holding multiple u64-stamped
/// versions. Payloads are opaque bytes; the store never interprets them.
///
/// # Invariants
///
/// - All stored versions of a (row, column) are distinct stamps; re-persisting
///   the same (row, column, version, payload) is an idempotent no-op
/// - Cells are never mutated in place: a new write is a new version
/// - Concurrent readers and writers are supported; per-row atomicity is the
///   strongest ordering guarantee a backend must offer
///
/// # Implementors
///
/// - [`super::InMemoryStore`] - reference backend for testing and ephemeral use
///
/// Any backend satisfying this contract is usable: in-memory, replicated
/// log, or a remote store behind a network client.
pub trait VersionedStore: Send + Sync {
    /// Persists every cell of `batch` stamped with `version`.
    ///
    /// Persistence is atomic per row at minimum. A backend that cannot
    /// apply a multi-row batch atomically applies rows one at a time and
    /// must surface a partial failure explicitly
    /// ([`crate::StoreError::PartialWrite`]), never silently.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails; transient failures
    /// ([`crate::StoreError::is_transient`]) are safe to retry with the
    /// identical batch and version.
    fn persist(&self, batch: &WriteBatch, version: Version) -> StoreResult<()>;

    /// Reads up to `max_versions` versions per selected column of `row`,
    /// newest first, considering only stamps `<= upper`.
    ///
    /// `columns = None` selects every column of the row. Columns with no
    /// version in range are omitted from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails. A missing row is not an
    /// error: the result is simply empty.
    fn get_versions(
        &self,
        row: &[u8],
        columns: Option<&[Column]>,
        upper: Version,
        max_versions: usize,
    ) -> StoreResult<ColumnVersions>;

    /// Reads the single newest stored version per selected column of `row`,
    /// with no version bound.
    ///
    /// This is the non-transactional access path.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get_latest(
        &self,
        row: &[u8],
        columns: Option<&[Column]>,
    ) -> StoreResult<BTreeMap<Column, Bytes>>;

    /// Opens a forward-only scan over rows in `[start_row, stop_row)`.
    ///
    /// Each yielded row carries up to `max_versions` versions per column
    /// with stamps `<= upper`, newest first. Rows with no column in range
    /// are not yielded.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan cannot be opened; per-row errors are
    /// yielded through the scanner.
    fn scan(
        &self,
        start_row: &[u8],
        stop_row: &[u8],
        upper: Version,
        max_versions: usize,
    ) -> StoreResult<RowScanner>;
}

impl<T: VersionedStore + ?Sized> VersionedStore for std::sync::Arc<T> {
    fn persist(&self, batch: &WriteBatch, version: Version) -> StoreResult<()> {
        (**self).persist(batch, version)
    }

    fn get_versions(
        &self,
        row: &[u8],
        columns: Option<&[Column]>,
        upper: Version,
        max_versions: usize,
    ) -> StoreResult<ColumnVersions> {
        (**self).get_versions(row, columns, upper, max_versions)
    }

    fn get_latest(
        &self,
        row: &[u8],
        columns: Option<&[Column]>,
    ) -> StoreResult<BTreeMap<Column, Bytes>> {
        (**self).get_latest(row, columns)
    }

    fn scan(
        &self,
        start_row: &[u8],
        stop_row: &[u8],
        upper: Version,
        max_versions: usize,
    ) -> StoreResult<RowScanner> {
        (**self).scan(start_row, stop_row, upper, max_versions)
    }
}
