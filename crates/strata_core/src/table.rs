//! Versioned table client.

use crate::buffer::WriteBuffer;
use crate::cell::{unwrap_payload, Lookup};
use crate::config::ClientConfig;
use crate::descriptor::TransactionDescriptor;
use crate::error::{CoreError, CoreResult};
use crate::retry::retrying;
use crate::visibility::{resolve_cell, resolve_row};
use bytes::Bytes;
use std::collections::BTreeMap;
use strata_store::{Column, ColumnVersions, Row, RowScanner, Version, VersionedStore};
use tracing::{debug, warn};

/// Orchestrates the write buffer, visibility filter, and versioned store
/// to expose snapshot-isolated table operations.
///
/// With a descriptor attached (see [`TableClient::start_tx`]) reads apply
/// the bounded-fetch policy and the visibility filter, and writes stage in
/// the transaction's write buffer until [`TableClient::commit`] flushes
/// them at the descriptor's write pointer. With no descriptor attached
/// ("raw mode") reads return the single latest stored version
/// unconditionally and writes are rejected.
///
/// A client is exclusively owned by the transaction driving it; reads and
/// writes never observe another client's unbuffered state.
pub struct TableClient<S> {
    store: S,
    config: ClientConfig,
    tx: Option<TransactionDescriptor>,
    buffer: WriteBuffer,
}

impl<S: VersionedStore> TableClient<S> {
    /// Creates a client over `store` with default configuration.
    pub fn new(store: S) -> Self {
        Self::with_config(store, ClientConfig::default())
    }

    /// Creates a client over `store` with the given configuration.
    pub fn with_config(store: S, config: ClientConfig) -> Self {
        Self {
            store,
            config,
            tx: None,
            buffer: WriteBuffer::new(),
        }
    }

    /// Attaches a transaction descriptor; subsequent reads and writes are
    /// scoped to it until commit or rollback.
    ///
    /// # Errors
    ///
    /// Fails if a transaction with staged writes is already attached.
    pub fn start_tx(&mut self, descriptor: TransactionDescriptor) -> CoreResult<()> {
        if !self.buffer.is_empty() {
            return Err(CoreError::invalid_operation(
                "cannot start transaction: staged writes pending",
            ));
        }
        self.tx = Some(descriptor);
        Ok(())
    }

    /// Returns the attached descriptor, if any.
    #[must_use]
    pub fn tx(&self) -> Option<&TransactionDescriptor> {
        self.tx.as_ref()
    }

    /// Returns `true` if a descriptor is attached.
    #[must_use]
    pub fn in_tx(&self) -> bool {
        self.tx.is_some()
    }

    /// Detaches the current descriptor, returning the client to raw mode.
    ///
    /// # Errors
    ///
    /// Fails if staged writes are pending; commit or roll back first.
    pub fn detach_tx(&mut self) -> CoreResult<()> {
        if !self.buffer.is_empty() {
            return Err(CoreError::invalid_operation(
                "cannot detach: staged writes pending",
            ));
        }
        self.tx = None;
        Ok(())
    }

    /// Reads the resolved value of one cell.
    ///
    /// The transaction's own staged writes win over committed state, so a
    /// buffered delete reads as [`Lookup::Deleted`] rather than falling
    /// through to an older committed version.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a stored payload is
    /// unreadable. A cell with no visible version is [`Lookup::Absent`],
    /// not an error.
    pub fn get(&self, row: &[u8], column: &[u8]) -> CoreResult<Lookup> {
        if let Some(pending) = self.buffer.pending(row, column) {
            return Lookup::from_wrapped(pending);
        }

        let selected = [column.to_vec()];
        match &self.tx {
            Some(d) => {
                let versions =
                    self.store
                        .get_versions(row, Some(&selected), d.read_pointer(), d.fetch_bound())?;
                match versions.get(column) {
                    Some(list) => resolve_cell(list, d),
                    None => Ok(Lookup::Absent),
                }
            }
            None => {
                let latest = self.store.get_latest(row, Some(&selected))?;
                match latest.get(column) {
                    Some(payload) => Lookup::from_wrapped(payload),
                    None => Ok(Lookup::Absent),
                }
            }
        }
    }

    /// Reads the resolved live values of the selected columns of a row.
    ///
    /// Deleted and invisible columns are omitted from the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a stored payload is
    /// unreadable.
    pub fn get_columns(
        &self,
        row: &[u8],
        columns: &[Column],
    ) -> CoreResult<BTreeMap<Column, Bytes>> {
        let mut resolved = self.fetch_resolved(row, Some(columns))?;
        self.overlay_buffer(row, Some(columns), &mut resolved)?;
        Ok(resolved)
    }

    /// Reads the resolved live values of every column of a row.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a stored payload is
    /// unreadable.
    pub fn get_row(&self, row: &[u8]) -> CoreResult<BTreeMap<Column, Bytes>> {
        let mut resolved = self.fetch_resolved(row, None)?;
        self.overlay_buffer(row, None, &mut resolved)?;
        Ok(resolved)
    }

    /// Reads up to `limit` resolved live columns of a row within
    /// `[start_column, stop_column)`.
    ///
    /// `None` bounds are unbounded. The limit counts *resolved* columns:
    /// excluded or tombstoned versions never count toward it.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or a stored payload is
    /// unreadable.
    pub fn get_range(
        &self,
        row: &[u8],
        start_column: Option<&[u8]>,
        stop_column: Option<&[u8]>,
        limit: usize,
    ) -> CoreResult<BTreeMap<Column, Bytes>> {
        let mut resolved = self.fetch_resolved(row, None)?;
        self.overlay_buffer(row, None, &mut resolved)?;
        Ok(resolved
            .into_iter()
            .filter(|(column, _)| {
                start_column.is_none_or(|start| column.as_slice() >= start)
                    && stop_column.is_none_or(|stop| column.as_slice() < stop)
            })
            .take(limit)
            .collect())
    }

    /// Stages a value write in the transaction's buffer.
    ///
    /// Nothing reaches the store before commit.
    ///
    /// # Errors
    ///
    /// Fails in raw mode: the non-transactional path is read-only.
    pub fn put(&mut self, row: &[u8], column: &[u8], value: &[u8]) -> CoreResult<()> {
        self.ensure_tx()?;
        self.buffer.put(row, column, value);
        self.check_buffer_size();
        Ok(())
    }

    /// Stages a logical delete in the transaction's buffer.
    ///
    /// # Errors
    ///
    /// Fails in raw mode: the non-transactional path is read-only.
    pub fn delete(&mut self, row: &[u8], column: &[u8]) -> CoreResult<()> {
        self.ensure_tx()?;
        self.buffer.delete(row, column);
        self.check_buffer_size();
        Ok(())
    }

    /// Drains the write buffer and persists every staged cell at the
    /// transaction's write pointer; deletes persist as tombstones at that
    /// version.
    ///
    /// Transient store failures are retried per the configured policy;
    /// replaying the identical batch is idempotent because the stamp is
    /// fixed. On success the client detaches and returns the stamp. On
    /// failure the descriptor stays attached so the coordinator can decide
    /// invalidation; the buffer is already drained and a half-flushed
    /// batch is only safe because the coordinator will exclude this write
    /// pointer.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CommitFailed`] when retries are exhausted, or
    /// the store error for a non-transient failure.
    pub fn commit(&mut self) -> CoreResult<Version> {
        let descriptor = self
            .tx
            .as_ref()
            .ok_or_else(|| CoreError::invalid_operation("no transaction attached"))?;
        let version = descriptor.write_pointer();

        let batch = self.buffer.drain();
        if !batch.is_empty() {
            retrying(&self.config.retry, || self.store.persist(&batch, version))?;
            debug!(
                rows = batch.row_count(),
                cells = batch.cell_count(),
                %version,
                "commit flushed"
            );
        }

        self.tx = None;
        Ok(version)
    }

    /// Discards all staged writes and detaches the descriptor.
    ///
    /// The coordinator owns invalidation; locally this only clears the
    /// buffer.
    pub fn rollback(&mut self) {
        self.buffer.clear();
        self.tx = None;
    }

    /// Opens a lazy, forward-only scan over `[start_row, stop_row)`.
    ///
    /// Rows come back in ascending key order with the same visibility
    /// resolution applied per column; rows with no live visible column are
    /// skipped. The scan reads committed state only and is not restartable
    /// mid-scan: to resume, issue a fresh scan.
    ///
    /// # Errors
    ///
    /// Returns an error if the scan cannot be opened.
    pub fn scan(&self, start_row: &[u8], stop_row: &[u8]) -> CoreResult<TableScanner> {
        let inner = match &self.tx {
            Some(d) => self
                .store
                .scan(start_row, stop_row, d.read_pointer(), d.fetch_bound())?,
            None => self.store.scan(start_row, stop_row, Version::MAX, 1)?,
        };
        Ok(TableScanner {
            inner,
            tx: self.tx.clone(),
        })
    }

    /// Returns the approximate staged write size in bytes.
    #[must_use]
    pub fn buffered_size(&self) -> usize {
        self.buffer.approximate_size()
    }

    fn ensure_tx(&self) -> CoreResult<()> {
        if self.tx.is_none() {
            return Err(CoreError::invalid_operation(
                "writes require a transaction descriptor",
            ));
        }
        Ok(())
    }

    fn check_buffer_size(&self) {
        let size = self.buffer.approximate_size();
        if size > self.config.write_buffer_threshold {
            warn!(
                size,
                threshold = self.config.write_buffer_threshold,
                "write buffer exceeds configured threshold"
            );
        }
    }

    /// Fetches and resolves committed state for a row, per the fetch
    /// policy: one version per column with no exclusions, `k + 1` with
    /// `k`, latest-unconditionally in raw mode.
    fn fetch_resolved(
        &self,
        row: &[u8],
        columns: Option<&[Column]>,
    ) -> CoreResult<BTreeMap<Column, Bytes>> {
        match &self.tx {
            Some(d) => {
                let versions =
                    self.store
                        .get_versions(row, columns, d.read_pointer(), d.fetch_bound())?;
                resolve_row(&versions, d)
            }
            None => {
                let latest = self.store.get_latest(row, columns)?;
                let mut out = BTreeMap::new();
                for (column, payload) in latest {
                    if let Some(value) = unwrap_payload(&payload)? {
                        out.insert(column, value);
                    }
                }
                Ok(out)
            }
        }
    }

    /// Overlays the transaction's staged writes for `row` onto a resolved
    /// column map: staged values replace, staged tombstones remove.
    fn overlay_buffer(
        &self,
        row: &[u8],
        columns: Option<&[Column]>,
        resolved: &mut BTreeMap<Column, Bytes>,
    ) -> CoreResult<()> {
        let Some(pending) = self.buffer.pending_row(row) else {
            return Ok(());
        };
        for (column, payload) in pending {
            if let Some(selected) = columns {
                if !selected.contains(column) {
                    continue;
                }
            }
            match unwrap_payload(payload)? {
                Some(value) => {
                    resolved.insert(column.clone(), value);
                }
                None => {
                    resolved.remove(column);
                }
            }
        }
        Ok(())
    }
}

impl<S> std::fmt::Debug for TableClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableClient")
            .field("in_tx", &self.tx.is_some())
            .field("buffered_bytes", &self.buffer.approximate_size())
            .finish_non_exhaustive()
    }
}

/// Lazy resolved row sequence produced by [`TableClient::scan`].
pub struct TableScanner {
    inner: RowScanner,
    tx: Option<TransactionDescriptor>,
}

impl TableScanner {
    fn resolve(&self, columns: &ColumnVersions) -> CoreResult<BTreeMap<Column, Bytes>> {
        match &self.tx {
            Some(d) => resolve_row(columns, d),
            None => {
                let mut out = BTreeMap::new();
                for (column, versions) in columns {
                    let Some((_, payload)) = versions.first() else {
                        continue;
                    };
                    if let Some(value) = unwrap_payload(payload)? {
                        out.insert(column.clone(), value);
                    }
                }
                Ok(out)
            }
        }
    }
}

impl Iterator for TableScanner {
    type Item = CoreResult<(Row, BTreeMap<Column, Bytes>)>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (row, columns) = match self.inner.next()? {
                Ok(item) => item,
                Err(err) => return Some(Err(err.into())),
            };
            match self.resolve(&columns) {
                Ok(resolved) if resolved.is_empty() => continue,
                Ok(resolved) => return Some(Ok((row, resolved))),
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::BTreeSet;
    use std::sync::Arc;
    use std::time::Duration;
    use strata_store::{InMemoryStore, StoreError, StoreResult, WriteBatch};

    fn descriptor(write: u64, read: u64, excluded: &[u64]) -> TransactionDescriptor {
        TransactionDescriptor::new(
            Version::new(write),
            Version::new(read),
            excluded.iter().copied().collect::<BTreeSet<u64>>(),
        )
    }

    fn client() -> TableClient<Arc<InMemoryStore>> {
        TableClient::with_config(
            Arc::new(InMemoryStore::new()),
            ClientConfig::new().retry_delay(Duration::ZERO),
        )
    }

    /// Commits `writes` as one transaction stamped `write_pointer`.
    fn seed(
        client: &mut TableClient<Arc<InMemoryStore>>,
        write_pointer: u64,
        read_pointer: u64,
        writes: &[(&[u8], &[u8], &[u8])],
    ) {
        client
            .start_tx(descriptor(write_pointer, read_pointer, &[]))
            .unwrap();
        for (row, column, value) in writes {
            client.put(row, column, value).unwrap();
        }
        client.commit().unwrap();
    }

    #[test]
    fn read_your_own_write_before_commit() {
        let mut client = client();
        client.start_tx(descriptor(1, 0, &[])).unwrap();
        client.put(b"r", b"c", b"v1").unwrap();
        client.put(b"r", b"c", b"v2").unwrap();

        let lookup = client.get(b"r", b"c").unwrap();
        assert_eq!(lookup, Lookup::Value(Bytes::from_static(b"v2")));
    }

    #[test]
    fn read_your_own_delete_before_commit() {
        let mut client = client();
        seed(&mut client, 1, 0, &[(b"r", b"c", b"committed")]);

        client.start_tx(descriptor(2, 1, &[])).unwrap();
        client.delete(b"r", b"c").unwrap();

        // Must observe "deleted", not fall through to the committed value.
        assert!(client.get(b"r", b"c").unwrap().is_deleted());
    }

    #[test]
    fn snapshot_isolation_hides_later_commits() {
        let store = Arc::new(InMemoryStore::new());

        let mut writer = TableClient::new(Arc::clone(&store));
        seed(&mut writer, 1, 0, &[(b"r", b"c", b"old")]);

        // Reader snapshots before the second commit.
        let mut reader = TableClient::new(Arc::clone(&store));
        reader.start_tx(descriptor(3, 1, &[])).unwrap();

        let mut late_writer = TableClient::new(Arc::clone(&store));
        seed(&mut late_writer, 2, 1, &[(b"r", b"c", b"new")]);

        // Late commit has write_pointer 2 > reader's read_pointer 1.
        let lookup = reader.get(b"r", b"c").unwrap();
        assert_eq!(lookup, Lookup::Value(Bytes::from_static(b"old")));

        // A fresh reader at read_pointer 2 sees the new value.
        let mut fresh = TableClient::new(store);
        fresh.start_tx(descriptor(4, 2, &[])).unwrap();
        let lookup = fresh.get(b"r", b"c").unwrap();
        assert_eq!(lookup, Lookup::Value(Bytes::from_static(b"new")));
    }

    #[test]
    fn excluded_writer_is_invisible() {
        let mut client = client();
        seed(&mut client, 5, 0, &[(b"r", b"c", b"five")]);
        seed(&mut client, 7, 5, &[(b"r", b"c", b"seven")]);
        seed(&mut client, 9, 7, &[(b"r", b"c", b"nine")]);

        client.start_tx(descriptor(10, 9, &[9])).unwrap();
        assert_eq!(
            client.get(b"r", b"c").unwrap(),
            Lookup::Value(Bytes::from_static(b"seven"))
        );
        client.rollback();

        client.start_tx(descriptor(10, 9, &[9, 7])).unwrap();
        assert_eq!(
            client.get(b"r", b"c").unwrap(),
            Lookup::Value(Bytes::from_static(b"five"))
        );
        client.rollback();

        client.start_tx(descriptor(10, 9, &[9, 7, 5])).unwrap();
        assert!(client.get(b"r", b"c").unwrap().is_absent());
    }

    #[test]
    fn tombstone_round_trip() {
        let mut client = client();
        seed(&mut client, 1, 0, &[(b"r", b"c", b"v")]);

        client.start_tx(descriptor(2, 1, &[])).unwrap();
        client.delete(b"r", b"c").unwrap();
        client.commit().unwrap();

        client.start_tx(descriptor(3, 2, &[])).unwrap();
        // Deleted, distinct from a column never written.
        assert!(client.get(b"r", b"c").unwrap().is_deleted());
        assert!(client.get(b"r", b"never").unwrap().is_absent());
    }

    #[test]
    fn raw_mode_reads_latest_unconditionally() {
        let mut client = client();
        seed(&mut client, 1, 0, &[(b"r", b"c", b"old")]);
        seed(&mut client, 9, 1, &[(b"r", b"c", b"new")]);

        // No descriptor: latest version, no visibility filtering.
        assert_eq!(
            client.get(b"r", b"c").unwrap(),
            Lookup::Value(Bytes::from_static(b"new"))
        );
    }

    #[test]
    fn raw_mode_rejects_writes() {
        let mut client = client();
        assert!(matches!(
            client.put(b"r", b"c", b"v"),
            Err(CoreError::InvalidOperation { .. })
        ));
        assert!(matches!(
            client.delete(b"r", b"c"),
            Err(CoreError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn commit_without_tx_fails() {
        let mut client = client();
        assert!(matches!(
            client.commit(),
            Err(CoreError::InvalidOperation { .. })
        ));
    }

    #[test]
    fn start_tx_with_pending_writes_fails() {
        let mut client = client();
        client.start_tx(descriptor(1, 0, &[])).unwrap();
        client.put(b"r", b"c", b"v").unwrap();

        assert!(client.start_tx(descriptor(2, 1, &[])).is_err());
    }

    #[test]
    fn rollback_discards_staged_writes() {
        let mut client = client();
        client.start_tx(descriptor(1, 0, &[])).unwrap();
        client.put(b"r", b"c", b"v").unwrap();
        client.rollback();

        assert!(!client.in_tx());
        assert!(client.get(b"r", b"c").unwrap().is_absent());
    }

    #[test]
    fn range_limit_counts_resolved_columns_only() {
        let mut client = client();
        seed(
            &mut client,
            1,
            0,
            &[
                (b"r", b"a", b"1"),
                (b"r", b"b", b"2"),
                (b"r", b"c", b"3"),
                (b"r", b"d", b"4"),
            ],
        );
        // Delete "a", then overwrite "b" through a writer the reader will exclude.
        client.start_tx(descriptor(3, 2, &[])).unwrap();
        client.delete(b"r", b"a").unwrap();
        client.commit().unwrap();
        client.start_tx(descriptor(4, 3, &[])).unwrap();
        client.put(b"r", b"b", b"hidden").unwrap();
        client.commit().unwrap();

        // Reader excludes writer 4: sees a=deleted, b=2, c=3, d=4.
        client.start_tx(descriptor(5, 4, &[4])).unwrap();
        let range = client.get_range(b"r", None, None, 2).unwrap();

        // The tombstoned "a" and the excluded version of "b" do not count.
        let entries: Vec<_> = range
            .iter()
            .map(|(c, v)| (c.clone(), v.clone()))
            .collect();
        assert_eq!(
            entries,
            vec![
                (b"b".to_vec(), Bytes::from_static(b"2")),
                (b"c".to_vec(), Bytes::from_static(b"3")),
            ]
        );
    }

    #[test]
    fn range_bounds_are_start_inclusive_stop_exclusive() {
        let mut client = client();
        seed(
            &mut client,
            1,
            0,
            &[(b"r", b"a", b"1"), (b"r", b"b", b"2"), (b"r", b"c", b"3")],
        );

        client.start_tx(descriptor(2, 1, &[])).unwrap();
        let range = client
            .get_range(b"r", Some(b"a"), Some(b"c"), usize::MAX)
            .unwrap();
        assert_eq!(range.len(), 2);
        assert!(range.contains_key(b"a".as_ref()));
        assert!(range.contains_key(b"b".as_ref()));
    }

    #[test]
    fn get_row_resolves_under_snapshot_then_detaches_to_raw() {
        let mut client = client();
        seed(&mut client, 1, 0, &[(b"r", b"a", b"1"), (b"r", b"b", b"2")]);
        seed(&mut client, 5, 1, &[(b"r", b"b", b"later")]);

        client.start_tx(descriptor(2, 1, &[])).unwrap();
        let row = client.get_row(b"r").unwrap();
        assert_eq!(row.get(b"b".as_ref()).unwrap().as_ref(), b"2");

        client.detach_tx().unwrap();
        assert!(!client.in_tx());
        let row = client.get_row(b"r").unwrap();
        assert_eq!(row.get(b"b".as_ref()).unwrap().as_ref(), b"later");
    }

    #[test]
    fn get_columns_merges_buffer_over_committed() {
        let mut client = client();
        seed(
            &mut client,
            1,
            0,
            &[(b"r", b"a", b"committed"), (b"r", b"b", b"committed")],
        );

        client.start_tx(descriptor(2, 1, &[])).unwrap();
        client.put(b"r", b"a", b"staged").unwrap();
        client.delete(b"r", b"b").unwrap();

        let columns = client
            .get_columns(b"r", &[b"a".to_vec(), b"b".to_vec()])
            .unwrap();
        assert_eq!(columns.len(), 1);
        assert_eq!(columns.get(b"a".as_ref()).unwrap().as_ref(), b"staged");
    }

    #[test]
    fn scan_resolves_and_skips_dead_rows() {
        let mut client = client();
        seed(&mut client, 1, 0, &[(b"a", b"c", b"1"), (b"b", b"c", b"2")]);
        client.start_tx(descriptor(2, 1, &[])).unwrap();
        client.delete(b"b", b"c").unwrap();
        client.commit().unwrap();

        client.start_tx(descriptor(3, 2, &[])).unwrap();
        let rows: Vec<_> = client
            .scan(b"a", b"z")
            .unwrap()
            .map(|r| r.unwrap())
            .collect();

        // Row "b" has only a tombstone: skipped entirely.
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, b"a".to_vec());
        assert_eq!(rows[0].1.get(b"c".as_ref()).unwrap().as_ref(), b"1");
    }

    #[test]
    fn scan_applies_exclusions() {
        let mut client = client();
        seed(&mut client, 1, 0, &[(b"a", b"c", b"one")]);
        seed(&mut client, 2, 1, &[(b"a", b"c", b"two")]);

        client.start_tx(descriptor(3, 2, &[2])).unwrap();
        let rows: Vec<_> = client
            .scan(b"a", b"z")
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(rows[0].1.get(b"c".as_ref()).unwrap().as_ref(), b"one");
    }

    // === Commit retry ===

    /// Store that injects transient persist failures after applying the
    /// batch, to exercise idempotent replay.
    struct FlakyStore {
        inner: InMemoryStore,
        failures_left: Mutex<usize>,
    }

    impl FlakyStore {
        fn failing(times: usize) -> Self {
            Self {
                inner: InMemoryStore::new(),
                failures_left: Mutex::new(times),
            }
        }
    }

    impl VersionedStore for FlakyStore {
        fn persist(&self, batch: &WriteBatch, version: Version) -> StoreResult<()> {
            // Apply first, then fail: the worst case for replay.
            self.inner.persist(batch, version)?;
            let mut left = self.failures_left.lock();
            if *left > 0 {
                *left -= 1;
                return Err(StoreError::transient("injected"));
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
            self.inner.get_versions(row, columns, upper, max_versions)
        }

        fn get_latest(
            &self,
            row: &[u8],
            columns: Option<&[Column]>,
        ) -> StoreResult<BTreeMap<Column, Bytes>> {
            self.inner.get_latest(row, columns)
        }

        fn scan(
            &self,
            start_row: &[u8],
            stop_row: &[u8],
            upper: Version,
            max_versions: usize,
        ) -> StoreResult<RowScanner> {
            self.inner.scan(start_row, stop_row, upper, max_versions)
        }
    }

    #[test]
    fn commit_retries_transient_failures_idempotently() {
        let flaky = Arc::new(FlakyStore::failing(2));
        let mut client = TableClient::with_config(
            Arc::clone(&flaky),
            ClientConfig::new().retry_delay(Duration::ZERO),
        );

        client.start_tx(descriptor(7, 0, &[])).unwrap();
        client.put(b"r", b"a", b"1").unwrap();
        client.put(b"r", b"b", b"2").unwrap();
        client.commit().unwrap();

        // Reference: the same commit against a clean store, once.
        let control = Arc::new(InMemoryStore::new());
        let mut control_client = TableClient::new(Arc::clone(&control));
        control_client.start_tx(descriptor(7, 0, &[])).unwrap();
        control_client.put(b"r", b"a", b"1").unwrap();
        control_client.put(b"r", b"b", b"2").unwrap();
        control_client.commit().unwrap();

        assert_eq!(flaky.inner.cells(), control.cells());
    }

    #[test]
    fn commit_surfaces_exhausted_retries() {
        let flaky = Arc::new(FlakyStore::failing(usize::MAX));
        let mut client = TableClient::with_config(
            flaky,
            ClientConfig::new()
                .retry_delay(Duration::ZERO)
                .retry_max_attempts(3),
        );

        client.start_tx(descriptor(7, 0, &[])).unwrap();
        client.put(b"r", b"a", b"1").unwrap();
        assert!(matches!(
            client.commit(),
            Err(CoreError::CommitFailed { attempts: 3, .. })
        ));
    }
}
