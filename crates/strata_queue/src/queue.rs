//! Queue client layered on the versioned table core.

use crate::error::{QueueError, QueueResult};
use crate::meta::QueueMeta;
use crate::pointer::EntryPointer;
use bytes::Bytes;
use strata_core::{Lookup, TableClient, TransactionDescriptor, Version};
use strata_store::VersionedStore;
use tracing::debug;

/// Column holding the encoded meta record in the meta row.
const META_COLUMN: &[u8] = b"meta";
/// Column holding the payload in an entry row.
const DATA_COLUMN: &[u8] = b"data";

/// A transactional queue over the versioned substrate.
///
/// Entry payloads and queue meta are plain rows read and written through
/// the snapshot-isolated [`TableClient`], so every queue operation runs
/// under a coordinator-supplied transaction descriptor and enqueue has the
/// same isolation guarantees as a table write. Staged queue mutations
/// become visible to other consumers only at commit.
///
/// Consumption is fan-out: every registered group sees every entry exactly
/// once; groups never compete.
pub struct QueueClient<S> {
    table: TableClient<S>,
    name: Vec<u8>,
}

impl<S: VersionedStore> QueueClient<S> {
    /// Creates a client for the named queue over `store`.
    pub fn new(store: S, name: impl Into<Vec<u8>>) -> Self {
        Self {
            table: TableClient::new(store),
            name: name.into(),
        }
    }

    /// Returns the queue name.
    #[must_use]
    pub fn name(&self) -> &[u8] {
        &self.name
    }

    /// Attaches a transaction descriptor for the following operations.
    ///
    /// # Errors
    ///
    /// Fails if staged writes from a previous transaction are pending.
    pub fn start_tx(&mut self, descriptor: TransactionDescriptor) -> QueueResult<()> {
        self.table.start_tx(descriptor)?;
        Ok(())
    }

    /// Commits staged queue mutations at the transaction's write pointer.
    ///
    /// # Errors
    ///
    /// Propagates commit failures from the table core.
    pub fn commit(&mut self) -> QueueResult<Version> {
        Ok(self.table.commit()?)
    }

    /// Discards staged queue mutations.
    pub fn rollback(&mut self) {
        self.table.rollback();
    }

    /// Reads the queue's meta under the current snapshot.
    ///
    /// A queue that was never written reads as fresh empty meta; it is
    /// materialized on first mutation.
    ///
    /// # Errors
    ///
    /// Fails if the store fails or the stored record is undecodable.
    pub fn meta(&self) -> QueueResult<QueueMeta> {
        match self.table.get(&self.meta_row(), META_COLUMN)? {
            Lookup::Value(bytes) => QueueMeta::decode(&bytes),
            Lookup::Deleted | Lookup::Absent => Ok(QueueMeta::new()),
        }
    }

    /// Registers a consumer group, starting it at the current global
    /// head. Idempotent.
    ///
    /// # Errors
    ///
    /// Fails on legacy meta or store failure.
    pub fn register_group(&mut self, group_id: u64) -> QueueResult<()> {
        let mut meta = self.meta()?;
        meta.register_group(group_id)?;
        self.store_meta(&meta)
    }

    /// Enqueues a payload, returning its assigned pointer.
    ///
    /// The entry row and the bumped meta row are staged through the write
    /// buffer; both persist atomically-per-row at commit, stamped with the
    /// transaction's write pointer.
    ///
    /// # Errors
    ///
    /// Fails on legacy meta or store failure.
    pub fn enqueue(&mut self, payload: &[u8]) -> QueueResult<EntryPointer> {
        let mut meta = self.meta()?;
        let pointer = meta.assign_next_pointer()?;
        self.table
            .put(&self.entry_row(pointer), DATA_COLUMN, payload)?;
        self.store_meta(&meta)?;
        debug!(queue = ?String::from_utf8_lossy(&self.name), %pointer, "enqueued");
        Ok(pointer)
    }

    /// Claims the next consumable entry for a group.
    ///
    /// The candidate is the smallest pointer above the group's
    /// consumed-through pointer that the group has neither acknowledged
    /// nor validly claimed; other groups' progress is irrelevant
    /// (fan-out). Entries enqueued by transactions invisible to this
    /// snapshot are skipped. Returns `None` when nothing is consumable.
    ///
    /// # Errors
    ///
    /// Fails on an unregistered group, legacy meta, or store failure.
    pub fn dequeue(
        &mut self,
        group_id: u64,
        now_ms: u64,
        lease_ms: u64,
    ) -> QueueResult<Option<(EntryPointer, Bytes)>> {
        let mut meta = self.meta()?;
        let current_write = meta.current_write_pointer().ok_or(QueueError::LegacyMeta)?;
        let group = meta
            .group(group_id)
            .ok_or(QueueError::UnknownGroup { group_id })?;

        let mut found = None;
        let mut candidate = group.consumed_through().next();
        while candidate <= current_write {
            if group.is_claimable(candidate, now_ms) {
                match self.table.get(&self.entry_row(candidate), DATA_COLUMN)? {
                    Lookup::Value(payload) => {
                        found = Some((candidate, payload));
                        break;
                    }
                    // Not visible under this snapshot, or compacted away.
                    Lookup::Absent | Lookup::Deleted => {}
                }
            }
            candidate = candidate.next();
        }

        let Some((pointer, payload)) = found else {
            return Ok(None);
        };
        meta.group_mut(group_id)?.claim(pointer, now_ms, lease_ms)?;
        self.store_meta(&meta)?;
        debug!(group_id, %pointer, "claimed");
        Ok(Some((pointer, payload)))
    }

    /// Acknowledges a claimed entry for a group.
    ///
    /// Acks may arrive in any order; the group's consumed-through pointer
    /// advances only when the gap closes.
    ///
    /// # Errors
    ///
    /// Fails if the entry is not claimed by the group, the group is
    /// unregistered, or the store fails.
    pub fn ack(&mut self, group_id: u64, pointer: EntryPointer) -> QueueResult<()> {
        let mut meta = self.meta()?;
        meta.group_mut(group_id)?.ack(pointer)?;
        self.store_meta(&meta)
    }

    /// Releases a group's expired claims, returning the freed pointers.
    ///
    /// # Errors
    ///
    /// Fails on an unregistered group, legacy meta, or store failure.
    pub fn reclaim_expired(
        &mut self,
        group_id: u64,
        now_ms: u64,
    ) -> QueueResult<Vec<EntryPointer>> {
        let mut meta = self.meta()?;
        let freed = meta.group_mut(group_id)?.reclaim_expired(now_ms);
        if !freed.is_empty() {
            self.store_meta(&meta)?;
        }
        Ok(freed)
    }

    /// Advances the queue's global head to the minimum consumed-through
    /// pointer across groups.
    ///
    /// # Errors
    ///
    /// Fails on legacy meta or store failure.
    pub fn advance_global_head(&mut self) -> QueueResult<EntryPointer> {
        let mut meta = self.meta()?;
        let head = meta.advance_global_head()?;
        self.store_meta(&meta)?;
        Ok(head)
    }

    fn store_meta(&mut self, meta: &QueueMeta) -> QueueResult<()> {
        let encoded = meta.encode()?;
        self.table.put(&self.meta_row(), META_COLUMN, &encoded)?;
        Ok(())
    }

    fn meta_row(&self) -> Vec<u8> {
        let mut row = Vec::with_capacity(2 + self.name.len());
        row.extend_from_slice(b"m:");
        row.extend_from_slice(&self.name);
        row
    }

    fn entry_row(&self, pointer: EntryPointer) -> Vec<u8> {
        let mut row = Vec::with_capacity(3 + self.name.len() + 8);
        row.extend_from_slice(b"e:");
        row.extend_from_slice(&self.name);
        row.push(b':');
        row.extend_from_slice(&pointer.to_key_bytes());
        row
    }
}

impl<S> std::fmt::Debug for QueueClient<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueClient")
            .field("name", &String::from_utf8_lossy(&self.name))
            .finish_non_exhaustive()
    }
}
