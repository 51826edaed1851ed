//! Per-group dequeue progress.

use crate::error::{QueueError, QueueResult};
use crate::pointer::EntryPointer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// An unacknowledged claim on one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Wall-clock milliseconds at which the claim's lease lapses.
    ///
    /// The lease timer lives outside the core; this state only supports
    /// re-claiming once an external clock says the lease expired.
    pub lease_expires_at_ms: u64,
}

/// Lifecycle of one entry from a consuming group's perspective.
///
/// `Claimed` returns to claimable when its lease expires, so a crashed
/// consumer's entry is replayed rather than lost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// Enqueued and not yet claimed by this group (or its claim lapsed).
    Enqueued,
    /// Claimed by this group under an unexpired lease.
    Claimed,
    /// Acknowledged by this group.
    Acked,
}

/// A consumer group's record of dequeue progress over the shared stream.
///
/// Progress is a dense prefix plus a sparse tail: everything at or below
/// `consumed_through` is acknowledged, and `acked` holds out-of-order
/// acknowledgements above it. Acks may arrive in any order; the
/// consumed-through pointer advances only as the gap closes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupState {
    group_id: u64,
    consumed_through: u64,
    acked: BTreeSet<u64>,
    claims: BTreeMap<u64, Claim>,
}

impl GroupState {
    /// Creates group state starting after `consumed_through`.
    #[must_use]
    pub fn new(group_id: u64, consumed_through: EntryPointer) -> Self {
        Self {
            group_id,
            consumed_through: consumed_through.as_u64(),
            acked: BTreeSet::new(),
            claims: BTreeMap::new(),
        }
    }

    /// Returns the group identifier.
    #[must_use]
    pub fn group_id(&self) -> u64 {
        self.group_id
    }

    /// Returns the pointer through which every entry is acknowledged.
    #[must_use]
    pub fn consumed_through(&self) -> EntryPointer {
        EntryPointer::new(self.consumed_through)
    }

    /// Returns whether an entry is acknowledged, densely or sparsely.
    #[must_use]
    pub fn is_acked(&self, pointer: EntryPointer) -> bool {
        pointer.as_u64() <= self.consumed_through || self.acked.contains(&pointer.as_u64())
    }

    /// Returns whether an entry is claimed under an unexpired lease.
    #[must_use]
    pub fn has_active_claim(&self, pointer: EntryPointer, now_ms: u64) -> bool {
        self.claims
            .get(&pointer.as_u64())
            .is_some_and(|claim| claim.lease_expires_at_ms > now_ms)
    }

    /// Returns an entry's lifecycle state from this group's perspective.
    #[must_use]
    pub fn entry_state(&self, pointer: EntryPointer, now_ms: u64) -> EntryState {
        if self.is_acked(pointer) {
            EntryState::Acked
        } else if self.has_active_claim(pointer, now_ms) {
            EntryState::Claimed
        } else {
            EntryState::Enqueued
        }
    }

    /// Returns whether this group may claim the entry right now.
    ///
    /// Fan-out semantics: only this group's own acks and active claims
    /// matter; other groups' progress never hides an entry.
    #[must_use]
    pub fn is_claimable(&self, pointer: EntryPointer, now_ms: u64) -> bool {
        pointer.as_u64() > self.consumed_through
            && !self.acked.contains(&pointer.as_u64())
            && !self.has_active_claim(pointer, now_ms)
    }

    /// Claims an entry under a lease.
    ///
    /// Re-claiming after lease expiry replaces the lapsed claim.
    ///
    /// # Errors
    ///
    /// Fails if the entry is already acknowledged or held under an
    /// unexpired lease.
    pub fn claim(&mut self, pointer: EntryPointer, now_ms: u64, lease_ms: u64) -> QueueResult<()> {
        if self.is_acked(pointer) {
            return Err(QueueError::invalid_claim(
                pointer.as_u64(),
                "already acknowledged",
            ));
        }
        if self.has_active_claim(pointer, now_ms) {
            return Err(QueueError::invalid_claim(
                pointer.as_u64(),
                "lease still active",
            ));
        }
        self.claims.insert(
            pointer.as_u64(),
            Claim {
                lease_expires_at_ms: now_ms.saturating_add(lease_ms),
            },
        );
        Ok(())
    }

    /// Acknowledges a claimed entry.
    ///
    /// The pointer joins the sparse acked set, then the dense prefix
    /// advances while consecutive pointers are present; entries folded
    /// into the prefix are dropped from the set.
    ///
    /// # Errors
    ///
    /// Fails if the entry was never claimed by this group or is already
    /// acknowledged.
    pub fn ack(&mut self, pointer: EntryPointer) -> QueueResult<()> {
        if self.is_acked(pointer) {
            return Err(QueueError::invalid_claim(
                pointer.as_u64(),
                "already acknowledged",
            ));
        }
        if self.claims.remove(&pointer.as_u64()).is_none() {
            return Err(QueueError::invalid_claim(pointer.as_u64(), "not claimed"));
        }
        self.acked.insert(pointer.as_u64());
        self.close_gaps();
        Ok(())
    }

    /// Releases every claim whose lease lapsed at or before `now_ms`,
    /// returning the freed pointers in ascending order.
    pub fn reclaim_expired(&mut self, now_ms: u64) -> Vec<EntryPointer> {
        let expired: Vec<u64> = self
            .claims
            .iter()
            .filter(|(_, claim)| claim.lease_expires_at_ms <= now_ms)
            .map(|(&pointer, _)| pointer)
            .collect();
        for pointer in &expired {
            self.claims.remove(pointer);
        }
        expired.into_iter().map(EntryPointer::new).collect()
    }

    /// Returns the number of entries claimed but not yet acknowledged.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.claims.len()
    }

    fn close_gaps(&mut self) {
        while self.acked.remove(&(self.consumed_through + 1)) {
            self.consumed_through += 1;
        }
    }
}
