//! # Strata Queue
//!
//! Transactional queue consumer-group state for Strata.
//!
//! A queue is one shared stream of enqueued entries layered on the same
//! versioned substrate as tables: entry payloads and queue metadata are
//! rows read and written through the snapshot-isolated table client, so
//! enqueue carries the same isolation guarantees as any table write.
//!
//! Consumption is fan-out: each named consumer group tracks its own
//! dequeue progress and sees every entry exactly once, independent of
//! every other group. Groups never compete for entries.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod group;
mod meta;
mod pointer;
mod queue;

pub use error::{QueueError, QueueResult};
pub use group::{Claim, EntryState, GroupState};
pub use meta::QueueMeta;
pub use pointer::EntryPointer;
pub use queue::QueueClient;
