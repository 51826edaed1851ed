//! # Strata Core
//!
//! Snapshot-isolated versioned table core for Strata.
//!
//! This crate provides:
//! - Transaction descriptors supplied by an external coordinator
//! - The visibility filter over multi-version cells
//! - Tombstone wrapping and unwrapping
//! - The per-transaction write buffer
//! - The versioned table client orchestrating reads and commit-flush
//!
//! The core never allocates transaction identifiers and never decides
//! commit or rollback; it consumes descriptors (read pointer, write
//! pointer, exclusion list) and filters or stamps versioned data with
//! them. Any [`strata_store::VersionedStore`] backend works underneath.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod buffer;
mod cell;
mod config;
mod descriptor;
mod error;
mod retry;
mod table;
mod visibility;

pub use buffer::WriteBuffer;
pub use cell::{unwrap_payload, wrap_delete, wrap_value, Lookup};
pub use config::ClientConfig;
pub use descriptor::{DescriptorPayload, TransactionDescriptor};
pub use error::{CoreError, CoreResult};
pub use retry::{retrying, FixedDelay, RetryPolicy};
pub use table::{TableClient, TableScanner};
pub use visibility::{resolve, resolve_cell, resolve_row};

pub use strata_store::Version;
