//! # Strata Store
//!
//! Versioned column store abstraction for Strata.
//!
//! This crate provides the lowest-level storage abstraction of the Strata
//! core: a multi-version key-value space where a row maps to columns and
//! each column holds multiple u64-stamped versions. Backends are **opaque
//! byte stores** - they never interpret payloads, and in particular they
//! cannot tell a tombstone from a live value. All payload interpretation
//! (tombstone wrapping, visibility) happens in `strata_core`.
//!
//! ## Design Principles
//!
//! - Backends expose exactly four capabilities: persist, versioned get,
//!   latest get, and scan
//! - Versions are never mutated in place; a new write is a new version
//! - Must be `Send + Sync` for concurrent readers and writers
//! - All data lives in a single fixed data column family; sibling families
//!   belong to other layers
//!
//! ## Available Backends
//!
//! - [`InMemoryStore`] - For testing and ephemeral use
//!
//! ## Example
//!
//! ```rust
//! use strata_store::{InMemoryStore, Version, VersionedStore, WriteBatch};
//!
//! let store = InMemoryStore::new();
//! let mut batch = WriteBatch::new();
//! batch.insert(b"row".to_vec(), b"col".to_vec(), b"payload".as_ref().into());
//! store.persist(&batch, Version::new(7)).unwrap();
//!
//! let latest = store.get_latest(b"row", None).unwrap();
//! assert_eq!(latest.get(b"col".as_ref()).unwrap().as_ref(), b"payload");
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cell;
mod error;
mod memory;
mod store;

pub use cell::{Column, ColumnFamily, ColumnVersions, Row, Version, VersionedCell, WriteBatch};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryStore;
pub use store::{RowScanner, VersionedStore};
