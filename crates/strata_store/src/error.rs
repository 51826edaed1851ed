//! Error types for store operations.

use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur during versioned store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A transient backend failure; the operation is safe to retry.
    ///
    /// Commit-flush stamps every cell with the transaction's fixed write
    /// pointer, so replaying the identical batch after a transient failure
    /// is idempotent.
    #[error("transient store failure: {message}")]
    Transient {
        /// Description of the failure.
        message: String,
    },

    /// A persisted batch was only partially applied.
    ///
    /// Raised by backends that offer per-row atomicity only, when some rows
    /// of a multi-row batch were applied before a failure. Never silent:
    /// callers must learn which row failed.
    #[error("partial write: batch failed at row {row:?}")]
    PartialWrite {
        /// The first row that failed to persist.
        row: Vec<u8>,
    },

    /// The stored data is corrupted.
    #[error("store corrupted: {0}")]
    Corrupted(String),

    /// The store is closed.
    #[error("store is closed")]
    Closed,
}

impl StoreError {
    /// Creates a transient failure.
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    /// Returns `true` if retrying the failed operation is safe and may
    /// succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}
