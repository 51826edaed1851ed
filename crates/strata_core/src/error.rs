//! Error types for core operations.

use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in core table operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Versioned store backend error.
    #[error("store error: {0}")]
    Store(#[from] strata_store::StoreError),

    /// A required field was missing or malformed at an input boundary.
    ///
    /// Never retried; surfaced immediately to the caller.
    #[error("invalid argument: missing or malformed field `{field}`")]
    InvalidArgument {
        /// Name of the offending field.
        field: String,
    },

    /// Operation not permitted in the client's current state.
    #[error("invalid operation: {message}")]
    InvalidOperation {
        /// Description of why the operation is invalid.
        message: String,
    },

    /// A stored payload carried an unrecognized encoding tag.
    ///
    /// Fatal for the operation; never silently ignored.
    #[error("unsupported payload tag: {tag:#04x}")]
    UnsupportedTag {
        /// The unrecognized tag byte.
        tag: u8,
    },

    /// Commit-flush exhausted its retry budget on transient failures.
    #[error("commit failed after {attempts} attempt(s): {source}")]
    CommitFailed {
        /// Number of attempts made.
        attempts: usize,
        /// The last transient failure observed.
        source: strata_store::StoreError,
    },
}

impl CoreError {
    /// Creates an invalid-argument error for a boundary field.
    pub fn invalid_argument(field: impl Into<String>) -> Self {
        Self::InvalidArgument {
            field: field.into(),
        }
    }

    /// Creates an invalid-operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }
}
