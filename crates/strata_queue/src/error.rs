//! Error types for queue operations.

use thiserror::Error;

/// Result type for queue operations.
pub type QueueResult<T> = Result<T, QueueError>;

/// Errors that can occur in queue operations.
#[derive(Debug, Error)]
pub enum QueueError {
    /// Table core error.
    #[error("core error: {0}")]
    Core(#[from] strata_core::CoreError),

    /// The consumer group is not registered on this queue.
    #[error("unknown consumer group: {group_id}")]
    UnknownGroup {
        /// The group identifier.
        group_id: u64,
    },

    /// A stored queue-meta row could not be decoded.
    #[error("queue meta corrupted: {message}")]
    MetaCorrupted {
        /// Description of the corruption.
        message: String,
    },

    /// A stored record carried an unrecognized format or state value.
    ///
    /// Fatal for the operation; never silently ignored.
    #[error("unsupported state value: {value}")]
    UnsupportedState {
        /// The unrecognized value.
        value: u64,
    },

    /// A structured operation was attempted on legacy-JSON queue meta.
    #[error("queue meta is in legacy JSON form")]
    LegacyMeta,

    /// An entry could not be claimed or acknowledged.
    #[error("invalid claim on entry {pointer}: {reason}")]
    InvalidClaim {
        /// The entry pointer.
        pointer: u64,
        /// Why the transition is not allowed.
        reason: String,
    },
}

impl QueueError {
    /// Creates a meta-corruption error.
    pub fn meta_corrupted(message: impl Into<String>) -> Self {
        Self::MetaCorrupted {
            message: message.into(),
        }
    }

    /// Creates an invalid-claim error.
    pub fn invalid_claim(pointer: u64, reason: impl Into<String>) -> Self {
        Self::InvalidClaim {
            pointer,
            reason: reason.into(),
        }
    }
}
