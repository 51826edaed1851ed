//! Retry policy around store mutations.
//!
//! Commit-flush is bounded, retryable I/O: every cell is stamped with the
//! transaction's fixed write pointer, so replaying an identical batch after
//! a transient failure is idempotent. The policy is pluggable; the cap is
//! explicit.

use crate::error::{CoreError, CoreResult};
use std::time::Duration;
use strata_store::StoreResult;
use tracing::warn;

/// Decides whether and how long to wait before retrying a failed store
/// mutation.
pub trait RetryPolicy: Send + Sync {
    /// Returns the delay before the next attempt, or `None` to give up.
    ///
    /// `attempt` counts failures so far, starting at 1.
    fn backoff(&self, attempt: usize) -> Option<Duration>;
}

/// Fixed-delay retry with an explicit attempt cap.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedDelay {
    /// Delay between attempts.
    pub delay: Duration,
    /// Total attempts permitted, including the first.
    pub max_attempts: usize,
}

impl FixedDelay {
    /// Creates a policy with the given delay and cap.
    #[must_use]
    pub const fn new(delay: Duration, max_attempts: usize) -> Self {
        Self {
            delay,
            max_attempts,
        }
    }
}

impl Default for FixedDelay {
    fn default() -> Self {
        Self {
            delay: Duration::from_millis(100),
            max_attempts: 5,
        }
    }
}

impl RetryPolicy for FixedDelay {
    fn backoff(&self, attempt: usize) -> Option<Duration> {
        (attempt < self.max_attempts).then_some(self.delay)
    }
}

/// Runs `op`, retrying transient store failures per `policy`.
///
/// Only failures reporting [`strata_store::StoreError::is_transient`] are
/// retried; everything else surfaces immediately. Each retry is logged.
///
/// # Errors
///
/// Returns [`CoreError::CommitFailed`] when the policy gives up on a
/// transient failure, or the converted store error for a non-transient
/// one.
pub fn retrying<T>(
    policy: &dyn RetryPolicy,
    mut op: impl FnMut() -> StoreResult<T>,
) -> CoreResult<T> {
    let mut attempt = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) if err.is_transient() => {
                attempt += 1;
                match policy.backoff(attempt) {
                    Some(delay) => {
                        warn!(attempt, ?delay, error = %err, "transient store failure, retrying");
                        if !delay.is_zero() {
                            std::thread::sleep(delay);
                        }
                    }
                    None => {
                        return Err(CoreError::CommitFailed {
                            attempts: attempt,
                            source: err,
                        })
                    }
                }
            }
            Err(err) => return Err(err.into()),
        }
    }
}
