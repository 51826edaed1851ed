//! Table client configuration.

use crate::retry::FixedDelay;
use std::time::Duration;

/// Configuration for a [`crate::TableClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Write-buffer size above which staged writes are reported oversized.
    ///
    /// Flushing happens on commit, never on a timer; the threshold only
    /// drives accounting and a warning, since flushing mid-transaction
    /// would split the commit's atomicity.
    pub write_buffer_threshold: usize,

    /// Retry policy for commit-flush against the store.
    pub retry: FixedDelay,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            write_buffer_threshold: 4 * 1024 * 1024, // 4 MB
            retry: FixedDelay::default(),
        }
    }
}

impl ClientConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the write-buffer size threshold.
    #[must_use]
    pub const fn write_buffer_threshold(mut self, bytes: usize) -> Self {
        self.write_buffer_threshold = bytes;
        self
    }

    /// Sets the commit retry delay.
    #[must_use]
    pub const fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry.delay = delay;
        self
    }

    /// Sets the commit retry attempt cap.
    #[must_use]
    pub const fn retry_max_attempts(mut self, attempts: usize) -> Self {
        self.retry.max_attempts = attempts;
        self
    }
}
