//! Per-workflow settings.

use crate::retry::RetryPolicy;

/// Settings every bill workflow is started with.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSettings {
    /// Retry policy for each item charge.
    pub retry: RetryPolicy,
    /// Capacity of each signal channel.
    pub signal_buffer: usize,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            signal_buffer: 32,
        }
    }
}

impl WorkflowSettings {
    /// Replaces the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Replaces the signal buffer size. Zero is treated as one.
    #[must_use]
    pub fn with_signal_buffer(mut self, signal_buffer: usize) -> Self {
        self.signal_buffer = signal_buffer.max(1);
        self
    }
}
