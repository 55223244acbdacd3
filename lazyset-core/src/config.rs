//! Per-list configuration.

use crossbeam_utils::Backoff;

/// What a writer does after its window failed validation.
///
/// Both strategies retry without bound; they only differ in how hard the
/// thread hammers the contended nodes between attempts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RetryStrategy {
    /// Re-traverse immediately.
    #[default]
    Immediate,
    /// Spin, then yield, with exponentially growing pauses between attempts.
    Backoff,
}

/// Lazy list configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListConfig {
    /// Behaviour on validation failure in insert and delete.
    pub retry: RetryStrategy,
}

impl ListConfig {
    /// Retry immediately after a failed validation.
    pub const fn immediate() -> Self {
        Self {
            retry: RetryStrategy::Immediate,
        }
    }

    /// Back off between retries, for workloads where many writers hit the
    /// same few adjacent nodes.
    pub const fn contended() -> Self {
        Self {
            retry: RetryStrategy::Backoff,
        }
    }
}

/// Retry bookkeeping for a single insert or delete call.
pub(crate) struct RetryState {
    op: &'static str,
    attempts: u32,
    backoff: Option<Backoff>,
}

impl RetryState {
    pub(crate) fn new(op: &'static str, strategy: RetryStrategy) -> Self {
        let backoff = match strategy {
            RetryStrategy::Immediate => None,
            RetryStrategy::Backoff => Some(Backoff::new()),
        };

        RetryState {
            op,
            attempts: 0,
            backoff,
        }
    }

    /// Record a failed validation and pause according to the strategy.
    pub(crate) fn retry(&mut self) {
        self.attempts = self.attempts.saturating_add(1);
        tracing::trace!(op = self.op, attempts = self.attempts, "window validation failed");

        if let Some(backoff) = &self.backoff {
            backoff.snooze();
        }
    }

    pub(crate) fn attempts(&self) -> u32 {
        self.attempts
    }
}
