//! # Executor configuration.
//!
//! Provides [`ExecutorConfig`], the settings shared by jobs created through
//! one executor.
//!
//! Config is used in two ways:
//! 1. **Executor creation**: `JobExecutor::new(config)` — jobs built via
//!    [`JobExecutor::submit`](crate::JobExecutor::submit) inherit it.
//! 2. **Job defaults**: `Job::with_config(id, task, &config)`.
//!
//! ## Sentinel values
//! - `subscription_timeout = 0s` → no backstop (a subscriber waits until
//!   delivery or its own context cancels)

use std::time::Duration;

/// Configuration for jobs created through a [`JobExecutor`](crate::JobExecutor).
///
/// ## Field semantics
/// - `subscription_timeout`: absolute backstop applied to every subscriber's
///   wait, independent of the caller's own context (`0s` = disabled)
/// - `subscriber_capacity`: initial capacity of a job's subscriber list
///   (min 1; a job always holds its own subscription as subscriber zero)
///
/// All fields are public for flexibility. Prefer the helper accessors to avoid
/// sprinkling sentinel checks across the codebase.
#[derive(Clone, Debug)]
pub struct ExecutorConfig {
    /// Maximum time a subscriber may wait for delivery before giving up.
    ///
    /// This is a per-subscriber backstop against a job that never signals,
    /// distinct from cancellation of the caller's own context:
    /// - `Duration::ZERO` = no backstop
    /// - `> 0` = the wait fails with `TaskError::TimedOut` after this long
    pub subscription_timeout: Duration,

    /// Initial capacity reserved for a job's subscriber list.
    ///
    /// Purely an allocation hint; the list grows past it freely.
    pub subscriber_capacity: usize,
}

impl ExecutorConfig {
    /// Returns the subscription backstop as an `Option`.
    ///
    /// - `None` → no backstop
    /// - `Some(d)` → the wait fails after `d`
    #[inline]
    pub fn backstop(&self) -> Option<Duration> {
        if self.subscription_timeout == Duration::ZERO {
            None
        } else {
            Some(self.subscription_timeout)
        }
    }

    /// Returns the subscriber capacity clamped to a minimum of 1.
    ///
    /// Every job carries at least its own subscription.
    #[inline]
    pub fn subscriber_capacity_clamped(&self) -> usize {
        self.subscriber_capacity.max(1)
    }
}

impl Default for ExecutorConfig {
    /// Default configuration:
    ///
    /// - `subscription_timeout = 20s` (generous backstop for slow tasks)
    /// - `subscriber_capacity = 6` (small bursts of coalesced callers)
    fn default() -> Self {
        Self {
            subscription_timeout: Duration::from_secs(20),
            subscriber_capacity: 6,
        }
    }
}
