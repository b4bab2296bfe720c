//! Error types used by the coalescing executor and tasks.
//!
//! The single public type is [`TaskError`]. It covers both outcomes a task can
//! produce and the two caller-local conditions a waiting subscriber can hit
//! (its own context being cancelled, or the subscription backstop elapsing).
//!
//! `TaskError` is `Clone` because one task outcome is fanned out to every
//! subscriber of the same job.

use std::time::Duration;
use thiserror::Error;

/// # Errors observed by a subscriber awaiting a job outcome.
///
/// A value of this type arrives through a [`Subscription`](crate::Subscription)
/// in one of two ways:
///
/// - **Broadcast**: the job's task failed, and the identical error is
///   delivered to every subscriber ([`TaskError::Fail`]).
/// - **Caller-local**: the wait itself gave up ([`TaskError::Canceled`],
///   [`TaskError::TimedOut`]). These are never broadcast and never affect
///   the job or its other subscribers.
///
/// Use [`TaskError::is_caller_local`] to tell the two classes apart.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskError {
    /// The task itself failed (e.g. numeric overflow). Broadcast verbatim
    /// to every subscriber; never retried.
    #[error("execution failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// The awaiting caller's own context was cancelled before delivery.
    #[error("context cancelled")]
    Canceled,

    /// The subscription-level backstop elapsed before any delivery.
    #[error("subscription timed out after {timeout:?}")]
    TimedOut {
        /// The backstop duration that was exceeded.
        timeout: Duration,
    },
}

impl TaskError {
    /// Shorthand for building a [`TaskError::Fail`] from any message.
    pub fn fail(error: impl Into<String>) -> Self {
        TaskError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use unijob::TaskError;
    ///
    /// let err = TaskError::fail("boom");
    /// assert_eq!(err.as_label(), "task_failed");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            TaskError::Fail { .. } => "task_failed",
            TaskError::Canceled => "wait_canceled",
            TaskError::TimedOut { .. } => "subscription_timeout",
        }
    }

    /// Indicates whether the error is local to the awaiting caller.
    ///
    /// Returns `true` for [`TaskError::Canceled`] and [`TaskError::TimedOut`]:
    /// the job may still complete and deliver to its other subscribers.
    ///
    /// # Example
    /// ```
    /// use unijob::TaskError;
    ///
    /// assert!(TaskError::Canceled.is_caller_local());
    /// assert!(!TaskError::fail("boom").is_caller_local());
    /// ```
    pub fn is_caller_local(&self) -> bool {
        matches!(self, TaskError::Canceled | TaskError::TimedOut { .. })
    }
}

/// Attaching to a job that has stopped accepting subscribers.
///
/// Internal to the registration protocol: the executor reacts by retrying
/// against a fresh view of the registry, so this never reaches a caller.
#[derive(Error, Debug)]
#[error("job is no longer accepting subscribers")]
pub(crate) struct AttachError;
