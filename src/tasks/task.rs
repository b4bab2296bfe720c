//! # Task abstraction.
//!
//! This module defines the [`Task`] trait (async, cancelable, typed output).
//! The common handle type is [`TaskRef`], an `Arc<dyn Task>` suitable for
//! sharing across the runtime.
//!
//! A task receives a [`CancellationToken`] owned by the executor (not by any
//! individual caller) and should periodically check it to stop cooperatively
//! during shutdown.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// # Asynchronous, cancelable unit of work.
///
/// A `Task` produces one `Result<Output, TaskError>` per invocation. Under a
/// [`JobExecutor`](crate::JobExecutor) it is invoked at most once per job and
/// the outcome is fanned out to every coalesced caller, which is why
/// [`Task::Output`] must be `Clone`.
///
/// The token passed to [`run`](Task::run) belongs to the executor, never to a
/// caller: a caller abandoning its subscription does not cancel the task.
///
/// # Example
/// ```
/// use tokio_util::sync::CancellationToken;
/// use async_trait::async_trait;
/// use unijob::{Task, TaskError};
///
/// struct Answer;
///
/// #[async_trait]
/// impl Task for Answer {
///     type Output = u64;
///
///     async fn run(&self, ctx: CancellationToken) -> Result<u64, TaskError> {
///         if ctx.is_cancelled() {
///             return Err(TaskError::Canceled);
///         }
///         Ok(42)
///     }
/// }
/// ```
#[async_trait]
pub trait Task: Send + Sync + 'static {
    /// The value delivered to every subscriber on success.
    type Output: Clone + Send + 'static;

    /// Executes the task until completion or cancellation.
    ///
    /// Implementations should check `ctx.is_cancelled()` at natural pause
    /// points and exit promptly during executor shutdown.
    async fn run(&self, ctx: CancellationToken) -> Result<Self::Output, TaskError>;
}

/// Shared handle to a task producing values of type `R`.
pub type TaskRef<R> = Arc<dyn Task<Output = R>>;
