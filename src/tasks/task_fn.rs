//! # Function-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: Fn(CancellationToken) -> Fut`, producing a
//! fresh future per invocation. This avoids shared mutable state; if shared
//! state is needed, move an `Arc<...>` into the closure explicitly.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;
use crate::tasks::task::{Task, TaskRef};

/// Function-backed task implementation.
///
/// Wraps a closure that *creates* a new future per invocation.
#[derive(Debug)]
pub struct TaskFn<F> {
    f: F,
}

impl<F> TaskFn<F> {
    /// Creates a new function-backed task.
    ///
    /// Prefer [`TaskFn::arc`] when you immediately need a [`TaskRef`].
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the task and returns it as a shared handle.
    ///
    /// ## Example
    /// ```rust
    /// use tokio_util::sync::CancellationToken;
    /// use unijob::{TaskFn, TaskRef, TaskError};
    ///
    /// let t: TaskRef<u64> = TaskFn::arc(|_ctx: CancellationToken| async {
    ///     Ok::<_, TaskError>(42)
    /// });
    /// ```
    pub fn arc<Fut, R>(f: F) -> TaskRef<R>
    where
        F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
        R: Clone + Send + 'static,
    {
        Arc::new(Self::new(f))
    }
}

#[async_trait]
impl<F, Fut, R> Task for TaskFn<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static, // Fn, not FnMut
    Fut: Future<Output = Result<R, TaskError>> + Send + 'static,
    R: Clone + Send + 'static,
{
    type Output = R;

    async fn run(&self, ctx: CancellationToken) -> Result<R, TaskError> {
        (self.f)(ctx).await
    }
}
