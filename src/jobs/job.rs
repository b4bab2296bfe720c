//! # Job: one at-most-once task execution plus its subscribers.
//!
//! A [`Job`] owns the task for one deduplication key, the list of attached
//! subscriptions, and the `accepting` gate that decides whether late callers
//! may still coalesce onto it.
//!
//! ## Lifecycle
//! ```text
//! Pending ──► Running ──► Completed ──► Done
//!    │           │            │           └─ every subscriber delivered
//!    │           │            └─ task returned; accepting=false; broadcasting
//!    │           └─ task launched (externally indistinguishable from Pending)
//!    └─ created by the first caller to observe the key absent
//! ```
//!
//! ## Rules
//! - `accepting` is one-way: once false it never turns true again.
//! - The job attaches its **own** subscription as subscriber zero at creation
//!   time; that handle is what `execute` returns to the originating caller.
//! - Broadcast happens strictly **after** the job is deregistered, so "in the
//!   registry" always implies "outcome not yet known to any subscriber".

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::ExecutorConfig;
use crate::error::AttachError;
use crate::jobs::subscription::{Outcome, Subscription, SubscriptionState};
use crate::tasks::TaskRef;

struct Subscribers<R> {
    /// Gate for new attachments; irreversibly closed by `broadcast`.
    accepting: bool,
    list: Vec<Arc<SubscriptionState<R>>>,
}

/// # One logical execution of a task for a given key.
///
/// Built by the caller (or by [`JobExecutor::submit`](crate::JobExecutor::submit))
/// and handed to [`JobExecutor::execute`](crate::JobExecutor::execute). If an
/// equivalent job is already in flight, this job's task is discarded
/// unexecuted and only its subscription is attached to the running job.
pub struct Job<R, K> {
    id: K,
    task: TaskRef<R>,
    /// Subscriber zero; the handle returned to whoever originated this job.
    subscription: Arc<SubscriptionState<R>>,
    subscribers: Mutex<Subscribers<R>>,
}

impl<R, K> Job<R, K>
where
    R: Clone + Send + 'static,
{
    /// Creates a job with the default [`ExecutorConfig`].
    pub fn new(id: K, task: TaskRef<R>) -> Self {
        Self::with_config(id, task, &ExecutorConfig::default())
    }

    /// Creates a job inheriting subscription settings from `cfg`.
    pub fn with_config(id: K, task: TaskRef<R>, cfg: &ExecutorConfig) -> Self {
        let subscription = SubscriptionState::new(cfg.backstop());
        let mut list = Vec::with_capacity(cfg.subscriber_capacity_clamped());

        // Each job subscribes to itself.
        list.push(Arc::clone(&subscription));

        Self {
            id,
            task,
            subscription,
            subscribers: Mutex::new(Subscribers {
                accepting: true,
                list,
            }),
        }
    }

    /// Returns the deduplication key.
    pub fn id(&self) -> &K {
        &self.id
    }

    /// The single-reader handle over subscriber zero.
    pub(crate) fn handle(&self) -> Subscription<R> {
        Subscription::new(Arc::clone(&self.subscription))
    }

    /// The shared state behind subscriber zero, for attaching to another job.
    pub(crate) fn own_state(&self) -> Arc<SubscriptionState<R>> {
        Arc::clone(&self.subscription)
    }

    /// Appends a subscription if the job still accepts subscribers.
    ///
    /// Fails once the job has begun (or finished) broadcasting; the caller
    /// must then resolve the key against a fresh view of the registry.
    pub(crate) fn attach(&self, sub: Arc<SubscriptionState<R>>) -> Result<(), AttachError> {
        let mut subs = self.lock_subscribers();
        if !subs.accepting {
            return Err(AttachError);
        }
        subs.list.push(sub);
        trace!(subscribers = subs.list.len(), "subscriber attached");
        Ok(())
    }

    /// Executes the task, deregisters via `on_finish`, then broadcasts.
    ///
    /// `on_finish` runs exactly once, strictly before any subscriber can
    /// observe the outcome.
    pub(crate) async fn run<F, Fut>(self: Arc<Self>, ctx: CancellationToken, on_finish: F)
    where
        F: FnOnce(Arc<Self>) -> Fut + Send,
        Fut: Future<Output = ()> + Send,
    {
        let outcome = self.task.run(ctx).await;

        on_finish(Arc::clone(&self)).await;

        self.broadcast(outcome);
    }

    /// Closes the accepting gate and delivers the outcome to every subscriber.
    fn broadcast(&self, outcome: Outcome<R>) {
        let mut subs = self.lock_subscribers();
        subs.accepting = false;

        debug!(subscribers = subs.list.len(), "broadcasting job outcome");
        for sub in &subs.list {
            sub.send(outcome.clone());
        }
    }

    fn lock_subscribers(&self) -> MutexGuard<'_, Subscribers<R>> {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
