//! # Job registry - coalesces equal keys onto one in-flight execution.
//!
//! The registry maps keys to in-flight jobs. On `execute` it either starts a
//! new job and launches its task, or discovers an equivalent job already
//! running and attaches the caller to it instead.
//!
//! ## Registration protocol
//! ```text
//! execute(job)
//!   └─► register(job): loop {
//!         ├─ read-lock lookup of job.id
//!         ├─ absent  → try_start(): re-check under write lock
//!         │             ├─ still absent → spawn task, insert, return
//!         │             └─ lost the race → retry from the top
//!         └─ present → attach job's own subscription under the read guard
//!                       ├─ Ok          → coalesced, return
//!                       └─ not accepting (job just finished) → retry
//!       }
//! ```
//!
//! ## Rules
//! - At most one live (accepting) job per key at any instant.
//! - The loop cannot livelock: every retry observes registry state strictly
//!   newer than the state it lost a race against.
//! - A job removes itself from the registry **before** it broadcasts, so no
//!   caller can attach to an entry whose outcome has begun to circulate.
//! - Unrelated keys never contend past the brief map lock.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;

use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::ExecutorConfig;
use crate::jobs::{Job, Subscription};
use crate::tasks::TaskRef;

/// # Deduplicating job executor.
///
/// For a given key, at most one task execution runs at a time; every
/// concurrent caller for that key receives the single computed outcome, and
/// callers for distinct keys never block one another.
///
/// The executor is cheap to clone (shared inner state); clones observe the
/// same working set. One instance is typically created at startup and passed
/// to whatever component needs coalescing.
pub struct JobExecutor<R, K> {
    working_set: Arc<RwLock<HashMap<K, Arc<Job<R, K>>>>>,
    /// Root of every task's cancellation token; cancelled by `shutdown`.
    root: CancellationToken,
    config: ExecutorConfig,
}

impl<R, K> JobExecutor<R, K>
where
    R: Clone + Send + 'static,
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    /// Creates an executor; jobs built via [`submit`](Self::submit) inherit `config`.
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            working_set: Arc::new(RwLock::new(HashMap::new())),
            root: CancellationToken::new(),
            config,
        }
    }

    /// Registers `job` and returns the subscription its outcome arrives on.
    ///
    /// If the key is already in flight, `job`'s task is discarded unexecuted
    /// and the returned subscription is attached to the pre-existing job.
    pub async fn execute(&self, job: Job<R, K>) -> Subscription<R> {
        let handle = job.handle();
        self.register(Arc::new(job)).await;
        handle
    }

    /// Convenience: builds a [`Job`] from this executor's config and executes it.
    pub async fn submit(&self, id: K, task: TaskRef<R>) -> Subscription<R> {
        self.execute(Job::with_config(id, task, &self.config)).await
    }

    /// Resolves `job` to either a fresh or an existing registry entry.
    ///
    /// Iterative on purpose: a retry under contention must not grow the
    /// stack.
    async fn register(&self, job: Arc<Job<R, K>>) {
        loop {
            let attached = {
                let set = self.working_set.read().await;
                // Attach under the read guard so the entry cannot be removed
                // out from under us mid-attach.
                set.get(job.id())
                    .map(|current| current.attach(job.own_state()).is_ok())
            };

            match attached {
                Some(true) => {
                    debug!("coalesced onto in-flight job");
                    return;
                }
                // The job we found is completing; the registry already
                // reflects (or is about to reflect) a newer state.
                Some(false) => continue,
                None => {
                    if self.try_start(Arc::clone(&job)).await {
                        return;
                    }
                    // Another caller inserted this key first; the retry
                    // takes the attach branch.
                }
            }
        }
    }

    /// Inserts `job` and launches its task, unless the key reappeared.
    async fn try_start(&self, job: Arc<Job<R, K>>) -> bool {
        let mut set = self.working_set.write().await;

        // Re-check under the exclusive lock: the race window between the
        // shared-lock lookup and here is closed by this check.
        if set.contains_key(job.id()) {
            return false;
        }

        let executor = self.clone();
        let token = self.root.child_token();
        tokio::spawn(Arc::clone(&job).run(token, move |finished| async move {
            executor.remove(finished.id()).await;
        }));

        set.insert(job.id().clone(), job);
        debug!(in_flight = set.len(), "job registered");
        true
    }

    /// Removes a finished job; called exactly once, by the job itself,
    /// strictly before it broadcasts.
    async fn remove(&self, id: &K) {
        let mut set = self.working_set.write().await;
        set.remove(id);
        trace!(in_flight = set.len(), "job deregistered");
    }

    /// Returns the number of in-flight jobs.
    pub async fn in_flight(&self) -> usize {
        self.working_set.read().await.len()
    }

    /// Returns true if no job is in flight.
    pub async fn is_idle(&self) -> bool {
        self.working_set.read().await.is_empty()
    }

    /// Returns the config inherited by jobs built via [`submit`](Self::submit).
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Cancels the root token shared by all in-flight tasks.
    ///
    /// Tasks observe this cooperatively; subscribers of a task that exits
    /// with an error receive that error as their outcome. No further
    /// teardown is required.
    pub fn shutdown(&self) {
        self.root.cancel();
    }
}

impl<R, K> Default for JobExecutor<R, K>
where
    R: Clone + Send + 'static,
    K: Eq + Hash + Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new(ExecutorConfig::default())
    }
}

impl<R, K> Clone for JobExecutor<R, K> {
    fn clone(&self) -> Self {
        Self {
            working_set: Arc::clone(&self.working_set),
            root: self.root.clone(),
            config: self.config.clone(),
        }
    }
}
