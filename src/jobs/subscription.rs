//! # One-shot outcome delivery.
//!
//! A subscription is a single-assignment result cell (a guarded slot plus a
//! completion signal), written by exactly one job and read by exactly one
//! caller.
//!
//! ## Delivery flow
//! ```text
//! Job::broadcast ──► SubscriptionState::send ──► slot: Pending → Ready
//!                                                notify reader
//!
//! Subscription::wait ──► take slot (Ready → Consumed) ──► return outcome
//!                    └─► or: caller context cancelled  ──► Err(Canceled)
//!                    └─► or: backstop elapsed           ──► Err(TimedOut)
//! ```
//!
//! ## Rules
//! - `send` assigns the slot **at most once**; a second send, or a send after
//!   the reader has already given up, is a silent no-op.
//! - `wait` consumes the [`Subscription`] handle, so a retired subscription
//!   can never be read again.
//! - A caller abandoning its wait affects nothing else: the job keeps running
//!   and sibling subscribers still get their delivery.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::error::TaskError;

/// The one value a subscription ever carries.
pub(crate) type Outcome<R> = Result<R, TaskError>;

enum Slot<R> {
    /// Nothing delivered yet.
    Pending,
    /// Outcome delivered, not yet read.
    Ready(Outcome<R>),
    /// Outcome read; the slot is retired.
    Consumed,
}

/// Shared state between the writing job and the reading caller.
pub(crate) struct SubscriptionState<R> {
    slot: Mutex<Slot<R>>,
    ready: Notify,
    backstop: Option<Duration>,
}

impl<R> SubscriptionState<R> {
    pub(crate) fn new(backstop: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            slot: Mutex::new(Slot::Pending),
            ready: Notify::new(),
            backstop,
        })
    }

    /// Delivers the outcome to the reader, at most once.
    ///
    /// Safe to call again after delivery or after the reader gave up; the
    /// extra outcome is dropped.
    pub(crate) fn send(&self, outcome: Outcome<R>) {
        let mut slot = self.lock_slot();
        if let Slot::Pending = *slot {
            *slot = Slot::Ready(outcome);
            // notify_one stores a permit, so a reader arriving later
            // still wakes immediately.
            self.ready.notify_one();
        }
    }

    /// Takes the outcome out of the slot, retiring it.
    fn take(&self) -> Option<Outcome<R>> {
        let mut slot = self.lock_slot();
        match std::mem::replace(&mut *slot, Slot::Consumed) {
            Slot::Ready(outcome) => Some(outcome),
            other => {
                *slot = other;
                None
            }
        }
    }

    fn lock_slot(&self) -> MutexGuard<'_, Slot<R>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// # Single-reader handle to one job outcome.
///
/// Returned by [`JobExecutor::execute`](crate::JobExecutor::execute) (and
/// [`submit`](crate::JobExecutor::submit)). Exactly one outcome is ever
/// written to it, by the job it is attached to; [`wait`](Subscription::wait)
/// is the sole read operation and consumes the handle.
pub struct Subscription<R> {
    state: Arc<SubscriptionState<R>>,
}

impl<R> Subscription<R> {
    pub(crate) fn new(state: Arc<SubscriptionState<R>>) -> Self {
        Self { state }
    }

    /// Suspends until exactly one of:
    ///
    /// - the job delivers an outcome → that `Result<R, TaskError>` verbatim;
    /// - `ctx` is cancelled → `Err(TaskError::Canceled)`;
    /// - the subscription backstop elapses → `Err(TaskError::TimedOut)`.
    ///
    /// `ctx` is the *caller's* context. Cancelling it abandons only this
    /// wait; the job's task and its other subscribers are untouched.
    pub async fn wait(self, ctx: CancellationToken) -> Result<R, TaskError> {
        let backstop = self.state.backstop;
        let deadline = async move {
            match backstop {
                Some(d) => {
                    tokio::time::sleep(d).await;
                    d
                }
                None => std::future::pending::<Duration>().await,
            }
        };
        tokio::pin!(deadline);

        loop {
            // Register for the wakeup before checking the slot, so a send
            // racing with this check cannot be missed.
            let notified = self.state.ready.notified();
            if let Some(outcome) = self.state.take() {
                return outcome;
            }
            tokio::select! {
                _ = notified => {}
                _ = ctx.cancelled() => return Err(TaskError::Canceled),
                timeout = &mut deadline => return Err(TaskError::TimedOut { timeout }),
            }
        }
    }
}
