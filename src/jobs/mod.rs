//! # Jobs and one-shot subscriptions.
//!
//! This module contains the fan-out half of the coalescing engine:
//! - [`Job`] - one at-most-once task execution plus its attached subscribers
//! - [`Subscription`] - single-reader, one-shot handle to a job's outcome
//!
//! Jobs and subscriptions have independent lifetimes: a subscriber walking
//! away (cancellation, timeout) never cancels the job's task and never
//! affects sibling subscribers.

mod job;
mod subscription;

pub use job::Job;
pub use subscription::Subscription;
