//! # unijob
//!
//! **Unijob** is a lightweight request-coalescing library for Rust.
//!
//! For a given deduplication key, at most one execution of the underlying
//! task runs at a time; every concurrent caller for that key receives the
//! single computed outcome (value or error); callers for distinct keys never
//! block one another.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   caller A            caller B            caller C
//!  (key "K1")          (key "K1")          (key "K2")
//!      │                   │                   │
//!      ▼                   ▼                   ▼
//! ┌───────────────────────────────────────────────────────────┐
//! │  JobExecutor (working set: key → in-flight Job)           │
//! │  - execute(): start new job OR attach to the existing one │
//! │  - register(): race-free via retry loop                   │
//! │  - a finishing job deregisters itself before broadcast    │
//! └──────┬───────────────────────────────────┬────────────────┘
//!        ▼                                   ▼
//! ┌──────────────────────────┐   ┌──────────────────────────┐
//! │ Job "K1"                 │   │ Job "K2"                 │
//! │  task (runs once)        │   │  task (runs once)        │
//! │  subscribers:            │   │  subscribers:            │
//! │   [sub A] [sub B]        │   │   [sub C]                │
//! └──────┬────────┬──────────┘   └──────┬───────────────────┘
//!        ▼        ▼                     ▼
//!     A.wait() B.wait()              C.wait()
//!   (same outcome, one-shot)     (independent outcome)
//! ```
//!
//! ### Execution flow
//! ```text
//! caller builds task + key ──► execute() ──► fresh Job   ──► task spawned
//!                                        └─► existing Job ─► subscription attached
//!                                        └─► returns Subscription either way
//!
//! task returns (value | error)
//!   ├─► job deregisters itself          (key is free again)
//!   ├─► accepting = false               (late callers start a fresh job)
//!   └─► broadcast to every subscriber   (identical outcome, one-shot each)
//!
//! caller awaits Subscription::wait(ctx)
//!   ├─► outcome delivered               → Ok(value) | Err(task error)
//!   ├─► ctx cancelled                   → Err(Canceled)      (caller-local)
//!   └─► subscription backstop elapsed   → Err(TimedOut)      (caller-local)
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                  |
//! |-------------------|--------------------------------------------------------------|-------------------------------------|
//! | **Coalescing**    | One task run per key, fan-out to every concurrent caller.    | [`JobExecutor`], [`Job`]            |
//! | **Delivery**      | One-shot, single-reader outcome handle with cancellation.    | [`Subscription`]                    |
//! | **Tasks**         | Define tasks as trait impls or plain closures.               | [`Task`], [`TaskFn`], [`TaskRef`]   |
//! | **Errors**        | Typed outcomes; caller-local vs broadcast conditions.        | [`TaskError`]                       |
//! | **Configuration** | Subscription backstop and fan-out sizing.                    | [`ExecutorConfig`]                  |
//!
//! ## Example
//! ```rust
//! use tokio_util::sync::CancellationToken;
//! use unijob::{ExecutorConfig, JobExecutor, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let executor: JobExecutor<u64, &str> = JobExecutor::new(ExecutorConfig::default());
//!
//!     // Concurrent submits with the same key share one execution.
//!     let task = TaskFn::arc(|_ctx: CancellationToken| async move { Ok(6 * 7) });
//!     let subscription = executor.submit("answer", task).await;
//!
//!     let value = subscription.wait(CancellationToken::new()).await?;
//!     assert_eq!(value, 42);
//!     Ok(())
//! }
//! ```

mod config;
mod error;
mod executor;
mod jobs;
mod tasks;

// ---- Public re-exports ----

pub use config::ExecutorConfig;
pub use error::TaskError;
pub use executor::JobExecutor;
pub use jobs::{Job, Subscription};
pub use tasks::{Task, TaskFn, TaskRef};
