//! # Coalescing core: the registry of in-flight work.
//!
//! The only public API from this module is [`JobExecutor`], which owns the
//! key → job working set and the race-free registration protocol.

mod registry;

pub use registry::JobExecutor;
