//! Worker schedulers.
//!
//! - [`core`]: one scheduler per named pool; spawning, queueing, shutdown.
//! - [`worker`]: the dispatch loop run by each worker thread.

pub(crate) mod core;
pub(crate) mod worker;

pub(crate) use self::core::{Scheduler, Spawn};
