//! Work-stealing run queues.
//!
//! - [`injector`]: the shared queue of a scheduler, also used for parking.
//! - [`queue`]: per-worker local queues, stolen from by idle siblings.
//!
//! Both are split into priority lanes. Queue locks are never held while
//! a shared-state cell lock is taken, so the two cannot deadlock.

pub(crate) mod injector;
pub(crate) mod queue;
