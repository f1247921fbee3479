//! Cooperative tasks.
//!
//! A task is a boxed future plus an explicit state machine
//! (active / pending / suspended / terminated). It runs on one worker at a
//! time, suspends only at an `.await` on something that registered its
//! waker, and is made pending again by that waker from any thread.
//!
//! This module also holds the task-facing entry points: [`spawn`],
//! [`async_call`], [`current`], and explicit suspension through
//! [`suspend`] / [`WakeHandle`].

mod builder;
mod core;
mod state;
mod suspend;
mod waker;

pub(crate) mod unwind;

pub(crate) use self::core::{BoxFuture, Task};

pub use self::core::{Priority, TaskId, TaskInfo};
pub use builder::TaskBuilder;
pub use state::TaskState;
pub use suspend::{Suspend, WakeHandle, Wakeup, suspend};

use crate::lcos::Future;
use crate::runtime::context;
use crate::runtime::scheduler::Spawn;

use std::future::Future as StdFuture;

/// Spawns a future on the pool of the calling task.
///
/// # Panics
///
/// Panics if called outside of a runtime worker thread. Use
/// [`Handle::spawn`](crate::Handle::spawn) from other threads.
pub fn spawn<F>(future: F) -> Future<F::Output>
where
    F: StdFuture + Send + 'static,
    F::Output: Send + 'static,
{
    let scheduler = context::current_scheduler()
        .expect("spawn must be called within the context of a runtime");

    scheduler.spawn(future, Spawn::default())
}

/// Runs a closure as a new task on the pool of the calling task.
///
/// # Panics
///
/// Panics if called outside of a runtime worker thread.
pub fn async_call<F, R>(f: F) -> Future<R>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    spawn(async move { f() })
}

/// Describes the task being polled on the current thread.
pub fn current() -> Option<TaskInfo> {
    context::current_task().map(|task| task.info())
}
