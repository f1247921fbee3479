use crate::runtime::Handle;
use crate::runtime::scheduler::Scheduler;
use crate::runtime::task::Task;

use std::cell::{Cell, RefCell};
use std::sync::Arc;

thread_local! {
    /// Runtime the current thread belongs to.
    ///
    /// Set for the lifetime of every worker thread, so that code running
    /// inside a task can spawn, build dataflows and sleep without passing
    /// handles around.
    static CURRENT_RUNTIME: RefCell<Option<Handle>> = const { RefCell::new(None) };

    /// Scheduler (pool) the current thread works for.
    static CURRENT_SCHEDULER: RefCell<Option<Arc<Scheduler>>> = const { RefCell::new(None) };

    /// Index of the current worker inside its scheduler.
    static CURRENT_WORKER_ID: Cell<Option<usize>> = const { Cell::new(None) };

    /// Set once a worker has handed its queues to a replacement thread. A
    /// retired worker exits after its current task.
    static RETIRED: Cell<bool> = const { Cell::new(false) };

    /// Task being polled on this thread.
    static CURRENT_TASK: RefCell<Option<Arc<Task>>> = const { RefCell::new(None) };
}

/// Installs `runtime` and `scheduler` as the thread context while `f` runs.
///
/// The previous context is restored afterwards.
pub(crate) fn enter_context<R>(
    runtime: Handle,
    scheduler: Arc<Scheduler>,
    f: impl FnOnce() -> R,
) -> R {
    let prev_runtime = CURRENT_RUNTIME.with(|r| r.replace(Some(runtime)));
    let prev_scheduler = CURRENT_SCHEDULER.with(|s| s.replace(Some(scheduler)));

    let out = f();

    CURRENT_SCHEDULER.with(|s| s.replace(prev_scheduler));
    CURRENT_RUNTIME.with(|r| r.replace(prev_runtime));

    out
}

pub(crate) fn set_worker(id: Option<usize>) {
    CURRENT_WORKER_ID.with(|cell| cell.set(id));
}

/// Runtime handle of the current thread, if any.
pub(crate) fn current_runtime() -> Option<Handle> {
    CURRENT_RUNTIME.with(|r| r.borrow().clone())
}

/// Scheduler of the current thread, if any.
pub(crate) fn current_scheduler() -> Option<Arc<Scheduler>> {
    CURRENT_SCHEDULER.with(|s| s.borrow().clone())
}

/// Worker index, if the current thread is a worker of `scheduler`.
pub(crate) fn current_worker_of(scheduler: &Arc<Scheduler>) -> Option<usize> {
    let id = CURRENT_WORKER_ID.with(Cell::get)?;

    CURRENT_SCHEDULER.with(|s| match s.borrow().as_ref() {
        Some(current) if Arc::ptr_eq(current, scheduler) => Some(id),
        _ => None,
    })
}

pub(crate) fn is_retired() -> bool {
    RETIRED.with(Cell::get)
}

pub(crate) fn retire() {
    RETIRED.with(|cell| cell.set(true));
}

/// Task currently being polled on this thread.
pub(crate) fn current_task() -> Option<Arc<Task>> {
    CURRENT_TASK.with(|t| t.borrow().clone())
}

/// Records `task` as the current task while `f` polls it.
pub(crate) fn with_task<R>(task: &Arc<Task>, f: impl FnOnce() -> R) -> R {
    let prev = CURRENT_TASK.with(|t| t.replace(Some(task.clone())));
    let out = f();
    CURRENT_TASK.with(|t| t.replace(prev));
    out
}

/// A worker thread blocked outside the scheduler.
///
/// While the guard lives the thread is enrolled with its pool, which unparks
/// it on shutdown.
pub(crate) struct Blocking {
    scheduler: Arc<Scheduler>,
}

impl Blocking {
    /// Whether the pool shut down while the thread was blocked.
    pub(crate) fn interrupted(&self) -> bool {
        self.scheduler.is_shutdown()
    }
}

impl Drop for Blocking {
    fn drop(&mut self) {
        self.scheduler.leave_blocking();
    }
}

/// Prepares the current thread for a blocking wait.
///
/// On a worker thread the worker's queues are handed to a replacement
/// thread (see [`Scheduler::enter_blocking`]). Returns `None` anywhere else.
pub(crate) fn block_in_place() -> Option<Blocking> {
    let scheduler = current_scheduler()?;
    let id = current_worker_of(&scheduler)?;

    scheduler.enter_blocking(id);
    Some(Blocking { scheduler })
}
