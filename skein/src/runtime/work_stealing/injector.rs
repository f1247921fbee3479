use super::queue::Lanes;
use crate::runtime::task::{Priority, Task};
use crate::utils::lock;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

/// Upper bound on a single park, so that work pushed to another worker's
/// local queue is eventually stolen even without a notification.
const PARK_TIMEOUT: Duration = Duration::from_millis(1);

/// Shared run queue of one worker scheduler.
///
/// Every push that does not come from a worker of the same scheduler lands
/// here: spawns from outside the pool, and every wake. Idle workers park on
/// the condition variable.
pub(crate) struct Injector {
    queue: Mutex<Lanes>,
    condvar: Condvar,
    shutdown: AtomicBool,
}

impl Injector {
    pub(crate) fn new() -> Self {
        Injector {
            queue: Mutex::new(Lanes::new()),
            condvar: Condvar::new(),
            shutdown: AtomicBool::new(false),
        }
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Stops accepting tasks, wakes every parked worker and discards
    /// whatever is still queued.
    pub(crate) fn shutdown(&self) {
        let drained = {
            let mut queue = lock(&self.queue);
            self.shutdown.store(true, Ordering::Release);
            queue.drain()
        };
        self.condvar.notify_all();

        for task in &drained {
            task.discard();
        }
    }

    /// Queues a task and wakes one parked worker.
    ///
    /// After shutdown the task is discarded instead.
    pub(crate) fn push(&self, task: Arc<Task>) {
        {
            let mut queue = lock(&self.queue);
            if !self.is_shutdown() {
                queue.push(task);
                drop(queue);
                self.condvar.notify_one();
                return;
            }
        }

        task.discard();
    }

    /// Wakes one parked worker without queueing anything.
    pub(crate) fn notify(&self) {
        self.condvar.notify_one();
    }

    /// Parks the calling worker until work arrives, shutdown starts, or
    /// the park timeout elapses.
    pub(crate) fn park(&self) {
        let queue = lock(&self.queue);

        if self.is_shutdown() || !queue.is_empty() {
            return;
        }

        let _ = self.condvar.wait_timeout(queue, PARK_TIMEOUT);
    }

    /// Takes the oldest task of the given priority.
    pub(crate) fn steal(&self, priority: Priority) -> Option<Arc<Task>> {
        lock(&self.queue).pop_front(priority)
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.queue).len()
    }
}
