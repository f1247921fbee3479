use super::core::Scheduler;
use crate::runtime::context;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// One OS worker thread of a scheduler.
///
/// The loop is:
/// 1. find a pending task (own queue, injector, siblings; by priority),
/// 2. run it until it terminates or suspends,
/// 3. park when nothing is runnable.
///
/// A worker that retired while blocked in its task leaves the loop as soon
/// as that task returns; its replacement owns the queue from then on.
pub(crate) struct Worker {
    id: usize,
    scheduler: Arc<Scheduler>,
}

impl Worker {
    pub(crate) fn new(id: usize, scheduler: Arc<Scheduler>) -> Self {
        Self { id, scheduler }
    }

    /// Runs the dispatch loop until `shutdown` is raised.
    pub(crate) fn run(&self, shutdown: Arc<AtomicBool>) {
        context::set_worker(Some(self.id));
        log::debug!("worker {} of `{}` running", self.id, self.scheduler.name());

        loop {
            if shutdown.load(Ordering::Acquire) {
                break;
            }

            if let Some(task) = self.scheduler.find_task(self.id) {
                task.run();

                if context::is_retired() {
                    self.scheduler.retired_exit();
                    break;
                }
                continue;
            }

            self.scheduler.park();
        }

        context::set_worker(None);
        log::debug!("worker {} of `{}` exiting", self.id, self.scheduler.name());
    }
}
