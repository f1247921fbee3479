use crate::runtime::task::{Priority, Task};
use crate::utils::lock;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One deque per priority, highest priority first.
pub(crate) struct Lanes {
    lanes: [VecDeque<Arc<Task>>; 3],
}

impl Lanes {
    pub(crate) fn new() -> Self {
        Self {
            lanes: [VecDeque::new(), VecDeque::new(), VecDeque::new()],
        }
    }

    /// Appends the task to the lane matching its priority.
    pub(crate) fn push(&mut self, task: Arc<Task>) {
        self.lanes[task.priority().lane()].push_back(task);
    }

    pub(crate) fn pop_back(&mut self, priority: Priority) -> Option<Arc<Task>> {
        self.lanes[priority.lane()].pop_back()
    }

    pub(crate) fn pop_front(&mut self, priority: Priority) -> Option<Arc<Task>> {
        self.lanes[priority.lane()].pop_front()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lanes.iter().all(VecDeque::is_empty)
    }

    pub(crate) fn len(&self) -> usize {
        self.lanes.iter().map(VecDeque::len).sum()
    }

    /// Removes every queued task.
    pub(crate) fn drain(&mut self) -> Vec<Arc<Task>> {
        self.lanes.iter_mut().flat_map(|lane| lane.drain(..)).collect()
    }
}

/// A per-worker run queue.
///
/// The owning worker pushes and pops at the back of each lane (LIFO, for
/// locality); other workers steal from the front (FIFO).
pub(crate) struct LocalQueue {
    inner: Mutex<Lanes>,
}

impl LocalQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(Lanes::new()),
        }
    }

    pub(crate) fn push(&self, task: Arc<Task>) {
        lock(&self.inner).push(task);
    }

    pub(crate) fn pop(&self, priority: Priority) -> Option<Arc<Task>> {
        lock(&self.inner).pop_back(priority)
    }

    pub(crate) fn steal(&self, priority: Priority) -> Option<Arc<Task>> {
        lock(&self.inner).pop_front(priority)
    }

    pub(crate) fn len(&self) -> usize {
        lock(&self.inner).len()
    }

    /// Empties the queue. The tasks are returned so that they are dropped
    /// after the lock is released.
    pub(crate) fn drain(&self) -> Vec<Arc<Task>> {
        lock(&self.inner).drain()
    }
}
