use super::state::{ACTIVE, NOTIFIED, PENDING, SUSPENDED, TERMINATED, TaskState};
use super::waker::make_waker;
use crate::runtime::context;
use crate::runtime::work_stealing::injector::Injector;

use std::cell::UnsafeCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, AtomicU64, Ordering};
use std::task::{Context, Poll};

use serde::Deserialize;

/// Boxed task body.
pub(crate) type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Unique identifier of a cooperative task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(u64);

impl TaskId {
    fn next() -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);
        TaskId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw identifier.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "task#{}", self.0)
    }
}

/// Scheduling hint for a task.
///
/// Workers always drain higher lanes first. There is no aging, so a steady
/// stream of high-priority work can starve lower lanes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    #[default]
    Normal,
    Low,
}

impl Priority {
    /// All priorities, highest first.
    pub(crate) const ALL: [Priority; 3] = [Priority::High, Priority::Normal, Priority::Low];

    /// Index of the run-queue lane for this priority.
    pub(crate) fn lane(self) -> usize {
        match self {
            Priority::High => 0,
            Priority::Normal => 1,
            Priority::Low => 2,
        }
    }
}

/// Snapshot of a task's identity and state, for diagnostics.
#[derive(Debug, Clone)]
pub struct TaskInfo {
    pub id: TaskId,
    pub state: TaskState,
    pub priority: Priority,
    /// Name of the pool that owns the task.
    pub pool: Arc<str>,
    pub description: Option<Arc<str>>,
}

/// A cooperative task: a boxed future plus its scheduling state.
///
/// The task is owned by one worker scheduler. It is polled only in the
/// `ACTIVE` state, which a single worker obtains by CAS from `PENDING`;
/// that exclusivity is what makes the `UnsafeCell` access sound.
pub(crate) struct Task {
    id: TaskId,
    priority: Priority,
    description: Option<Arc<str>>,
    pool: Arc<str>,

    /// Body of the task; dropped as soon as it completes.
    future: UnsafeCell<Option<BoxFuture>>,

    state: AtomicU8,

    /// Run queue of the owning scheduler, used to requeue on wake.
    injector: Arc<Injector>,
}

unsafe impl Send for Task {}
unsafe impl Sync for Task {}

impl Task {
    /// Creates a task in the `PENDING` state; the caller must queue it.
    pub(crate) fn new(
        future: BoxFuture,
        priority: Priority,
        description: Option<Arc<str>>,
        pool: Arc<str>,
        injector: Arc<Injector>,
    ) -> Self {
        Self {
            id: TaskId::next(),
            priority,
            description,
            pool,
            future: UnsafeCell::new(Some(future)),
            state: AtomicU8::new(PENDING),
            injector,
        }
    }

    pub(crate) fn id(&self) -> TaskId {
        self.id
    }

    pub(crate) fn priority(&self) -> Priority {
        self.priority
    }

    pub(crate) fn state(&self) -> TaskState {
        TaskState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub(crate) fn info(&self) -> TaskInfo {
        TaskInfo {
            id: self.id,
            state: self.state(),
            priority: self.priority,
            pool: self.pool.clone(),
            description: self.description.clone(),
        }
    }

    /// Dispatches the task on the calling worker thread.
    ///
    /// Moves `PENDING → ACTIVE`, polls the body once, then either
    /// terminates, suspends, or requeues itself if it was woken while
    /// active.
    pub(crate) fn run(self: Arc<Self>) {
        if self
            .state
            .compare_exchange(PENDING, ACTIVE, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        let waker = make_waker(self.clone());
        let mut cx = Context::from_waker(&waker);

        // Safety: the ACTIVE state guarantees that no other thread touches the body.
        let poll = context::with_task(&self, || unsafe {
            match &mut *self.future.get() {
                Some(future) => future.as_mut().poll(&mut cx),
                None => Poll::Ready(()),
            }
        });

        match poll {
            Poll::Pending => {
                if self
                    .state
                    .compare_exchange(ACTIVE, SUSPENDED, Ordering::AcqRel, Ordering::Acquire)
                    .is_err()
                {
                    // Woken during the poll.
                    self.state.store(PENDING, Ordering::Release);
                    self.injector.push(self.clone());
                } else {
                    log::trace!("{} suspended", self.id);
                }
            }
            Poll::Ready(()) => {
                // Safety: still ACTIVE, so the body is exclusively ours.
                unsafe {
                    *self.future.get() = None;
                }
                self.state.store(TERMINATED, Ordering::Release);
                log::trace!("{} terminated", self.id);
            }
        }
    }

    /// Makes the task runnable again.
    ///
    /// `SUSPENDED → PENDING` pushes the task onto its scheduler; an active
    /// task is flagged `NOTIFIED` so that it requeues after its poll. Any
    /// other state makes the wake a no-op, which is what lets several wake
    /// sources race for the same suspension.
    pub(crate) fn wake(self: Arc<Self>) {
        loop {
            match self.state.load(Ordering::Acquire) {
                SUSPENDED => {
                    if self
                        .state
                        .compare_exchange(SUSPENDED, PENDING, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        log::trace!("{} woken", self.id);
                        self.injector.push(self.clone());
                        return;
                    }
                }
                ACTIVE => {
                    if self
                        .state
                        .compare_exchange(ACTIVE, NOTIFIED, Ordering::AcqRel, Ordering::Acquire)
                        .is_ok()
                    {
                        return;
                    }
                }
                _ => return,
            }
        }
    }

    /// Drops the body of a task that will never be dispatched.
    ///
    /// Used when a scheduler shuts down with work still queued.
    pub(crate) fn discard(&self) {
        if self
            .state
            .compare_exchange(PENDING, TERMINATED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            // Safety: a task moved out of PENDING by this CAS is never polled again.
            unsafe {
                *self.future.get() = None;
            }
        }
    }
}
