//! Task lifecycle states.
//!
//! The raw values live in an `AtomicU8` inside each task. `NOTIFIED` is an
//! internal refinement of *active*: the task was woken while running and
//! must be queued again as soon as its current poll returns.

use std::fmt;

/// Task is parked on a wake source and holds no OS thread.
pub(crate) const SUSPENDED: u8 = 0;

/// Task sits in a run queue waiting for dispatch.
pub(crate) const PENDING: u8 = 1;

/// Task is being polled by exactly one worker thread.
pub(crate) const ACTIVE: u8 = 2;

/// Task was woken while active.
pub(crate) const NOTIFIED: u8 = 3;

/// Task body returned; the task will never run again.
pub(crate) const TERMINATED: u8 = 4;

/// Observable state of a cooperative task.
///
/// Transitions:
///
/// ```text
/// pending ──dispatch──▶ active ──finish──▶ terminated
///    ▲                    │
///    └──wake── suspended ◀┘ suspend
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskState {
    /// Running on a worker thread.
    Active,
    /// Queued, waiting for a worker.
    Pending,
    /// Waiting on a registered wake source.
    Suspended,
    /// Finished.
    Terminated,
}

impl TaskState {
    pub(crate) fn from_raw(raw: u8) -> Self {
        match raw {
            SUSPENDED => TaskState::Suspended,
            PENDING => TaskState::Pending,
            ACTIVE | NOTIFIED => TaskState::Active,
            _ => TaskState::Terminated,
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TaskState::Active => "active",
            TaskState::Pending => "pending",
            TaskState::Suspended => "suspended",
            TaskState::Terminated => "terminated",
        };
        f.write_str(name)
    }
}
