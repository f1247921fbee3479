use crate::error::{Error, Result};
use crate::runtime::context;
use crate::utils::lock;

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Wake, Waker};
use std::thread::{self, Thread};
use std::time::{Duration, Instant};

/// Callback invoked once a cell completes.
///
/// It receives a clone of the stored error, or `None` when the cell holds a
/// value. The value itself is read back from the cell by whoever needs it.
pub(crate) type Notify = Box<dyn FnOnce(Option<Error>) + Send>;

/// An entry in a cell's continuation list.
pub(crate) enum Continuation {
    /// A suspended task (or parked thread) to wake.
    Wake(Waker),

    /// A callback to run on the completing thread.
    Notify(Notify),
}

/// What the cell currently holds.
enum Slot<T> {
    Empty,
    Value(T),
    Error(Error),

    /// The value was moved out by the single owner of a unique future.
    Taken,
}

/// State guarded by the cell lock.
struct Inner<T> {
    slot: Slot<T>,
    continuations: Vec<Continuation>,
}

/// The completion record shared by a promise and its futures.
///
/// The slot and the continuation list form a single critical section. The
/// `ready` flag mirrors `slot != Empty` for lock-free probing; it is written
/// under the lock and never reset.
pub(crate) struct SharedState<T> {
    ready: AtomicBool,
    inner: Mutex<Inner<T>>,
}

impl<T> SharedState<T> {
    /// Creates an empty cell.
    pub(crate) fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                slot: Slot::Empty,
                continuations: Vec::new(),
            }),
        }
    }

    /// Creates a cell that is already complete.
    pub(crate) fn completed(outcome: Result<T>) -> Self {
        let slot = match outcome {
            Ok(value) => Slot::Value(value),
            Err(err) => Slot::Error(err),
        };

        Self {
            ready: AtomicBool::new(true),
            inner: Mutex::new(Inner {
                slot,
                continuations: Vec::new(),
            }),
        }
    }

    /// Non-blocking readiness probe.
    ///
    /// A `false` answer carries no ordering guarantee.
    pub(crate) fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Stores the outcome and fires every registered continuation.
    ///
    /// Fails with [`Error::PromiseAlreadySatisfied`] if the cell was already
    /// complete, leaving the stored outcome untouched. Continuations run
    /// after the lock is released so that they may freely touch the cell.
    pub(crate) fn complete(&self, outcome: Result<T>) -> Result<()> {
        let (error, continuations) = {
            let mut inner = lock(&self.inner);

            if !matches!(inner.slot, Slot::Empty) {
                return Err(Error::PromiseAlreadySatisfied);
            }

            let error = match outcome {
                Ok(value) => {
                    inner.slot = Slot::Value(value);
                    None
                }
                Err(err) => {
                    inner.slot = Slot::Error(err.clone());
                    Some(err)
                }
            };

            self.ready.store(true, Ordering::Release);
            (error, mem::take(&mut inner.continuations))
        };

        for continuation in continuations {
            match continuation {
                Continuation::Wake(waker) => waker.wake(),
                Continuation::Notify(notify) => notify(error.clone()),
            }
        }

        Ok(())
    }

    /// Registers `waker` unless the cell is already complete.
    ///
    /// Returns `true` when the cell is complete, in which case nothing was
    /// registered. The readiness check happens under the lock, so a
    /// completion racing with this call is never missed.
    pub(crate) fn register(&self, waker: &Waker) -> bool {
        let mut inner = lock(&self.inner);

        if !matches!(inner.slot, Slot::Empty) {
            return true;
        }

        let already = inner.continuations.iter().any(|c| match c {
            Continuation::Wake(w) => w.will_wake(waker),
            Continuation::Notify(_) => false,
        });

        if !already {
            inner.continuations.push(Continuation::Wake(waker.clone()));
        }

        false
    }

    /// Runs `notify` once the cell completes.
    ///
    /// If the cell is already complete, `notify` runs immediately on the
    /// calling thread.
    pub(crate) fn on_complete(&self, notify: Notify) {
        let error = {
            let mut inner = lock(&self.inner);

            match &inner.slot {
                Slot::Empty => {
                    inner.continuations.push(Continuation::Notify(notify));
                    return;
                }
                Slot::Error(err) => Some(err.clone()),
                Slot::Value(_) | Slot::Taken => None,
            }
        };

        notify(error);
    }

    /// Moves the outcome out of a completed cell.
    ///
    /// Returns `None` if the cell is still empty or was already taken.
    pub(crate) fn take(&self) -> Option<Result<T>> {
        let mut inner = lock(&self.inner);

        match mem::replace(&mut inner.slot, Slot::Taken) {
            Slot::Value(value) => Some(Ok(value)),
            Slot::Error(err) => {
                inner.slot = Slot::Error(err.clone());
                Some(Err(err))
            }
            Slot::Empty => {
                inner.slot = Slot::Empty;
                None
            }
            Slot::Taken => None,
        }
    }

    /// Clones the outcome out of a completed cell.
    pub(crate) fn peek(&self) -> Option<Result<T>>
    where
        T: Clone,
    {
        let inner = lock(&self.inner);

        match &inner.slot {
            Slot::Value(value) => Some(Ok(value.clone())),
            Slot::Error(err) => Some(Err(err.clone())),
            Slot::Empty | Slot::Taken => None,
        }
    }

    /// Removes `waker` from the continuation list, if it is there.
    fn deregister(&self, waker: &Waker) {
        lock(&self.inner).continuations.retain(|c| match c {
            Continuation::Wake(w) => !w.will_wake(waker),
            Continuation::Notify(_) => true,
        });
    }

    /// Blocks until the cell is complete.
    ///
    /// The OS thread is parked. On a worker thread the worker first hands
    /// its queues to a replacement thread, so the rest of the pool keeps
    /// running while the caller sleeps.
    ///
    /// Returns `false` if the caller's pool shut down before completion.
    pub(crate) fn wait(&self) -> bool {
        self.wait_until(None)
    }

    /// Blocks until the cell is complete or `timeout` elapses.
    ///
    /// Returns whether the cell is complete.
    pub(crate) fn wait_for(&self, timeout: Duration) -> bool {
        self.wait_until(Some(Instant::now() + timeout))
    }

    fn wait_until(&self, deadline: Option<Instant>) -> bool {
        if self.is_ready() {
            return true;
        }

        let blocking = context::block_in_place();

        PARKER.with(|waker| loop {
            if self.register(waker) {
                return true;
            }

            if blocking.as_ref().is_some_and(|b| b.interrupted()) {
                self.deregister(waker);
                return self.is_ready();
            }

            match deadline {
                None => thread::park(),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        self.deregister(waker);
                        return self.is_ready();
                    }
                    thread::park_timeout(deadline - now);
                }
            }
        })
    }

    #[cfg(test)]
    fn waiters(&self) -> usize {
        lock(&self.inner).continuations.len()
    }
}

thread_local! {
    /// One parking waker per thread, so repeated waits on the same cell
    /// register a single entry.
    static PARKER: Waker = Waker::from(Arc::new(Unpark(thread::current())));
}

/// Waker that unparks a blocked OS thread.
struct Unpark(Thread);

impl Wake for Unpark {
    fn wake(self: Arc<Self>) {
        self.0.unpark();
    }

    fn wake_by_ref(self: &Arc<Self>) {
        self.0.unpark();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_out_waits_leave_no_waiters() {
        let state = SharedState::<u32>::new();

        for _ in 0..100 {
            assert!(!state.wait_for(Duration::from_micros(50)));
        }

        assert_eq!(state.waiters(), 0);
    }

    #[test]
    fn test_waits_from_one_thread_share_a_waker() {
        let state = SharedState::<u32>::new();
        let waker = PARKER.with(Waker::clone);

        assert!(!state.register(&waker));
        assert!(!state.register(&waker));
        assert_eq!(state.waiters(), 1);

        state.complete(Ok(3)).unwrap();
        assert_eq!(state.waiters(), 0);
        assert!(state.wait_for(Duration::ZERO));
    }
}
