use super::promise::make_future_promise;
use super::shared::SharedFuture;
use super::state::SharedState;
use crate::error::{Error, Result};
use crate::runtime::task::unwind::catch;
use crate::runtime::{Pool, Scheduler, Spawn, context};

use std::future::Future as StdFuture;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// Read side of a shared-state cell, with a single owner.
///
/// A `Future` can be consumed in three ways:
///
/// - [`get`](Self::get) blocks until the cell completes. On a worker
///   thread another thread takes over the worker's queues meanwhile.
/// - `.await` suspends the calling task until the cell completes.
/// - [`then`](Self::then) attaches a continuation.
///
/// Use [`share`](Self::share) to obtain a cloneable [`SharedFuture`].
#[must_use = "a future does nothing unless it is waited on, awaited, or chained"]
pub struct Future<T> {
    state: Arc<SharedState<T>>,
}

impl<T> Future<T> {
    pub(crate) fn from_state(state: Arc<SharedState<T>>) -> Self {
        Self { state }
    }

    pub(crate) fn state(&self) -> &Arc<SharedState<T>> {
        &self.state
    }

    /// A future that is already complete with `value`.
    pub fn ready(value: T) -> Self {
        Self::from_state(Arc::new(SharedState::completed(Ok(value))))
    }

    /// A future that is already complete with `error`.
    pub fn failed(error: Error) -> Self {
        Self::from_state(Arc::new(SharedState::completed(Err(error))))
    }

    /// Non-blocking probe. A `false` result may be stale by the time it is
    /// read; only [`get`](Self::get) and `.await` synchronize.
    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    /// Blocks until the cell completes, without consuming the future.
    pub fn wait(&self) {
        let _ = self.state.wait();
    }

    /// Blocks for at most `timeout`. Returns whether the cell completed.
    pub fn wait_for(&self, timeout: Duration) -> bool {
        self.state.wait_for(timeout)
    }

    /// Blocks until the cell completes and returns its outcome.
    ///
    /// An error stored in the cell is returned as `Err`. A task blocked
    /// here when its pool shuts down gets [`Error::Shutdown`].
    pub fn get(self) -> Result<T> {
        if !self.state.wait() {
            return Err(Error::Shutdown);
        }
        self.state.take().unwrap_or(Err(Error::BrokenPromise))
    }

    /// Converts into a future that any number of readers may share.
    pub fn share(self) -> SharedFuture<T>
    where
        T: Clone,
    {
        SharedFuture::from_state(self.state)
    }

    /// Attaches a continuation.
    ///
    /// `f` receives the outcome of this future and its return value
    /// completes the returned future; a panic in `f` completes it with
    /// [`Error::Panicked`]. The continuation runs as a task on the pool that
    /// is current when `then` is called, or inline on the completing thread
    /// when called outside a runtime.
    pub fn then<U, F>(self, f: F) -> Future<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(Result<T>) -> U + Send + 'static,
    {
        self.chain(context::current_scheduler(), f)
    }

    /// Like [`then`](Self::then), but the continuation always runs on `pool`.
    pub fn then_on<U, F>(self, pool: &Pool, f: F) -> Future<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(Result<T>) -> U + Send + 'static,
    {
        self.chain(Some(pool.scheduler().clone()), f)
    }

    fn chain<U, F>(self, scheduler: Option<Arc<Scheduler>>, f: F) -> Future<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(Result<T>) -> U + Send + 'static,
    {
        chain(self.state, SharedState::take, scheduler, f)
    }
}

/// Completes a new future with `f` applied to the outcome of `state`, read
/// with `read` once the cell completes.
///
/// `f` runs as a task posted to `scheduler`, or inline on the completing
/// thread without one.
pub(super) fn chain<T, U, F>(
    state: Arc<SharedState<T>>,
    read: fn(&SharedState<T>) -> Option<Result<T>>,
    scheduler: Option<Arc<Scheduler>>,
    f: F,
) -> Future<U>
where
    T: Send + 'static,
    U: Send + 'static,
    F: FnOnce(Result<T>) -> U + Send + 'static,
{
    let (output, promise) = make_future_promise();
    let source = state.clone();

    state.on_complete(Box::new(move |_| {
        let run = move || {
            let input = read(&source).unwrap_or(Err(Error::BrokenPromise));
            let _ = promise.complete(catch(|| f(input)));
        };

        match scheduler {
            // A refused post drops `run` and breaks the promise.
            Some(scheduler) => {
                let _ = scheduler.post(run, Spawn::default());
            }
            None => run(),
        }
    }));

    output
}

impl<T> StdFuture for Future<T> {
    type Output = Result<T>;

    /// Registers the task in the cell's waiter list, or takes the outcome
    /// if the cell is complete.
    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<T>> {
        if self.state.register(cx.waker()) {
            return Poll::Ready(self.state.take().unwrap_or(Err(Error::BrokenPromise)));
        }

        Poll::Pending
    }
}

impl<T> std::fmt::Debug for Future<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Future")
            .field("ready", &self.is_ready())
            .finish()
    }
}
