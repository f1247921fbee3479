use super::future::{Future, chain};
use super::state::SharedState;
use crate::error::{Error, Result};
use crate::runtime::{Pool, context};

use std::future::Future as StdFuture;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// A future with any number of independent readers.
///
/// Every clone observes the same outcome; `get` hands out clones of the
/// stored value or error.
pub struct SharedFuture<T> {
    state: Arc<SharedState<T>>,
}

impl<T> Clone for SharedFuture<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
        }
    }
}

impl<T: Clone> SharedFuture<T> {
    pub(crate) fn from_state(state: Arc<SharedState<T>>) -> Self {
        Self { state }
    }

    pub(crate) fn state(&self) -> &Arc<SharedState<T>> {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state.is_ready()
    }

    pub fn wait(&self) {
        let _ = self.state.wait();
    }

    pub fn wait_for(&self, timeout: Duration) -> bool {
        self.state.wait_for(timeout)
    }

    /// Blocks until the cell completes and returns a clone of its outcome.
    pub fn get(&self) -> Result<T> {
        if !self.state.wait() {
            return Err(Error::Shutdown);
        }
        self.state.peek().unwrap_or(Err(Error::BrokenPromise))
    }

    /// Attaches a continuation that receives a clone of the outcome.
    ///
    /// Scheduling follows [`Future::then`].
    pub fn then<U, F>(&self, f: F) -> Future<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(Result<T>) -> U + Send + 'static,
    {
        chain(self.state.clone(), SharedState::peek, context::current_scheduler(), f)
    }

    /// Like [`then`](Self::then), but the continuation always runs on `pool`.
    pub fn then_on<U, F>(&self, pool: &Pool, f: F) -> Future<U>
    where
        T: Send + 'static,
        U: Send + 'static,
        F: FnOnce(Result<T>) -> U + Send + 'static,
    {
        chain(self.state.clone(), SharedState::peek, Some(pool.scheduler().clone()), f)
    }
}

impl<T: Clone> StdFuture for SharedFuture<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<T>> {
        if self.state.register(cx.waker()) {
            return Poll::Ready(self.state.peek().unwrap_or(Err(Error::BrokenPromise)));
        }

        Poll::Pending
    }
}

impl<T: Clone> From<Future<T>> for SharedFuture<T> {
    fn from(future: Future<T>) -> Self {
        future.share()
    }
}
