use super::future::Future;
use super::state::SharedState;
use crate::error::{Error, Result};

use std::sync::Arc;

/// Creates a connected future/promise pair around a fresh shared-state
/// cell.
///
/// # Examples
///
/// ```rust,ignore
/// let (future, promise) = make_future_promise();
/// std::thread::spawn(move || promise.set_value(7));
/// assert_eq!(future.get()?, 7);
/// ```
pub fn make_future_promise<T>() -> (Future<T>, Promise<T>) {
    let state = Arc::new(SharedState::new());

    (
        Future::from_state(state.clone()),
        Promise { state },
    )
}

/// Write side of a shared-state cell.
///
/// A promise is satisfied at most once. Dropping an unsatisfied promise
/// completes its futures with [`Error::BrokenPromise`].
pub struct Promise<T> {
    state: Arc<SharedState<T>>,
}

impl<T> Promise<T> {
    /// Stores `value` and wakes every waiter.
    ///
    /// # Errors
    ///
    /// [`Error::PromiseAlreadySatisfied`] if the promise already holds a
    /// value or an error; the stored outcome is left unchanged.
    pub fn set_value(&self, value: T) -> Result<()> {
        self.complete(Ok(value))
    }

    /// Stores `error`; every reader will observe it.
    ///
    /// # Errors
    ///
    /// [`Error::PromiseAlreadySatisfied`], as for [`set_value`](Self::set_value).
    pub fn set_error(&self, error: Error) -> Result<()> {
        self.complete(Err(error))
    }

    /// Whether a value or an error has been stored.
    pub fn is_satisfied(&self) -> bool {
        self.state.is_ready()
    }

    pub(crate) fn complete(&self, outcome: Result<T>) -> Result<()> {
        self.state.complete(outcome)
    }
}

impl<T> Drop for Promise<T> {
    fn drop(&mut self) {
        if !self.state.is_ready() && self.state.complete(Err(Error::BrokenPromise)).is_ok() {
            log::debug!("promise dropped before being satisfied");
        }
    }
}

/// Object-safe write access to a cell.
///
/// Lets a layer that fulfils promises from outside the process (for
/// example after deserializing a reply) hold a `Box<dyn Fulfill<T>>`
/// without depending on [`Promise`] itself.
pub trait Fulfill<T>: Send + Sync {
    fn set_value(&self, value: T) -> Result<()>;

    fn set_error(&self, error: Error) -> Result<()>;
}

impl<T: Send> Fulfill<T> for Promise<T> {
    fn set_value(&self, value: T) -> Result<()> {
        Promise::set_value(self, value)
    }

    fn set_error(&self, error: Error) -> Result<()> {
        Promise::set_error(self, error)
    }
}
