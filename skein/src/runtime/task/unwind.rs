use crate::error::{Error, Result};

use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::pin::Pin;
use std::task::{Context, Poll};

/// Wraps a future so that a panic while polling it becomes an
/// [`Error::Panicked`] output instead of unwinding into the worker loop.
pub(crate) struct CatchUnwind<F> {
    future: F,
}

impl<F> CatchUnwind<F> {
    pub(crate) fn new(future: F) -> Self {
        Self { future }
    }
}

impl<F: Future> Future for CatchUnwind<F> {
    type Output = Result<F::Output>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        // Safety: `future` is structurally pinned and never moved out.
        let future = unsafe { self.map_unchecked_mut(|this| &mut this.future) };

        match panic::catch_unwind(AssertUnwindSafe(|| future.poll(cx))) {
            Ok(Poll::Pending) => Poll::Pending,
            Ok(Poll::Ready(value)) => Poll::Ready(Ok(value)),
            Err(payload) => {
                let err = Error::from_panic(payload);
                log::warn!("{err}");
                Poll::Ready(Err(err))
            }
        }
    }
}

/// Runs a closure, converting a panic into [`Error::Panicked`].
pub(crate) fn catch<R>(f: impl FnOnce() -> R) -> Result<R> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|payload| {
        let err = Error::from_panic(payload);
        log::warn!("{err}");
        err
    })
}
