use super::core::Handle;
use super::scheduler::Spawn;
use super::task::unwind::catch;
use super::task::{Wakeup, suspend};
use crate::error::{Error, Result};
use crate::utils::lock;

use std::future::Future as StdFuture;
use std::sync::{Arc, Mutex};

impl Handle {
    /// Runs a blocking closure on another pool without blocking the
    /// calling task's worker.
    ///
    /// The calling task posts `f` to `pool`, suspends, and is made pending
    /// again by the completion callback once `f` returns. Typical use is a
    /// pool reserved for device or file I/O:
    ///
    /// ```rust,ignore
    /// let bytes = handle.offload("io", move || std::fs::read(path)).await??;
    /// ```
    ///
    /// # Errors
    ///
    /// [`Error::UnknownPool`] for an unknown pool, [`Error::Shutdown`] if the
    /// target pool drops the work, [`Error::Panicked`] if `f` panics.
    pub fn offload<F, R>(&self, pool: &str, f: F) -> impl StdFuture<Output = Result<R>> + Send + 'static
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let target = self.scheduler(pool).cloned();

        async move {
            let target = target?;
            let slot: Arc<Mutex<Option<Result<R>>>> = Arc::new(Mutex::new(None));
            let result = slot.clone();

            let wakeup = suspend("offload", move |wake| {
                // If the post fails the closure, and with it `wake`, is
                // dropped, which ends the suspension as abandoned.
                let _ = target.post(
                    move || {
                        *lock(&result) = Some(catch(f));
                        wake.wake();
                    },
                    Spawn::default(),
                );
            })
            .await;

            match wakeup {
                Wakeup::Woken => lock(&slot).take().unwrap_or(Err(Error::BrokenPromise)),
                Wakeup::Abandoned => Err(Error::Shutdown),
            }
        }
    }
}
