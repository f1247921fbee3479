//! Re-running fallible work.
//!
//! [`replay`] drives a factory of futures, starting a fresh attempt each
//! time the previous one asks to be retried. [`dataflow_replay`] and
//! [`dataflow_replay_validate`] apply the same policy to the combining
//! function of a [`dataflow`](crate::dataflow()).
//!
//! An attempt reports an [`Attempt`]: success, a failure worth retrying, or
//! a hard failure that ends the replay at once. Plain `Result`s convert
//! into `Attempt`, with every error treated as retryable.

use crate::dataflow::{Inputs, dataflow_on};
use crate::error::{Error, Result};
use crate::lcos::{Future, make_future_promise};
use crate::runtime::task::unwind::catch;
use crate::runtime::{Handle, Scheduler, Spawn, context};
use crate::time::{Sleep, sleep};

use std::future::{Future as StdFuture, ready};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// Outcome of one attempt.
#[derive(Debug)]
pub enum Attempt<T> {
    /// The attempt produced a value.
    Success(T),
    /// The attempt failed and may be retried.
    Retry(Error),
    /// The attempt failed and must not be retried.
    Fail(Error),
}

/// `Err` is retried, except for contract violations
/// ([`Error::is_contract_violation`]) which fail at once.
impl<T, E: Into<Error>> From<Result<T, E>> for Attempt<T> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => Attempt::Success(value),
            Err(error) => {
                let error = error.into();
                if error.is_contract_violation() {
                    Attempt::Fail(error)
                } else {
                    Attempt::Retry(error)
                }
            }
        }
    }
}

type Validator<T> = Box<dyn Fn(&T) -> bool + Send>;

/// Runs futures produced by `factory` until one succeeds, at most
/// `times + 1` attempts in total.
///
/// The error of the last attempt is returned once the attempts are used up.
///
/// ```no_run
/// use skein::replay::replay;
///
/// # async fn f() {
/// let mut calls = 0;
/// let value = replay(3, move || {
///     calls += 1;
///     let outcome = if calls < 3 { Err(skein::Error::msg("flaky")) } else { Ok(calls) };
///     async move { outcome }
/// })
/// .await;
///
/// assert_eq!(value.unwrap(), 3);
/// # }
/// ```
pub fn replay<G, F, T>(times: usize, factory: G) -> Replay<G, F, T>
where
    G: FnMut() -> F,
    F: StdFuture,
    F::Output: Into<Attempt<T>>,
{
    Replay {
        factory,
        future: None,
        delay: None,
        remaining: times,
        attempts: 0,
        interval: Duration::ZERO,
        validate: None,
    }
}

/// Future returned by [`replay`].
#[must_use = "futures do nothing unless you `.await` or poll them"]
pub struct Replay<G, F, T> {
    factory: G,
    future: Option<Pin<Box<F>>>,
    delay: Option<Sleep>,

    remaining: usize,
    attempts: usize,
    interval: Duration,
    validate: Option<Validator<T>>,
}

// The factory is only called through `&mut`, and attempts are boxed.
impl<G, F, T> Unpin for Replay<G, F, T> {}

impl<G, F, T> Replay<G, F, T> {
    /// Waits `interval` between attempts. Requires a runtime context.
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Treats a successful value rejected by `validate` as a retryable
    /// failure.
    pub fn validate<V>(mut self, validate: V) -> Self
    where
        V: Fn(&T) -> bool + Send + 'static,
    {
        self.validate = Some(Box::new(validate));
        self
    }

    /// Number of attempts started so far.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    fn classify(&self, attempt: Attempt<T>) -> Attempt<T> {
        match attempt {
            Attempt::Success(value) => match &self.validate {
                Some(validate) if !validate(&value) => Attempt::Retry(Error::ValidationRejected {
                    attempts: self.attempts,
                }),
                _ => Attempt::Success(value),
            },
            other => other,
        }
    }
}

impl<G, F, T> StdFuture for Replay<G, F, T>
where
    G: FnMut() -> F,
    F: StdFuture,
    F::Output: Into<Attempt<T>>,
{
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        loop {
            if let Some(delay) = this.delay.as_mut() {
                match Pin::new(delay).poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(()) => this.delay = None,
                }
            }

            let attempts = &mut this.attempts;
            let factory = &mut this.factory;
            let future = this.future.get_or_insert_with(|| {
                *attempts += 1;
                Box::pin(factory())
            });

            let outcome = match future.as_mut().poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(outcome) => outcome.into(),
            };
            this.future = None;

            match this.classify(outcome) {
                Attempt::Success(value) => return Poll::Ready(Ok(value)),
                Attempt::Fail(error) => return Poll::Ready(Err(error)),
                Attempt::Retry(error) if this.remaining == 0 => {
                    log::debug!("giving up after {} attempts: {error}", this.attempts);
                    return Poll::Ready(Err(error));
                }
                Attempt::Retry(error) => {
                    this.remaining -= 1;
                    log::debug!("attempt {} rejected, retrying: {error}", this.attempts);

                    if !this.interval.is_zero() {
                        this.delay = Some(sleep(this.interval));
                    }
                }
            }
        }
    }
}

/// Like [`dataflow`](crate::dataflow()), re-running `f` on failure.
///
/// `f` sees the input values by reference and may run up to `times + 1`
/// times. An error returned by `f` or a panic inside it is retried; the
/// last failure is reported when every attempt fails. A failed input is
/// never retried: the result carries its error and `f` does not run.
///
/// # Panics
///
/// Panics when called outside a runtime.
pub fn dataflow_replay<I, F, O, R>(times: usize, f: F, inputs: I) -> Future<R>
where
    I: Inputs,
    F: FnMut(&I::Values) -> O + Send + 'static,
    O: Into<Attempt<R>>,
    R: Send + 'static,
{
    let scheduler = current_scheduler("dataflow_replay");
    replay_on(&scheduler, times, None, f, inputs)
}

/// Like [`dataflow_replay`], also re-running `f` when `validate` rejects
/// its value.
///
/// When every attempt is rejected the result fails with
/// [`Error::ValidationRejected`].
///
/// # Panics
///
/// Panics when called outside a runtime.
pub fn dataflow_replay_validate<I, V, F, O, R>(
    times: usize,
    validate: V,
    f: F,
    inputs: I,
) -> Future<R>
where
    I: Inputs,
    V: Fn(&R) -> bool + Send + 'static,
    F: FnMut(&I::Values) -> O + Send + 'static,
    O: Into<Attempt<R>>,
    R: Send + 'static,
{
    let scheduler = current_scheduler("dataflow_replay_validate");
    replay_on(&scheduler, times, Some(Box::new(validate)), f, inputs)
}

fn current_scheduler(caller: &str) -> Arc<Scheduler> {
    match context::current_scheduler() {
        Some(scheduler) => scheduler,
        None => panic!("{caller} must be called within the context of a runtime"),
    }
}

fn replay_on<I, F, O, R>(
    scheduler: &Arc<Scheduler>,
    times: usize,
    validate: Option<Validator<R>>,
    mut f: F,
    inputs: I,
) -> Future<R>
where
    I: Inputs,
    F: FnMut(&I::Values) -> O + Send + 'static,
    O: Into<Attempt<R>>,
    R: Send + 'static,
{
    let (output, promise) = make_future_promise();
    let gathered = dataflow_on(scheduler, |values| values, inputs);

    let _ = scheduler.spawn(
        async move {
            let outcome = match gathered.await {
                Ok(values) => {
                    let attempt = move || {
                        let outcome = match catch(|| f(&values)) {
                            Ok(outcome) => outcome.into(),
                            Err(panic) => Attempt::Retry(panic),
                        };
                        ready(outcome)
                    };

                    let mut replay = replay(times, attempt);
                    replay.validate = validate;
                    replay.await
                }
                Err(error) => Err(error),
            };

            let _ = promise.complete(outcome);
        },
        Spawn::default(),
    );

    output
}

impl Handle {
    /// [`dataflow_replay`] on this runtime's default pool.
    pub fn dataflow_replay<I, F, O, R>(&self, times: usize, f: F, inputs: I) -> Future<R>
    where
        I: Inputs,
        F: FnMut(&I::Values) -> O + Send + 'static,
        O: Into<Attempt<R>>,
        R: Send + 'static,
    {
        replay_on(self.default_scheduler(), times, None, f, inputs)
    }

    /// [`dataflow_replay_validate`] on this runtime's default pool.
    pub fn dataflow_replay_validate<I, V, F, O, R>(
        &self,
        times: usize,
        validate: V,
        f: F,
        inputs: I,
    ) -> Future<R>
    where
        I: Inputs,
        V: Fn(&R) -> bool + Send + 'static,
        F: FnMut(&I::Values) -> O + Send + 'static,
        O: Into<Attempt<R>>,
        R: Send + 'static,
    {
        replay_on(self.default_scheduler(), times, Some(Box::new(validate)), f, inputs)
    }
}
