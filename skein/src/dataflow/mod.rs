//! Dataflow composition over futures.
//!
//! [`dataflow`] attaches a combining function to a set of input futures.
//! Each input reports its completion to a shared countdown node; the input
//! that completes last schedules the function as a new task. No thread
//! blocks while inputs are outstanding.
//!
//! ```no_run
//! use skein::{Runtime, dataflow};
//!
//! let rt = Runtime::new().unwrap();
//!
//! let sum = rt.block_on(async {
//!     let a = skein::task::async_call(|| 2);
//!     let b = skein::task::async_call(|| 3);
//!     dataflow(|(a, b)| a + b, (a, b)).await
//! });
//!
//! assert_eq!(sum.unwrap(), 5);
//! ```

mod inputs;
mod node;

pub use inputs::{Arrival, Input, Inputs};

use crate::error::Error;
use crate::lcos::{Future, make_future_promise};
use crate::runtime::task::unwind::catch;
use crate::runtime::{Handle, Pool, Scheduler, Spawn, context};

use node::Node;

use std::sync::Arc;

/// Schedules `f` to run once every input has completed.
///
/// `f` receives the input values in order and its return value completes
/// the returned future. If any input fails, `f` never runs and the result
/// carries the first error that arrived. A panic in `f` completes the
/// result with [`Error::Panicked`](crate::Error::Panicked).
///
/// With no inputs, `f` is scheduled immediately.
///
/// # Panics
///
/// Panics when called outside a runtime. Use [`Handle::dataflow`] to pick a
/// runtime explicitly.
pub fn dataflow<I, F, R>(f: F, inputs: I) -> Future<R>
where
    I: Inputs,
    F: FnOnce(I::Values) -> R + Send + 'static,
    R: Send + 'static,
{
    let scheduler = context::current_scheduler()
        .expect("dataflow must be called within the context of a runtime");

    dataflow_on(&scheduler, f, inputs)
}

/// Future that completes with every input value once all inputs complete.
///
/// # Panics
///
/// Panics when called outside a runtime.
pub fn when_all<I: Inputs>(inputs: I) -> Future<I::Values> {
    dataflow(|values| values, inputs)
}

/// Blocks until every input has completed, discarding the outcomes.
///
/// On a worker thread this runs other tasks while waiting.
pub fn wait_all<I: Inputs>(inputs: I) {
    inputs.wait();
}

pub(crate) fn dataflow_on<I, F, R>(scheduler: &Arc<Scheduler>, f: F, inputs: I) -> Future<R>
where
    I: Inputs,
    F: FnOnce(I::Values) -> R + Send + 'static,
    R: Send + 'static,
{
    let (output, promise) = make_future_promise();

    // One extra arrival keeps the node from firing before `fire` is installed.
    let node = Node::new(inputs.count() + 1);
    inputs.subscribe(&mut || node.arrival());

    let scheduler = scheduler.clone();

    node.on_fire(Box::new(move |first_error: Option<Error>| {
        let run = move || {
            let outcome = match first_error {
                Some(error) => Err(error),
                None => inputs.take().and_then(|values| catch(|| f(values))),
            };

            let _ = promise.complete(outcome);
        };

        // A refused post drops `run` and breaks the promise.
        let _ = scheduler.post(run, Spawn::default());
    }));

    node.arrive(None);
    output
}

impl Handle {
    /// [`dataflow`] on this runtime's default pool.
    pub fn dataflow<I, F, R>(&self, f: F, inputs: I) -> Future<R>
    where
        I: Inputs,
        F: FnOnce(I::Values) -> R + Send + 'static,
        R: Send + 'static,
    {
        dataflow_on(self.default_scheduler(), f, inputs)
    }

    /// [`when_all`] on this runtime's default pool.
    pub fn when_all<I: Inputs>(&self, inputs: I) -> Future<I::Values> {
        self.dataflow(|values| values, inputs)
    }
}

impl Pool {
    /// [`dataflow`] with the combining function running on this pool.
    pub fn dataflow<I, F, R>(&self, f: F, inputs: I) -> Future<R>
    where
        I: Inputs,
        F: FnOnce(I::Values) -> R + Send + 'static,
        R: Send + 'static,
    {
        dataflow_on(self.scheduler(), f, inputs)
    }
}
