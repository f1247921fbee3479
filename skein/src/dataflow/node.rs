use crate::error::Error;
use crate::lcos::state::Notify;
use crate::utils::lock;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Countdown record behind one dataflow invocation.
///
/// Every input decrements `outstanding` once when it completes. The single
/// arrival that observes the counter reach zero takes `fire` and runs it;
/// the atomic decrement is what makes the firing unique.
///
/// The first failing input to arrive records its error; later errors are
/// dropped. Which of several concurrently failing inputs wins is
/// arbitrary.
pub(crate) struct Node {
    outstanding: AtomicUsize,
    first_error: OnceLock<Error>,
    fire: Mutex<Option<Notify>>,
}

impl Node {
    /// Creates a node expecting `arrivals` calls to [`arrive`](Self::arrive).
    pub(crate) fn new(arrivals: usize) -> Arc<Self> {
        Arc::new(Self {
            outstanding: AtomicUsize::new(arrivals),
            first_error: OnceLock::new(),
            fire: Mutex::new(None),
        })
    }

    /// Installs the function run when the count reaches zero.
    pub(crate) fn on_fire(&self, fire: Notify) {
        *lock(&self.fire) = Some(fire);
    }

    /// Records one completed input.
    pub(crate) fn arrive(&self, error: Option<Error>) {
        if let Some(error) = error {
            let _ = self.first_error.set(error);
        }

        if self.outstanding.fetch_sub(1, Ordering::AcqRel) == 1 {
            let fire = lock(&self.fire).take();

            if let Some(fire) = fire {
                log::trace!("dataflow node firing");
                fire(self.first_error.get().cloned());
            }
        }
    }

    /// A continuation that reports one arrival to this node.
    pub(crate) fn arrival(self: &Arc<Self>) -> Notify {
        let node = self.clone();
        Box::new(move |error| node.arrive(error))
    }
}
