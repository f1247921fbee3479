use crate::runtime::Handle;
use crate::runtime::context;
use crate::runtime::timer::{Command, TimerHandle};

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

/// Creates a future that completes after `duration`.
///
/// Sleeping is a suspension point: the task gives up its worker and the
/// runtime's timer thread wakes it once the deadline passes.
///
/// # Panics
///
/// Panics if first polled outside of a runtime worker thread; use
/// [`Handle::sleep`] there.
///
/// # Examples
///
/// ```rust,ignore
/// sleep(Duration::from_millis(10)).await;
/// ```
pub fn sleep(duration: Duration) -> Sleep {
    Sleep::new(duration, None)
}

impl Handle {
    /// Creates a [`Sleep`] bound to this runtime's timer.
    pub fn sleep(&self, duration: Duration) -> Sleep {
        Sleep::new(duration, Some(self.timer().clone()))
    }
}

/// Future returned by [`sleep`].
///
/// Dropping it before the deadline cancels the timer.
pub struct Sleep {
    deadline: Instant,
    timer: Option<TimerHandle>,
    registered: bool,

    /// Cancellation flag shared with the timer entry.
    cancelled: Arc<AtomicBool>,
}

impl Sleep {
    pub(crate) fn new(duration: Duration, timer: Option<TimerHandle>) -> Self {
        Self {
            deadline: Instant::now() + duration,
            timer,
            registered: false,
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Instant at which the sleep completes.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }
}

impl Future for Sleep {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();

        if Instant::now() >= this.deadline {
            return Poll::Ready(());
        }

        if !this.registered {
            this.registered = true;

            let timer = match this.timer.take() {
                Some(timer) => timer,
                None => context::current_runtime()
                    .expect("Sleep polled outside of runtime")
                    .timer()
                    .clone(),
            };

            let sent = timer.send(Command::SetTimer {
                deadline: this.deadline,
                waker: cx.waker().clone(),
                cancelled: this.cancelled.clone(),
            });

            // No timer thread means the runtime is going away; do not
            // leave the task without a wake source.
            if sent.is_err() {
                return Poll::Ready(());
            }
        }

        Poll::Pending
    }
}

impl Drop for Sleep {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::Release);
    }
}
