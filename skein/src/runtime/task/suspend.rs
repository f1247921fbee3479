use super::TaskId;
use crate::runtime::context;
use crate::utils::lock;

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

/// How a suspension ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wakeup {
    /// A [`WakeHandle`] was woken explicitly.
    Woken,
    /// Every [`WakeHandle`] was dropped without waking.
    Abandoned,
}

/// Shared between a [`Suspend`] future and its wake handles.
struct WakeSlot {
    woken: AtomicBool,
    abandoned: AtomicBool,
    waker: Mutex<Option<Waker>>,
}

impl WakeSlot {
    /// Fires the wake at most once. Returns whether this call won.
    fn fire(&self) -> bool {
        if self.woken.swap(true, Ordering::AcqRel) {
            return false;
        }

        if let Some(waker) = lock(&self.waker).take() {
            waker.wake();
        }

        true
    }
}

/// Last clone of a [`WakeHandle`] going away counts as a wake, so a
/// suspended task can never be left without a wake source.
struct Token {
    slot: Arc<WakeSlot>,
}

impl Drop for Token {
    fn drop(&mut self) {
        if !self.slot.woken.load(Ordering::Acquire) {
            self.slot.abandoned.store(true, Ordering::Release);
            self.slot.fire();
        }
    }
}

/// Handle used by an external facility to resume a suspended task.
///
/// Cloning is cheap; all clones wake the same suspension, and only the
/// first wake has an effect.
#[derive(Clone)]
pub struct WakeHandle {
    token: Arc<Token>,
    task: Option<TaskId>,
}

impl WakeHandle {
    /// Moves the suspended task back to pending.
    ///
    /// Returns `false` if the suspension was already woken.
    pub fn wake(&self) -> bool {
        self.token.slot.fire()
    }

    /// Whether the suspension has been woken already.
    pub fn is_woken(&self) -> bool {
        self.token.slot.woken.load(Ordering::Acquire)
    }

    /// Task that will be resumed, if the suspension happened inside one.
    pub fn task(&self) -> Option<TaskId> {
        self.task
    }
}

/// Suspends the current task until a [`WakeHandle`] is woken.
///
/// `register` receives the wake handle on the first poll and must hand it
/// to whatever will eventually call [`WakeHandle::wake`]: a timer, a
/// completion callback, another pool. The wake may happen on any thread,
/// including before `register` returns.
///
/// # Examples
///
/// ```rust,ignore
/// let wakeup = task::suspend("device read", |wake| {
///     device.on_complete(move || { wake.wake(); });
/// })
/// .await;
/// ```
pub fn suspend<R>(reason: &'static str, register: R) -> Suspend<R>
where
    R: FnOnce(WakeHandle),
{
    Suspend {
        reason,
        register: Some(register),
        slot: Arc::new(WakeSlot {
            woken: AtomicBool::new(false),
            abandoned: AtomicBool::new(false),
            waker: Mutex::new(None),
        }),
    }
}

/// Future returned by [`suspend`].
pub struct Suspend<R> {
    reason: &'static str,
    register: Option<R>,
    slot: Arc<WakeSlot>,
}

impl<R> Unpin for Suspend<R> {}

impl<R> Future for Suspend<R>
where
    R: FnOnce(WakeHandle),
{
    type Output = Wakeup;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Wakeup> {
        let this = self.get_mut();

        // The waker is stored before the handle escapes, so an immediate
        // wake from another thread always finds it.
        *lock(&this.slot.waker) = Some(cx.waker().clone());

        if let Some(register) = this.register.take() {
            let task = context::current_task().map(|t| t.id());
            if let Some(id) = task {
                log::trace!("{id} suspending: {}", this.reason);
            }

            register(WakeHandle {
                token: Arc::new(Token {
                    slot: this.slot.clone(),
                }),
                task,
            });
        }

        if this.slot.woken.load(Ordering::Acquire) {
            if this.slot.abandoned.load(Ordering::Acquire) {
                return Poll::Ready(Wakeup::Abandoned);
            }
            return Poll::Ready(Wakeup::Woken);
        }

        Poll::Pending
    }
}
