use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

/// Yields exactly once: wakes itself, then completes on the next poll.
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if !self.0 {
            self.0 = true;
            cx.waker().wake_by_ref();
            return Poll::Pending;
        }

        Poll::Ready(())
    }
}

/// Gives other pending tasks of the pool a chance to run.
///
/// The calling task goes back to the end of its run queue.
///
/// # Examples
///
/// ```rust,ignore
/// for chunk in work.chunks(64) {
///     process(chunk);
///     yield_now().await;
/// }
/// ```
pub async fn yield_now() {
    YieldOnce(false).await
}
