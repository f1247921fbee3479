use super::Priority;
use crate::lcos::Future;
use crate::runtime::Handle;
use crate::runtime::scheduler::Spawn;

use std::future::Future as StdFuture;
use std::sync::Arc;

/// Configures a single task before spawning it.
///
/// Obtained from [`Handle::task`].
///
/// ```rust,ignore
/// let out = runtime
///     .task()
///     .pool("io")
///     .priority(Priority::High)
///     .description("load index")
///     .spawn(async { load().await });
/// ```
pub struct TaskBuilder {
    handle: Handle,
    pool: Option<String>,
    options: Spawn,
}

impl TaskBuilder {
    pub(crate) fn new(handle: Handle) -> Self {
        Self {
            handle,
            pool: None,
            options: Spawn::default(),
        }
    }

    /// Runs the task on the named pool instead of the default one.
    pub fn pool(mut self, name: impl Into<String>) -> Self {
        self.pool = Some(name.into());
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.options.priority = Some(priority);
        self
    }

    /// Attaches a description, reported by [`current`](super::current).
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.options.description = Some(Arc::from(description.into()));
        self
    }

    /// Spawns the future.
    ///
    /// An unknown pool name surfaces as [`Error::UnknownPool`](crate::Error::UnknownPool)
    /// from the returned future.
    pub fn spawn<F>(self, future: F) -> Future<F::Output>
    where
        F: StdFuture + Send + 'static,
        F::Output: Send + 'static,
    {
        let scheduler = match &self.pool {
            Some(name) => match self.handle.scheduler(name) {
                Ok(scheduler) => scheduler.clone(),
                Err(err) => return Future::failed(err),
            },
            None => self.handle.default_scheduler().clone(),
        };

        scheduler.spawn(future, self.options)
    }

    /// Runs a closure as the task body.
    pub fn call<F, R>(self, f: F) -> Future<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.spawn(async move { f() })
    }
}
