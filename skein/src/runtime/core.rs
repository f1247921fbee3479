use super::context;
use super::scheduler::{Scheduler, Spawn};
use super::task::TaskBuilder;
use super::timer::{Timer, TimerHandle};
use crate::error::{Error, Result};
use crate::lcos::Future;

use std::collections::HashMap;
use std::future::Future as StdFuture;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Name of the pool created for every runtime.
pub const DEFAULT_POOL: &str = "default";

/// State shared by every [`Handle`] of one runtime.
struct Shared {
    pools: HashMap<String, Arc<Scheduler>>,
    default_pool: Arc<Scheduler>,
    timer: TimerHandle,
    shutdown: AtomicBool,
}

/// Cloneable reference to a running runtime.
///
/// A handle is the explicit context object through which work is posted:
/// it owns the mapping from pool names to worker schedulers. Code running
/// inside a task can obtain the handle of its runtime with
/// [`Handle::current`].
#[derive(Clone)]
pub struct Handle {
    shared: Arc<Shared>,
}

impl Handle {
    /// Returns the handle of the runtime the current thread works for.
    ///
    /// `None` outside of worker threads.
    pub fn current() -> Option<Handle> {
        context::current_runtime()
    }

    /// Looks up a pool by name.
    pub fn pool(&self, name: &str) -> Option<Pool> {
        self.shared.pools.get(name).map(|scheduler| Pool {
            scheduler: scheduler.clone(),
        })
    }

    /// The pool named [`DEFAULT_POOL`].
    pub fn default_pool(&self) -> Pool {
        Pool {
            scheduler: self.shared.default_pool.clone(),
        }
    }

    /// Names of every pool, sorted.
    pub fn pool_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.shared.pools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether [`Runtime`] has been dropped or shut down.
    pub fn is_shutdown(&self) -> bool {
        self.shared.shutdown.load(Ordering::Acquire)
    }

    /// Spawns a future on the default pool.
    ///
    /// The returned [`Future`] completes with the output, or with
    /// [`Error::Panicked`] if the future panics.
    pub fn spawn<F>(&self, future: F) -> Future<F::Output>
    where
        F: StdFuture + Send + 'static,
        F::Output: Send + 'static,
    {
        self.shared.default_pool.spawn(future, Spawn::default())
    }

    /// Runs a closure as a new task on the default pool.
    pub fn async_call<F, R>(&self, f: F) -> Future<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.spawn(async move { f() })
    }

    /// Starts configuring a task: pool, priority, description.
    pub fn task(&self) -> TaskBuilder {
        TaskBuilder::new(self.clone())
    }

    /// Enqueues a closure on the named pool.
    ///
    /// # Errors
    ///
    /// [`Error::UnknownPool`] if no such pool exists, [`Error::Shutdown`]
    /// if the runtime is shutting down.
    pub fn post<F>(&self, pool: &str, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.scheduler(pool)?.post(f, Spawn::default())
    }

    pub(crate) fn scheduler(&self, name: &str) -> Result<&Arc<Scheduler>> {
        self.shared
            .pools
            .get(name)
            .ok_or_else(|| Error::UnknownPool(name.to_owned()))
    }

    pub(crate) fn default_scheduler(&self) -> &Arc<Scheduler> {
        &self.shared.default_pool
    }

    pub(crate) fn timer(&self) -> &TimerHandle {
        &self.shared.timer
    }
}

/// One named worker pool of a runtime.
///
/// Cloning is cheap. Work posted to a pool only ever runs on that pool's
/// worker threads.
#[derive(Clone)]
pub struct Pool {
    scheduler: Arc<Scheduler>,
}

impl Pool {
    pub fn name(&self) -> &str {
        self.scheduler.name()
    }

    pub fn worker_threads(&self) -> usize {
        self.scheduler.threads()
    }

    /// Number of tasks waiting to be dispatched.
    pub fn queued(&self) -> usize {
        self.scheduler.queued()
    }

    /// Spawns a future on this pool.
    pub fn spawn<F>(&self, future: F) -> Future<F::Output>
    where
        F: StdFuture + Send + 'static,
        F::Output: Send + 'static,
    {
        self.scheduler.spawn(future, Spawn::default())
    }

    /// Runs a closure as a new task on this pool.
    pub fn async_call<F, R>(&self, f: F) -> Future<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        self.spawn(async move { f() })
    }

    /// Enqueues a fire-and-forget closure.
    pub fn post<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        self.scheduler.post(f, Spawn::default())
    }

    pub(crate) fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }
}

/// The runtime: named worker pools plus a timer thread.
///
/// `Runtime` dereferences to its [`Handle`], so every handle method is
/// available on it directly. Dropping the runtime shuts everything down:
/// workers finish the task they are running, queued tasks are discarded
/// (their futures complete with [`Error::BrokenPromise`]), and all threads
/// are joined.
pub struct Runtime {
    handle: Handle,
    timer: Timer,
}

impl Runtime {
    /// Builds a runtime with the default configuration.
    pub fn new() -> Result<Self> {
        super::builder::RuntimeBuilder::new().build()
    }

    /// Returns a builder for a custom runtime.
    pub fn builder() -> super::builder::RuntimeBuilder {
        super::builder::RuntimeBuilder::new()
    }

    pub(crate) fn start(
        pools: Vec<Arc<Scheduler>>,
        default_pool: Arc<Scheduler>,
        thread_prefix: &str,
    ) -> Result<Self> {
        let timer = Timer::start(thread_prefix)?;

        let handle = Handle {
            shared: Arc::new(Shared {
                pools: pools
                    .iter()
                    .map(|pool| (pool.name().to_string(), pool.clone()))
                    .collect(),
                default_pool,
                timer: timer.handle(),
                shutdown: AtomicBool::new(false),
            }),
        };

        let runtime = Self { handle, timer };

        for pool in &pools {
            // On error `runtime` is dropped, which stops what did start.
            pool.start(&runtime.handle, thread_prefix)?;
        }

        log::info!("runtime started with pools {:?}", runtime.handle.pool_names());
        Ok(runtime)
    }

    /// Returns a cloneable handle to this runtime.
    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Runs a future to completion on the default pool, blocking the
    /// calling thread.
    ///
    /// # Panics
    ///
    /// Panics if the future panics or the runtime shuts down first; use
    /// [`try_block_on`](Self::try_block_on) to get the error instead.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// let runtime = Runtime::new()?;
    /// assert_eq!(runtime.block_on(async { 42 }), 42);
    /// ```
    pub fn block_on<F>(&self, future: F) -> F::Output
    where
        F: StdFuture + Send + 'static,
        F::Output: Send + 'static,
    {
        match self.try_block_on(future) {
            Ok(value) => value,
            Err(err) => panic!("block_on failed: {err}"),
        }
    }

    /// Like [`block_on`](Self::block_on), but reports failures as errors.
    pub fn try_block_on<F>(&self, future: F) -> Result<F::Output>
    where
        F: StdFuture + Send + 'static,
        F::Output: Send + 'static,
    {
        self.handle.spawn(future).get()
    }
}

impl Deref for Runtime {
    type Target = Handle;

    fn deref(&self) -> &Handle {
        &self.handle
    }
}

impl Drop for Runtime {
    fn drop(&mut self) {
        self.handle.shared.shutdown.store(true, Ordering::Release);

        let pools: Vec<_> = self.handle.shared.pools.values().cloned().collect();

        for pool in &pools {
            pool.shutdown();
        }
        for pool in &pools {
            pool.join();
        }

        self.timer.shutdown();
        log::info!("runtime shut down");
    }
}
