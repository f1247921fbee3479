use super::worker::Worker;
use crate::error::{Error, Result};
use crate::lcos::{Future, make_future_promise};
use crate::runtime::Handle;
use crate::runtime::context;
use crate::runtime::task::unwind::{CatchUnwind, catch};
use crate::runtime::task::{BoxFuture, Priority, Task};
use crate::runtime::work_stealing::injector::Injector;
use crate::runtime::work_stealing::queue::LocalQueue;
use crate::utils::lock;

use std::future::Future as StdFuture;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle, Thread};

/// Per-task options applied at spawn time.
#[derive(Debug, Clone, Default)]
pub(crate) struct Spawn {
    pub(crate) priority: Option<Priority>,
    pub(crate) description: Option<Arc<str>>,
}

/// The worker scheduler behind one named pool.
///
/// Owns a shared injector, one local queue per worker thread, and the
/// worker threads themselves. Workers pull ready tasks by priority and park
/// when there is nothing to do.
///
/// A worker that blocks inside a task hands its local queue to a freshly
/// started thread and retires, so the pool keeps `threads` runnable
/// workers no matter how many tasks are blocked.
pub(crate) struct Scheduler {
    name: Arc<str>,
    injector: Arc<Injector>,
    locals: Arc<Vec<Arc<LocalQueue>>>,
    default_priority: Priority,
    threads: usize,
    handles: Mutex<Vec<JoinHandle<()>>>,
    shutdown: Arc<AtomicBool>,

    /// Cap on `retired`.
    max_blocking: usize,

    /// Workers that handed their queue over and have not exited yet.
    retired: AtomicUsize,

    /// Worker threads parked in a blocking wait, unparked on shutdown.
    blocked: Mutex<Vec<Thread>>,
}

impl Scheduler {
    /// Creates the queues for a pool of `threads` workers.
    ///
    /// No thread runs until [`start`](Self::start) is called.
    pub(crate) fn new(
        name: &str,
        threads: usize,
        default_priority: Priority,
        max_blocking: usize,
    ) -> Self {
        let locals = (0..threads).map(|_| Arc::new(LocalQueue::new())).collect();

        Self {
            name: Arc::from(name),
            injector: Arc::new(Injector::new()),
            locals: Arc::new(locals),
            default_priority,
            threads,
            handles: Mutex::new(Vec::with_capacity(threads)),
            shutdown: Arc::new(AtomicBool::new(false)),
            max_blocking,
            retired: AtomicUsize::new(0),
            blocked: Mutex::new(Vec::new()),
        }
    }

    /// Spawns the worker threads.
    ///
    /// Each worker installs `runtime` and this scheduler as its thread
    /// context before entering its loop.
    pub(crate) fn start(self: &Arc<Self>, runtime: &Handle, thread_prefix: &str) -> Result<()> {
        for id in 0..self.threads {
            let name = format!("{thread_prefix}-{}-{id}", self.name);
            self.spawn_worker(id, runtime.clone(), name)?;
        }

        log::debug!("pool `{}` started with {} workers", self.name, self.threads);
        Ok(())
    }

    /// Starts a thread running the dispatch loop of worker `id`.
    ///
    /// Fails with [`Error::Shutdown`] once the pool is stopping, so that
    /// [`join`](Self::join) never misses a thread.
    fn spawn_worker(self: &Arc<Self>, id: usize, runtime: Handle, name: String) -> Result<()> {
        let mut handles = lock(&self.handles);

        if self.is_shutdown() {
            return Err(Error::Shutdown);
        }

        let worker = Worker::new(id, self.clone());
        let scheduler = self.clone();
        let shutdown = self.shutdown.clone();

        let handle = thread::Builder::new()
            .name(name)
            .spawn(move || {
                context::enter_context(runtime, scheduler, || worker.run(shutdown));
            })
            .map_err(|err| Error::Config(format!("cannot spawn worker thread: {err}")))?;

        handles.push(handle);
        Ok(())
    }

    /// Called by worker `id` right before it parks in a blocking wait.
    ///
    /// The calling thread is enrolled for the shutdown wake-up, then a
    /// replacement thread takes over worker `id` and the caller retires.
    /// Nothing is handed over when the caller already retired, when the
    /// pool is stopping, or when `max_blocking` workers are retired
    /// already; the caller then just blocks.
    pub(crate) fn enter_blocking(self: &Arc<Self>, id: usize) {
        lock(&self.blocked).push(thread::current());

        if context::is_retired() || self.is_shutdown() {
            return;
        }

        let reserved = self
            .retired
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.max_blocking).then_some(n + 1)
            });

        if reserved.is_err() {
            log::debug!(
                "pool `{}` has {} blocked workers, worker {id} blocks in place",
                self.name,
                self.max_blocking
            );
            return;
        }

        let Some(runtime) = context::current_runtime() else {
            self.retired.fetch_sub(1, Ordering::AcqRel);
            return;
        };

        let name = thread::current()
            .name()
            .map_or_else(|| format!("{}-{id}", self.name), str::to_owned);

        match self.spawn_worker(id, runtime, name) {
            Ok(()) => {
                context::retire();
                log::trace!("worker {id} of `{}` handed over while blocked", self.name);
            }
            Err(err) => {
                self.retired.fetch_sub(1, Ordering::AcqRel);
                if !matches!(err, Error::Shutdown) {
                    log::warn!("pool `{}` cannot replace blocked worker {id}: {err}", self.name);
                }
            }
        }
    }

    /// Withdraws the calling thread from the shutdown wake-up list.
    pub(crate) fn leave_blocking(&self) {
        let me = thread::current().id();
        let mut blocked = lock(&self.blocked);

        if let Some(pos) = blocked.iter().position(|t| t.id() == me) {
            blocked.swap_remove(pos);
        }
    }

    /// Called by a retired worker as it exits.
    pub(crate) fn retired_exit(&self) {
        self.retired.fetch_sub(1, Ordering::AcqRel);
    }

    pub(crate) fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub(crate) fn threads(&self) -> usize {
        self.threads
    }

    pub(crate) fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Number of tasks waiting in this pool's queues.
    pub(crate) fn queued(&self) -> usize {
        self.injector.len() + self.locals.iter().map(|q| q.len()).sum::<usize>()
    }

    /// Spawns a future as a new task whose output lands in the returned
    /// future.
    ///
    /// A panic in `future` is stored as [`Error::Panicked`].
    pub(crate) fn spawn<F>(self: &Arc<Self>, future: F, options: Spawn) -> Future<F::Output>
    where
        F: StdFuture + Send + 'static,
        F::Output: Send + 'static,
    {
        if self.is_shutdown() {
            return Future::failed(Error::Shutdown);
        }

        let (output, promise) = make_future_promise();

        self.submit(
            Box::pin(async move {
                let outcome = CatchUnwind::new(future).await;
                let _ = promise.complete(outcome);
            }),
            options,
        );

        output
    }

    /// Queues a closure as a fire-and-forget task.
    pub(crate) fn post<F>(self: &Arc<Self>, f: F, options: Spawn) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        if self.is_shutdown() {
            return Err(Error::Shutdown);
        }

        self.submit(
            Box::pin(async move {
                let _ = catch(f);
            }),
            options,
        );

        Ok(())
    }

    fn submit(self: &Arc<Self>, body: BoxFuture, options: Spawn) {
        let task = Arc::new(Task::new(
            body,
            options.priority.unwrap_or(self.default_priority),
            options.description,
            self.name.clone(),
            self.injector.clone(),
        ));

        log::trace!("{} spawned on `{}`", task.id(), self.name);
        self.schedule(task);
    }

    /// Queues a runnable task.
    ///
    /// From one of this pool's own workers the task goes to the worker's
    /// local queue; from anywhere else it goes to the injector.
    pub(crate) fn schedule(self: &Arc<Self>, task: Arc<Task>) {
        if let Some(id) = context::current_worker_of(self) {
            self.locals[id].push(task);
            self.injector.notify();
        } else {
            self.injector.push(task);
        }
    }

    /// Finds the next task for worker `id`.
    ///
    /// For each priority, highest first: the worker's own queue, then the
    /// injector, then the other workers.
    pub(crate) fn find_task(&self, id: usize) -> Option<Arc<Task>> {
        for priority in Priority::ALL {
            if let Some(task) = self.locals[id].pop(priority) {
                return Some(task);
            }

            if let Some(task) = self.injector.steal(priority) {
                return Some(task);
            }

            if let Some(task) = self.try_steal(id, priority) {
                return Some(task);
            }
        }

        None
    }

    /// Steals from sibling workers, visited round-robin from `id + 1`.
    fn try_steal(&self, id: usize, priority: Priority) -> Option<Arc<Task>> {
        let len = self.locals.len();

        if len <= 1 {
            return None;
        }

        (1..len)
            .map(|i| (id + i) % len)
            .find_map(|victim| self.locals[victim].steal(priority))
    }

    /// Parks the calling worker until there may be work.
    pub(crate) fn park(&self) {
        self.injector.park();
    }

    /// Stops the pool: workers exit after their current task, queued
    /// tasks are discarded and blocked workers are woken up.
    pub(crate) fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.injector.shutdown();

        for thread in lock(&self.blocked).iter() {
            thread.unpark();
        }

        for local in self.locals.iter() {
            for task in local.drain() {
                task.discard();
            }
        }
    }

    /// Joins every worker thread, replacements included.
    ///
    /// A worker calling this on its own pool skips itself.
    pub(crate) fn join(&self) {
        let me = thread::current().id();

        loop {
            let handles: Vec<_> = lock(&self.handles).drain(..).collect();
            if handles.is_empty() {
                break;
            }

            for handle in handles {
                if handle.thread().id() == me {
                    continue;
                }
                let _ = handle.join();
            }
        }

        log::debug!("pool `{}` stopped", self.name);
    }
}
