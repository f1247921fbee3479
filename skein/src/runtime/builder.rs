use super::core::{DEFAULT_POOL, Runtime};
use super::scheduler::Scheduler;
use super::task::Priority;
use crate::config::RuntimeConfig;
use crate::error::{Error, Result};

use std::sync::Arc;
use std::thread;

/// Default cap on blocked workers replaced per pool.
const DEFAULT_MAX_BLOCKING: usize = 512;

/// Builder for configuring and creating a [`Runtime`].
///
/// Every runtime has a pool named [`DEFAULT_POOL`]; additional named pools
/// (for example one reserved for blocking I/O) are added with
/// [`pool`](Self::pool).
///
/// # Examples
///
/// ```rust,ignore
/// let runtime = RuntimeBuilder::new()
///     .worker_threads(4)
///     .pool("io", 2)
///     .build()?;
/// ```
pub struct RuntimeBuilder {
    /// Worker threads of the default pool.
    worker_threads: usize,

    /// Extra pools, in declaration order.
    pools: Vec<(String, usize)>,

    /// Priority given to tasks that do not ask for one.
    default_priority: Priority,

    /// Prefix of every thread name.
    thread_name: String,

    /// Blocked workers each pool may replace at once.
    max_blocking_threads: usize,
}

impl RuntimeBuilder {
    /// Creates a builder with default configuration.
    ///
    /// The default pool gets one worker per logical CPU, falling back to
    /// `1` if that cannot be determined.
    pub fn new() -> Self {
        let worker_threads = thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);

        Self {
            worker_threads,
            pools: Vec::new(),
            default_priority: Priority::Normal,
            thread_name: String::from("skein"),
            max_blocking_threads: DEFAULT_MAX_BLOCKING,
        }
    }

    /// Creates a builder from plain configuration values.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        let mut builder = Self::new().default_priority(config.default_priority);

        if let Some(n) = config.worker_threads {
            builder = builder.worker_threads(n);
        }
        if let Some(name) = &config.thread_name {
            builder = builder.thread_name(name.clone());
        }
        if let Some(n) = config.max_blocking_threads {
            builder = builder.max_blocking_threads(n);
        }
        for pool in &config.pools {
            builder = builder.pool(pool.name.clone(), pool.threads);
        }

        builder
    }

    /// Sets the number of worker threads of the default pool.
    pub fn worker_threads(mut self, n: usize) -> Self {
        self.worker_threads = n;
        self
    }

    /// Adds a named pool with its own worker threads.
    ///
    /// Declaring [`DEFAULT_POOL`] here resizes the default pool; declaring
    /// the same name twice keeps the last size.
    pub fn pool(mut self, name: impl Into<String>, threads: usize) -> Self {
        let name = name.into();

        if name == DEFAULT_POOL {
            self.worker_threads = threads;
            return self;
        }

        match self.pools.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = threads,
            None => self.pools.push((name, threads)),
        }
        self
    }

    /// Sets the priority of tasks spawned without an explicit one.
    pub fn default_priority(mut self, priority: Priority) -> Self {
        self.default_priority = priority;
        self
    }

    /// Sets the prefix used to name runtime threads.
    pub fn thread_name(mut self, prefix: impl Into<String>) -> Self {
        self.thread_name = prefix.into();
        self
    }

    /// Caps how many workers of one pool may be blocked in
    /// [`Future::get`](crate::Future::get) with a replacement thread
    /// standing in for them. Defaults to 512.
    ///
    /// Past the cap a blocked worker keeps its queue, and tasks queued
    /// behind it wait until it resumes. `0` disables replacement.
    pub fn max_blocking_threads(mut self, n: usize) -> Self {
        self.max_blocking_threads = n;
        self
    }

    /// Starts the timer thread and every pool.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if a pool has no threads, a pool name is empty, or
    /// a thread cannot be spawned.
    pub fn build(self) -> Result<Runtime> {
        if self.worker_threads == 0 {
            return Err(Error::Config(format!(
                "pool `{DEFAULT_POOL}` needs at least one worker thread"
            )));
        }

        let default_pool = Arc::new(Scheduler::new(
            DEFAULT_POOL,
            self.worker_threads,
            self.default_priority,
            self.max_blocking_threads,
        ));

        let mut pools = vec![default_pool.clone()];

        for (name, threads) in &self.pools {
            if name.is_empty() {
                return Err(Error::Config("pool names must not be empty".into()));
            }
            if *threads == 0 {
                return Err(Error::Config(format!(
                    "pool `{name}` needs at least one worker thread"
                )));
            }

            pools.push(Arc::new(Scheduler::new(
                name,
                *threads,
                self.default_priority,
                self.max_blocking_threads,
            )));
        }

        Runtime::start(pools, default_pool, &self.thread_name)
    }
}

impl Default for RuntimeBuilder {
    fn default() -> Self {
        Self::new()
    }
}
