//! # Skein
//!
//! **Skein** is a task-parallel runtime built around futures and promises.
//!
//! Work is expressed as lightweight tasks running on pools of worker
//! threads. Results travel through write-once [`Future`]/[`Promise`] cells,
//! and [`dataflow`] composes futures into a graph of dependent tasks that
//! run as soon as their inputs are ready, without any thread blocking in
//! between.
//!
//! Skein offers:
//!
//! - A **work-stealing scheduler** with three priority lanes and any number
//!   of named pools
//! - **Write-once futures and promises**, shareable and awaitable
//! - **Dataflow composition** with `when_all`, `wait_all` and replay of
//!   failing work
//! - **Explicit suspension** of a running task until another party wakes it
//! - **Timers** including sleep and timeout
//! - **Macros** `#[skein::main]` and `#[skein::test]`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use skein::{dataflow, task};
//!
//! #[skein::main]
//! async fn main() {
//!     let a = task::async_call(|| 20);
//!     let b = task::async_call(|| 22);
//!
//!     let sum = dataflow(|(a, b)| a + b, (a, b)).await.unwrap();
//!     println!("{sum}");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`task`]: spawning, task metadata and suspension
//! - [`dataflow`](mod@dataflow): input sets accepted by the combinators
//! - [`replay`]: re-running failing work
//! - [`time`]: sleep and timeout
//! - [`config`]: TOML runtime configuration

mod error;
mod lcos;
mod runtime;
mod utils;

pub mod config;
pub mod dataflow;
pub mod replay;
pub mod time;

pub use config::{PoolConfig, RuntimeConfig};
pub use dataflow::{dataflow, wait_all, when_all};
pub use error::{Error, Result};
pub use lcos::{Fulfill, Future, Promise, SharedFuture, make_future_promise};
pub use replay::{dataflow_replay, dataflow_replay_validate};
pub use runtime::builder::RuntimeBuilder;
pub use runtime::task;
pub use runtime::yield_now::yield_now;
pub use runtime::{DEFAULT_POOL, Handle, Pool, Runtime};

pub use skein_macros::{main, test};
