//! Runtime components.
//!
//! - [`core`]: [`Runtime`], its [`Handle`] and named [`Pool`]s,
//! - [`builder`]: runtime configuration,
//! - [`scheduler`] and [`work_stealing`]: one worker scheduler per pool,
//! - [`task`]: cooperative tasks and explicit suspension,
//! - [`timer`]: the timer thread behind `sleep` and `timeout`,
//! - [`blocking`]: offloading blocking work to another pool.
//!
//! The thread-local [`context`] lets code running inside a task reach its
//! runtime and pool without passing handles around.

mod blocking;
mod core;
mod scheduler;
mod work_stealing;

pub(crate) mod builder;
pub(crate) mod context;
pub(crate) mod timer;
pub(crate) mod yield_now;

pub mod task;

pub use self::core::{DEFAULT_POOL, Handle, Pool, Runtime};
pub(crate) use scheduler::{Scheduler, Spawn};
