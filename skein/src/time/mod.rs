//! Time utilities.
//!
//! - [`sleep`] suspends the calling task until a deadline,
//! - [`timeout`] races a future against a deadline.
//!
//! Both are driven by the runtime's timer thread.

mod sleep;
mod timeout;

#[doc(inline)]
pub use sleep::{Sleep, sleep};

#[doc(inline)]
pub use timeout::{Timeout, timeout};
