//! Local control objects: futures, promises and the cell they share.
//!
//! A [`Promise`] and its [`Future`] (or [`SharedFuture`]s) point at one
//! shared-state cell. The cell moves from empty to either a value or an
//! error exactly once, under its own lock, and then wakes every task and
//! runs every continuation that was registered while it was empty.
//!
//! Completion of a cell happens-before every wake and continuation it
//! triggers. Sibling continuations of one cell are not ordered with
//! respect to each other.

mod future;
mod promise;
mod shared;

pub(crate) mod state;

pub use future::Future;
pub use promise::{Fulfill, Promise, make_future_promise};
pub use shared::SharedFuture;
