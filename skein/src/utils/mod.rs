//! Internal utilities shared across runtime components.
//!
//! These helpers are not part of the public API.

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the guard if a previous holder panicked.
///
/// Every critical section in the runtime leaves the protected data in a
/// consistent state before running user code, so a poisoned lock still
/// guards valid data.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
