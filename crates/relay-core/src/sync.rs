//! Lock helpers shared by the routing engine.

use std::sync::{Mutex, MutexGuard};

/// Extension trait for `Mutex` that ignores lock poisoning.
///
/// Router state guarded by a mutex is plain counters; a panic in another
/// caller never leaves it half-written in a way later readers must avoid.
pub trait IgnoreLock<T> {
    /// Lock the mutex, recovering the guard if it was poisoned.
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T>;
}

impl<T> IgnoreLock<T> for Mutex<T> {
    fn lock_ignore_poison(&self) -> MutexGuard<'_, T> {
        match self.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
