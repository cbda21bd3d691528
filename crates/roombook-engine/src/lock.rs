//! Per-room and per-class advisory locks.
//!
//! Conflict detection reads the store and the write happens afterwards; both
//! must run while the affected room and class are locked, or two concurrent
//! requests could each pass detection against a stale read.

use std::collections::HashSet;
use std::sync::{Condvar, Mutex};

use crate::error::{Result, ScheduleError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) enum LockKey {
    Room(String),
    Class(String),
}

#[derive(Debug, Default)]
pub(crate) struct ResourceLocks {
    held: Mutex<HashSet<LockKey>>,
    released: Condvar,
}

impl ResourceLocks {
    /// Block until none of `keys` is held, then take all of them at once.
    ///
    /// Taking the whole set in one step means callers never hold part of a set
    /// while waiting on the rest, so there is no lock-ordering deadlock.
    pub(crate) fn acquire(&self, keys: impl IntoIterator<Item = LockKey>) -> Result<LockGuard<'_>> {
        let keys: Vec<LockKey> = keys
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let mut held = self.held.lock().map_err(|_| lock_failed())?;
        while keys.iter().any(|k| held.contains(k)) {
            held = self.released.wait(held).map_err(|_| lock_failed())?;
        }
        held.extend(keys.iter().cloned());

        Ok(LockGuard { locks: self, keys })
    }
}

fn lock_failed() -> ScheduleError {
    ScheduleError::Store("failed to acquire resource lock".to_string())
}

/// Releases its keys on drop.
pub(crate) struct LockGuard<'a> {
    locks: &'a ResourceLocks,
    keys: Vec<LockKey>,
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        let mut held = match self.locks.held.lock() {
            Ok(held) => held,
            Err(poisoned) => poisoned.into_inner(),
        };
        for key in &self.keys {
            held.remove(key);
        }
        drop(held);
        self.locks.released.notify_all();
    }
}
