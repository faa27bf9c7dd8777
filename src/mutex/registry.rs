//! Process-wide table of named locks.

use super::guard::KeyGuard;
use super::key::LockKey;
use std::collections::HashMap;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// An exclusive, non-reentrant lock bound to one key.
///
/// Ownership is modelled with a flag instead of a held `MutexGuard` so the
/// lock can be carried by an owned [`KeyGuard`] across function boundaries.
#[derive(Debug, Default)]
pub(crate) struct KeyedMutex {
    held: Mutex<bool>,
    released: Condvar,
}

impl KeyedMutex {
    fn state(&self) -> MutexGuard<'_, bool> {
        // The flag is always left consistent, so a poisoned mutex is still usable.
        self.held.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Block until the lock is free, then take it.
    fn acquire(&self) {
        let mut held = self.state();
        while *held {
            held = self
                .released
                .wait(held)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *held = true;
    }

    /// Take the lock if it is free.
    fn try_acquire(&self) -> bool {
        let mut held = self.state();
        if *held {
            false
        } else {
            *held = true;
            true
        }
    }

    /// Give the lock back and wake one waiter.
    pub(super) fn release(&self) {
        let mut held = self.state();
        *held = false;
        drop(held);
        self.released.notify_one();
    }

    #[cfg(test)]
    pub(crate) fn is_held(&self) -> bool {
        *self.state()
    }
}

/// Registry of named mutexes.
///
/// Created once per provider and shared (`Arc<MutexKv>`) by every operation.
/// Locks are created on first use and never removed: the number of distinct
/// repositories touched by one run is small and bounded by configuration.
#[derive(Debug, Default)]
pub struct MutexKv {
    store: Mutex<HashMap<LockKey, Arc<KeyedMutex>>>,
}

impl MutexKv {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the lock for `key` is held by the caller.
    ///
    /// The lock is released when the returned guard is dropped.
    pub fn lock(&self, key: &LockKey) -> KeyGuard {
        let mutex = self.get(key);

        debug!(key = %key, "waiting for lock");
        mutex.acquire();
        debug!(key = %key, "acquired lock");

        KeyGuard::new(key.clone(), mutex)
    }

    /// Take the lock for `key` only if nobody holds it.
    pub fn try_lock(&self, key: &LockKey) -> Option<KeyGuard> {
        let mutex = self.get(key);
        if mutex.try_acquire() {
            debug!(key = %key, "acquired lock");
            Some(KeyGuard::new(key.clone(), mutex))
        } else {
            None
        }
    }

    /// Number of keys seen so far.
    pub fn len(&self) -> usize {
        self.store().len()
    }

    /// Whether no key has been locked yet.
    pub fn is_empty(&self) -> bool {
        self.store().is_empty()
    }

    /// Return the lock for `key`, creating it if this is the first reference.
    ///
    /// Lookup and insertion happen under the same registry lock.
    pub(crate) fn get(&self, key: &LockKey) -> Arc<KeyedMutex> {
        let mut store = self.store();
        Arc::clone(store.entry(key.clone()).or_default())
    }

    fn store(&self) -> MutexGuard<'_, HashMap<LockKey, Arc<KeyedMutex>>> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
