//! RAII guard for a named lock.

use super::key::LockKey;
use super::registry::KeyedMutex;
use std::sync::Arc;
use tracing::debug;

/// Holds the lock for one key.
///
/// When dropped, the lock is released and one waiter is woken.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct KeyGuard {
    key: LockKey,
    mutex: Arc<KeyedMutex>,
}

impl KeyGuard {
    pub(super) fn new(key: LockKey, mutex: Arc<KeyedMutex>) -> Self {
        Self { key, mutex }
    }

    /// The key this guard holds.
    pub fn key(&self) -> &LockKey {
        &self.key
    }

    /// Release the lock before the guard goes out of scope.
    pub fn release(self) {
        drop(self);
    }
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        self.mutex.release();
        debug!(key = %self.key, "released lock");
    }
}
