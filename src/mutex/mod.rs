//! Named mutex registry.
//!
//! Plan operations run in parallel, so two of them can target the same GitOps
//! repository at the same time. Every git-mutating igc invocation is
//! serialized here by a string key derived from the repository it touches.
//!
//! # Keys
//!
//! A [`LockKey`] names a serialization domain: the normalized repository slug
//! (`host/org/repo`). Operations on different repositories never contend.
//!
//! # Registry
//!
//! [`MutexKv`] lazily creates one lock per key and keeps it for the lifetime
//! of the registry. Insertion happens under a registry-wide mutex, so
//! concurrent first-time callers always resolve to the same lock.
//!
//! # RAII Guards
//!
//! [`MutexKv::lock`] returns a [`KeyGuard`]; the key is released when the
//! guard is dropped, on every exit path. There is no free-standing unlock.
//! Locking a key again while holding its guard on the same thread deadlocks.

mod guard;
mod key;
mod registry;

#[cfg(test)]
mod tests;

// Re-export public API
pub use guard::KeyGuard;
pub use key::LockKey;
pub use registry::MutexKv;
