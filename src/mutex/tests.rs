//! Tests for the named mutex registry.

use super::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, mpsc};
use std::thread;
use std::time::Duration;

fn key(name: &str) -> LockKey {
    LockKey::new(name)
}

#[test]
fn test_lock_and_release() {
    let kv = MutexKv::new();
    let k = key("github.com/org/repo");

    let guard = kv.lock(&k);
    assert_eq!(guard.key(), &k);
    assert!(kv.try_lock(&k).is_none());

    drop(guard);
    assert!(kv.try_lock(&k).is_some());
}

#[test]
fn test_explicit_release() {
    let kv = MutexKv::new();
    let k = key("github.com/org/repo");

    let guard = kv.lock(&k);
    guard.release();

    assert!(kv.try_lock(&k).is_some());
}

#[test]
fn test_mutual_exclusion_same_key() {
    let kv = Arc::new(MutexKv::new());
    let k = key("github.com/org/shared");
    let inside = Arc::new(AtomicUsize::new(0));
    let max_inside = Arc::new(AtomicUsize::new(0));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let kv = Arc::clone(&kv);
            let k = k.clone();
            let inside = Arc::clone(&inside);
            let max_inside = Arc::clone(&max_inside);
            thread::spawn(move || {
                for _ in 0..20 {
                    let _guard = kv.lock(&k);
                    let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                    max_inside.fetch_max(now, Ordering::SeqCst);
                    thread::yield_now();
                    inside.fetch_sub(1, Ordering::SeqCst);
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(max_inside.load(Ordering::SeqCst), 1);
}

#[test]
fn test_second_locker_waits_for_release() {
    let kv = Arc::new(MutexKv::new());
    let k = key("github.com/org/repo");
    let (tx, rx) = mpsc::channel();

    let guard = kv.lock(&k);

    let waiter = {
        let kv = Arc::clone(&kv);
        let k = k.clone();
        thread::spawn(move || {
            let _guard = kv.lock(&k);
            tx.send(()).unwrap();
        })
    };

    // The waiter cannot get in while the guard is alive
    assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

    drop(guard);
    rx.recv_timeout(Duration::from_secs(5))
        .expect("waiter should acquire after release");
    waiter.join().unwrap();
}

#[test]
fn test_different_keys_do_not_block() {
    let kv = Arc::new(MutexKv::new());
    let _held = kv.lock(&key("github.com/org/one"));

    let (tx, rx) = mpsc::channel();
    let other = {
        let kv = Arc::clone(&kv);
        thread::spawn(move || {
            let _guard = kv.lock(&key("github.com/org/two"));
            tx.send(()).unwrap();
        })
    };

    rx.recv_timeout(Duration::from_secs(5))
        .expect("independent key must not wait");
    other.join().unwrap();
}

#[test]
fn test_same_key_resolves_to_same_lock() {
    let kv = MutexKv::new();
    let k = key("github.com/org/repo");

    let first = kv.get(&k);
    let second = kv.get(&k);

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(kv.len(), 1);
}

#[test]
fn test_concurrent_first_access_creates_one_lock() {
    let kv = Arc::new(MutexKv::new());
    let k = key("github.com/org/fresh");
    let barrier = Arc::new(Barrier::new(16));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let kv = Arc::clone(&kv);
            let k = k.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                kv.get(&k)
            })
        })
        .collect();

    let locks: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(locks.iter().all(|l| Arc::ptr_eq(l, &locks[0])));
    assert_eq!(kv.len(), 1);
}

#[test]
fn test_registry_never_shrinks() {
    let kv = MutexKv::new();
    assert!(kv.is_empty());

    drop(kv.lock(&key("a")));
    drop(kv.lock(&key("b")));
    drop(kv.lock(&key("a")));

    assert_eq!(kv.len(), 2);
}

#[test]
fn test_guard_released_on_panic() {
    let kv = Arc::new(MutexKv::new());
    let k = key("github.com/org/repo");

    let result = {
        let kv = Arc::clone(&kv);
        let k = k.clone();
        thread::spawn(move || {
            let _guard = kv.lock(&k);
            panic!("operation blew up while holding the lock");
        })
        .join()
    };

    assert!(result.is_err());
    assert!(!kv.get(&k).is_held());
    assert!(kv.try_lock(&k).is_some());
}

// ============================================================================
// Key derivation
// ============================================================================

#[test]
fn test_repository_key() {
    assert_eq!(
        LockKey::for_repository("github.com", "Org", "", "repo").as_str(),
        "github.com/org/repo"
    );
    assert_eq!(
        LockKey::for_repository("dev.azure.com", "org", "project", "repo").as_str(),
        "dev.azure.com/org/project/repo"
    );
}

#[test]
fn test_url_normalization() {
    for url in [
        "https://github.com/org/repo",
        "https://github.com/org/repo.git",
        "https://user@github.com/org/repo/",
        "git@github.com:org/repo.git",
        "github.com/org/repo",
    ] {
        assert_eq!(LockKey::for_url(url).as_str(), "github.com/org/repo", "{}", url);
    }
}

#[test]
fn test_repository_and_url_keys_agree() {
    assert_eq!(
        LockKey::for_repository("github.com", "org", "", "repo"),
        LockKey::for_url("https://github.com/org/repo.git")
    );
}

#[test]
fn test_gitops_config_key_uses_bootstrap_repo() {
    let config = r#"{
        "bootstrap": {"argocd-config": {"project": "0-bootstrap", "repo": "gitops", "url": "https://github.com/org/gitops", "path": "argocd/0-bootstrap"}},
        "infrastructure": {"argocd-config": {"url": "https://github.com/org/other"}, "payload": {"url": "https://github.com/org/other"}}
    }"#;

    assert_eq!(
        LockKey::for_gitops_config(config).as_str(),
        "github.com/org/gitops"
    );
}

#[test]
fn test_gitops_config_key_falls_back_to_layer_repo() {
    let config = "services:\n  payload:\n    url: https://github.com/org/services.git\n";

    assert_eq!(
        LockKey::for_gitops_config(config).as_str(),
        "github.com/org/services"
    );
}

#[test]
fn test_gitops_config_key_unparseable_is_shared() {
    assert_eq!(LockKey::for_gitops_config("{not: [valid").as_str(), "gitops");
    assert_eq!(LockKey::for_gitops_config("{}").as_str(), "gitops");
}
