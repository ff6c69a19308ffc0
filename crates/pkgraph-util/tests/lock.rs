use std::time::Duration;

use pkgraph_util::lock::CacheLock;
use tempfile::TempDir;

#[test]
fn test_acquire_creates_cache_dir_and_lock_file() {
    let tmp = TempDir::new().unwrap();
    let cache = tmp.path().join("cache");
    let lock = CacheLock::acquire("checkouts", &cache, Duration::from_secs(1)).unwrap();
    assert!(lock.is_held());
    assert!(cache.is_dir());
    assert!(lock.path().is_file());
}

#[test]
fn test_second_holder_is_refused_while_held() {
    let tmp = TempDir::new().unwrap();
    let _held = CacheLock::acquire("checkouts", tmp.path(), Duration::from_secs(1)).unwrap();
    let second = CacheLock::try_acquire("checkouts", tmp.path()).unwrap();
    assert!(second.is_none());
}

#[test]
fn test_acquire_times_out_while_held() {
    let tmp = TempDir::new().unwrap();
    let _held = CacheLock::acquire("checkouts", tmp.path(), Duration::from_secs(1)).unwrap();
    let err = CacheLock::acquire("checkouts", tmp.path(), Duration::from_millis(200)).unwrap_err();
    assert!(err.to_string().contains("timed out"), "got: {err}");
}

#[test]
fn test_lock_released_on_drop() {
    let tmp = TempDir::new().unwrap();
    {
        let _lock = CacheLock::acquire("checkouts", tmp.path(), Duration::from_secs(1)).unwrap();
    }
    let again = CacheLock::try_acquire("checkouts", tmp.path()).unwrap();
    assert!(again.is_some());
}

#[test]
fn test_explicit_release() {
    let tmp = TempDir::new().unwrap();
    let mut lock = CacheLock::acquire("checkouts", tmp.path(), Duration::from_secs(1)).unwrap();
    lock.release().unwrap();
    assert!(!lock.is_held());
    assert!(CacheLock::try_acquire("checkouts", tmp.path()).unwrap().is_some());
}

#[test]
fn test_distinct_names_do_not_contend() {
    let tmp = TempDir::new().unwrap();
    let _a = CacheLock::acquire("checkouts", tmp.path(), Duration::from_secs(1)).unwrap();
    assert!(CacheLock::try_acquire("manifests", tmp.path()).unwrap().is_some());
}
