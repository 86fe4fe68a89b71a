// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::fake::FakeExecutor;
use pcs_core::Host;

#[test]
fn acquire_writes_holder_string() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pc-switcher.lock");
    let mut lock = SyncLock::new(&path);
    assert!(lock.acquire("source:laptop1:abc12345").unwrap());
    assert_eq!(
        lock.holder().as_deref(),
        Some("source:laptop1:abc12345")
    );
}

#[test]
fn second_acquire_conflicts_and_preserves_holder() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pc-switcher.lock");

    let mut first = SyncLock::new(&path);
    assert!(first.acquire("source:laptop1:abc12345").unwrap());

    let mut second = SyncLock::new(&path);
    assert!(!second.acquire("source:laptop2:ffff0000").unwrap());
    // The loser must not clobber the holder string.
    assert_eq!(
        second.holder().as_deref(),
        Some("source:laptop1:abc12345")
    );
}

#[test]
fn release_allows_reacquisition() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pc-switcher.lock");

    let mut first = SyncLock::new(&path);
    assert!(first.acquire("source:laptop1:abc12345").unwrap());
    first.release();

    let mut second = SyncLock::new(&path);
    assert!(second.acquire("source:laptop2:ffff0000").unwrap());
    assert_eq!(
        second.holder().as_deref(),
        Some("source:laptop2:ffff0000")
    );
}

#[test]
fn drop_releases_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("pc-switcher.lock");
    {
        let mut lock = SyncLock::new(&path);
        assert!(lock.acquire("source:laptop1:abc12345").unwrap());
    }
    let mut lock = SyncLock::new(&path);
    assert!(lock.acquire("source:laptop1:deadbeef").unwrap());
}

#[test]
fn acquire_creates_parent_directories() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/dirs/pc-switcher.lock");
    let mut lock = SyncLock::new(&path);
    assert!(lock.acquire("source:laptop1:abc12345").unwrap());
}

#[tokio::test]
async fn target_lock_acquired_on_locked_report() {
    let executor = FakeExecutor::new(Host::Target).with_process_lines(vec!["LOCKED"]);
    let lock = acquire_target_lock(&executor, "source:laptop1:abc12345", Duration::from_secs(1))
        .await
        .unwrap();
    assert!(lock.is_some());
}

#[tokio::test]
async fn target_lock_conflict_returns_none() {
    let executor = FakeExecutor::new(Host::Target).with_process_lines(vec!["CONFLICT"]);
    let lock = acquire_target_lock(&executor, "source:laptop1:abc12345", Duration::from_secs(1))
        .await
        .unwrap();
    assert!(lock.is_none());
}

#[tokio::test]
async fn target_lock_times_out_to_none() {
    // No output at all: the grace period elapses.
    let executor = FakeExecutor::new(Host::Target).with_silent_process();
    let lock = acquire_target_lock(
        &executor,
        "source:laptop1:abc12345",
        Duration::from_millis(50),
    )
    .await
    .unwrap();
    assert!(lock.is_none());
}

#[tokio::test]
async fn read_target_holder_trims_output() {
    let executor = FakeExecutor::new(Host::Target)
        .on("cat ~/.local/share/pc-switcher", 0, "source:laptop1:abc12345\n", "");
    assert_eq!(
        read_target_holder(&executor).await.as_deref(),
        Some("source:laptop1:abc12345")
    );
}
