// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pcs_core::Host;
use pcs_exec::fake::FakeExecutor;

#[test]
fn missing_file_reads_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let outcome = read_last_role(&dir.path().join("sync-history.json"));
    assert_eq!(outcome, HistoryReadOutcome::Missing);
    assert_eq!(outcome.effective_role(), None);
}

#[yare::parameterized(
    source = { "{\"last_role\": \"source\"}", SyncRole::Source },
    target = { "{\"last_role\": \"target\"}", SyncRole::Target },
)]
fn well_formed_file_reads_role(content: &str, expected: SyncRole) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sync-history.json");
    std::fs::write(&path, content).unwrap();
    assert_eq!(read_last_role(&path), HistoryReadOutcome::Recorded(expected));
}

#[yare::parameterized(
    invalid_json  = { "{not json" },
    missing_key   = { "{\"other\": 1}" },
    invalid_value = { "{\"last_role\": \"sideways\"}" },
)]
fn corrupted_file_biases_to_source(content: &str) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sync-history.json");
    std::fs::write(&path, content).unwrap();
    let outcome = read_last_role(&path);
    assert_eq!(outcome, HistoryReadOutcome::Corrupted);
    assert_eq!(outcome.effective_role(), Some(SyncRole::Source));
}

#[test]
fn record_writes_and_overwrites() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested/sync-history.json");

    record_local_role(&path, SyncRole::Source).unwrap();
    assert_eq!(
        read_last_role(&path),
        HistoryReadOutcome::Recorded(SyncRole::Source)
    );

    record_local_role(&path, SyncRole::Target).unwrap();
    assert_eq!(
        read_last_role(&path),
        HistoryReadOutcome::Recorded(SyncRole::Target)
    );
    // No temp file left behind.
    assert!(!path.with_extension("json.tmp").exists());
}

#[tokio::test]
async fn remote_record_is_an_idempotent_shell_write() {
    let executor = FakeExecutor::new(Host::Target);
    record_remote_role(&executor, SyncRole::Target).await.unwrap();

    let commands = executor.recorded();
    assert_eq!(commands.len(), 1);
    assert!(commands[0].contains("mkdir -p"));
    assert!(commands[0].contains("{\"last_role\": \"target\"}"));
    assert!(commands[0].contains("sync-history.json"));
}

#[tokio::test]
async fn remote_record_failure_is_fatal() {
    let executor = FakeExecutor::new(Host::Target).on("mkdir -p", 1, "", "disk full");
    let err = record_remote_role(&executor, SyncRole::Target)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("disk full"));
}
