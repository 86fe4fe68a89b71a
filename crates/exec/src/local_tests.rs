// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[tokio::test]
async fn run_captures_stdout() {
    let executor = LocalExecutor::new();
    let result = executor
        .run("echo hello", RunOptions::default())
        .await
        .unwrap();
    assert!(result.success());
    assert_eq!(result.stdout.trim(), "hello");
}

#[tokio::test]
async fn nonzero_exit_is_not_an_error() {
    let executor = LocalExecutor::new();
    let result = executor
        .run("echo oops >&2; exit 3", RunOptions::default())
        .await
        .unwrap();
    assert!(!result.success());
    assert_eq!(result.exit_code, 3);
    assert_eq!(result.stderr.trim(), "oops");
}

#[tokio::test]
async fn timeout_surfaces_as_distinct_error() {
    let executor = LocalExecutor::new();
    let opts = RunOptions {
        timeout: Some(std::time::Duration::from_millis(100)),
        login_shell: None,
    };
    let err = executor.run("sleep 10", opts).await.unwrap_err();
    match err {
        ExecError::Timeout { command, .. } => assert_eq!(command, "sleep 10"),
        other => panic!("expected timeout, got {other:?}"),
    }
}

#[tokio::test]
async fn process_streams_lines() {
    let executor = LocalExecutor::new();
    let mut process = executor
        .start_process("echo one; echo two", RunOptions::default())
        .await
        .unwrap();
    assert_eq!(process.next_stdout_line().await.unwrap().unwrap(), "one");
    assert_eq!(process.next_stdout_line().await.unwrap().unwrap(), "two");
    assert_eq!(process.next_stdout_line().await.unwrap(), None);
    let result = process.wait().await.unwrap();
    assert!(result.success());
}

#[tokio::test]
async fn wait_collects_remaining_output() {
    let executor = LocalExecutor::new();
    let mut process = executor
        .start_process("echo out; echo err >&2; exit 2", RunOptions::default())
        .await
        .unwrap();
    let result = process.wait().await.unwrap();
    assert_eq!(result.exit_code, 2);
    assert_eq!(result.stdout.trim(), "out");
    assert_eq!(result.stderr.trim(), "err");
}

#[tokio::test]
async fn terminate_all_stops_registered_processes() {
    let executor = LocalExecutor::new();
    let mut process = executor
        .start_process("sleep 30", RunOptions::default())
        .await
        .unwrap();
    executor.terminate_all().await;
    // The killed process reports an unsuccessful exit.
    let result = process.wait().await.unwrap();
    assert!(!result.success());
}

#[tokio::test]
async fn terminate_is_idempotent() {
    let executor = LocalExecutor::new();
    let mut process = executor
        .start_process("sleep 30", RunOptions::default())
        .await
        .unwrap();
    process.terminate().await;
    process.terminate().await;
}

#[tokio::test]
async fn local_hostname_resolves() {
    let hostname = local_hostname().await.unwrap();
    assert!(!hostname.is_empty());
}
