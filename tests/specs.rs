// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workspace-level CLI specs.
//!
//! These drive the built `pc-switcher` binary end to end for the
//! commands that work without a second host. XDG environment overrides
//! keep every run inside its own temp directory.

use assert_cmd::Command;
use tempfile::TempDir;

struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    fn new() -> Self {
        Self {
            home: tempfile::tempdir().expect("tempdir"),
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("pc-switcher").expect("binary");
        let home = self.home.path();
        cmd.env("HOME", home)
            .env("XDG_CONFIG_HOME", home.join(".config"))
            .env("XDG_DATA_HOME", home.join(".local/share"))
            .env("NO_COLOR", "1");
        cmd
    }

    fn config_path(&self) -> std::path::PathBuf {
        self.home
            .path()
            .join(".config/pc-switcher/config.yaml")
    }
}

#[test]
fn help_lists_all_commands() {
    let sandbox = Sandbox::new();
    let assert = sandbox.cmd().arg("--help").assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    for command in [
        "sync",
        "logs",
        "rollback",
        "cleanup-snapshots",
        "init",
        "self",
    ] {
        assert!(output.contains(command), "missing {command} in help");
    }
}

#[test]
fn version_prints_a_parseable_version() {
    let sandbox = Sandbox::new();
    let assert = sandbox.cmd().arg("--version").assert().success();
    let output = String::from_utf8(assert.get_output().stdout.clone()).expect("utf8");
    assert!(output.contains("pc-switcher"));
    assert!(output.split_whitespace().any(|token| {
        token.chars().next().is_some_and(|c| c.is_ascii_digit())
    }));
}

#[test]
#[serial_test::serial]
fn init_writes_the_default_config() {
    let sandbox = Sandbox::new();
    sandbox.cmd().arg("init").assert().success();

    let config = std::fs::read_to_string(sandbox.config_path()).expect("config written");
    assert!(config.contains("btrfs_snapshots:"));
    assert!(config.contains("disk_space_monitor:"));
    assert!(config.contains("sync_jobs:"));
}

#[test]
#[serial_test::serial]
fn init_refuses_to_overwrite_without_force() {
    let sandbox = Sandbox::new();
    sandbox.cmd().arg("init").assert().success();
    std::fs::write(sandbox.config_path(), "# customized\n").expect("write");

    sandbox.cmd().arg("init").assert().code(1);
    let content = std::fs::read_to_string(sandbox.config_path()).expect("read");
    assert_eq!(content, "# customized\n");

    sandbox.cmd().args(["init", "--force"]).assert().success();
    let content = std::fs::read_to_string(sandbox.config_path()).expect("read");
    assert!(content.contains("btrfs_snapshots:"));
}

#[test]
fn sync_fails_cleanly_without_a_config() {
    let sandbox = Sandbox::new();
    let assert = sandbox
        .cmd()
        .args(["sync", "nonexistent-host"])
        .assert()
        .code(1);
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8");
    assert!(stderr.contains("configuration"), "got: {stderr}");
}

#[test]
fn sync_reports_all_config_errors_at_once() {
    let sandbox = Sandbox::new();
    let config_dir = sandbox.config_path();
    std::fs::create_dir_all(config_dir.parent().expect("parent")).expect("mkdir");
    std::fs::write(
        &config_dir,
        "sync_jobs:\n  bogus_job: true\nlogging:\n  tui: LOUD\n",
    )
    .expect("write");

    let assert = sandbox
        .cmd()
        .args(["sync", "nonexistent-host"])
        .assert()
        .code(1);
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8");
    assert!(stderr.contains("bogus_job"), "got: {stderr}");
    assert!(stderr.contains("logging.tui"), "got: {stderr}");
}

#[test]
fn logs_with_no_history_is_quiet_success() {
    let sandbox = Sandbox::new();
    sandbox.cmd().arg("logs").assert().success();
    sandbox.cmd().args(["logs", "--last"]).assert().success();
}

#[test]
fn cleanup_snapshots_rejects_bad_durations() {
    let sandbox = Sandbox::new();
    std::fs::create_dir_all(sandbox.config_path().parent().expect("parent")).expect("mkdir");
    std::fs::write(sandbox.config_path(), "").expect("write");

    let assert = sandbox
        .cmd()
        .args(["cleanup-snapshots", "--older-than", "fortnight"])
        .assert()
        .code(1);
    let stderr = String::from_utf8(assert.get_output().stderr.clone()).expect("utf8");
    assert!(stderr.contains("fortnight") || stderr.contains("duration"));
}
