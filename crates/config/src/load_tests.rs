// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use pcs_core::LogLevel;
use std::path::PathBuf;

const KNOWN: &[&str] = &["dummy_success", "dummy_fail"];

#[test]
fn empty_file_produces_defaults() {
    let config = parse_config("", &PathBuf::from("test.yaml"), KNOWN).unwrap();
    assert_eq!(config.logging.file, LogLevel::Debug);
    assert_eq!(config.logging.tui, LogLevel::Info);
    assert_eq!(config.logging.external, LogLevel::Warning);
    assert_eq!(config.disk_space_monitor.check_interval_secs, 30);
    assert_eq!(config.btrfs_snapshots.subvolumes, vec!["@", "@home"]);
    assert_eq!(config.btrfs_snapshots.keep_recent, 3);
}

#[test]
fn syntax_error_carries_line_number() {
    let text = "logging:\n  file: DEBUG\n   bad_indent: x\n";
    let err = parse_config(text, &PathBuf::from("broken.yaml"), KNOWN).unwrap_err();
    match err {
        ConfigLoadError::Syntax { line, path, .. } => {
            assert!(line > 0);
            assert_eq!(path, "broken.yaml");
        }
        other => panic!("expected syntax error, got {other:?}"),
    }
}

#[test]
fn structural_errors_abort_with_full_list() {
    let text = "sync_jobs:\n  bogus: true\nlogging:\n  file: NOPE\n";
    let err = parse_config(text, &PathBuf::from("test.yaml"), KNOWN).unwrap_err();
    match err {
        ConfigLoadError::Invalid { errors } => {
            assert_eq!(errors.len(), 2);
        }
        other => panic!("expected invalid error, got {other:?}"),
    }
}

#[test]
fn missing_file_is_reported() {
    let missing = tempfile::tempdir().unwrap().path().join("nope.yaml");
    let err = load_config(&missing, KNOWN).unwrap_err();
    assert!(matches!(err, ConfigLoadError::NotFound(_)));
}

#[test]
fn file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "sync_jobs:\n  dummy_success: true\n").unwrap();
    let config = load_config(&path, KNOWN).unwrap();
    assert_eq!(config.enabled_jobs(), vec!["dummy_success"]);
    assert_eq!(config.path, path);
}

#[test]
fn default_template_is_loadable() {
    let config = parse_config(
        default_config_template(),
        &PathBuf::from("config.yaml"),
        KNOWN,
    )
    .unwrap();
    assert_eq!(config.btrfs_snapshots.subvolumes, vec!["@", "@home"]);
    assert!(config.enabled_jobs().is_empty());
}
