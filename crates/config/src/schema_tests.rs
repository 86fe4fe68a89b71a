// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

const KNOWN: &[&str] = &["dummy_success", "dummy_fail"];

fn validate(yaml: &str) -> (Config, Vec<ConfigError>) {
    let value: Value = serde_yaml::from_str(yaml).unwrap();
    validate_structure(&value, KNOWN)
}

fn errors_for(yaml: &str) -> Vec<ConfigError> {
    validate(yaml).1
}

#[test]
fn empty_document_yields_defaults() {
    let (config, errors) = validate_structure(&Value::Null, KNOWN);
    assert!(errors.is_empty());
    assert_eq!(config.logging.file, LogLevel::Debug);
    assert_eq!(config.logging.tui, LogLevel::Info);
    assert_eq!(config.logging.external, LogLevel::Warning);
    assert_eq!(config.disk_space_monitor.check_interval_secs, 30);
    assert_eq!(config.btrfs_snapshots.subvolumes, vec!["@", "@home"]);
    assert_eq!(config.btrfs_snapshots.keep_recent, 3);
    assert_eq!(config.btrfs_snapshots.max_age_days, None);
}

#[test]
fn valid_document_parses() {
    let (config, errors) = validate(
        r#"
logging:
  file: FULL
  tui: WARNING
sync_jobs:
  dummy_success: true
  dummy_fail: false
disk_space_monitor:
  runtime_minimum: "10 GiB"
  check_interval: 60
btrfs_snapshots:
  subvolumes: ["@", "@home", "@root"]
  keep_recent: 5
  max_age_days: 14
dummy_success:
  source_duration: 4
"#,
    );
    assert!(errors.is_empty(), "unexpected errors: {errors:?}");
    assert_eq!(config.logging.file, LogLevel::Full);
    // untouched sinks keep their defaults
    assert_eq!(config.logging.external, LogLevel::Warning);
    assert_eq!(config.enabled_jobs(), vec!["dummy_success"]);
    assert_eq!(
        config.disk_space_monitor.runtime_minimum,
        Threshold::Absolute(10 * (1 << 30))
    );
    assert_eq!(config.disk_space_monitor.runtime_minimum_raw, "10 GiB");
    assert_eq!(config.btrfs_snapshots.max_age_days, Some(14));
    assert_eq!(
        config
            .get_job_config("dummy_success")
            .get("source_duration")
            .and_then(Value::as_u64),
        Some(4)
    );
    // unconfigured job section is an empty mapping
    assert!(config.get_job_config("dummy_fail").is_empty());
}

#[test]
fn unknown_job_name_under_sync_jobs() {
    let errors = errors_for("sync_jobs:\n  nonexistent: true\n");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "sync_jobs.nonexistent");
    assert!(errors[0].message.contains("unknown job name"));
}

#[test]
fn infrastructure_jobs_are_rejected_under_sync_jobs() {
    let errors = errors_for("sync_jobs:\n  btrfs_snapshots: true\n");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "sync_jobs.btrfs_snapshots");
}

#[test]
fn non_boolean_sync_job_value() {
    let errors = errors_for("sync_jobs:\n  dummy_success: \"yes\"\n");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("boolean"));
}

#[test]
fn missing_subvolumes_is_an_error_when_section_present() {
    let errors = errors_for("btrfs_snapshots:\n  keep_recent: 2\n");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "btrfs_snapshots.subvolumes");
    assert!(errors[0].message.contains("required"));
}

#[yare::parameterized(
    zero      = { 0 },
    too_large = { 9999 },
)]
fn out_of_range_check_interval(value: u64) {
    let errors = errors_for(&format!("disk_space_monitor:\n  check_interval: {value}\n"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "disk_space_monitor.check_interval");
    assert!(errors[0].message.contains("out of range"));
}

#[test]
fn threshold_without_unit() {
    let errors = errors_for("disk_space_monitor:\n  runtime_minimum: \"15\"\n");
    assert_eq!(errors.len(), 1);
    assert!(errors[0].message.contains("no unit"));
}

#[test]
fn invalid_log_level() {
    let errors = errors_for("logging:\n  tui: LOUD\n");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "logging.tui");
}

#[test]
fn unknown_top_level_section() {
    let errors = errors_for("surprise:\n  key: 1\n");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].path, "surprise");
}

#[test]
fn every_error_is_collected_in_one_pass() {
    let errors = errors_for(
        r#"
logging:
  tui: LOUD
sync_jobs:
  nonexistent: true
  dummy_success: 3
disk_space_monitor:
  runtime_minimum: "15"
  check_interval: 0
btrfs_snapshots:
  keep_recent: 1
"#,
    );
    assert_eq!(errors.len(), 6, "got: {errors:?}");
    for error in &errors {
        assert!(!error.path.is_empty());
        assert!(!error.message.is_empty());
    }
}
