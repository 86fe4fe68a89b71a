// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural validation of the parsed YAML document.
//!
//! The walker mirrors a draft-07 schema: fixed section types, enumerated
//! log levels, threshold string patterns, integer ranges, and
//! `additionalProperties: false` on `sync_jobs` (unknown job names are
//! rejected). Every failure is collected; nothing aborts early.

use crate::model::{BtrfsSnapshotsConfig, Config, DiskSpaceMonitorConfig, LoggingConfig};
use crate::threshold::Threshold;
use pcs_core::{ConfigError, LogLevel};
use serde_yaml::{Mapping, Value};

const CHECK_INTERVAL_MIN: u64 = 1;
const CHECK_INTERVAL_MAX: u64 = 3600;

/// Validate the top-level structure and build the typed config.
///
/// Returns the config (with defaults applied for anything absent) and all
/// structural errors found. The config is only meaningful when the error
/// list is empty.
pub fn validate_structure(value: &Value, known_jobs: &[&str]) -> (Config, Vec<ConfigError>) {
    let mut config = Config::default();
    let mut errors = Vec::new();

    let mapping = match value {
        // Empty document: every section takes its default.
        Value::Null => return (config, errors),
        Value::Mapping(mapping) => mapping,
        _ => {
            errors.push(ConfigError::new("(root)", "configuration must be a mapping"));
            return (config, errors);
        }
    };

    for (key, section) in mapping {
        let Some(name) = key.as_str() else {
            errors.push(ConfigError::new("(root)", "section keys must be strings"));
            continue;
        };
        match name {
            "logging" => config.logging = parse_logging(section, &mut errors),
            "sync_jobs" => config.sync_jobs = parse_sync_jobs(section, known_jobs, &mut errors),
            "disk_space_monitor" => {
                config.disk_space_monitor = parse_disk_monitor(section, &mut errors)
            }
            "btrfs_snapshots" => config.btrfs_snapshots = parse_btrfs(section, &mut errors),
            job_name if known_jobs.contains(&job_name) => match section {
                Value::Mapping(job_section) => {
                    config
                        .job_configs
                        .insert(job_name.to_string(), job_section.clone());
                }
                _ => errors.push(ConfigError::new(job_name, "job section must be a mapping")),
            },
            other => errors.push(ConfigError::new(other, "unknown configuration section")),
        }
    }

    (config, errors)
}

fn expect_mapping<'a>(
    section: &'a Value,
    path: &str,
    errors: &mut Vec<ConfigError>,
) -> Option<&'a Mapping> {
    match section {
        Value::Mapping(mapping) => Some(mapping),
        _ => {
            errors.push(ConfigError::new(path, "must be a mapping"));
            None
        }
    }
}

fn parse_logging(section: &Value, errors: &mut Vec<ConfigError>) -> LoggingConfig {
    let mut logging = LoggingConfig::default();
    let Some(mapping) = expect_mapping(section, "logging", errors) else {
        return logging;
    };
    for (key, value) in mapping {
        let Some(sink) = key.as_str() else {
            errors.push(ConfigError::new("logging", "keys must be strings"));
            continue;
        };
        let path = format!("logging.{sink}");
        let slot = match sink {
            "file" => &mut logging.file,
            "tui" => &mut logging.tui,
            "external" => &mut logging.external,
            _ => {
                errors.push(ConfigError::new(path, "unknown logging sink"));
                continue;
            }
        };
        match value.as_str().map(str::parse::<LogLevel>) {
            Some(Ok(level)) => *slot = level,
            Some(Err(e)) => errors.push(ConfigError::new(path, e.to_string())),
            None => errors.push(ConfigError::new(path, "must be a log level string")),
        }
    }
    logging
}

fn parse_sync_jobs(
    section: &Value,
    known_jobs: &[&str],
    errors: &mut Vec<ConfigError>,
) -> indexmap::IndexMap<String, bool> {
    let mut jobs = indexmap::IndexMap::new();
    let Some(mapping) = expect_mapping(section, "sync_jobs", errors) else {
        return jobs;
    };
    for (key, value) in mapping {
        let Some(name) = key.as_str() else {
            errors.push(ConfigError::new("sync_jobs", "keys must be strings"));
            continue;
        };
        let path = format!("sync_jobs.{name}");
        if !known_jobs.contains(&name) {
            errors.push(ConfigError::new(path, "unknown job name"));
            continue;
        }
        match value.as_bool() {
            Some(enabled) => {
                jobs.insert(name.to_string(), enabled);
            }
            None => errors.push(ConfigError::new(path, "must be a boolean")),
        }
    }
    jobs
}

fn parse_disk_monitor(section: &Value, errors: &mut Vec<ConfigError>) -> DiskSpaceMonitorConfig {
    let mut monitor = DiskSpaceMonitorConfig::default();
    let Some(mapping) = expect_mapping(section, "disk_space_monitor", errors) else {
        return monitor;
    };
    for (key, value) in mapping {
        let Some(field) = key.as_str() else {
            errors.push(ConfigError::new("disk_space_monitor", "keys must be strings"));
            continue;
        };
        let path = format!("disk_space_monitor.{field}");
        match field {
            "preflight_minimum" | "runtime_minimum" | "warning_threshold" => {
                let Some(raw) = value.as_str() else {
                    errors.push(ConfigError::new(path, "must be a threshold string"));
                    continue;
                };
                match raw.parse::<Threshold>() {
                    Ok(threshold) => match field {
                        "preflight_minimum" => {
                            monitor.preflight_minimum = threshold;
                            monitor.preflight_minimum_raw = raw.to_string();
                        }
                        "runtime_minimum" => {
                            monitor.runtime_minimum = threshold;
                            monitor.runtime_minimum_raw = raw.to_string();
                        }
                        _ => {
                            monitor.warning_threshold = threshold;
                            monitor.warning_threshold_raw = raw.to_string();
                        }
                    },
                    Err(e) => errors.push(ConfigError::new(path, e.to_string())),
                }
            }
            "check_interval" => match value.as_u64() {
                Some(secs) if (CHECK_INTERVAL_MIN..=CHECK_INTERVAL_MAX).contains(&secs) => {
                    monitor.check_interval_secs = secs;
                }
                Some(secs) => errors.push(ConfigError::new(
                    path,
                    format!(
                        "{secs} out of range ({CHECK_INTERVAL_MIN}..={CHECK_INTERVAL_MAX} seconds)"
                    ),
                )),
                None => errors.push(ConfigError::new(path, "must be an integer")),
            },
            _ => errors.push(ConfigError::new(path, "unknown field")),
        }
    }
    monitor
}

fn parse_btrfs(section: &Value, errors: &mut Vec<ConfigError>) -> BtrfsSnapshotsConfig {
    let mut btrfs = BtrfsSnapshotsConfig::default();
    let Some(mapping) = expect_mapping(section, "btrfs_snapshots", errors) else {
        return btrfs;
    };

    // `subvolumes` is required whenever the section is written out; the
    // default list only applies when the whole section is absent.
    if mapping.get("subvolumes").is_none() {
        errors.push(ConfigError::new(
            "btrfs_snapshots.subvolumes",
            "required field is missing",
        ));
    }

    for (key, value) in mapping {
        let Some(field) = key.as_str() else {
            errors.push(ConfigError::new("btrfs_snapshots", "keys must be strings"));
            continue;
        };
        let path = format!("btrfs_snapshots.{field}");
        match field {
            "subvolumes" => match value.as_sequence() {
                Some(seq) if !seq.is_empty() => {
                    let mut subvolumes = Vec::with_capacity(seq.len());
                    for entry in seq {
                        match entry.as_str() {
                            Some(name) if !name.is_empty() => subvolumes.push(name.to_string()),
                            _ => errors.push(ConfigError::new(
                                path.clone(),
                                "entries must be non-empty strings",
                            )),
                        }
                    }
                    btrfs.subvolumes = subvolumes;
                }
                Some(_) => errors.push(ConfigError::new(path, "must not be empty")),
                None => errors.push(ConfigError::new(path, "must be a list of subvolume names")),
            },
            "snapshot_dir" => match value.as_str() {
                Some(dir) => btrfs.snapshot_dir = dir.to_string(),
                None => errors.push(ConfigError::new(path, "must be a string")),
            },
            "keep_recent" => match value.as_u64() {
                Some(n) if n <= u32::MAX as u64 => btrfs.keep_recent = n as u32,
                _ => errors.push(ConfigError::new(path, "must be a non-negative integer")),
            },
            "max_age_days" => match value {
                Value::Null => btrfs.max_age_days = None,
                _ => match value.as_u64() {
                    Some(days) if days >= 1 && days <= u32::MAX as u64 => {
                        btrfs.max_age_days = Some(days as u32);
                    }
                    _ => errors.push(ConfigError::new(path, "must be a positive integer or null")),
                },
            },
            _ => errors.push(ConfigError::new(path, "unknown field")),
        }
    }
    btrfs
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
