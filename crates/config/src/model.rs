// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed configuration model and defaults.

use crate::threshold::Threshold;
use indexmap::IndexMap;
use pcs_core::LogLevel;
use std::path::PathBuf;

/// Per-sink log-level thresholds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// JSON file sink threshold.
    pub file: LogLevel,
    /// Terminal stream sink threshold.
    pub tui: LogLevel,
    /// Threshold for internal/third-party diagnostics.
    pub external: LogLevel,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            file: LogLevel::Debug,
            tui: LogLevel::Info,
            external: LogLevel::Warning,
        }
    }
}

/// Disk-space monitor settings.
///
/// The raw threshold strings are kept alongside the parsed values: error
/// and warning messages quote them back to the user as written.
#[derive(Debug, Clone, PartialEq)]
pub struct DiskSpaceMonitorConfig {
    pub preflight_minimum: Threshold,
    pub runtime_minimum: Threshold,
    pub warning_threshold: Threshold,
    pub check_interval_secs: u64,
    pub preflight_minimum_raw: String,
    pub runtime_minimum_raw: String,
    pub warning_threshold_raw: String,
}

impl Default for DiskSpaceMonitorConfig {
    fn default() -> Self {
        Self {
            preflight_minimum: Threshold::Percent(20.0),
            runtime_minimum: Threshold::Percent(15.0),
            warning_threshold: Threshold::Percent(25.0),
            check_interval_secs: 30,
            preflight_minimum_raw: "20%".to_string(),
            runtime_minimum_raw: "15%".to_string(),
            warning_threshold_raw: "25%".to_string(),
        }
    }
}

/// Snapshot retention and subvolume settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BtrfsSnapshotsConfig {
    pub subvolumes: Vec<String>,
    pub snapshot_dir: String,
    pub keep_recent: u32,
    pub max_age_days: Option<u32>,
}

impl Default for BtrfsSnapshotsConfig {
    fn default() -> Self {
        Self {
            subvolumes: vec!["@".to_string(), "@home".to_string()],
            snapshot_dir: "/.snapshots".to_string(),
            keep_recent: 3,
            max_age_days: None,
        }
    }
}

/// The fully validated configuration document.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub logging: LoggingConfig,
    /// Optional jobs in execution order, mapped to their enabled flag.
    pub sync_jobs: IndexMap<String, bool>,
    pub disk_space_monitor: DiskSpaceMonitorConfig,
    pub btrfs_snapshots: BtrfsSnapshotsConfig,
    /// Raw per-job sections, keyed by job name.
    pub job_configs: IndexMap<String, serde_yaml::Mapping>,
    pub path: PathBuf,
}

impl Config {
    /// Names of jobs enabled under `sync_jobs`, in configuration order.
    pub fn enabled_jobs(&self) -> Vec<&str> {
        self.sync_jobs
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// The raw section for a job; empty mapping when unconfigured.
    pub fn get_job_config(&self, name: &str) -> serde_yaml::Mapping {
        self.job_configs.get(name).cloned().unwrap_or_default()
    }
}

/// Default location of the configuration file.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pc-switcher")
        .join("config.yaml")
}

/// Commented default config written by `pc-switcher init`.
pub fn default_config_template() -> &'static str {
    r#"# pc-switcher configuration file
# See https://github.com/flaksit/pc-switcher for details.

# Log-level thresholds per sink: DEBUG, FULL, INFO, WARNING, ERROR, CRITICAL
logging:
  file: DEBUG       # JSON log file
  tui: INFO         # terminal output
  external: WARNING # internal/third-party diagnostics

# Disk space monitoring.
# Thresholds MUST carry a unit: "N%" for percentage, "N GiB"/"N MiB" absolute.
disk_space_monitor:
  preflight_minimum: "20%"   # free space required to start a sync
  runtime_minimum: "15%"     # abort the sync below this
  warning_threshold: "25%"   # warn below this
  check_interval: 30         # seconds between checks

# Btrfs snapshot bracketing.
btrfs_snapshots:
  subvolumes:        # flat subvolume names from 'btrfs subvolume list /'
    - "@"            # root filesystem (mounted at /)
    - "@home"        # home directories (mounted at /home)
  snapshot_dir: "/.snapshots"
  keep_recent: 3     # sync sessions whose snapshots are always kept
  # max_age_days: 7  # delete older sessions beyond keep_recent

# Optional sync jobs, in execution order.
sync_jobs:
  # dummy_success: false
  # dummy_fail: false

# Per-job sections follow, keyed by job name.
# dummy_success:
#   source_duration: 10
#   target_duration: 10
"#
}
