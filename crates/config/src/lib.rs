// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pcs-config: YAML configuration for pc-switcher.
//!
//! Loading is a fixed pipeline: parse the YAML document (syntax errors
//! carry line numbers and abort), validate the top-level structure
//! collecting every error, then apply defaults. Per-job sections are
//! validated later by the jobs that own them.

mod model;
mod schema;
mod threshold;

pub use model::{
    default_config_path, default_config_template, BtrfsSnapshotsConfig, Config,
    DiskSpaceMonitorConfig, LoggingConfig,
};
pub use schema::validate_structure;
pub use threshold::{Threshold, ThresholdError};

use pcs_core::ConfigError;
use std::path::Path;

/// Fatal configuration-loading failures.
///
/// `Invalid` aggregates every structural error found in one pass so the
/// user sees them all at once.
#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("configuration file not found: {0}")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML syntax error in {path} at line {line}: {message}")]
    Syntax {
        path: String,
        line: usize,
        message: String,
    },
    #[error("invalid configuration:\n{}", format_errors(errors))]
    Invalid { errors: Vec<ConfigError> },
}

fn format_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Load and validate the configuration file.
///
/// `known_jobs` is the registry's set of optional job names; anything else
/// under `sync_jobs` is a structural error.
pub fn load_config(path: &Path, known_jobs: &[&str]) -> Result<Config, ConfigLoadError> {
    if !path.exists() {
        return Err(ConfigLoadError::NotFound(path.display().to_string()));
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_config(&text, path, known_jobs)
}

/// Parse a configuration document from a string.
pub fn parse_config(
    text: &str,
    path: &Path,
    known_jobs: &[&str],
) -> Result<Config, ConfigLoadError> {
    let value: serde_yaml::Value = if text.trim().is_empty() {
        serde_yaml::Value::Null
    } else {
        serde_yaml::from_str(text).map_err(|e| ConfigLoadError::Syntax {
            path: path.display().to_string(),
            line: e.location().map(|l| l.line()).unwrap_or(0),
            message: e.to_string(),
        })?
    };

    let (config, errors) = schema::validate_structure(&value, known_jobs);
    if !errors.is_empty() {
        return Err(ConfigLoadError::Invalid { errors });
    }

    let mut config = config;
    config.path = path.to_path_buf();
    Ok(config)
}

#[cfg(test)]
#[path = "load_tests.rs"]
mod tests;
