// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Collected validation failures.
//!
//! Both error kinds are values, not panics: callers gather every failure
//! across jobs and present them to the user in one batch.

use crate::host::Host;
use serde::{Deserialize, Serialize};

/// A live-system validation failure reported by a job's `validate()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub job: String,
    pub host: Host,
    pub message: String,
}

impl ValidationError {
    pub fn new(job: impl Into<String>, host: Host, message: impl Into<String>) -> Self {
        Self {
            job: job.into(),
            host,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.job, self.host, self.message)
    }
}

/// A configuration-file failure with a dotted path into the document.
///
/// `job` is absent for failures in the top-level structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    pub path: String,
    pub message: String,
}

impl ConfigError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            job: None,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn for_job(
        job: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            job: Some(job.into()),
            path: path.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.job {
            Some(job) => write!(f, "{}: {} - {}", job, self.path, self.message),
            None => write!(f, "{} - {}", self.path, self.message),
        }
    }
}
