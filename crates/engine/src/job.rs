// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The job framework.
//!
//! A job is one step of the pipeline with a validate/execute contract.
//! Class-level concerns (name, config validation, construction) live in
//! the [`Registry`]; instance behavior is the [`Job`] trait. Jobs receive
//! everything they need through an immutable [`JobContext`].

use crate::bus::EventBus;
use crate::logger::Logger;
use async_trait::async_trait;
use pcs_core::{ConfigError, Host, ValidationError};
use pcs_exec::{ExecError, Executor};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// When a job runs, relative to the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobRole {
    /// Infrastructure; always runs regardless of `sync_jobs`.
    System,
    /// User-facing; runs iff enabled in `sync_jobs`.
    Sync,
    /// Runs concurrently for the duration of the Sync stage.
    Background,
}

/// Fatal job failures.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("{0}")]
    Fatal(String),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error("disk space critically low on {hostname}: {free_space} free, minimum {threshold}")]
    DiskSpaceCritical {
        host: Host,
        hostname: String,
        free_space: String,
        threshold: String,
    },

    #[error("cancelled")]
    Cancelled,
}

/// Immutable per-job bundle handed to `validate` and `execute`.
#[derive(Clone)]
pub struct JobContext {
    /// The job's own config section (empty mapping when unconfigured).
    pub config: serde_yaml::Mapping,
    pub source: Arc<dyn Executor>,
    pub target: Arc<dyn Executor>,
    pub bus: EventBus,
    pub session_id: String,
    pub source_hostname: String,
    pub target_hostname: String,
    /// Cooperative cancellation for the whole session.
    pub cancel: CancellationToken,
}

impl JobContext {
    pub fn executor_for(&self, host: Host) -> &dyn Executor {
        match host {
            Host::Source => self.source.as_ref(),
            Host::Target => self.target.as_ref(),
        }
    }

    pub fn hostname_for(&self, host: Host) -> &str {
        match host {
            Host::Source => &self.source_hostname,
            Host::Target => &self.target_hostname,
        }
    }

    /// Logger stamped with the given job name.
    pub fn logger(&self, job: &str) -> Logger {
        Logger::for_job(self.bus.clone(), job)
    }

    /// A copy of this context with a different config section.
    pub fn with_config(&self, config: serde_yaml::Mapping) -> Self {
        Self {
            config,
            ..self.clone()
        }
    }

    /// Error out promptly when the session was cancelled.
    pub fn check_cancelled(&self) -> Result<(), JobError> {
        if self.cancel.is_cancelled() {
            return Err(JobError::Cancelled);
        }
        Ok(())
    }
}

/// One step of the sync pipeline.
#[async_trait]
pub trait Job: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &'static str;

    fn role(&self) -> JobRole;

    /// Probe the live system without mutating it; all problems are
    /// collected, never raised.
    async fn validate(&self, ctx: &JobContext) -> Vec<ValidationError>;

    /// Do the work. Must observe cancellation within seconds and report
    /// progress at least at the start and the end.
    async fn execute(&self, ctx: &JobContext) -> Result<(), JobError>;
}

/// Class-level description of an optional job.
pub struct JobSpec {
    pub name: &'static str,
    /// Pure config validation; collects every error.
    pub validate_config: fn(&serde_yaml::Mapping) -> Vec<ConfigError>,
    pub construct: fn() -> Box<dyn Job>,
}

/// Maps `sync_jobs` names to their job classes.
pub struct Registry {
    specs: Vec<JobSpec>,
}

impl Registry {
    /// The built-in optional jobs.
    pub fn builtin() -> Self {
        Self {
            specs: vec![
                crate::jobs::dummy::success_spec(),
                crate::jobs::dummy::fail_spec(),
            ],
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.specs.iter().map(|spec| spec.name).collect()
    }

    pub fn get(&self, name: &str) -> Option<&JobSpec> {
        self.specs.iter().find(|spec| spec.name == name)
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
