// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reference Sync jobs for smoke-testing the pipeline.
//!
//! `dummy_success` simulates a two-phase transfer (source work, then
//! target work) with periodic logs and monotonic progress. `dummy_fail`
//! climbs in 10-point steps and blows up at a configured percentage.

use crate::job::{Job, JobContext, JobError, JobRole, JobSpec};
use crate::log_context;
use async_trait::async_trait;
use pcs_core::{ConfigError, Host, LogLevel, ProgressUpdate, ValidationError};
use std::time::Duration;

const STEP_SECS: u64 = 2;
const MAX_DURATION_SECS: u64 = 3600;
const DEFAULT_PHASE_SECS: u64 = 10;
const DEFAULT_FAIL_AT_PERCENT: u64 = 60;

pub fn success_spec() -> JobSpec {
    JobSpec {
        name: "dummy_success",
        validate_config: DummySuccessJob::validate_config,
        construct: || Box::new(DummySuccessJob),
    }
}

pub fn fail_spec() -> JobSpec {
    JobSpec {
        name: "dummy_fail",
        validate_config: DummyFailJob::validate_config,
        construct: || Box::new(DummyFailJob),
    }
}

fn duration_field(
    config: &serde_yaml::Mapping,
    job: &str,
    field: &str,
    errors: &mut Vec<ConfigError>,
) -> u64 {
    match config.get(field) {
        None => DEFAULT_PHASE_SECS,
        Some(value) => match value.as_u64() {
            Some(secs) if (1..=MAX_DURATION_SECS).contains(&secs) => secs,
            Some(secs) => {
                errors.push(ConfigError::for_job(
                    job,
                    field,
                    format!("{secs} out of range (1..={MAX_DURATION_SECS} seconds)"),
                ));
                DEFAULT_PHASE_SECS
            }
            None => {
                errors.push(ConfigError::for_job(job, field, "must be an integer"));
                DEFAULT_PHASE_SECS
            }
        },
    }
}

fn reject_unknown_fields(
    config: &serde_yaml::Mapping,
    job: &str,
    known: &[&str],
    errors: &mut Vec<ConfigError>,
) {
    for key in config.keys() {
        match key.as_str() {
            Some(name) if known.contains(&name) => {}
            Some(name) => errors.push(ConfigError::for_job(job, name, "unknown field")),
            None => errors.push(ConfigError::for_job(job, "(root)", "keys must be strings")),
        }
    }
}

/// Sleep one step or bail out on cancellation.
async fn step_or_cancel(ctx: &JobContext, job: &str, host: Host) -> Result<(), JobError> {
    tokio::select! {
        _ = ctx.cancel.cancelled() => {
            ctx.logger(job)
                .log(host, LogLevel::Info, "cancellation requested, stopping");
            Err(JobError::Cancelled)
        }
        _ = tokio::time::sleep(Duration::from_secs(STEP_SECS)) => Ok(()),
    }
}

/// Simulated transfer that always succeeds.
#[derive(Debug)]
pub struct DummySuccessJob;

impl DummySuccessJob {
    pub fn validate_config(config: &serde_yaml::Mapping) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        reject_unknown_fields(
            config,
            "dummy_success",
            &["source_duration", "target_duration"],
            &mut errors,
        );
        duration_field(config, "dummy_success", "source_duration", &mut errors);
        duration_field(config, "dummy_success", "target_duration", &mut errors);
        errors
    }

    async fn run_phase(
        &self,
        ctx: &JobContext,
        host: Host,
        duration_secs: u64,
        progress_start: f64,
    ) -> Result<(), JobError> {
        let logger = ctx.logger(self.name());
        let steps = (duration_secs / STEP_SECS).max(1);
        let midpoint = steps / 2;

        logger.log_with(
            host,
            LogLevel::Info,
            format!("starting {host} phase"),
            log_context! { "duration_secs" => duration_secs },
        );

        for step in 0..steps {
            step_or_cancel(ctx, self.name(), host).await?;
            logger.log(
                host,
                LogLevel::Info,
                format!("working ({}/{} steps)", step + 1, steps),
            );
            if step + 1 == midpoint {
                logger.log(host, LogLevel::Warning, "halfway point reached");
                logger.report_progress(ProgressUpdate::percent(progress_start + 25.0));
            }
        }
        logger.report_progress(ProgressUpdate::percent(progress_start + 50.0));
        Ok(())
    }
}

#[async_trait]
impl Job for DummySuccessJob {
    fn name(&self) -> &'static str {
        "dummy_success"
    }

    fn role(&self) -> JobRole {
        JobRole::Sync
    }

    async fn validate(&self, _ctx: &JobContext) -> Vec<ValidationError> {
        Vec::new()
    }

    async fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        let mut errors = Vec::new();
        let source_secs = duration_field(&ctx.config, self.name(), "source_duration", &mut errors);
        let target_secs = duration_field(&ctx.config, self.name(), "target_duration", &mut errors);

        let logger = ctx.logger(self.name());
        logger.report_progress(ProgressUpdate::percent(0.0));
        self.run_phase(ctx, Host::Source, source_secs, 0.0).await?;
        self.run_phase(ctx, Host::Target, target_secs, 50.0).await?;
        logger.log(Host::Source, LogLevel::Info, "dummy sync complete");
        Ok(())
    }
}

/// Simulated transfer that fails at a configured percentage.
#[derive(Debug)]
pub struct DummyFailJob;

impl DummyFailJob {
    pub fn validate_config(config: &serde_yaml::Mapping) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        reject_unknown_fields(config, "dummy_fail", &["fail_at_percent"], &mut errors);
        Self::fail_at(config, &mut errors);
        errors
    }

    fn fail_at(config: &serde_yaml::Mapping, errors: &mut Vec<ConfigError>) -> u64 {
        match config.get("fail_at_percent") {
            None => DEFAULT_FAIL_AT_PERCENT,
            Some(value) => match value.as_u64() {
                Some(percent) if percent <= 100 => percent,
                Some(percent) => {
                    errors.push(ConfigError::for_job(
                        "dummy_fail",
                        "fail_at_percent",
                        format!("{percent} out of range (0..=100)"),
                    ));
                    DEFAULT_FAIL_AT_PERCENT
                }
                None => {
                    errors.push(ConfigError::for_job(
                        "dummy_fail",
                        "fail_at_percent",
                        "must be an integer",
                    ));
                    DEFAULT_FAIL_AT_PERCENT
                }
            },
        }
    }
}

#[async_trait]
impl Job for DummyFailJob {
    fn name(&self) -> &'static str {
        "dummy_fail"
    }

    fn role(&self) -> JobRole {
        JobRole::Sync
    }

    async fn validate(&self, _ctx: &JobContext) -> Vec<ValidationError> {
        Vec::new()
    }

    async fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        let mut ignored = Vec::new();
        let fail_at = Self::fail_at(&ctx.config, &mut ignored);
        let logger = ctx.logger(self.name());

        for percent in (0..=100u64).step_by(10) {
            logger.report_progress(ProgressUpdate::percent(percent as f64));
            if percent >= fail_at {
                logger.log_with(
                    Host::Source,
                    LogLevel::Critical,
                    "simulated failure",
                    log_context! { "fail_at_percent" => fail_at },
                );
                return Err(JobError::Fatal(format!(
                    "dummy_fail failed at {percent}%"
                )));
            }
            step_or_cancel(ctx, self.name(), Host::Source).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "dummy_tests.rs"]
mod tests;
