// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Continuous disk-space monitoring (Background job).
//!
//! One instance per host polls `df` at the configured interval and
//! compares free space against three floors: above the warning threshold
//! it emits a heartbeat, between warning and runtime minimum it warns,
//! and below the runtime minimum it raises — which, through the shared
//! execution scope, cancels every other job in the session.

use crate::job::{Job, JobContext, JobError, JobRole};
use crate::log_context;
use async_trait::async_trait;
use pcs_config::{DiskSpaceMonitorConfig, Threshold};
use pcs_core::{format_bytes, Host, LogLevel, ProgressUpdate, ValidationError};
use pcs_exec::{Executor, RunOptions};
use std::time::Duration;

/// Free-space figures for one mount point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskSpace {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

impl DiskSpace {
    fn free_string(&self, threshold: &Threshold) -> String {
        match threshold {
            Threshold::Percent(_) if self.total_bytes > 0 => {
                let free = self.available_bytes as f64 / self.total_bytes as f64 * 100.0;
                format!("{free:.1}%")
            }
            _ => format_bytes(self.available_bytes),
        }
    }
}

/// Query free space via `df -P -B1`.
pub async fn check_disk_space(
    executor: &dyn Executor,
    mount_point: &str,
) -> Result<DiskSpace, JobError> {
    let cmd = format!("df -P -B1 {mount_point}");
    let result = executor.run(&cmd, RunOptions::timeout(30)).await?;
    if !result.success() {
        return Err(JobError::Fatal(format!(
            "df failed for {mount_point}: {}",
            result.stderr.trim()
        )));
    }
    parse_df_output(&result.stdout)
        .ok_or_else(|| JobError::Fatal(format!("unparseable df output for {mount_point}")))
}

// POSIX df: Filesystem 1-blocks Used Available Capacity Mounted-on
fn parse_df_output(output: &str) -> Option<DiskSpace> {
    let line = output.lines().nth(1)?;
    let fields: Vec<&str> = line.split_whitespace().collect();
    Some(DiskSpace {
        total_bytes: fields.get(1)?.parse().ok()?,
        available_bytes: fields.get(3)?.parse().ok()?,
    })
}

/// Background job watching one host's free space.
#[derive(Debug)]
pub struct DiskSpaceMonitorJob {
    host: Host,
    mount_point: String,
    config: DiskSpaceMonitorConfig,
}

impl DiskSpaceMonitorJob {
    pub fn new(host: Host, mount_point: impl Into<String>, config: DiskSpaceMonitorConfig) -> Self {
        Self {
            host,
            mount_point: mount_point.into(),
            config,
        }
    }

    /// One poll: classify free space and emit the matching signal.
    async fn check_once(&self, ctx: &JobContext) -> Result<(), JobError> {
        let executor = ctx.executor_for(self.host);
        let hostname = ctx.hostname_for(self.host);
        let logger = ctx.logger(self.name());

        let space = check_disk_space(executor, &self.mount_point).await?;

        if self
            .config
            .runtime_minimum
            .is_below(space.available_bytes, space.total_bytes)
        {
            logger.log_with(
                self.host,
                LogLevel::Critical,
                format!("disk space critically low on {hostname}"),
                log_context! {
                    "mount_point" => self.mount_point.clone(),
                    "available_bytes" => space.available_bytes,
                    "threshold" => self.config.runtime_minimum_raw.clone(),
                },
            );
            return Err(JobError::DiskSpaceCritical {
                host: self.host,
                hostname: hostname.to_string(),
                free_space: space.free_string(&self.config.runtime_minimum),
                threshold: self.config.runtime_minimum_raw.clone(),
            });
        }

        if self
            .config
            .warning_threshold
            .is_below(space.available_bytes, space.total_bytes)
        {
            logger.log_with(
                self.host,
                LogLevel::Warning,
                format!("disk space getting low on {hostname}"),
                log_context! {
                    "mount_point" => self.mount_point.clone(),
                    "available_bytes" => space.available_bytes,
                    "available_formatted" => format_bytes(space.available_bytes),
                    "warning_threshold" => self.config.warning_threshold_raw.clone(),
                },
            );
        } else {
            logger.report_progress(ProgressUpdate::heartbeat());
        }
        Ok(())
    }
}

#[async_trait]
impl Job for DiskSpaceMonitorJob {
    fn name(&self) -> &'static str {
        "disk_space_monitor"
    }

    fn role(&self) -> JobRole {
        JobRole::Background
    }

    async fn validate(&self, ctx: &JobContext) -> Vec<ValidationError> {
        let executor = ctx.executor_for(self.host);
        match check_disk_space(executor, &self.mount_point).await {
            Ok(_) => Vec::new(),
            Err(e) => vec![ValidationError::new(
                self.name(),
                self.host,
                format!("mount point {} not monitorable: {e}", self.mount_point),
            )],
        }
    }

    async fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        let logger = ctx.logger(self.name());
        logger.log_with(
            self.host,
            LogLevel::Debug,
            format!("starting disk space monitoring for {}", self.mount_point),
            log_context! {
                "interval" => self.config.check_interval_secs,
                "threshold" => self.config.runtime_minimum_raw.clone(),
            },
        );

        let interval = Duration::from_secs(self.config.check_interval_secs);
        loop {
            self.check_once(ctx).await?;
            tokio::select! {
                _ = ctx.cancel.cancelled() => {
                    logger.log(
                        self.host,
                        LogLevel::Debug,
                        format!("disk space monitoring cancelled for {}", self.mount_point),
                    );
                    return Err(JobError::Cancelled);
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}

#[cfg(test)]
#[path = "disk_monitor_tests.rs"]
mod tests;
