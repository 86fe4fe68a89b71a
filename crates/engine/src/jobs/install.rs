// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Install-or-upgrade pc-switcher on the target (System role).
//!
//! Runs after the pre-sync snapshots so a botched install is covered by
//! the rollback bracket. Downgrades are never performed automatically: a
//! newer target fails validation before any state changes.

use crate::job::{Job, JobContext, JobError, JobRole};
use crate::log_context;
use async_trait::async_trait;
use pcs_core::{find_one_version, Host, LogLevel, ProgressUpdate, ValidationError, Version};
use pcs_exec::{Executor, RunOptions};

const VERSION_PROBE_TIMEOUT_SECS: u64 = 30;
const INSTALL_TIMEOUT_SECS: u64 = 600;

/// Public installer entry point; the running version is passed via env.
const INSTALLER_URL: &str =
    "https://github.com/flaksit/pc-switcher/releases/latest/download/install.sh";

/// Query the target's installed pc-switcher version.
///
/// `None` means not installed (or not answering `--version` sanely);
/// transport failures propagate.
pub async fn get_target_version(executor: &dyn Executor) -> Result<Option<Version>, JobError> {
    let result = executor
        .run(
            "pc-switcher --version",
            RunOptions::login_shell().with_timeout(VERSION_PROBE_TIMEOUT_SECS),
        )
        .await?;
    if !result.success() {
        return Ok(None);
    }
    Ok(find_one_version(&result.stdout).ok())
}

#[derive(Debug)]
pub struct InstallOnTargetJob {
    source_version: Version,
}

impl InstallOnTargetJob {
    pub fn new(source_version: Version) -> Self {
        Self { source_version }
    }

    async fn install(&self, ctx: &JobContext) -> Result<(), JobError> {
        let cmd = format!(
            "curl -LsSf {INSTALLER_URL} | PC_SWITCHER_VERSION={} sh",
            self.source_version
        );
        let result = ctx
            .target
            .run(
                &cmd,
                RunOptions::login_shell().with_timeout(INSTALL_TIMEOUT_SECS),
            )
            .await?;
        if !result.success() {
            return Err(JobError::Fatal(format!(
                "install script failed on target: {}",
                result.stderr.trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Job for InstallOnTargetJob {
    fn name(&self) -> &'static str {
        "install_on_target"
    }

    fn role(&self) -> JobRole {
        JobRole::System
    }

    async fn validate(&self, ctx: &JobContext) -> Vec<ValidationError> {
        match get_target_version(ctx.target.as_ref()).await {
            Ok(Some(target_version)) if target_version > self.source_version => {
                vec![ValidationError::new(
                    self.name(),
                    Host::Target,
                    format!(
                        "target version {target_version} is newer than source {}; \
                         downgrades are never performed automatically",
                        self.source_version
                    ),
                )]
            }
            Ok(_) => Vec::new(),
            Err(e) => vec![ValidationError::new(
                self.name(),
                Host::Target,
                format!("cannot determine target version: {e}"),
            )],
        }
    }

    async fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        let logger = ctx.logger(self.name());
        logger.report_progress(ProgressUpdate::percent(0.0));

        let target_version = get_target_version(ctx.target.as_ref()).await?;
        match &target_version {
            Some(version) if *version == self.source_version => {
                logger.log(
                    Host::Target,
                    LogLevel::Info,
                    format!("target version {version} matches source, nothing to install"),
                );
                logger.report_progress(ProgressUpdate::percent(100.0));
                return Ok(());
            }
            Some(version) => logger.log_with(
                Host::Target,
                LogLevel::Info,
                format!("upgrading pc-switcher from {version} to {}", self.source_version),
                log_context! { "installer" => INSTALLER_URL },
            ),
            None => logger.log_with(
                Host::Target,
                LogLevel::Info,
                format!("installing pc-switcher {}", self.source_version),
                log_context! { "installer" => INSTALLER_URL },
            ),
        }

        self.install(ctx).await?;
        logger.report_progress(ProgressUpdate::percent(75.0));

        // Verify by re-reading the remote version.
        match get_target_version(ctx.target.as_ref()).await? {
            Some(version) if version == self.source_version => {
                logger.log(
                    Host::Target,
                    LogLevel::Info,
                    format!("installed pc-switcher {version} on target"),
                );
                logger.report_progress(ProgressUpdate::percent(100.0));
                Ok(())
            }
            Some(version) => Err(JobError::Fatal(format!(
                "install verification failed: target reports {version}, expected {}",
                self.source_version
            ))),
            None => Err(JobError::Fatal(
                "install verification failed: pc-switcher still missing on target".to_string(),
            )),
        }
    }
}

#[cfg(test)]
#[path = "install_tests.rs"]
mod tests;
