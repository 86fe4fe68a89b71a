// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot bracketing job (System role).
//!
//! Instantiated twice per session: once with the PRE phase before any
//! sync job runs, once with POST after the last one. Both instances
//! write into the same session folder.

use crate::job::{Job, JobContext, JobError, JobRole};
use crate::log_context;
use crate::snapshots::{
    self, create_snapshot, ensure_snapshot_dir, mount_point_for, verify_subvolume,
};
use async_trait::async_trait;
use pcs_core::{Host, LogLevel, ProgressUpdate, SnapshotPhase, ValidationError, SNAPSHOT_ROOT};
use pcs_exec::RunOptions;

#[derive(Debug)]
pub struct SnapshotJob {
    phase: SnapshotPhase,
    subvolumes: Vec<String>,
    session_folder: String,
}

impl SnapshotJob {
    pub fn new(phase: SnapshotPhase, subvolumes: Vec<String>, session_folder: String) -> Self {
        Self {
            phase,
            subvolumes,
            session_folder,
        }
    }

    async fn snapshot_host(&self, ctx: &JobContext, host: Host, done: &mut usize, total: usize)
        -> Result<(), JobError> {
        let executor = ctx.executor_for(host);
        let logger = ctx.logger(self.name());

        ensure_snapshot_dir(executor, host)
            .await
            .map_err(|e| JobError::Fatal(e.to_string()))?;

        let folder_path = format!("{SNAPSHOT_ROOT}/{}", self.session_folder);
        let mkdir = executor
            .run(&format!("sudo mkdir -p {folder_path}"), RunOptions::default())
            .await?;
        if !mkdir.success() {
            return Err(JobError::Fatal(format!(
                "cannot create session folder {folder_path} on {host}: {}",
                mkdir.stderr.trim()
            )));
        }

        for subvolume in &self.subvolumes {
            ctx.check_cancelled()?;
            let name = snapshots::snapshot_name(subvolume, self.phase);
            let snapshot_path = format!("{folder_path}/{name}");
            let mount_point = mount_point_for(subvolume);

            let result = create_snapshot(executor, &mount_point, &snapshot_path).await?;
            if !result.success() {
                return Err(JobError::Fatal(format!(
                    "snapshot of {subvolume} failed on {host}: {}",
                    result.stderr.trim()
                )));
            }
            logger.log_with(
                host,
                LogLevel::Info,
                format!("created {} snapshot of {subvolume}", self.phase),
                log_context! { "path" => snapshot_path },
            );

            *done += 1;
            logger.report_progress(ProgressUpdate::percent(
                *done as f64 / total as f64 * 100.0,
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Job for SnapshotJob {
    fn name(&self) -> &'static str {
        "btrfs_snapshots"
    }

    fn role(&self) -> JobRole {
        JobRole::System
    }

    async fn validate(&self, ctx: &JobContext) -> Vec<ValidationError> {
        let mut errors = Vec::new();
        for host in [Host::Source, Host::Target] {
            let executor = ctx.executor_for(host);

            // A plain-directory /.snapshots cannot be upgraded in place;
            // catch it before any state changes. Absent is fine — it is
            // created as a subvolume during execute.
            let show = executor
                .run(
                    "sudo btrfs subvolume show /.snapshots 2>&1",
                    RunOptions::default(),
                )
                .await;
            if let Ok(result) = show {
                if !result.success() {
                    if let Ok(exists) =
                        executor.run("test -d /.snapshots", RunOptions::default()).await
                    {
                        if exists.success() {
                            errors.push(ValidationError::new(
                                self.name(),
                                host,
                                "/.snapshots exists but is not a btrfs subvolume",
                            ));
                        }
                    }
                }
            }

            for subvolume in &self.subvolumes {
                let mount_point = mount_point_for(subvolume);
                if let Err(e) = verify_subvolume(executor, subvolume, &mount_point, host).await {
                    errors.push(ValidationError::new(self.name(), host, e.to_string()));
                }
            }
        }
        errors
    }

    async fn execute(&self, ctx: &JobContext) -> Result<(), JobError> {
        let logger = ctx.logger(self.name());
        logger.report_progress(ProgressUpdate::percent(0.0));
        logger.log(
            Host::Source,
            LogLevel::Info,
            format!("creating {} snapshots", self.phase),
        );

        let total = self.subvolumes.len() * 2;
        let mut done = 0;
        self.snapshot_host(ctx, Host::Source, &mut done, total).await?;
        self.snapshot_host(ctx, Host::Target, &mut done, total).await?;

        logger.log(
            Host::Source,
            LogLevel::Info,
            format!("{} snapshots complete", self.phase),
        );
        Ok(())
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
