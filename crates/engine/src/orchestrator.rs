// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session state machine.
//!
//! One `run()` walks the ordered phases: consecutive-sync check, source
//! lock, connect, target lock, version check, job discovery/validation,
//! pre-snapshots, install-on-target, the execute stage (Background jobs
//! concurrent with sequential Sync jobs), post-snapshots, history, and
//! an unconditional cleanup. Any phase error short-circuits to cleanup.

use crate::bus::EventBus;
use crate::history::{self, HistoryReadOutcome};
use crate::job::{Job, JobContext, JobError, Registry};
use crate::jobs::install::get_target_version;
use crate::jobs::{DiskSpaceMonitorJob, InstallOnTargetJob, SnapshotJob};
use crate::logger::Logger;
use crate::prompt::Prompter;
use crate::sinks::{log_filename, logs_dir, JsonFileSink, StreamSink};
use crate::snapshots::session_folder_name;
use chrono::Local;
use pcs_config::Config;
use pcs_core::{
    generate_session_id, ConfigError, Host, JobResult, JobStatus, LogLevel, SessionStatus,
    SnapshotPhase, SyncRole, SyncSession, ValidationError, Version,
};
use pcs_exec::{
    acquire_target_lock, local_hostname, read_target_holder, ExecError, Executor, LocalExecutor,
    SshConnection, SshExecutor, SyncLock, TargetLock,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

const TARGET_LOCK_GRACE: Duration = Duration::from_secs(10);

/// Fatal phase failures; each maps to a final session status.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("lock conflict: {0}")]
    Lock(String),

    #[error("job configuration validation failed:\n{}", format_config_errors(.0))]
    Config(Vec<ConfigError>),

    #[error("system state validation failed:\n{}", format_validation_errors(.0))]
    Validation(Vec<ValidationError>),

    #[error(transparent)]
    Exec(#[from] ExecError),

    #[error(transparent)]
    Job(#[from] JobError),

    #[error("{0}")]
    Fatal(String),

    #[error("sync declined by user")]
    Declined,

    #[error("sync interrupted by user")]
    Interrupted,
}

fn format_config_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

impl EngineError {
    fn final_status(&self) -> SessionStatus {
        match self {
            EngineError::Declined | EngineError::Interrupted => SessionStatus::Interrupted,
            EngineError::Job(JobError::Cancelled) => SessionStatus::Interrupted,
            _ => SessionStatus::Failed,
        }
    }
}

/// Knobs the CLI resolves before handing over.
pub struct OrchestratorOptions {
    /// The running binary's own version.
    pub source_version: Version,
    /// Bypass the consecutive-sync prompt.
    pub allow_consecutive: bool,
    /// Local sync-history file.
    pub history_path: PathBuf,
    /// Source lock file.
    pub lock_path: PathBuf,
    /// Directory for SSH control sockets.
    pub control_dir: PathBuf,
    /// Color the stream sink output.
    pub colorize: bool,
}

impl OrchestratorOptions {
    pub fn new(source_version: Version) -> Self {
        Self {
            source_version,
            allow_consecutive: false,
            history_path: history::history_path(),
            lock_path: pcs_exec::lock_path(),
            control_dir: pcs_exec::data_dir(),
            colorize: true,
        }
    }
}

/// Everything the CLI needs to render the final report.
pub struct SessionSummary {
    pub session: SyncSession,
    pub log_path: PathBuf,
    /// Events lost to sink backpressure.
    pub dropped_events: u64,
    /// Pre-snapshots exist for this session, so rollback is meaningful.
    pub rollback_available: bool,
}

#[derive(Default)]
struct Resources {
    source_lock: Option<SyncLock>,
    connection: Option<Arc<SshConnection>>,
    local: Option<Arc<LocalExecutor>>,
    remote: Option<Arc<SshExecutor>>,
    target_lock: Option<TargetLock>,
    pre_snapshots_done: bool,
}

pub struct Orchestrator {
    target: String,
    config: Config,
    options: OrchestratorOptions,
    prompter: Box<dyn Prompter>,
    registry: Registry,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        target: impl Into<String>,
        config: Config,
        options: OrchestratorOptions,
        prompter: Box<dyn Prompter>,
    ) -> Self {
        Self {
            target: target.into(),
            config,
            options,
            prompter,
            registry: Registry::builtin(),
            cancel: CancellationToken::new(),
        }
    }

    /// Token a signal handler cancels to request cooperative shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Execute the complete sync workflow.
    pub async fn run(&self) -> SessionSummary {
        let session_id = generate_session_id();
        let source_hostname = match local_hostname().await {
            Ok(hostname) => hostname,
            Err(_) => "unknown".to_string(),
        };
        let mut session = SyncSession::new(&session_id, &source_hostname);

        let bus = EventBus::new();
        let log_path = logs_dir().join(log_filename(&session_id));
        let json_sink =
            JsonFileSink::spawn(bus.subscribe(), log_path.clone(), self.config.logging.file);
        let stream_sink = StreamSink::spawn(
            bus.subscribe(),
            self.config.logging.tui,
            self.options.colorize,
        );
        let logger = Logger::unscoped(bus.clone());

        let mut resources = Resources::default();
        let outcome = self
            .run_phases(&mut session, &mut resources, &bus, &logger)
            .await;

        match &outcome {
            Ok(()) => {
                session.status = SessionStatus::Completed;
                logger.log_unhosted(LogLevel::Info, "sync completed successfully");
            }
            Err(e) => {
                session.status = e.final_status();
                session.error_message = Some(e.to_string());
                let level = match session.status {
                    SessionStatus::Interrupted => LogLevel::Warning,
                    _ => LogLevel::Critical,
                };
                logger.log_unhosted(level, format!("sync {}: {e}", session.status));
            }
        }
        session.ended_at = Some(Local::now());

        let was_connected = resources.connection.is_some();
        self.cleanup(&mut resources).await;
        if was_connected {
            bus.publish(pcs_core::Event::Connection {
                status: pcs_core::ConnectionStatus::Disconnected,
                latency_ms: None,
            });
        }

        let dropped_events = bus.dropped_count();
        bus.close();
        if let Err(e) = json_sink.await {
            tracing::debug!(error = %e, "json sink join failed");
        }
        if let Err(e) = stream_sink.await {
            tracing::debug!(error = %e, "stream sink join failed");
        }

        let rollback_available =
            resources.pre_snapshots_done && session.status == SessionStatus::Failed;
        SessionSummary {
            session,
            log_path,
            dropped_events,
            rollback_available,
        }
    }

    async fn run_phases(
        &self,
        session: &mut SyncSession,
        resources: &mut Resources,
        bus: &EventBus,
        logger: &Logger,
    ) -> Result<(), EngineError> {
        // Consecutive-sync check runs before anything is locked so a
        // decline leaves no trace on either host.
        self.check_consecutive_sync(logger).await?;

        logger.log(Host::Source, LogLevel::Info, "acquiring source lock");
        self.acquire_source_lock(session, resources)?;

        logger.log(
            Host::Source,
            LogLevel::Info,
            format!("connecting to target: {}", self.target),
        );
        self.establish_connection(session, resources, bus).await?;

        logger.log(Host::Target, LogLevel::Info, "acquiring target lock");
        self.acquire_target_lock_phase(session, resources).await?;

        logger.log(
            Host::Target,
            LogLevel::Info,
            "checking pc-switcher version compatibility",
        );
        let install_needed = self.check_version_compatibility(resources, logger).await?;

        logger.log(
            Host::Source,
            LogLevel::Info,
            "discovering and validating jobs",
        );
        let session_folder = session_folder_name(&session.id);
        let stage_cancel = self.cancel.child_token();
        let base_ctx = self.base_context(session, resources, bus, stage_cancel.clone());
        let (sync_jobs, system_jobs) =
            self.discover_and_validate_jobs(&base_ctx, &session_folder, install_needed)
                .await?;

        logger.log(Host::Source, LogLevel::Info, "creating pre-sync snapshots");
        let pre_job = SnapshotJob::new(
            SnapshotPhase::Pre,
            self.config.btrfs_snapshots.subvolumes.clone(),
            session_folder.clone(),
        );
        pre_job.execute(&base_ctx).await?;
        resources.pre_snapshots_done = true;

        if install_needed {
            logger.log(
                Host::Target,
                LogLevel::Info,
                "installing pc-switcher on target",
            );
            for job in &system_jobs {
                job.execute(&base_ctx).await?;
            }
        }

        logger.log(Host::Source, LogLevel::Info, "starting sync operations");
        let (results, first_error) = self
            .execute_stage(&base_ctx, sync_jobs, stage_cancel)
            .await;
        session.job_results = results;
        if let Some(error) = first_error {
            return Err(error.into());
        }
        if self.cancel.is_cancelled() {
            return Err(EngineError::Interrupted);
        }

        logger.log(Host::Source, LogLevel::Info, "creating post-sync snapshots");
        let post_job = SnapshotJob::new(
            SnapshotPhase::Post,
            self.config.btrfs_snapshots.subvolumes.clone(),
            session_folder,
        );
        // Post-snapshot failure is reported, never fatal: the sync
        // itself already happened.
        let post_ctx = self.base_context(session, resources, bus, self.cancel.child_token());
        if let Err(e) = post_job.execute(&post_ctx).await {
            logger.log(
                Host::Source,
                LogLevel::Warning,
                format!("post-sync snapshots failed: {e}"),
            );
        }

        logger.log(Host::Source, LogLevel::Info, "recording sync history");
        self.record_history(resources).await?;

        Ok(())
    }

    async fn check_consecutive_sync(&self, logger: &Logger) -> Result<(), EngineError> {
        if self.options.allow_consecutive {
            return Ok(());
        }
        let outcome = history::read_last_role(&self.options.history_path);
        if outcome == HistoryReadOutcome::Corrupted {
            logger.log_unhosted(
                LogLevel::Warning,
                "sync history file is corrupted; assuming this host was the source",
            );
        }
        if outcome.effective_role() != Some(SyncRole::Source) {
            return Ok(());
        }
        let confirmed = self
            .prompter
            .confirm(
                "This machine was the source of the previous sync. Syncing again \
                 will overwrite changes made on the other machine. Continue?",
            )
            .await;
        if !confirmed {
            return Err(EngineError::Declined);
        }
        Ok(())
    }

    fn acquire_source_lock(
        &self,
        session: &SyncSession,
        resources: &mut Resources,
    ) -> Result<(), EngineError> {
        let mut lock = SyncLock::new(&self.options.lock_path);
        let holder = format!("source:{}:{}", session.source_hostname, session.id);
        match lock.acquire(&holder) {
            Ok(true) => {
                resources.source_lock = Some(lock);
                Ok(())
            }
            Ok(false) => {
                let holder = lock.holder().unwrap_or_else(|| "unknown".to_string());
                Err(EngineError::Lock(format!(
                    "this machine is already involved in a sync (held by: {holder})"
                )))
            }
            Err(e) => Err(EngineError::Fatal(format!("cannot acquire source lock: {e}"))),
        }
    }

    async fn establish_connection(
        &self,
        session: &mut SyncSession,
        resources: &mut Resources,
        bus: &EventBus,
    ) -> Result<(), EngineError> {
        let connect_started = std::time::Instant::now();
        let connection = Arc::new(
            SshConnection::connect(&self.target, &self.options.control_dir, &session.id).await?,
        );
        let local = Arc::new(LocalExecutor::new());
        let remote = Arc::new(SshExecutor::new(Arc::clone(&connection)));

        session.target_hostname = remote.hostname().await?;
        bus.publish(pcs_core::Event::Connection {
            status: pcs_core::ConnectionStatus::Connected,
            latency_ms: Some(connect_started.elapsed().as_millis() as u64),
        });

        resources.connection = Some(connection);
        resources.local = Some(local);
        resources.remote = Some(remote);
        Ok(())
    }

    async fn acquire_target_lock_phase(
        &self,
        session: &SyncSession,
        resources: &mut Resources,
    ) -> Result<(), EngineError> {
        let remote = resources.remote_executor();
        let holder = format!("source:{}:{}", session.source_hostname, session.id);
        match acquire_target_lock(remote.as_ref(), &holder, TARGET_LOCK_GRACE).await? {
            Some(lock) => {
                resources.target_lock = Some(lock);
                Ok(())
            }
            None => {
                let holder = read_target_holder(remote.as_ref())
                    .await
                    .unwrap_or_else(|| "unknown".to_string());
                Err(EngineError::Lock(format!(
                    "target {} is already involved in a sync (held by: {holder})",
                    session.target_hostname
                )))
            }
        }
    }

    async fn check_version_compatibility(
        &self,
        resources: &Resources,
        logger: &Logger,
    ) -> Result<bool, EngineError> {
        let remote = resources.remote_executor();
        let source_version = &self.options.source_version;
        match get_target_version(remote.as_ref()).await? {
            None => {
                logger.log(
                    Host::Target,
                    LogLevel::Info,
                    format!("pc-switcher not found on target, will install {source_version}"),
                );
                Ok(true)
            }
            Some(target_version) if &target_version > source_version => {
                Err(EngineError::Fatal(format!(
                    "target version {target_version} is newer than source {source_version}; \
                     run the sync from the newer machine or upgrade this one"
                )))
            }
            Some(target_version) if &target_version < source_version => {
                logger.log(
                    Host::Target,
                    LogLevel::Info,
                    format!(
                        "target version {target_version} is outdated, will upgrade to {source_version}"
                    ),
                );
                Ok(true)
            }
            Some(target_version) => {
                logger.log(
                    Host::Target,
                    LogLevel::Info,
                    format!("target version {target_version} matches source"),
                );
                Ok(false)
            }
        }
    }

    fn base_context(
        &self,
        session: &SyncSession,
        resources: &Resources,
        bus: &EventBus,
        cancel: CancellationToken,
    ) -> JobContext {
        JobContext {
            config: serde_yaml::Mapping::new(),
            source: resources.local_executor(),
            target: resources.remote_executor(),
            bus: bus.clone(),
            session_id: session.id.clone(),
            source_hostname: session.source_hostname.clone(),
            target_hostname: session.target_hostname.clone(),
            cancel,
        }
    }

    /// Construct enabled Sync jobs and the System/Background set, then
    /// validate configs and live state, collecting every error.
    #[allow(clippy::type_complexity)]
    async fn discover_and_validate_jobs(
        &self,
        base_ctx: &JobContext,
        session_folder: &str,
        install_needed: bool,
    ) -> Result<(Vec<Box<dyn Job>>, Vec<Box<dyn Job>>), EngineError> {
        let mut config_errors: Vec<ConfigError> = Vec::new();
        let mut sync_jobs: Vec<Box<dyn Job>> = Vec::new();

        for name in self.config.enabled_jobs() {
            let Some(spec) = self.registry.get(name) else {
                // Unknown names were rejected at config load; a miss here
                // is a registry drift bug.
                config_errors.push(ConfigError::new(
                    format!("sync_jobs.{name}"),
                    "job not found in registry",
                ));
                continue;
            };
            let job_config = self.config.get_job_config(name);
            let errors = (spec.validate_config)(&job_config);
            if errors.is_empty() {
                sync_jobs.push((spec.construct)());
            } else {
                config_errors.extend(errors);
            }
        }
        if !config_errors.is_empty() {
            return Err(EngineError::Config(config_errors));
        }

        let mut system_jobs: Vec<Box<dyn Job>> = Vec::new();
        if install_needed {
            system_jobs.push(Box::new(InstallOnTargetJob::new(
                self.options.source_version.clone(),
            )));
        }

        let snapshot_job = SnapshotJob::new(
            SnapshotPhase::Pre,
            self.config.btrfs_snapshots.subvolumes.clone(),
            session_folder.to_string(),
        );
        let monitors = self.monitors();

        let mut validation_errors: Vec<ValidationError> = Vec::new();
        validation_errors.extend(snapshot_job.validate(base_ctx).await);
        for job in &system_jobs {
            validation_errors.extend(job.validate(base_ctx).await);
        }
        for monitor in &monitors {
            validation_errors.extend(monitor.validate(base_ctx).await);
        }
        for job in &sync_jobs {
            let ctx = base_ctx.with_config(self.config.get_job_config(job.name()));
            validation_errors.extend(job.validate(&ctx).await);
        }
        if !validation_errors.is_empty() {
            return Err(EngineError::Validation(validation_errors));
        }

        Ok((sync_jobs, system_jobs))
    }

    fn monitors(&self) -> Vec<DiskSpaceMonitorJob> {
        vec![
            DiskSpaceMonitorJob::new(
                Host::Source,
                "/",
                self.config.disk_space_monitor.clone(),
            ),
            DiskSpaceMonitorJob::new(
                Host::Target,
                "/",
                self.config.disk_space_monitor.clone(),
            ),
        ]
    }

    /// The EXECUTE phase: Background monitors concurrent with strictly
    /// sequential Sync jobs inside one cancellation scope.
    async fn execute_stage(
        &self,
        base_ctx: &JobContext,
        sync_jobs: Vec<Box<dyn Job>>,
        stage_cancel: CancellationToken,
    ) -> (Vec<JobResult>, Option<JobError>) {
        let mut background: JoinSet<Result<(), JobError>> = JoinSet::new();
        for monitor in self.monitors() {
            let ctx = base_ctx.clone();
            background.spawn(async move { monitor.execute(&ctx).await });
        }

        let mut results: Vec<JobResult> = Vec::new();
        let mut first_error: Option<JobError> = None;

        for job in sync_jobs {
            if first_error.is_some() || base_ctx.cancel.is_cancelled() {
                let now = Local::now();
                results.push(JobResult {
                    job_name: job.name().to_string(),
                    status: JobStatus::Skipped,
                    started_at: now,
                    ended_at: now,
                    error_message: None,
                });
                continue;
            }

            let ctx = base_ctx.with_config(self.config.get_job_config(job.name()));
            let logger = Logger::unscoped(base_ctx.bus.clone());
            let started_at = Local::now();

            let outcome = tokio::select! {
                result = job.execute(&ctx) => result,
                Some(finished) = background.join_next() => {
                    Err(flatten_background(finished))
                }
            };

            let ended_at = Local::now();
            match outcome {
                Ok(()) => {
                    logger.log(
                        Host::Source,
                        LogLevel::Info,
                        format!("job {} completed successfully", job.name()),
                    );
                    results.push(JobResult {
                        job_name: job.name().to_string(),
                        status: JobStatus::Success,
                        started_at,
                        ended_at,
                        error_message: None,
                    });
                }
                Err(error) => {
                    logger.log(
                        Host::Source,
                        LogLevel::Critical,
                        format!("job {} failed: {error}", job.name()),
                    );
                    results.push(JobResult {
                        job_name: job.name().to_string(),
                        status: JobStatus::Failed,
                        started_at,
                        ended_at,
                        error_message: Some(error.to_string()),
                    });
                    stage_cancel.cancel();
                    first_error = Some(error);
                }
            }
        }

        // Wind down the Background jobs; a real failure there outranks
        // a clean Sync stage.
        stage_cancel.cancel();
        while let Some(finished) = background.join_next().await {
            match finished {
                Ok(Ok(())) | Ok(Err(JobError::Cancelled)) => {}
                Ok(Err(error)) => {
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
                Err(join_error) => {
                    if first_error.is_none() {
                        first_error = Some(JobError::Fatal(format!(
                            "background job crashed: {join_error}"
                        )));
                    }
                }
            }
        }

        (results, first_error)
    }

    async fn record_history(&self, resources: &Resources) -> Result<(), EngineError> {
        history::record_local_role(&self.options.history_path, SyncRole::Source)
            .map_err(|e| EngineError::Fatal(format!("cannot record local sync history: {e}")))?;
        history::record_remote_role(resources.remote_executor().as_ref(), SyncRole::Target)
            .await?;
        Ok(())
    }

    /// Phase CLEANUP: always runs, tolerates every failure.
    async fn cleanup(&self, resources: &mut Resources) {
        if let Some(local) = &resources.local {
            local.terminate_all().await;
        }
        if let Some(remote) = &resources.remote {
            remote.terminate_all().await;
        }
        if let Some(lock) = resources.target_lock.take() {
            lock.release().await;
        }
        if let Some(connection) = resources.connection.take() {
            connection.disconnect().await;
        }
        if let Some(mut lock) = resources.source_lock.take() {
            lock.release();
        }
    }
}

impl Resources {
    #[allow(clippy::expect_used)] // set during CONNECT, before any use
    fn local_executor(&self) -> Arc<dyn pcs_exec::Executor> {
        self.local.clone().expect("local executor initialized") as Arc<dyn pcs_exec::Executor>
    }

    #[allow(clippy::expect_used)] // set during CONNECT, before any use
    fn remote_executor(&self) -> Arc<dyn pcs_exec::Executor> {
        self.remote.clone().expect("remote executor initialized") as Arc<dyn pcs_exec::Executor>
    }
}

fn flatten_background(
    finished: Result<Result<(), JobError>, tokio::task::JoinError>,
) -> JobError {
    match finished {
        Ok(Ok(())) => JobError::Fatal("background job exited unexpectedly".to_string()),
        Ok(Err(error)) => error,
        Err(join_error) => JobError::Fatal(format!("background job crashed: {join_error}")),
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
