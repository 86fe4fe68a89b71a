// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::prompt::{AutoDecline, Prompter};
use crate::test_support::{context_with_handles, yaml_map};
use async_trait::async_trait;
use pcs_exec::fake::FakeExecutor;
use std::sync::atomic::{AtomicBool, Ordering};

const GIB: u64 = 1 << 30;

struct RecordingPrompter {
    asked: Arc<AtomicBool>,
    answer: bool,
}

#[async_trait]
impl Prompter for RecordingPrompter {
    async fn confirm(&self, _question: &str) -> bool {
        self.asked.store(true, Ordering::SeqCst);
        self.answer
    }
}

fn orchestrator_with(
    config: Config,
    history_path: PathBuf,
    prompter: Box<dyn Prompter>,
) -> Orchestrator {
    let mut options = OrchestratorOptions::new(Version::parse("0.4.0").unwrap());
    options.history_path = history_path;
    options.colorize = false;
    Orchestrator::new("test-target", config, options, prompter)
}

fn healthy_df() -> String {
    let total = 100 * GIB;
    let available = 50 * GIB;
    format!(
        "Filesystem 1-blocks Used Available Capacity Mounted on\n/dev/sda2 {total} {} {available} 50% /\n",
        total - available
    )
}

fn critical_df() -> String {
    let total = 100 * GIB;
    let available = 5 * GIB; // 5% free, below the 15% runtime minimum
    format!(
        "Filesystem 1-blocks Used Available Capacity Mounted on\n/dev/sda2 {total} {} {available} 95% /\n",
        total - available
    )
}

fn execute_context(
    source_df: String,
    target_df: String,
) -> (crate::job::JobContext, CancellationToken) {
    let (ctx, _, _) = context_with_handles(
        FakeExecutor::new(Host::Source).on("df -P -B1", 0, source_df, ""),
        FakeExecutor::new(Host::Target).on("df -P -B1", 0, target_df, ""),
        serde_yaml::Mapping::new(),
    );
    let stage = CancellationToken::new();
    let ctx = crate::job::JobContext {
        cancel: stage.clone(),
        ..ctx
    };
    (ctx, stage)
}

fn config_with_jobs(yaml: &str) -> Config {
    let value: serde_yaml::Value = if yaml.trim().is_empty() {
        serde_yaml::Value::Null
    } else {
        serde_yaml::from_str(yaml).unwrap()
    };
    let (config, errors) =
        pcs_config::validate_structure(&value, &["dummy_success", "dummy_fail"]);
    assert!(errors.is_empty(), "bad test config: {errors:?}");
    config
}

// -- consecutive-sync check --

#[tokio::test]
async fn consecutive_decline_interrupts_before_any_lock() {
    let dir = tempfile::tempdir().unwrap();
    let history = dir.path().join("sync-history.json");
    std::fs::write(&history, "{\"last_role\": \"source\"}").unwrap();

    let orchestrator =
        orchestrator_with(Config::default(), history, Box::new(AutoDecline));
    let bus = EventBus::new();
    let logger = Logger::unscoped(bus.clone());

    let err = orchestrator
        .check_consecutive_sync(&logger)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Declined));
    assert_eq!(err.final_status(), SessionStatus::Interrupted);
}

#[tokio::test]
async fn consecutive_prompt_skipped_when_last_role_was_target() {
    let dir = tempfile::tempdir().unwrap();
    let history = dir.path().join("sync-history.json");
    std::fs::write(&history, "{\"last_role\": \"target\"}").unwrap();

    let asked = Arc::new(AtomicBool::new(false));
    let prompter = RecordingPrompter {
        asked: Arc::clone(&asked),
        answer: false,
    };
    let orchestrator = orchestrator_with(Config::default(), history, Box::new(prompter));
    let bus = EventBus::new();
    let logger = Logger::unscoped(bus.clone());

    orchestrator.check_consecutive_sync(&logger).await.unwrap();
    assert!(!asked.load(Ordering::SeqCst));
}

#[tokio::test]
async fn corrupted_history_warns_and_prompts() {
    let dir = tempfile::tempdir().unwrap();
    let history = dir.path().join("sync-history.json");
    std::fs::write(&history, "{broken").unwrap();

    let asked = Arc::new(AtomicBool::new(false));
    let prompter = RecordingPrompter {
        asked: Arc::clone(&asked),
        answer: true,
    };
    let orchestrator = orchestrator_with(Config::default(), history, Box::new(prompter));
    let bus = EventBus::new();
    let mut sub = bus.subscribe();
    let logger = Logger::unscoped(bus.clone());

    orchestrator.check_consecutive_sync(&logger).await.unwrap();
    assert!(asked.load(Ordering::SeqCst));
    bus.close();
    let (records, _) = crate::test_support::drain(&mut sub).await;
    assert!(records
        .iter()
        .any(|r| r.level == LogLevel::Warning && r.message.contains("corrupted")));
}

#[tokio::test]
async fn allow_consecutive_bypasses_the_prompt() {
    let dir = tempfile::tempdir().unwrap();
    let history = dir.path().join("sync-history.json");
    std::fs::write(&history, "{\"last_role\": \"source\"}").unwrap();

    let asked = Arc::new(AtomicBool::new(false));
    let prompter = RecordingPrompter {
        asked: Arc::clone(&asked),
        answer: false,
    };
    let mut options = OrchestratorOptions::new(Version::parse("0.4.0").unwrap());
    options.history_path = history;
    options.allow_consecutive = true;
    let orchestrator =
        Orchestrator::new("test-target", Config::default(), options, Box::new(prompter));
    let bus = EventBus::new();
    let logger = Logger::unscoped(bus.clone());

    orchestrator.check_consecutive_sync(&logger).await.unwrap();
    assert!(!asked.load(Ordering::SeqCst));
}

// -- job discovery --

#[tokio::test]
async fn discovery_collects_job_config_errors() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_jobs(
        "sync_jobs:\n  dummy_fail: true\ndummy_fail:\n  fail_at_percent: 150\n",
    );
    let orchestrator = orchestrator_with(
        config,
        dir.path().join("history.json"),
        Box::new(AutoDecline),
    );
    let (ctx, _) = execute_context(healthy_df(), healthy_df());

    let err = orchestrator
        .discover_and_validate_jobs(&ctx, "20250101T120000-abc12345", false)
        .await
        .unwrap_err();
    match err {
        EngineError::Config(errors) => {
            assert_eq!(errors.len(), 1);
            assert_eq!(errors[0].path, "fail_at_percent");
        }
        other => panic!("expected config errors, got {other:?}"),
    }
}

#[tokio::test]
async fn discovery_constructs_enabled_jobs_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_jobs("sync_jobs:\n  dummy_fail: true\n  dummy_success: true\n");
    let orchestrator = orchestrator_with(
        config,
        dir.path().join("history.json"),
        Box::new(AutoDecline),
    );
    // Subvolume checks need to pass on both hosts.
    let (ctx, _, _) = context_with_handles(
        FakeExecutor::new(Host::Source)
            .on("df -P -B1", 0, healthy_df(), "")
            .on("btrfs subvolume show", 0, "@\n@home", ""),
        FakeExecutor::new(Host::Target)
            .on("df -P -B1", 0, healthy_df(), "")
            .on("btrfs subvolume show", 0, "@\n@home", ""),
        serde_yaml::Mapping::new(),
    );

    let (sync_jobs, system_jobs) = orchestrator
        .discover_and_validate_jobs(&ctx, "20250101T120000-abc12345", false)
        .await
        .unwrap();
    let names: Vec<&str> = sync_jobs.iter().map(|j| j.name()).collect();
    assert_eq!(names, vec!["dummy_fail", "dummy_success"]);
    assert!(system_jobs.is_empty());
}

#[tokio::test]
async fn discovery_collects_validation_errors_across_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_jobs("sync_jobs:\n  dummy_success: true\n");
    let orchestrator = orchestrator_with(
        config,
        dir.path().join("history.json"),
        Box::new(AutoDecline),
    );
    // Subvolumes missing on the target; df healthy everywhere.
    let (ctx, _, _) = context_with_handles(
        FakeExecutor::new(Host::Source)
            .on("df -P -B1", 0, healthy_df(), "")
            .on("btrfs subvolume show", 0, "@\n@home", ""),
        FakeExecutor::new(Host::Target)
            .on("df -P -B1", 0, healthy_df(), "")
            .on("btrfs subvolume show", 1, "", "missing")
            .on("test -d /.snapshots", 1, "", ""),
        serde_yaml::Mapping::new(),
    );

    let err = orchestrator
        .discover_and_validate_jobs(&ctx, "20250101T120000-abc12345", false)
        .await
        .unwrap_err();
    match err {
        EngineError::Validation(errors) => {
            assert_eq!(errors.len(), 2, "one per missing subvolume: {errors:?}");
            assert!(errors.iter().all(|e| e.host == Host::Target));
        }
        other => panic!("expected validation errors, got {other:?}"),
    }
}

// -- execute stage --

#[tokio::test(start_paused = true)]
async fn execute_stage_runs_sync_jobs_sequentially() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_jobs(
        "sync_jobs:\n  dummy_success: true\ndummy_success:\n  source_duration: 2\n  target_duration: 2\n",
    );
    let orchestrator = orchestrator_with(
        config,
        dir.path().join("history.json"),
        Box::new(AutoDecline),
    );
    let (ctx, stage) = execute_context(healthy_df(), healthy_df());

    let jobs: Vec<Box<dyn crate::job::Job>> = vec![Box::new(crate::jobs::DummySuccessJob)];
    let (results, error) = orchestrator.execute_stage(&ctx, jobs, stage).await;

    assert!(error.is_none(), "got: {error:?}");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, JobStatus::Success);
    assert_eq!(results[0].job_name, "dummy_success");
    assert!(results[0].ended_at >= results[0].started_at);
}

#[tokio::test(start_paused = true)]
async fn execute_stage_captures_first_error_and_skips_the_rest() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_jobs("sync_jobs:\n  dummy_fail: true\n  dummy_success: true\n");
    let orchestrator = orchestrator_with(
        config,
        dir.path().join("history.json"),
        Box::new(AutoDecline),
    );
    let (ctx, stage) = execute_context(healthy_df(), healthy_df());

    let jobs: Vec<Box<dyn crate::job::Job>> = vec![
        Box::new(crate::jobs::DummyFailJob),
        Box::new(crate::jobs::DummySuccessJob),
    ];
    let (results, error) = orchestrator.execute_stage(&ctx, jobs, stage).await;

    assert!(matches!(error, Some(JobError::Fatal(_))));
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].status, JobStatus::Failed);
    assert!(results[0]
        .error_message
        .as_deref()
        .unwrap()
        .contains("dummy_fail"));
    assert_eq!(results[1].status, JobStatus::Skipped);
}

#[tokio::test(start_paused = true)]
async fn disk_critical_cancels_the_running_job() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_jobs(
        "sync_jobs:\n  dummy_success: true\ndummy_success:\n  source_duration: 600\n  target_duration: 600\n",
    );
    let orchestrator = orchestrator_with(
        config,
        dir.path().join("history.json"),
        Box::new(AutoDecline),
    );
    // The source host is already below the runtime minimum.
    let (ctx, stage) = execute_context(critical_df(), healthy_df());

    let jobs: Vec<Box<dyn crate::job::Job>> = vec![Box::new(crate::jobs::DummySuccessJob)];
    let (results, error) = orchestrator.execute_stage(&ctx, jobs, stage).await;

    match error {
        Some(JobError::DiskSpaceCritical { host, .. }) => assert_eq!(host, Host::Source),
        other => panic!("expected disk-space critical, got {other:?}"),
    }
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].status, JobStatus::Failed);
}

#[tokio::test(start_paused = true)]
async fn user_cancellation_marks_job_cancelled() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_jobs(
        "sync_jobs:\n  dummy_success: true\ndummy_success:\n  source_duration: 600\n  target_duration: 600\n",
    );
    let orchestrator = orchestrator_with(
        config,
        dir.path().join("history.json"),
        Box::new(AutoDecline),
    );
    let (ctx, stage) = execute_context(healthy_df(), healthy_df());

    let jobs: Vec<Box<dyn crate::job::Job>> = vec![Box::new(crate::jobs::DummySuccessJob)];
    let cancel = ctx.cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        cancel.cancel();
    });

    let (results, error) = orchestrator.execute_stage(&ctx, jobs, stage).await;
    assert!(matches!(error, Some(JobError::Cancelled)));
    assert_eq!(results[0].status, JobStatus::Failed);
    assert!(matches!(
        EngineError::Job(JobError::Cancelled).final_status(),
        SessionStatus::Interrupted
    ));
}

#[tokio::test(start_paused = true)]
async fn execute_stage_with_no_sync_jobs_still_winds_down_monitors() {
    let dir = tempfile::tempdir().unwrap();
    let config = config_with_jobs("");
    let orchestrator = orchestrator_with(
        config,
        dir.path().join("history.json"),
        Box::new(AutoDecline),
    );
    let (ctx, stage) = execute_context(healthy_df(), healthy_df());

    let (results, error) = orchestrator.execute_stage(&ctx, Vec::new(), stage).await;
    assert!(results.is_empty());
    assert!(error.is_none());
}
