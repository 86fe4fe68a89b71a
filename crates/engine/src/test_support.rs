// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::bus::EventBus;
use crate::job::JobContext;
use pcs_core::{Event, Host, LogRecord};
use pcs_exec::fake::FakeExecutor;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Context backed by default fake executors.
pub fn test_context(config: serde_yaml::Mapping) -> JobContext {
    context_with(
        FakeExecutor::new(Host::Source),
        FakeExecutor::new(Host::Target),
        config,
    )
}

/// Context backed by the given scripted executors.
pub fn context_with(
    source: FakeExecutor,
    target: FakeExecutor,
    config: serde_yaml::Mapping,
) -> JobContext {
    let (ctx, _, _) = context_with_handles(source, target, config);
    ctx
}

/// Like [`context_with`], but keeps handles to the fakes so tests can
/// inspect recorded commands after the context takes ownership.
pub fn context_with_handles(
    source: FakeExecutor,
    target: FakeExecutor,
    config: serde_yaml::Mapping,
) -> (JobContext, Arc<FakeExecutor>, Arc<FakeExecutor>) {
    let source = Arc::new(source);
    let target = Arc::new(target);
    let ctx = JobContext {
        config,
        source: Arc::clone(&source) as Arc<dyn pcs_exec::Executor>,
        target: Arc::clone(&target) as Arc<dyn pcs_exec::Executor>,
        bus: EventBus::new(),
        session_id: "abc12345".to_string(),
        source_hostname: "src-host".to_string(),
        target_hostname: "tgt-host".to_string(),
        cancel: CancellationToken::new(),
    };
    (ctx, source, target)
}

/// Drain a closed bus subscription into (log records, progress percents).
pub async fn drain(
    sub: &mut crate::bus::Subscription,
) -> (Vec<LogRecord>, Vec<f64>) {
    let mut records = Vec::new();
    let mut percents = Vec::new();
    while let Some(event) = sub.recv().await {
        match event {
            Event::Log(record) => records.push(record),
            Event::Progress { update, .. } => {
                if let Some(percent) = update.percent {
                    percents.push(percent);
                }
            }
            Event::Connection { .. } => {}
        }
    }
    (records, percents)
}

/// Parse YAML into a mapping for job configs.
pub fn yaml_map(text: &str) -> serde_yaml::Mapping {
    if text.trim().is_empty() {
        return serde_yaml::Mapping::new();
    }
    #[allow(clippy::unwrap_used)]
    let mapping = serde_yaml::from_str(text).unwrap();
    mapping
}
