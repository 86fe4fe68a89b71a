// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{test_context, yaml_map};

#[test]
fn registry_lists_the_builtin_sync_jobs() {
    let registry = Registry::builtin();
    assert_eq!(registry.names(), vec!["dummy_success", "dummy_fail"]);
}

#[test]
fn registry_constructs_jobs_by_name() {
    let registry = Registry::builtin();
    let spec = registry.get("dummy_success").unwrap();
    let job = (spec.construct)();
    assert_eq!(job.name(), "dummy_success");
    assert_eq!(job.role(), JobRole::Sync);
}

#[test]
fn registry_misses_unknown_names() {
    let registry = Registry::builtin();
    assert!(registry.get("btrfs_snapshots").is_none());
    assert!(registry.get("nope").is_none());
}

#[test]
fn registry_validate_config_delegates_to_the_class() {
    let registry = Registry::builtin();
    let spec = registry.get("dummy_fail").unwrap();
    let errors = (spec.validate_config)(&yaml_map("fail_at_percent: 200"));
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].job.as_deref(), Some("dummy_fail"));
}

#[test]
fn context_resolves_executors_and_hostnames_by_host() {
    let ctx = test_context(yaml_map(""));
    assert_eq!(ctx.executor_for(pcs_core::Host::Source).host(), pcs_core::Host::Source);
    assert_eq!(ctx.executor_for(pcs_core::Host::Target).host(), pcs_core::Host::Target);
    assert_eq!(ctx.hostname_for(pcs_core::Host::Source), "src-host");
    assert_eq!(ctx.hostname_for(pcs_core::Host::Target), "tgt-host");
}

#[test]
fn context_check_cancelled_tracks_the_token() {
    let ctx = test_context(yaml_map(""));
    assert!(ctx.check_cancelled().is_ok());
    ctx.cancel.cancel();
    assert!(matches!(ctx.check_cancelled(), Err(JobError::Cancelled)));
}

#[test]
fn with_config_replaces_only_the_config() {
    let ctx = test_context(yaml_map(""));
    let other = ctx.with_config(yaml_map("fail_at_percent: 30"));
    assert_eq!(other.session_id, ctx.session_id);
    assert!(other.config.get("fail_at_percent").is_some());
    assert!(ctx.config.is_empty());
}
