// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::bus::EventBus;
use pcs_core::Host;

fn record(level: LogLevel, message: &str) -> LogRecord {
    LogRecord::new(level, message)
}

#[test]
fn json_line_has_required_fields() {
    let line = json_line(&record(LogLevel::Info, "starting sync"));
    let value: Value = serde_json::from_str(&line).unwrap();
    assert!(value.get("timestamp").is_some());
    assert_eq!(value["level"], "INFO");
    assert_eq!(value["event"], "starting sync");
    assert!(value.get("job").is_none());
    assert!(value.get("host").is_none());
}

#[test]
fn json_line_includes_scope_and_context() {
    let scoped = record(LogLevel::Full, "copied file")
        .with_job("user_data")
        .with_host(Host::Target)
        .with_context("bytes", 4096)
        .with_context("file", "notes.txt");
    let value: Value = serde_json::from_str(&json_line(&scoped)).unwrap();
    assert_eq!(value["job"], "user_data");
    assert_eq!(value["host"], "target");
    // context entries are top-level siblings
    assert_eq!(value["bytes"], 4096);
    assert_eq!(value["file"], "notes.txt");
}

#[test]
fn progress_translates_to_full_record() {
    let update = ProgressUpdate::percent(75.0).with_item("photos/");
    let record = progress_record("user_data", &update);
    assert_eq!(record.level, LogLevel::Full);
    assert_eq!(record.message, "progress_update");
    assert_eq!(record.job.as_deref(), Some("user_data"));
    assert_eq!(record.context["percent"], 75.0);
    assert_eq!(record.context["item"], "photos/");
    assert!(record.context.get("heartbeat").is_none());
}

#[test]
fn stream_line_plain_format() {
    let mut scoped = record(LogLevel::Warning, "disk space getting low")
        .with_job("disk_space_monitor")
        .with_host(Host::Source);
    scoped
        .context
        .insert("available_formatted".to_string(), "12.0 GiB".into());
    let line = stream_line(&scoped, false);
    assert!(line.contains("[WARNING ]"), "got: {line}");
    assert!(line.contains("[disk_space_monitor]"));
    assert!(line.contains("(source)"));
    assert!(line.contains("disk space getting low"));
    assert!(line.ends_with("available_formatted=12.0 GiB"));
}

#[test]
fn stream_line_pads_level_to_eight() {
    let line = stream_line(&record(LogLevel::Info, "x"), false);
    assert!(line.contains("[INFO    ]"), "got: {line}");
}

#[test]
fn stream_line_omits_absent_scope() {
    let line = stream_line(&record(LogLevel::Info, "starting"), false);
    // level bracket is there, job bracket is not
    let brackets = line.matches('[').count();
    assert_eq!(brackets, 1, "got: {line}");
    assert!(!line.contains('('));
}

#[test]
fn stream_line_colors_by_level() {
    let line = stream_line(&record(LogLevel::Critical, "snapshot failed"), true);
    assert!(line.contains("\x1b[1;31m"), "bold red expected: {line:?}");
    let info = stream_line(&record(LogLevel::Info, "ok"), true);
    assert!(info.contains("\x1b[32m"), "green expected: {info:?}");
}

#[tokio::test]
async fn file_sink_filters_by_level() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sync-test.log");
    let bus = EventBus::new();
    let handle = JsonFileSink::spawn(bus.subscribe(), path.clone(), LogLevel::Full);

    bus.publish(Event::Log(record(LogLevel::Debug, "too low")));
    bus.publish(Event::Log(record(LogLevel::Full, "kept")));
    bus.publish(Event::Log(record(LogLevel::Critical, "also kept")));
    bus.close();
    handle.await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    for line in &lines {
        let value: Value = serde_json::from_str(line).unwrap();
        assert!(value.get("timestamp").is_some());
        assert!(value.get("level").is_some());
        assert!(value.get("event").is_some());
    }
}

#[tokio::test]
async fn file_sink_at_info_excludes_full() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sync-test.log");
    let bus = EventBus::new();
    let handle = JsonFileSink::spawn(bus.subscribe(), path.clone(), LogLevel::Info);

    bus.publish(Event::Progress {
        job: "user_data".to_string(),
        update: ProgressUpdate::percent(10.0),
    });
    bus.publish(Event::Log(record(LogLevel::Info, "kept")));
    bus.close();
    handle.await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains("kept"));
}

#[tokio::test]
async fn file_sink_writes_progress_as_full_records() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sync-test.log");
    let bus = EventBus::new();
    let handle = JsonFileSink::spawn(bus.subscribe(), path.clone(), LogLevel::Debug);

    bus.publish(Event::Progress {
        job: "dummy_success".to_string(),
        update: ProgressUpdate::counts(3, Some(10)),
    });
    bus.close();
    handle.await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    let value: Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
    assert_eq!(value["event"], "progress_update");
    assert_eq!(value["level"], "FULL");
    assert_eq!(value["job"], "dummy_success");
    assert_eq!(value["current"], 3);
    assert_eq!(value["total"], 10);
}

#[test]
fn log_filename_shape() {
    let name = log_filename("abc12345");
    assert!(name.starts_with("sync-"));
    assert!(name.ends_with("-abc12345.log"));
    // sync- + 15-char timestamp + -sessionid.log
    assert_eq!(name.len(), "sync-".len() + 15 + "-abc12345.log".len());
}
