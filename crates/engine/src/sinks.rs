// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Logging sinks: consumers of an event-bus subscription.
//!
//! Two long-running sink tasks drain their own subscriptions, each with
//! its own level threshold: a JSON Lines file per session and a styled
//! stderr stream. Sink failures are reported through `tracing` and never
//! propagate — logging must not break the sync.

use crate::bus::Subscription;
use chrono::Local;
use pcs_core::{Event, LogLevel, LogRecord, ProgressUpdate};
use serde_json::{Map, Value};
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;
use tokio::task::JoinHandle;

/// Logs directory (`~/.local/share/pc-switcher/logs`).
pub fn logs_dir() -> PathBuf {
    pcs_exec::data_dir().join("logs")
}

/// Per-session log file name: `sync-<YYYYMMDDThhmmss>-<session_id>.log`.
pub fn log_filename(session_id: &str) -> String {
    let timestamp = Local::now().format("%Y%m%dT%H%M%S");
    format!("sync-{timestamp}-{session_id}.log")
}

/// Most recent log file under the logs directory, if any.
pub fn latest_log_file() -> Option<PathBuf> {
    log_files().into_iter().next_back()
}

/// Log file for a specific session id, if any.
pub fn find_log_file(session_id: &str) -> Option<PathBuf> {
    let suffix = format!("-{session_id}.log");
    log_files()
        .into_iter()
        .find(|p| p.to_string_lossy().ends_with(&suffix))
}

fn log_files() -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(logs_dir()) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with("sync-") && name.ends_with(".log"))
        })
        .collect();
    files.sort();
    files
}

/// Translate a progress event into its FULL-level record.
pub fn progress_record(job: &str, update: &ProgressUpdate) -> LogRecord {
    let mut record = LogRecord::new(LogLevel::Full, "progress_update").with_job(job);
    if let Some(percent) = update.percent {
        record.context.insert("percent".to_string(), percent.into());
    }
    if let Some(current) = update.current {
        record.context.insert("current".to_string(), current.into());
    }
    if let Some(total) = update.total {
        record.context.insert("total".to_string(), total.into());
    }
    if update.heartbeat {
        record.context.insert("heartbeat".to_string(), true.into());
    }
    if let Some(item) = &update.item {
        record
            .context
            .insert("item".to_string(), item.clone().into());
    }
    record
}

fn record_for(event: &Event) -> Option<LogRecord> {
    match event {
        Event::Log(record) => Some(record.clone()),
        Event::Progress { job, update } => Some(progress_record(job, update)),
        // Connection transitions are surfaced by the orchestrator's own
        // log records; the raw event carries no message to render.
        Event::Connection { .. } => None,
    }
}

/// Render one JSON Lines entry.
///
/// Always present: `timestamp`, `level`, `event`. `job`/`host` appear
/// only when scoped; context entries become top-level siblings.
pub fn json_line(record: &LogRecord) -> String {
    let mut object = Map::new();
    object.insert(
        "timestamp".to_string(),
        Value::String(record.timestamp.to_rfc3339()),
    );
    object.insert(
        "level".to_string(),
        Value::String(record.level.as_str().to_string()),
    );
    if let Some(job) = &record.job {
        object.insert("job".to_string(), Value::String(job.clone()));
    }
    if let Some(host) = record.host {
        object.insert("host".to_string(), Value::String(host.to_string()));
    }
    object.insert("event".to_string(), Value::String(record.message.clone()));
    for (key, value) in &record.context {
        object.insert(key.clone(), value.clone());
    }
    Value::Object(object).to_string()
}

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const RED: &str = "\x1b[31m";
    pub const BOLD_RED: &str = "\x1b[1;31m";
    pub const BLUE: &str = "\x1b[34m";
    pub const MAGENTA: &str = "\x1b[35m";
}

fn level_color(level: LogLevel) -> &'static str {
    match level {
        LogLevel::Debug => ansi::DIM,
        LogLevel::Full => ansi::CYAN,
        LogLevel::Info => ansi::GREEN,
        LogLevel::Warning => ansi::YELLOW,
        LogLevel::Error => ansi::RED,
        LogLevel::Critical => ansi::BOLD_RED,
    }
}

/// Render one terminal line:
/// `HH:MM:SS [LEVEL   ] [job] (host) message key=value …`
pub fn stream_line(record: &LogRecord, colorize: bool) -> String {
    let mut line = String::new();
    let paint = |line: &mut String, color: &str, text: &str| {
        if colorize {
            line.push_str(color);
            line.push_str(text);
            line.push_str(ansi::RESET);
        } else {
            line.push_str(text);
        }
    };

    let timestamp = record.timestamp.format("%H:%M:%S").to_string();
    paint(&mut line, ansi::DIM, &timestamp);
    line.push(' ');
    paint(
        &mut line,
        level_color(record.level),
        &format!("[{:<8}]", record.level.as_str()),
    );
    if let Some(job) = &record.job {
        line.push(' ');
        paint(&mut line, ansi::BLUE, &format!("[{job}]"));
    }
    if let Some(host) = record.host {
        line.push(' ');
        paint(&mut line, ansi::MAGENTA, &format!("({host})"));
    }
    line.push(' ');
    line.push_str(&record.message);
    if !record.context.is_empty() {
        let extras: Vec<String> = record
            .context
            .iter()
            .map(|(key, value)| match value {
                Value::String(s) => format!("{key}={s}"),
                other => format!("{key}={other}"),
            })
            .collect();
        line.push(' ');
        paint(&mut line, ansi::DIM, &extras.join(" "));
    }
    line
}

/// Writes matching records as JSON Lines to the session log file.
pub struct JsonFileSink;

impl JsonFileSink {
    /// Drain the subscription until the shutdown sentinel.
    ///
    /// The logs directory is created on demand. Returns the task handle;
    /// await it after closing the bus to ensure the file is flushed.
    pub fn spawn(mut sub: Subscription, path: PathBuf, level: LogLevel) -> JoinHandle<()> {
        tokio::spawn(async move {
            if let Some(parent) = path.parent() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    tracing::warn!(error = %e, "cannot create logs directory");
                    return;
                }
            }
            let file = tokio::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .await;
            let mut file = match file {
                Ok(file) => file,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "cannot open log file");
                    return;
                }
            };

            while let Some(event) = sub.recv().await {
                let Some(record) = record_for(&event) else {
                    continue;
                };
                if record.level < level {
                    continue;
                }
                let mut line = json_line(&record);
                line.push('\n');
                if let Err(e) = file.write_all(line.as_bytes()).await {
                    tracing::warn!(error = %e, "log file write failed");
                }
            }
            if let Err(e) = file.flush().await {
                tracing::warn!(error = %e, "log file flush failed");
            }
        })
    }
}

/// Writes matching records to stderr with level-keyed colors.
pub struct StreamSink;

impl StreamSink {
    pub fn spawn(mut sub: Subscription, level: LogLevel, colorize: bool) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut stderr = tokio::io::stderr();
            while let Some(event) = sub.recv().await {
                let Some(record) = record_for(&event) else {
                    continue;
                };
                if record.level < level {
                    continue;
                }
                let mut line = stream_line(&record, colorize);
                line.push('\n');
                if let Err(e) = stderr.write_all(line.as_bytes()).await {
                    tracing::debug!(error = %e, "stderr write failed");
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "sinks_tests.rs"]
mod tests;
