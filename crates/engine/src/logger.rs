// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Convenience wrapper for publishing log and progress events.

use crate::bus::EventBus;
use pcs_core::{Event, Host, LogLevel, LogRecord, ProgressUpdate};
use serde_json::{Map, Value};

/// Publishes structured records onto the bus.
///
/// Binding a job name at construction stamps every record with it, so a
/// record from inside a job always carries its `job` field.
#[derive(Clone)]
pub struct Logger {
    bus: EventBus,
    job: Option<String>,
}

impl Logger {
    /// Logger for code not scoped to a job (startup, shutdown).
    pub fn unscoped(bus: EventBus) -> Self {
        Self { bus, job: None }
    }

    /// Logger bound to a job name.
    pub fn for_job(bus: EventBus, job: impl Into<String>) -> Self {
        Self {
            bus,
            job: Some(job.into()),
        }
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Publish a log record attributed to `host`.
    pub fn log(&self, host: Host, level: LogLevel, message: impl Into<String>) {
        self.log_with(host, level, message, Map::new());
    }

    /// Publish a log record with extra context entries.
    pub fn log_with(
        &self,
        host: Host,
        level: LogLevel,
        message: impl Into<String>,
        context: Map<String, Value>,
    ) {
        let mut record = LogRecord::new(level, message).with_host(host);
        record.job = self.job.clone();
        record.context = context;
        self.bus.publish(Event::Log(record));
    }

    /// Publish a log record with no host attribution.
    pub fn log_unhosted(&self, level: LogLevel, message: impl Into<String>) {
        let mut record = LogRecord::new(level, message);
        record.job = self.job.clone();
        self.bus.publish(Event::Log(record));
    }

    /// Publish a progress update for the bound job.
    ///
    /// No-op when the logger is unscoped: progress is meaningless without
    /// a job to attribute it to.
    pub fn report_progress(&self, update: ProgressUpdate) {
        if let Some(job) = &self.job {
            debug_assert!(update.is_valid());
            self.bus.publish(Event::Progress {
                job: job.clone(),
                update,
            });
        }
    }
}

/// Build a context map from key/value pairs.
#[macro_export]
macro_rules! log_context {
    ($($key:expr => $value:expr),* $(,)?) => {{
        let mut map = serde_json::Map::new();
        $(map.insert($key.to_string(), serde_json::Value::from($value));)*
        map
    }};
}

#[cfg(test)]
#[path = "logger_tests.rs"]
mod tests;
