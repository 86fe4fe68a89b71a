// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events carried by the session event bus.

use crate::host::Host;
use crate::level::LogLevel;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A structured log record.
///
/// `job` and `host` are omitted when the record is emitted from code not
/// scoped to either (startup, shutdown, the orchestrator itself).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub timestamp: DateTime<Local>,
    pub level: LogLevel,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<Host>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub context: Map<String, Value>,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            timestamp: Local::now(),
            level,
            job: None,
            host: None,
            message: message.into(),
            context: Map::new(),
        }
    }

    pub fn with_job(mut self, job: impl Into<String>) -> Self {
        self.job = Some(job.into());
        self
    }

    pub fn with_host(mut self, host: Host) -> Self {
        self.host = Some(host);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// A single progress report from a job.
///
/// Any combination of fields is allowed as long as it is internally
/// consistent: percent stays within [0, 100] and `current <= total` when
/// both counts are given.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub heartbeat: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item: Option<String>,
}

impl ProgressUpdate {
    pub fn percent(percent: f64) -> Self {
        Self {
            percent: Some(percent),
            ..Self::default()
        }
    }

    pub fn counts(current: u64, total: Option<u64>) -> Self {
        Self {
            current: Some(current),
            total,
            ..Self::default()
        }
    }

    pub fn heartbeat() -> Self {
        Self {
            heartbeat: true,
            ..Self::default()
        }
    }

    pub fn item(item: impl Into<String>) -> Self {
        Self {
            item: Some(item.into()),
            ..Self::default()
        }
    }

    pub fn with_item(mut self, item: impl Into<String>) -> Self {
        self.item = Some(item.into());
        self
    }

    /// Check internal consistency.
    pub fn is_valid(&self) -> bool {
        if let Some(p) = self.percent {
            if !(0.0..=100.0).contains(&p) {
                return false;
            }
        }
        if let (Some(current), Some(total)) = (self.current, self.total) {
            if current > total {
                return false;
            }
        }
        true
    }
}

/// Connection health as observed by the transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Everything that flows over the event bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    Log(LogRecord),
    Progress {
        job: String,
        update: ProgressUpdate,
    },
    Connection {
        status: ConnectionStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        latency_ms: Option<u64>,
    },
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
