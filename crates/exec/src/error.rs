// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Execution failure kinds.
//!
//! A non-zero exit code is never an error here; executors fail only on
//! spawn, transport, or timeout problems. Timeouts are a distinct kind so
//! callers can tell them apart from commands that ran and failed.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("command timed out after {secs}s: {command}")]
    Timeout { command: String, secs: u64 },

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("file transfer failed: {0}")]
    Transfer(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
