// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result of a completed command on either host.

use serde::{Deserialize, Serialize};

/// Captured output of a finished command.
///
/// A non-zero exit code is a normal value here, never an error: executors
/// only fail on transport or timeout problems.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandResult {
    pub fn new(exit_code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    /// `exit_code == 0`
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
