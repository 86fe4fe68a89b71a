// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The host-execution capability.

use crate::error::ExecError;
use crate::process::Process;
use async_trait::async_trait;
use pcs_core::{CommandResult, Host};
use std::time::Duration;

/// Per-call execution options.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Abort the command after this long; expiry surfaces as
    /// [`ExecError::Timeout`], not as a non-zero exit.
    pub timeout: Option<Duration>,
    /// Override the executor's login-shell default for this call.
    /// Ignored by the local executor.
    pub login_shell: Option<bool>,
}

impl RunOptions {
    pub fn timeout(secs: u64) -> Self {
        Self {
            timeout: Some(Duration::from_secs(secs)),
            login_shell: None,
        }
    }

    pub fn login_shell() -> Self {
        Self {
            timeout: None,
            login_shell: Some(true),
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout = Some(Duration::from_secs(secs));
        self
    }
}

/// Runs shell commands on one host.
///
/// Implementations never raise on non-zero exit; only transport and
/// timeout failures are errors. Long-running processes started through
/// [`Executor::start_process`] are registered with the executor and
/// torn down by [`Executor::terminate_all`].
#[async_trait]
pub trait Executor: Send + Sync {
    /// Which machine this executor talks to.
    fn host(&self) -> Host;

    /// Run a command to completion.
    async fn run(&self, cmd: &str, opts: RunOptions) -> Result<CommandResult, ExecError>;

    /// Start a long-running process with line-streamed output.
    async fn start_process(&self, cmd: &str, opts: RunOptions)
        -> Result<Box<dyn Process>, ExecError>;

    /// Best-effort cancel-and-wait of every registered process.
    async fn terminate_all(&self);
}
