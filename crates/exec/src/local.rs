// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command execution on the source machine.

use crate::error::ExecError;
use crate::executor::{Executor, RunOptions};
use crate::process::{terminate_child, ChildProcess, Process};
use async_trait::async_trait;
use parking_lot::Mutex;
use pcs_core::{CommandResult, Host};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};

/// Executes commands on the source machine via `sh -c`.
pub struct LocalExecutor {
    processes: Mutex<Vec<Arc<tokio::sync::Mutex<Child>>>>,
}

impl LocalExecutor {
    pub fn new() -> Self {
        Self {
            processes: Mutex::new(Vec::new()),
        }
    }

    fn command(cmd: &str) -> Command {
        let mut command = Command::new("sh");
        command
            .arg("-c")
            .arg(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl Default for LocalExecutor {
    fn default() -> Self {
        Self::new()
    }
}

/// Run a command, converting timeout expiry into a distinct error.
pub(crate) async fn run_with_timeout(
    mut command: Command,
    cmd: &str,
    opts: RunOptions,
) -> Result<CommandResult, ExecError> {
    let output_future = command.output();
    let output = match opts.timeout {
        Some(timeout) => tokio::time::timeout(timeout, output_future)
            .await
            .map_err(|_| ExecError::Timeout {
                command: cmd.to_string(),
                secs: timeout.as_secs(),
            })?,
        None => output_future.await,
    }
    .map_err(|source| ExecError::Spawn {
        command: cmd.to_string(),
        source,
    })?;

    Ok(CommandResult::new(
        output.status.code().unwrap_or(-1),
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
    ))
}

#[async_trait]
impl Executor for LocalExecutor {
    fn host(&self) -> Host {
        Host::Source
    }

    async fn run(&self, cmd: &str, opts: RunOptions) -> Result<CommandResult, ExecError> {
        run_with_timeout(Self::command(cmd), cmd, opts).await
    }

    async fn start_process(
        &self,
        cmd: &str,
        _opts: RunOptions,
    ) -> Result<Box<dyn Process>, ExecError> {
        let child = Self::command(cmd).spawn().map_err(|source| ExecError::Spawn {
            command: cmd.to_string(),
            source,
        })?;
        let (process, shared) = ChildProcess::new(child);
        self.processes.lock().push(shared);
        Ok(Box::new(process))
    }

    async fn terminate_all(&self) {
        let children: Vec<_> = self.processes.lock().drain(..).collect();
        for child in children {
            let mut child = child.lock().await;
            terminate_child(&mut child).await;
        }
    }
}

/// Resolve the local machine's hostname.
pub async fn local_hostname() -> Result<String, ExecError> {
    let executor = LocalExecutor::new();
    let result = executor
        .run("hostname", RunOptions::timeout(10))
        .await?;
    if !result.success() {
        return Err(ExecError::Transport(format!(
            "hostname failed: {}",
            result.stderr.trim()
        )));
    }
    Ok(result.stdout.trim().to_string())
}

#[cfg(test)]
#[path = "local_tests.rs"]
mod tests;
