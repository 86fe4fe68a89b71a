// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handles for long-running processes with line-streamed output.

use crate::error::ExecError;
use async_trait::async_trait;
use pcs_core::CommandResult;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStderr, ChildStdout};
use tokio::sync::Mutex;

/// A running process: stream its output line by line, wait for the
/// result, or terminate it. `stdin` is intentionally unsupported — every
/// command must be non-interactive.
#[async_trait]
pub trait Process: Send {
    /// Next stdout line, or `None` once the stream is closed.
    async fn next_stdout_line(&mut self) -> Result<Option<String>, ExecError>;

    /// Next stderr line, or `None` once the stream is closed.
    async fn next_stderr_line(&mut self) -> Result<Option<String>, ExecError>;

    /// Wait for completion, draining any remaining output.
    async fn wait(&mut self) -> Result<CommandResult, ExecError>;

    /// Kill the process and wait for it to exit. Never fails.
    async fn terminate(&mut self);
}

/// [`Process`] backed by a local [`tokio::process::Child`].
///
/// The child handle is shared with the owning executor's registry so that
/// `terminate_all` can reach processes whose handles are held by jobs.
pub struct ChildProcess {
    child: Arc<Mutex<Child>>,
    stdout: Option<Lines<BufReader<ChildStdout>>>,
    stderr: Option<Lines<BufReader<ChildStderr>>>,
}

impl ChildProcess {
    /// Wrap a freshly spawned child, taking ownership of its pipes.
    ///
    /// Returns the process plus the shared child handle for registration.
    pub(crate) fn new(mut child: Child) -> (Self, Arc<Mutex<Child>>) {
        let stdout = child
            .stdout
            .take()
            .map(|out| BufReader::new(out).lines());
        let stderr = child
            .stderr
            .take()
            .map(|err| BufReader::new(err).lines());
        let shared = Arc::new(Mutex::new(child));
        (
            Self {
                child: Arc::clone(&shared),
                stdout,
                stderr,
            },
            shared,
        )
    }

    async fn drain(&mut self) -> (String, String) {
        let mut out = String::new();
        let mut err = String::new();
        if let Some(lines) = &mut self.stdout {
            while let Ok(Some(line)) = lines.next_line().await {
                out.push_str(&line);
                out.push('\n');
            }
        }
        if let Some(lines) = &mut self.stderr {
            while let Ok(Some(line)) = lines.next_line().await {
                err.push_str(&line);
                err.push('\n');
            }
        }
        (out, err)
    }
}

#[async_trait]
impl Process for ChildProcess {
    async fn next_stdout_line(&mut self) -> Result<Option<String>, ExecError> {
        match &mut self.stdout {
            Some(lines) => Ok(lines.next_line().await?),
            None => Ok(None),
        }
    }

    async fn next_stderr_line(&mut self) -> Result<Option<String>, ExecError> {
        match &mut self.stderr {
            Some(lines) => Ok(lines.next_line().await?),
            None => Ok(None),
        }
    }

    async fn wait(&mut self) -> Result<CommandResult, ExecError> {
        let (stdout, stderr) = self.drain().await;
        let status = {
            let mut child = self.child.lock().await;
            child.wait().await?
        };
        Ok(CommandResult::new(
            status.code().unwrap_or(-1),
            stdout,
            stderr,
        ))
    }

    async fn terminate(&mut self) {
        let mut child = self.child.lock().await;
        terminate_child(&mut child).await;
    }
}

/// Kill a child and reap it, swallowing every failure.
pub(crate) async fn terminate_child(child: &mut Child) {
    if let Err(e) = child.start_kill() {
        // Already exited is the common case here.
        tracing::debug!(error = %e, "kill failed");
    }
    if let Err(e) = child.wait().await {
        tracing::debug!(error = %e, "wait after kill failed");
    }
}
