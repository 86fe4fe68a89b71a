// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command execution on the target machine over SSH.
//!
//! A persistent ControlMaster connection is opened once per session;
//! every command multiplexes over its control socket, so per-command
//! latency stays in the millisecond range. A remote "process" is the
//! local `ssh` child carrying it — killing the child tears down the
//! remote command, which is exactly what the target heartbeat lock
//! relies on.

use crate::error::ExecError;
use crate::executor::{Executor, RunOptions};
use crate::local::run_with_timeout;
use crate::process::{terminate_child, ChildProcess, Process};
use crate::wrap_login_shell;
use async_trait::async_trait;
use parking_lot::Mutex;
use pcs_core::{CommandResult, Host};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::{Child, Command};

// ssh(1) reserves 255 for its own failures; remote commands cannot
// produce it through `sh -c`.
const SSH_TRANSPORT_EXIT: i32 = 255;

const CONNECT_TIMEOUT_SECS: u64 = 30;

/// A persistent multiplexed SSH connection to the target.
pub struct SshConnection {
    target: String,
    control_path: PathBuf,
}

impl SshConnection {
    /// Open the ControlMaster connection.
    ///
    /// `control_dir` must be a short path (unix socket name limits);
    /// the session id keeps concurrent tests apart.
    pub async fn connect(
        target: &str,
        control_dir: &Path,
        session_id: &str,
    ) -> Result<Self, ExecError> {
        tokio::fs::create_dir_all(control_dir).await?;
        let control_path = control_dir.join(format!("pcs-{session_id}.sock"));
        let conn = Self {
            target: target.to_string(),
            control_path,
        };

        let mut command = conn.ssh_command();
        command
            .args(["-o", "ControlMaster=yes", "-o", "ControlPersist=yes"])
            .arg("-o")
            .arg(format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}"))
            .arg("-fN")
            .arg(&conn.target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        let output = command.output().await.map_err(|source| ExecError::Spawn {
            command: format!("ssh -fN {}", conn.target),
            source,
        })?;
        if !output.status.success() {
            return Err(ExecError::Transport(format!(
                "connecting to {} failed: {}",
                conn.target,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(conn)
    }

    fn ssh_command(&self) -> Command {
        let mut command = Command::new("ssh");
        command
            .arg("-o")
            .arg(format!("ControlPath={}", self.control_path.display()))
            .arg("-o")
            .arg("BatchMode=yes")
            .kill_on_drop(true);
        command
    }

    /// True while the master connection answers control checks.
    pub async fn is_alive(&self) -> bool {
        let mut command = self.ssh_command();
        command
            .args(["-O", "check", &self.target])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        matches!(command.status().await, Ok(status) if status.success())
    }

    /// Close the master connection; remote processes riding on it die.
    pub async fn disconnect(&self) {
        let mut command = self.ssh_command();
        command
            .args(["-O", "exit", &self.target])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        if let Err(e) = command.status().await {
            tracing::debug!(error = %e, "ssh control exit failed");
        }
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

/// Executes commands on the target over an [`SshConnection`].
pub struct SshExecutor {
    connection: Arc<SshConnection>,
    default_login_shell: bool,
    processes: Mutex<Vec<Arc<tokio::sync::Mutex<Child>>>>,
}

impl SshExecutor {
    pub fn new(connection: Arc<SshConnection>) -> Self {
        Self {
            connection,
            default_login_shell: false,
            processes: Mutex::new(Vec::new()),
        }
    }

    /// Make every call default to login-shell wrapping.
    pub fn with_login_shell_default(mut self, default: bool) -> Self {
        self.default_login_shell = default;
        self
    }

    fn effective_cmd(&self, cmd: &str, opts: &RunOptions) -> String {
        if opts.login_shell.unwrap_or(self.default_login_shell) {
            wrap_login_shell(cmd)
        } else {
            cmd.to_string()
        }
    }

    fn remote_command(&self, cmd: &str) -> Command {
        let mut command = self.connection.ssh_command();
        command
            .arg(self.connection.target())
            .arg("--")
            .arg(cmd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        command
    }

    /// Resolve the target's hostname.
    pub async fn hostname(&self) -> Result<String, ExecError> {
        let result = self.run("hostname", RunOptions::timeout(10)).await?;
        if !result.success() {
            return Err(ExecError::Transport(format!(
                "hostname failed: {}",
                result.stderr.trim()
            )));
        }
        Ok(result.stdout.trim().to_string())
    }

    /// Copy a local file to the target.
    pub async fn send_file(&self, local: &Path, remote: &str) -> Result<(), ExecError> {
        self.scp(&local.display().to_string(), &format!("{}:{remote}", self.connection.target()))
            .await
    }

    /// Copy a remote file from the target.
    pub async fn get_file(&self, remote: &str, local: &Path) -> Result<(), ExecError> {
        self.scp(&format!("{}:{remote}", self.connection.target()), &local.display().to_string())
            .await
    }

    async fn scp(&self, from: &str, to: &str) -> Result<(), ExecError> {
        let mut command = Command::new("scp");
        command
            .arg("-o")
            .arg(format!(
                "ControlPath={}",
                self.connection.control_path.display()
            ))
            .arg("-o")
            .arg("BatchMode=yes")
            .arg("-q")
            .arg(from)
            .arg(to)
            .stdin(Stdio::null());
        let output = command.output().await.map_err(|source| ExecError::Spawn {
            command: format!("scp {from} {to}"),
            source,
        })?;
        if !output.status.success() {
            return Err(ExecError::Transfer(format!(
                "scp {from} -> {to}: {}",
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Executor for SshExecutor {
    fn host(&self) -> Host {
        Host::Target
    }

    async fn run(&self, cmd: &str, opts: RunOptions) -> Result<CommandResult, ExecError> {
        let wrapped = self.effective_cmd(cmd, &opts);
        let result = run_with_timeout(self.remote_command(&wrapped), cmd, opts).await?;

        if result.exit_code == SSH_TRANSPORT_EXIT {
            // Re-establish the master for subsequent commands, but surface
            // this failure: the command's side effects are unknown, so it
            // is never replayed.
            if !self.connection.is_alive().await {
                tracing::warn!(target = %self.connection.target(), "ssh master connection lost");
            }
            return Err(ExecError::Transport(format!(
                "ssh to {} failed: {}",
                self.connection.target(),
                result.stderr.trim()
            )));
        }
        Ok(result)
    }

    async fn start_process(
        &self,
        cmd: &str,
        opts: RunOptions,
    ) -> Result<Box<dyn Process>, ExecError> {
        let wrapped = self.effective_cmd(cmd, &opts);
        let child = self
            .remote_command(&wrapped)
            .spawn()
            .map_err(|source| ExecError::Spawn {
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
