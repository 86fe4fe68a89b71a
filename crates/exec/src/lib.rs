// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pcs-exec: command execution on both hosts.
//!
//! The [`Executor`] trait abstracts where a shell command runs. The local
//! variant spawns subprocesses directly; the SSH variant multiplexes
//! commands over a persistent `ssh` ControlMaster connection, so a remote
//! "process" is just a local `ssh` child. Both register long-running
//! processes for best-effort termination at session cleanup.

mod error;
mod executor;
mod local;
mod lock;
mod process;
mod ssh;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use error::ExecError;
pub use executor::{Executor, RunOptions};
pub use local::{local_hostname, LocalExecutor};
pub use lock::{
    acquire_target_lock, data_dir, lock_path, read_target_holder, LockError, SyncLock, TargetLock,
};
pub use process::{ChildProcess, Process};
pub use ssh::{SshConnection, SshExecutor};

/// Wrap a command for execution in a bash login shell.
///
/// Remote SSH commands run in non-login shells, so `~/.profile` is not
/// sourced and `PATH` may miss `~/.local/bin`. Wrapping in `bash -l -c`
/// restores the user environment; required when invoking user-installed
/// tools such as pc-switcher itself.
pub fn wrap_login_shell(cmd: &str) -> String {
    format!("bash -l -c {}", shell_words::quote(cmd))
}
