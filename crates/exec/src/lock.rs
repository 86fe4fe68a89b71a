// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mutual exclusion across concurrent syncs.
//!
//! Source side: a kernel-enforced exclusive file lock, released on
//! process exit. Target side: a long-lived remote heartbeat process that
//! holds a `flock` and sleeps; killing it or dropping the SSH connection
//! releases the lock.

use crate::error::ExecError;
use crate::executor::{Executor, RunOptions};
use crate::process::Process;
use fs2::FileExt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Lock file name, shared by both hosts.
pub const LOCK_FILE: &str = "pc-switcher.lock";

#[derive(Debug, Error)]
pub enum LockError {
    #[error("I/O error on lock file: {0}")]
    Io(#[from] std::io::Error),
}

/// Application data directory (`~/.local/share/pc-switcher`).
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("pc-switcher")
}

/// Default source-side lock path.
pub fn lock_path() -> PathBuf {
    data_dir().join(LOCK_FILE)
}

/// Exclusive source-side sync lock.
///
/// The holder string (`source:<hostname>:<session_id>`) is written into
/// the file on acquisition so a conflicting run can name the holder.
pub struct SyncLock {
    path: PathBuf,
    file: Option<std::fs::File>,
}

impl SyncLock {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: None,
        }
    }

    /// Try to acquire the lock without blocking.
    ///
    /// Returns `false` on conflict; [`SyncLock::holder`] then reads the
    /// current holder string.
    pub fn acquire(&mut self, holder: &str) -> Result<bool, LockError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        // Open without truncating: the file content belongs to whoever
        // holds the lock until we do.
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)?;
        if file.try_lock_exclusive().is_err() {
            return Ok(false);
        }
        let mut file = file;
        file.set_len(0)?;
        writeln!(file, "{holder}")?;
        file.flush()?;
        self.file = Some(file);
        Ok(true)
    }

    /// Read the holder string currently written into the lock file.
    pub fn holder(&self) -> Option<String> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        let holder = content.trim();
        (!holder.is_empty()).then(|| holder.to_string())
    }

    /// Release the lock explicitly. Also happens on drop / process exit.
    pub fn release(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = fs2::FileExt::unlock(&file) {
                tracing::debug!(error = %e, "unlock failed");
            }
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SyncLock {
    fn drop(&mut self) {
        self.release();
    }
}

/// The remote heartbeat process holding the target's lock.
///
/// Dropping the handle (or the SSH connection) kills the remote `flock`
/// holder, releasing the lock.
pub struct TargetLock {
    process: Box<dyn Process>,
}

impl TargetLock {
    /// Kill the heartbeat, releasing the target lock.
    pub async fn release(mut self) {
        self.process.terminate().await;
    }
}

// The heartbeat script: take the flock on an inherited descriptor, write
// the holder string, report acquisition, then sleep until killed. The
// append-mode open never truncates a holder we failed to displace.
fn heartbeat_script(holder: &str) -> String {
    format!(
        concat!(
            "mkdir -p ~/.local/share/pc-switcher && ",
            "exec 9>>~/.local/share/pc-switcher/{lock}; ",
            "if flock -n 9; then ",
            "printf '%s\\n' '{holder}' > ~/.local/share/pc-switcher/{lock}; ",
            "echo LOCKED; ",
            "sleep infinity; ",
            "else echo CONFLICT; exit 1; fi"
        ),
        lock = LOCK_FILE,
        holder = holder,
    )
}

/// Acquire the target-side lock via a remote heartbeat process.
///
/// Returns `None` when the remote process fails to report acquisition
/// within `grace` — a conflict. The caller reads the holder with
/// [`read_target_holder`] for the error message.
pub async fn acquire_target_lock(
    executor: &dyn Executor,
    holder: &str,
    grace: Duration,
) -> Result<Option<TargetLock>, ExecError> {
    let mut process = executor
        .start_process(&heartbeat_script(holder), RunOptions::default())
        .await?;

    let acquired = tokio::time::timeout(grace, process.next_stdout_line()).await;
    match acquired {
        Ok(Ok(Some(line))) if line.trim() == "LOCKED" => {
            Ok(Some(TargetLock { process }))
        }
        Ok(Err(e)) => {
            process.terminate().await;
            Err(e)
        }
        // CONFLICT, closed stream, or no report within the grace period.
        _ => {
            process.terminate().await;
            Ok(None)
        }
    }
}

/// Read the holder string from the target's lock file.
pub async fn read_target_holder(executor: &dyn Executor) -> Option<String> {
    let cmd = format!("cat ~/.local/share/pc-switcher/{LOCK_FILE} 2>/dev/null");
    match executor.run(&cmd, RunOptions::timeout(10)).await {
        Ok(result) if result.success() => {
            let holder = result.stdout.trim().to_string();
            (!holder.is_empty()).then_some(holder)
        }
        _ => None,
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
