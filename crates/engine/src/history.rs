// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Consecutive-sync history.
//!
//! Each host remembers the role it last played in
//! `~/.local/share/pc-switcher/sync-history.json`. Syncing from a host
//! that was the source last time would overwrite whatever the previous
//! target accumulated, so the orchestrator warns and prompts. A
//! corrupted file reads as SOURCE: the safe bias is to always warn.

use pcs_core::SyncRole;
use pcs_exec::{Executor, RunOptions};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const HISTORY_FILE: &str = "sync-history.json";

/// Default history path on this host.
pub fn history_path() -> PathBuf {
    pcs_exec::data_dir().join(HISTORY_FILE)
}

#[derive(Debug, Serialize, Deserialize)]
struct HistoryDoc {
    last_role: SyncRole,
}

/// What reading the history file yielded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryReadOutcome {
    /// No history yet; first sync from this host.
    Missing,
    /// A well-formed record.
    Recorded(SyncRole),
    /// Unreadable or malformed; treated as SOURCE by callers.
    Corrupted,
}

impl HistoryReadOutcome {
    /// The role to act on, with the corruption bias applied.
    pub fn effective_role(&self) -> Option<SyncRole> {
        match self {
            HistoryReadOutcome::Missing => None,
            HistoryReadOutcome::Recorded(role) => Some(*role),
            HistoryReadOutcome::Corrupted => Some(SyncRole::Source),
        }
    }
}

/// Read the local history file.
pub fn read_last_role(path: &Path) -> HistoryReadOutcome {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(_) => return HistoryReadOutcome::Missing,
    };
    match serde_json::from_str::<HistoryDoc>(&content) {
        Ok(doc) => HistoryReadOutcome::Recorded(doc.last_role),
        Err(_) => HistoryReadOutcome::Corrupted,
    }
}

/// Overwrite the local history atomically (write-temp, rename).
pub fn record_local_role(path: &Path, role: SyncRole) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let doc = HistoryDoc { last_role: role };
    #[allow(clippy::expect_used)] // two-field struct, cannot fail
    let json = serde_json::to_string(&doc).expect("history serialization");
    let tmp_path = path.with_extension("json.tmp");
    std::fs::write(&tmp_path, json)?;
    std::fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Record the role on the remote host via an idempotent shell write.
pub async fn record_remote_role(
    executor: &dyn Executor,
    role: SyncRole,
) -> Result<(), pcs_exec::ExecError> {
    let cmd = format!(
        "mkdir -p ~/.local/share/pc-switcher && \
         printf '%s' '{{\"last_role\": \"{}\"}}' > ~/.local/share/pc-switcher/{HISTORY_FILE}",
        role.as_str()
    );
    let result = executor.run(&cmd, RunOptions::timeout(30)).await?;
    if !result.success() {
        return Err(pcs_exec::ExecError::Transport(format!(
            "recording sync history on target failed: {}",
            result.stderr.trim()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "history_tests.rs"]
mod tests;
