// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Btrfs snapshot management.
//!
//! Everything is expressed as btrfs shell invocations through an
//! [`Executor`], so the same code brackets both hosts. Snapshots are
//! grouped per session under `/.snapshots/pc-switcher/<ts>-<session>/`.

use chrono::{Duration as ChronoDuration, Local, NaiveDateTime};
use pcs_core::{CommandResult, Host, Snapshot, SnapshotPhase, SNAPSHOT_ROOT};
use pcs_exec::{ExecError, Executor, RunOptions};
use std::collections::BTreeMap;
use thiserror::Error;

pub use pcs_core::snapshot::mount_point_for;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("{0}")]
    Failed(String),
}

/// Snapshot name: `{phase}-{subvolume}-{YYYYMMDDThhmmss}`.
pub fn snapshot_name(subvolume: &str, phase: SnapshotPhase) -> String {
    let timestamp = Local::now().format("%Y%m%dT%H%M%S");
    format!("{phase}-{subvolume}-{timestamp}")
}

/// Session folder name: `{YYYYMMDDThhmmss}-{session_id}`.
pub fn session_folder_name(session_id: &str) -> String {
    let timestamp = Local::now().format("%Y%m%dT%H%M%S");
    format!("{timestamp}-{session_id}")
}

/// Create a read-only snapshot. Non-zero exit is the caller's problem.
pub async fn create_snapshot(
    executor: &dyn Executor,
    source_path: &str,
    snapshot_path: &str,
) -> Result<CommandResult, ExecError> {
    let cmd = format!("sudo btrfs subvolume snapshot -r {source_path} {snapshot_path}");
    executor.run(&cmd, RunOptions::default()).await
}

/// Ensure `/.snapshots` is a btrfs subvolume with the pc-switcher folder.
///
/// Missing: created. Plain directory: fatal — it cannot be transparently
/// upgraded to a subvolume.
pub async fn ensure_snapshot_dir(
    executor: &dyn Executor,
    host: Host,
) -> Result<(), SnapshotError> {
    let show = executor
        .run(
            "sudo btrfs subvolume show /.snapshots 2>&1",
            RunOptions::default(),
        )
        .await?;
    if show.success() {
        // Subvolume exists; make sure our folder does too.
        let mkdir = executor
            .run(
                &format!("sudo mkdir -p {SNAPSHOT_ROOT}"),
                RunOptions::default(),
            )
            .await?;
        if !mkdir.success() {
            return Err(SnapshotError::Failed(format!(
                "cannot create {SNAPSHOT_ROOT} on {host}: {}",
                mkdir.stderr.trim()
            )));
        }
        return Ok(());
    }

    let exists = executor
        .run("test -d /.snapshots", RunOptions::default())
        .await?;
    if exists.success() {
        return Err(SnapshotError::Failed(format!(
            "/.snapshots on {host} exists but is not a btrfs subvolume; \
             move it aside and re-run"
        )));
    }

    let create = executor
        .run(
            &format!("sudo btrfs subvolume create /.snapshots && sudo mkdir -p {SNAPSHOT_ROOT}"),
            RunOptions::default(),
        )
        .await?;
    if !create.success() {
        return Err(SnapshotError::Failed(format!(
            "failed to create /.snapshots subvolume on {host}: {}",
            create.stderr.trim()
        )));
    }
    Ok(())
}

/// Check that a subvolume is mounted where the flat convention says.
pub async fn verify_subvolume(
    executor: &dyn Executor,
    subvolume: &str,
    mount_point: &str,
    host: Host,
) -> Result<(), SnapshotError> {
    let result = executor
        .run(
            &format!("sudo btrfs subvolume show {mount_point} 2>&1"),
            RunOptions::default(),
        )
        .await?;
    if !result.success() {
        return Err(SnapshotError::Failed(format!(
            "subvolume {subvolume} not found at {mount_point} on {host}: {}",
            result.stderr.trim()
        )));
    }
    if !result.stdout.contains(subvolume) {
        return Err(SnapshotError::Failed(format!(
            "path {mount_point} on {host} is not subvolume {subvolume}"
        )));
    }
    Ok(())
}

/// Enumerate pc-switcher snapshots, newest first.
///
/// Entries that do not match the naming convention are skipped.
pub async fn list_snapshots(
    executor: &dyn Executor,
    host: Host,
) -> Result<Vec<Snapshot>, ExecError> {
    let mut snapshots = Vec::new();

    let sessions = executor
        .run(
            &format!("ls -1 {SNAPSHOT_ROOT}/ 2>/dev/null || true"),
            RunOptions::default(),
        )
        .await?;
    for folder in sessions.stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let folder_path = format!("{SNAPSHOT_ROOT}/{folder}");
        let names = executor
            .run(
                &format!("ls -1 {folder_path} 2>/dev/null || true"),
                RunOptions::default(),
            )
            .await?;
        for name in names.stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
            let path = format!("{folder_path}/{name}");
            if let Ok(snapshot) = Snapshot::from_path(&path, host) {
                snapshots.push(snapshot);
            }
        }
    }

    snapshots.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    Ok(snapshots)
}

/// Apply the retention policy and delete everything outside it.
///
/// The `keep_recent` newest sessions survive unconditionally. Among the
/// rest, `max_age_days` limits deletion to sessions older than the
/// cutoff; with no age limit every session beyond the window goes.
/// Emptied session folders are removed afterwards.
pub async fn cleanup(
    executor: &dyn Executor,
    host: Host,
    keep_recent: usize,
    max_age_days: Option<u32>,
    now: NaiveDateTime,
) -> Result<Vec<Snapshot>, ExecError> {
    let all = list_snapshots(executor, host).await?;
    if all.is_empty() {
        return Ok(Vec::new());
    }

    let mut sessions: BTreeMap<String, Vec<Snapshot>> = BTreeMap::new();
    for snapshot in all {
        sessions
            .entry(snapshot.session_id.clone())
            .or_default()
            .push(snapshot);
    }

    // Newest session first, by its newest snapshot.
    let mut ordered: Vec<(String, Vec<Snapshot>)> = sessions.into_iter().collect();
    ordered.sort_by_key(|(_, snaps)| {
        std::cmp::Reverse(snaps.iter().map(|s| s.timestamp).max())
    });

    let mut to_delete: Vec<Snapshot> = Vec::new();
    for (index, (_, snaps)) in ordered.iter().enumerate() {
        if index < keep_recent {
            continue;
        }
        match max_age_days {
            Some(days) => {
                let cutoff = now - ChronoDuration::days(days as i64);
                let newest = snaps.iter().map(|s| s.timestamp).max();
                if newest.is_some_and(|ts| ts < cutoff) {
                    to_delete.extend(snaps.iter().cloned());
                }
            }
            None => to_delete.extend(snaps.iter().cloned()),
        }
    }

    let mut deleted = Vec::new();
    let mut emptied_folders = std::collections::BTreeSet::new();
    for snapshot in to_delete {
        let result = executor
            .run(
                &format!("sudo btrfs subvolume delete {}", snapshot.path),
                RunOptions::default(),
            )
            .await?;
        if result.success() {
            emptied_folders.insert(snapshot.session_folder().to_string());
            tracing::debug!(path = %snapshot.path, "deleted snapshot");
            deleted.push(snapshot);
        } else {
            tracing::warn!(path = %snapshot.path, stderr = %result.stderr.trim(), "snapshot delete failed");
        }
    }

    for folder in emptied_folders {
        executor
            .run(
                &format!("rmdir {folder} 2>/dev/null || true"),
                RunOptions::default(),
            )
            .await?;
    }

    Ok(deleted)
}

// Deletes children before parents; `btrfs subvolume delete` is not
// recursive in btrfs-progs < 6.12. The path guard keeps the blast radius
// inside the pc-switcher root.
const DELETE_ALL_SCRIPT: &str = r#"
delete_subvol_recursive() {
    local path="$1"
    local child
    btrfs subvolume list -o "$path" 2>/dev/null | awk '{print $NF}' \
        | sed 's/^@snapshots/\/.snapshots/' \
        | while read -r child; do
        if [ "${child#/.snapshots/pc-switcher}" = "$child" ]; then
            echo "ERROR: unexpected subvolume path: '$child', skipping" >&2
            continue
        fi
        delete_subvol_recursive "$child"
    done
    if btrfs subvolume show "$path" >/dev/null 2>&1; then
        btrfs subvolume delete "$path" 2>/dev/null || true
    fi
}
btrfs subvolume list / 2>/dev/null | awk '{print $NF}' | grep '^@snapshots/pc-switcher' \
    | sed 's/^@snapshots/\/.snapshots/' \
    | while read -r abs_path; do
    delete_subvol_recursive "$abs_path"
done
"#;

/// Emergency reset: delete every pc-switcher snapshot on the host.
///
/// Test-cleanup path only; normal retention goes through [`cleanup`].
pub async fn delete_all(executor: &dyn Executor) -> Result<CommandResult, ExecError> {
    executor
        .run(
            &format!("sudo bash -c {}", shell_quote(DELETE_ALL_SCRIPT)),
            RunOptions::default(),
        )
        .await
}

fn shell_quote(script: &str) -> String {
    format!("'{}'", script.replace('\'', r"'\''"))
}

/// What a completed rollback requires of the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RollbackReport {
    pub restored_subvolumes: Vec<String>,
    pub reboot_required: bool,
}

/// Roll the given subvolumes back to their pre-sync snapshots.
///
/// Fatal if any pre-snapshot for the session is missing: a partial
/// pre-set means the session never reached a consistent bracket. For
/// each subvolume the live tree at the canonical mount point is replaced
/// by a read-write snapshot of the pre-sync state. A reboot is required
/// afterwards.
pub async fn rollback_to_presync(
    executor: &dyn Executor,
    host: Host,
    session_id: &str,
    subvolumes: &[String],
) -> Result<RollbackReport, SnapshotError> {
    let all = list_snapshots(executor, host).await?;
    let pre: Vec<&Snapshot> = all
        .iter()
        .filter(|s| s.session_id == session_id && s.phase == SnapshotPhase::Pre)
        .collect();

    let mut missing = Vec::new();
    for subvolume in subvolumes {
        if !pre.iter().any(|s| &s.subvolume == subvolume) {
            missing.push(subvolume.clone());
        }
    }
    if !missing.is_empty() {
        return Err(SnapshotError::Failed(format!(
            "pre-sync snapshots for session {session_id} are incomplete on {host} \
             (missing: {}); nothing to roll back to",
            missing.join(", ")
        )));
    }

    let mut restored = Vec::new();
    for subvolume in subvolumes {
        #[allow(clippy::unwrap_used)] // presence checked above
        let snapshot = pre.iter().find(|s| &s.subvolume == subvolume).unwrap();
        let mount_point = mount_point_for(subvolume);

        let delete = executor
            .run(
                &format!("sudo btrfs subvolume delete {mount_point}"),
                RunOptions::default(),
            )
            .await?;
        if !delete.success() {
            return Err(SnapshotError::Failed(format!(
                "cannot delete live subvolume at {mount_point} on {host}: {}",
                delete.stderr.trim()
            )));
        }

        let restore = executor
            .run(
                &format!(
                    "sudo btrfs subvolume snapshot {} {mount_point}",
                    snapshot.path
                ),
                RunOptions::default(),
            )
            .await?;
        if !restore.success() {
            return Err(SnapshotError::Failed(format!(
                "cannot restore {subvolume} from {} on {host}: {}",
                snapshot.path,
                restore.stderr.trim()
            )));
        }
        restored.push(subvolume.clone());
    }

    Ok(RollbackReport {
        restored_subvolumes: restored,
        reboot_required: true,
    })
}

#[cfg(test)]
#[path = "snapshots_tests.rs"]
mod tests;
