// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot naming and on-disk layout.
//!
//! Snapshots live at
//! `/.snapshots/pc-switcher/<timestamp>-<session_id>/{pre|post}-<subvolume>-<timestamp>`
//! on each host. `Snapshot` values are parsed views of that layout; they
//! are enumerated on demand and never cached.

use crate::host::Host;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Root of the pc-switcher snapshot tree on every host.
pub const SNAPSHOT_ROOT: &str = "/.snapshots/pc-switcher";

/// Timestamp format used in snapshot and session-folder names.
pub const NAME_TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Whether a snapshot brackets the session before or after the jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotPhase {
    Pre,
    Post,
}

impl SnapshotPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotPhase::Pre => "pre",
            SnapshotPhase::Post => "post",
        }
    }
}

impl std::fmt::Display for SnapshotPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed view of one on-disk snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub path: String,
    pub subvolume: String,
    pub phase: SnapshotPhase,
    pub host: Host,
    pub session_id: String,
    pub timestamp: NaiveDateTime,
}

/// Failure to interpret a path as a pc-switcher snapshot.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a pc-switcher snapshot path: {0}")]
pub struct SnapshotParseError(pub String);

impl Snapshot {
    /// Parse a snapshot from its full path.
    ///
    /// Expects `<...>/<timestamp>-<session_id>/<phase>-<subvolume>-<timestamp>`.
    /// Paths that do not match the naming convention are rejected so that
    /// foreign entries under the snapshot root are skipped, not deleted.
    pub fn from_path(path: &str, host: Host) -> Result<Self, SnapshotParseError> {
        let err = || SnapshotParseError(path.to_string());

        let mut parts = path.rsplitn(3, '/');
        let name = parts.next().ok_or_else(err)?;
        let folder = parts.next().ok_or_else(err)?;

        // Session folder: <timestamp>-<session_id>
        let (folder_ts, session_id) = folder.split_once('-').ok_or_else(err)?;
        if folder_ts.len() != 15 || session_id.len() != 8 {
            return Err(err());
        }
        if NaiveDateTime::parse_from_str(folder_ts, NAME_TIMESTAMP_FORMAT).is_err() {
            return Err(err());
        }

        // Snapshot name: <phase>-<subvolume>-<timestamp>
        let (phase_str, rest) = name.split_once('-').ok_or_else(err)?;
        let phase = match phase_str {
            "pre" => SnapshotPhase::Pre,
            "post" => SnapshotPhase::Post,
            _ => return Err(err()),
        };
        let (subvolume, ts_str) = rest.rsplit_once('-').ok_or_else(err)?;
        if subvolume.is_empty() {
            return Err(err());
        }
        let timestamp =
            NaiveDateTime::parse_from_str(ts_str, NAME_TIMESTAMP_FORMAT).map_err(|_| err())?;

        Ok(Self {
            path: path.to_string(),
            subvolume: subvolume.to_string(),
            phase,
            host,
            session_id: session_id.to_string(),
            timestamp,
        })
    }

    /// Path of the session folder containing this snapshot.
    pub fn session_folder(&self) -> &str {
        match self.path.rsplit_once('/') {
            Some((folder, _)) => folder,
            None => &self.path,
        }
    }
}

/// Map a flat subvolume name to its canonical mount point.
///
/// Follows the flat convention: `@` mounts at `/`, `@home` at `/home`,
/// `@root` at `/root`.
pub fn mount_point_for(subvolume: &str) -> String {
    match subvolume {
        "@" => "/".to_string(),
        name => format!("/{}", name.trim_start_matches('@')),
    }
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
