// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pcs-core: data model for the pc-switcher sync pipeline

pub mod command;
pub mod error;
pub mod event;
pub mod fmt;
pub mod host;
pub mod level;
pub mod session;
pub mod snapshot;
pub mod version;

pub use command::CommandResult;
pub use error::{ConfigError, ValidationError};
pub use event::{ConnectionStatus, Event, LogRecord, ProgressUpdate};
pub use fmt::{format_bytes, format_elapsed};
pub use host::Host;
pub use level::LogLevel;
pub use session::{
    generate_session_id, JobResult, JobStatus, SessionStatus, SyncRole, SyncSession,
};
pub use snapshot::{Snapshot, SnapshotPhase, SNAPSHOT_ROOT};
pub use version::{find_one_version, Grammar, Version, VersionError};
