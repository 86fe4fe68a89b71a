// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The two machines participating in a sync.

use serde::{Deserialize, Serialize};

/// Which machine a fact is attributed to.
///
/// The source initiates the sync toward the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Host {
    Source,
    Target,
}

impl Host {
    pub fn as_str(&self) -> &'static str {
        match self {
            Host::Source => "source",
            Host::Target => "target",
        }
    }
}

impl std::fmt::Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
