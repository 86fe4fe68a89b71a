// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pc-switcher logs` - locate and print session log files.

use anyhow::{Context, Result};
use clap::Args;
use pcs_engine::sinks::{find_log_file, latest_log_file, logs_dir};

#[derive(Args)]
pub struct LogsArgs {
    /// Print the most recent session log
    #[arg(long, conflicts_with = "session")]
    pub last: bool,

    /// Print the log of a specific session id
    #[arg(long)]
    pub session: Option<String>,
}

pub fn run(args: LogsArgs) -> Result<u8> {
    let selected = if args.last {
        latest_log_file()
    } else if let Some(session_id) = &args.session {
        find_log_file(session_id)
    } else {
        // No selector: list what exists.
        let dir = logs_dir();
        let Ok(entries) = std::fs::read_dir(&dir) else {
            println!("no logs yet under {}", dir.display());
            return Ok(0);
        };
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with("sync-"))
            .collect();
        names.sort();
        for name in names {
            println!("{}", dir.join(name).display());
        }
        return Ok(0);
    };

    match selected {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            print!("{content}");
            Ok(0)
        }
        None => {
            eprintln!("no matching log file found");
            Ok(0)
        }
    }
}
