// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pc-switcher cleanup-snapshots` - apply the retention policy now.

use crate::duration::parse_older_than;
use anyhow::Result;
use clap::Args;
use pcs_core::Host;
use pcs_engine::snapshots::cleanup;
use pcs_exec::LocalExecutor;
use std::path::PathBuf;

#[derive(Args)]
pub struct CleanupArgs {
    /// Delete sessions older than this (e.g. "7d", "2w", "30 days")
    #[arg(long)]
    pub older_than: Option<String>,

    /// Keep this many recent sessions unconditionally
    #[arg(long)]
    pub keep_recent: Option<usize>,

    /// Path to the configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn run(args: CleanupArgs) -> Result<u8> {
    let registry = pcs_engine::Registry::builtin();
    let known = registry.names();
    let config = pcs_config::load_config(&crate::config_path(args.config.as_ref()), &known)?;

    let max_age_days = match &args.older_than {
        Some(expr) => Some(parse_older_than(expr).map_err(anyhow::Error::msg)?),
        None => config.btrfs_snapshots.max_age_days,
    };
    let keep_recent = args
        .keep_recent
        .unwrap_or(config.btrfs_snapshots.keep_recent as usize);

    let executor = LocalExecutor::new();
    let deleted = cleanup(
        &executor,
        Host::Source,
        keep_recent,
        max_age_days,
        chrono::Local::now().naive_local(),
    )
    .await?;

    if deleted.is_empty() {
        println!("nothing to delete");
    } else {
        for snapshot in &deleted {
            println!("deleted {}", snapshot.path);
        }
        println!("{} snapshot(s) deleted", deleted.len());
    }
    Ok(0)
}
