// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pc-switcher rollback` - restore pre-sync snapshots of a session.

use anyhow::Result;
use clap::Args;
use pcs_core::Host;
use pcs_engine::snapshots::rollback_to_presync;
use pcs_exec::LocalExecutor;
use std::path::PathBuf;

#[derive(Args)]
pub struct RollbackArgs {
    /// Session id whose pre-sync snapshots to restore
    #[arg(long)]
    pub session: String,

    /// Path to the configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

pub async fn run(args: RollbackArgs) -> Result<u8> {
    let registry = pcs_engine::Registry::builtin();
    let known = registry.names();
    let config = pcs_config::load_config(&crate::config_path(args.config.as_ref()), &known)?;

    let executor = LocalExecutor::new();
    match rollback_to_presync(
        &executor,
        Host::Source,
        &args.session,
        &config.btrfs_snapshots.subvolumes,
    )
    .await
    {
        Ok(report) => {
            println!(
                "restored subvolumes: {}",
                report.restored_subvolumes.join(", ")
            );
            if report.reboot_required {
                println!("reboot required to finish the rollback");
            }
            Ok(0)
        }
        Err(e) => {
            eprintln!("rollback failed: {e}");
            Ok(1)
        }
    }
}
