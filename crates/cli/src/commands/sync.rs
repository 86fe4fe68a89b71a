// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pc-switcher sync` - run the full pipeline against a target host.

use crate::color::should_colorize;
use crate::prompt::StdinPrompter;
use crate::summary::render;
use crate::EXIT_INTERRUPTED;
use anyhow::{Context, Result};
use clap::Args;
use pcs_core::{Host, SessionStatus, Version};
use pcs_engine::snapshots::rollback_to_presync;
use pcs_engine::{Orchestrator, OrchestratorOptions, Prompter, Registry};
use pcs_exec::LocalExecutor;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Forced-exit deadline after the first SIGINT.
const CLEANUP_DEADLINE: Duration = Duration::from_secs(30);

#[derive(Args)]
pub struct SyncArgs {
    /// Target hostname or SSH alias
    pub target: String,

    /// Path to the configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Skip the consecutive-sync confirmation prompt
    #[arg(long)]
    pub allow_consecutive: bool,
}

/// First SIGINT requests cooperative cancellation; a second one (or a
/// blown cleanup deadline) forces the process out with code 130.
fn spawn_sigint_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        eprintln!("\ninterrupt received, cancelling (press Ctrl-C again to force quit)");
        cancel.cancel();

        let second = tokio::signal::ctrl_c();
        let deadline = tokio::time::sleep(CLEANUP_DEADLINE);
        tokio::select! {
            _ = second => {
                eprintln!("\nforced exit");
                std::process::exit(EXIT_INTERRUPTED as i32);
            }
            _ = deadline => {
                eprintln!("cleanup deadline exceeded, forcing exit");
                std::process::exit(EXIT_INTERRUPTED as i32);
            }
        }
    });
}

pub async fn run(args: SyncArgs) -> Result<u8> {
    let registry = Registry::builtin();
    let known = registry.names();
    let config_file = crate::config_path(args.config.as_ref());
    let config = pcs_config::load_config(&config_file, &known)
        .with_context(|| format!("loading {}", config_file.display()))?;

    crate::init_tracing(config.logging.external);

    let source_version = Version::parse(env!("CARGO_PKG_VERSION"))?;
    let mut options = OrchestratorOptions::new(source_version);
    options.allow_consecutive = args.allow_consecutive;
    options.colorize = should_colorize();
    let colorize = options.colorize;
    let subvolumes = config.btrfs_snapshots.subvolumes.clone();

    let orchestrator = Orchestrator::new(
        &args.target,
        config,
        options,
        Box::new(StdinPrompter),
    );
    spawn_sigint_handler(orchestrator.cancel_token());

    let summary = orchestrator.run().await;
    eprint!("{}", render(&summary, colorize));

    if summary.rollback_available {
        let prompter = StdinPrompter;
        let question = format!(
            "Roll back to the pre-sync snapshots of session {}?",
            summary.session.id
        );
        if prompter.confirm(&question).await {
            let executor = LocalExecutor::new();
            match rollback_to_presync(
                &executor,
                Host::Source,
                &summary.session.id,
                &subvolumes,
            )
            .await
            {
                Ok(report) => {
                    eprintln!(
                        "restored subvolumes: {}; reboot required",
                        report.restored_subvolumes.join(", ")
                    );
                }
                Err(e) => eprintln!("rollback failed: {e}"),
            }
        } else {
            eprintln!(
                "you can roll back later with: pc-switcher rollback --session {}",
                summary.session.id
            );
        }
    }

    Ok(match summary.session.status {
        SessionStatus::Completed => 0,
        SessionStatus::Interrupted => EXIT_INTERRUPTED,
        _ => 1,
    })
}
