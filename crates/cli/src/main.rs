// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! pc-switcher - sync one Linux workstation onto another

mod color;
mod commands;
mod duration;
mod prompt;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

pub(crate) const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(
    name = "pc-switcher",
    version,
    about = "Synchronize the state of this workstation onto another over SSH"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full sync onto the target host
    Sync(commands::sync::SyncArgs),
    /// Show session log files
    Logs(commands::logs::LogsArgs),
    /// Roll back to the pre-sync snapshots of a session
    Rollback(commands::rollback::RollbackArgs),
    /// Delete old snapshot sessions per the retention policy
    CleanupSnapshots(commands::cleanup::CleanupArgs),
    /// Write the default configuration file
    Init(commands::init::InitArgs),
    /// Manage this installation
    #[command(name = "self", subcommand)]
    SelfCmd(SelfCommands),
}

#[derive(Subcommand)]
enum SelfCommands {
    /// Update pc-switcher to a released version
    Update(commands::self_update::UpdateArgs),
}

fn init_tracing(level: pcs_core::LogLevel) {
    use tracing_subscriber::EnvFilter;
    let default = match level {
        pcs_core::LogLevel::Debug | pcs_core::LogLevel::Full => "debug",
        pcs_core::LogLevel::Info => "info",
        pcs_core::LogLevel::Warning => "warn",
        pcs_core::LogLevel::Error | pcs_core::LogLevel::Critical => "error",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Resolve the config path: `--config` override or the default location.
pub(crate) fn config_path(override_path: Option<&PathBuf>) -> PathBuf {
    override_path
        .cloned()
        .unwrap_or_else(pcs_config::default_config_path)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let outcome: Result<u8> = match cli.command {
        Commands::Sync(args) => commands::sync::run(args).await,
        Commands::Logs(args) => commands::logs::run(args),
        Commands::Rollback(args) => commands::rollback::run(args).await,
        Commands::CleanupSnapshots(args) => commands::cleanup::run(args).await,
        Commands::Init(args) => commands::init::run(args),
        Commands::SelfCmd(SelfCommands::Update(args)) => commands::self_update::run(args).await,
    };

    match outcome {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
