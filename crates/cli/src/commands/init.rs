// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pc-switcher init` - write the commented default configuration.

use anyhow::{Context, Result};
use clap::Args;

#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing configuration file
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<u8> {
    let path = pcs_config::default_config_path();
    if path.exists() && !args.force {
        eprintln!(
            "configuration already exists at {} (use --force to overwrite)",
            path.display()
        );
        return Ok(1);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    std::fs::write(&path, pcs_config::default_config_template())
        .with_context(|| format!("writing {}", path.display()))?;
    println!("wrote default configuration to {}", path.display());
    Ok(0)
}
