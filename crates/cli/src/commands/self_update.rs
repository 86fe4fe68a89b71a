// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `pc-switcher self update` - install a released version locally.

use anyhow::Result;
use clap::Args;
use pcs_core::Version;
use pcs_engine::release::{exact_release, ReleaseResolver};
use pcs_exec::{Executor, LocalExecutor, RunOptions};

const INSTALLER_URL: &str =
    "https://github.com/flaksit/pc-switcher/releases/latest/download/install.sh";

#[derive(Args)]
pub struct UpdateArgs {
    /// Specific version to install (defaults to the highest release)
    pub version: Option<String>,

    /// Consider prereleases when picking the highest release
    #[arg(long)]
    pub prerelease: bool,
}

pub async fn run(args: UpdateArgs) -> Result<u8> {
    let current = Version::parse(env!("CARGO_PKG_VERSION"))?;
    let resolver = ReleaseResolver::new();

    let release = match &args.version {
        Some(requested) => {
            let wanted = Version::parse(requested)?;
            let releases = resolver.get_releases(true).await?;
            match exact_release(&releases, &wanted) {
                Some(release) => release.clone(),
                None => {
                    eprintln!("no release found for version {requested}");
                    return Ok(1);
                }
            }
        }
        None => match resolver.get_highest_release(args.prerelease).await? {
            Some(release) => release,
            None => {
                eprintln!("no releases found");
                return Ok(1);
            }
        },
    };

    if release.version == current {
        println!("already running {current}, nothing to do");
        return Ok(0);
    }
    if release.version < current {
        eprintln!(
            "release {} is older than the running {current}; refusing to downgrade",
            release.version
        );
        return Ok(1);
    }

    println!("updating {current} -> {} ({})", release.version, release.tag);
    let executor = LocalExecutor::new();
    let cmd = format!(
        "curl -LsSf {INSTALLER_URL} | PC_SWITCHER_VERSION={} sh",
        release.version
    );
    let result = executor
        .run(&cmd, RunOptions::default().with_timeout(600))
        .await?;
    if !result.success() {
        eprintln!("install script failed: {}", result.stderr.trim());
        return Ok(1);
    }
    println!("updated to {}", release.version);
    Ok(0)
}
