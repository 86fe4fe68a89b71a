// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub release feed for self-update version resolution.
//!
//! Tags are fetched once per resolver call and mapped to [`Release`]
//! values; the selection helpers are pure functions over that list so
//! they stay testable without the network.

use pcs_core::Version;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Repository whose releases carry pc-switcher versions.
pub const RELEASE_REPO: &str = "flaksit/pc-switcher";

const API_BASE: &str = "https://api.github.com";
const USER_AGENT: &str = concat!("pc-switcher/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT_SECS: u64 = 30;
const PAGE_SIZE: u32 = 100;

#[derive(Debug, Error)]
pub enum ReleaseError {
    #[error("release feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("release feed returned status {0}")]
    Status(u16),
    #[error("no release at or below version {0}")]
    NoFloor(String),
}

/// One published release.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    pub version: Version,
    pub is_prerelease: bool,
    pub tag: String,
}

#[derive(Debug, Deserialize)]
struct ApiRelease {
    tag_name: String,
    prerelease: bool,
    draft: bool,
}

/// Client for the GitHub releases feed.
///
/// Reads `GITHUB_TOKEN` for authenticated requests when set; anonymous
/// otherwise.
pub struct ReleaseResolver {
    client: reqwest::Client,
    base_url: String,
    repo: String,
    token: Option<String>,
}

impl ReleaseResolver {
    pub fn new() -> Self {
        Self::for_repo(RELEASE_REPO)
    }

    pub fn for_repo(repo: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base_url: API_BASE.to_string(),
            repo: repo.to_string(),
            token: std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()),
        }
    }

    /// Point the resolver at a different API host (tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Fetch releases, highest version first.
    ///
    /// Drafts and tags that do not parse as versions are skipped.
    pub async fn get_releases(
        &self,
        include_prereleases: bool,
    ) -> Result<Vec<Release>, ReleaseError> {
        let url = format!(
            "{}/repos/{}/releases?per_page={PAGE_SIZE}",
            self.base_url, self.repo
        );
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(ReleaseError::Status(response.status().as_u16()));
        }
        let api_releases: Vec<ApiRelease> = response.json().await?;

        let releases = api_releases
            .into_iter()
            .filter(|r| !r.draft)
            .filter_map(|r| {
                let version = Version::parse(r.tag_name.trim_start_matches('v')).ok()?;
                Some(Release {
                    version,
                    is_prerelease: r.prerelease,
                    tag: r.tag_name,
                })
            })
            .collect();
        Ok(sort_releases(releases, include_prereleases))
    }

    /// Highest release by version.
    pub async fn get_highest_release(
        &self,
        include_prereleases: bool,
    ) -> Result<Option<Release>, ReleaseError> {
        Ok(self
            .get_releases(include_prereleases)
            .await?
            .into_iter()
            .next())
    }
}

impl Default for ReleaseResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Filter and sort a release list, highest version first.
pub fn sort_releases(mut releases: Vec<Release>, include_prereleases: bool) -> Vec<Release> {
    if !include_prereleases {
        releases.retain(|r| !r.is_prerelease);
    }
    releases.sort_by(|a, b| b.version.cmp(&a.version));
    releases
}

/// The greatest release `<= version`.
///
/// A dev build of a prerelease resolves to that prerelease, so the
/// comparison strips the dev component first.
pub fn release_floor<'a>(
    releases: &'a [Release],
    version: &Version,
) -> Result<&'a Release, ReleaseError> {
    let anchor = version.without_dev();
    releases
        .iter()
        .filter(|r| r.version <= anchor)
        .max_by(|a, b| a.version.cmp(&b.version))
        .ok_or_else(|| ReleaseError::NoFloor(version.to_string()))
}

/// The release whose version equals `version` exactly, if any.
pub fn exact_release<'a>(releases: &'a [Release], version: &Version) -> Option<&'a Release> {
    releases.iter().find(|r| &r.version == version)
}

#[cfg(test)]
#[path = "release_tests.rs"]
mod tests;
