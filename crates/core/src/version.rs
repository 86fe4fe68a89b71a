// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dual-grammar version model.
//!
//! A [`Version`] can be parsed from either a PEP 440 string (`1.0.0a1`)
//! or a SemVer string (`1.0.0-alpha.1`) and rendered back in both forms.
//! Comparison and hashing use PEP 440 ordering over the canonical
//! components, so two versions compare equal regardless of which grammar
//! produced them. The original input string and its grammar are preserved
//! for round-trip display.
//!
//! Conversion table:
//!
//! | PEP 440            | SemVer                      |
//! |--------------------|-----------------------------|
//! | `aN` / `bN` / `rcN`| `-alpha.N` / `-beta.N` / `-rc.N` |
//! | `.devN` (no post)  | `-dev.N`                    |
//! | `.postN` (no dev)  | `+post.N`                   |
//! | `.postN.devM`      | `+post.N.dev.M`             |
//! | `+local`           | appended to build metadata  |

use regex::Regex;
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use std::sync::OnceLock;

/// Which grammar a version string was parsed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Grammar {
    Pep440,
    Semver,
}

/// Pre-release kind, ordered `Alpha < Beta < Rc`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreKind {
    Alpha,
    Beta,
    Rc,
}

impl PreKind {
    fn pep440(&self) -> &'static str {
        match self {
            PreKind::Alpha => "a",
            PreKind::Beta => "b",
            PreKind::Rc => "rc",
        }
    }

    fn semver(&self) -> &'static str {
        match self {
            PreKind::Alpha => "alpha",
            PreKind::Beta => "beta",
            PreKind::Rc => "rc",
        }
    }

    fn from_semver(ident: &str) -> Option<Self> {
        match ident {
            "alpha" => Some(PreKind::Alpha),
            "beta" => Some(PreKind::Beta),
            "rc" => Some(PreKind::Rc),
            _ => None,
        }
    }
}

/// Version parsing and conversion failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionError {
    #[error("invalid version: {0}")]
    Invalid(String),
    #[error("PEP 440 epoch is not supported: {0}")]
    EpochUnsupported(String),
    #[error("version must have exactly 3 release components for SemVer conversion: {0}")]
    NotThreeComponents(String),
    #[error("unrecognized prerelease identifier '{0}' in {1}")]
    UnrecognizedPrerelease(String, String),
    #[error("cannot parse version from output: {0}")]
    NotFound(String),
    #[error("multiple version tokens found in output: {0}")]
    Ambiguous(String),
}

/// Parsed components of a PEP 440 version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Pep440 {
    pub release: Vec<u64>,
    pub pre: Option<(PreKind, u64)>,
    pub post: Option<u64>,
    pub dev: Option<u64>,
    pub local: Option<String>,
}

#[allow(clippy::unwrap_used)] // pattern is a compile-time constant
fn pep440_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\d+(?:\.\d+)*)(?:(a|b|rc)(\d+))?(?:\.post(\d+))?(?:\.dev(\d+))?(?:\+([0-9a-zA-Z]+(?:\.[0-9a-zA-Z]+)*))?$",
        )
        .unwrap()
    })
}

#[allow(clippy::unwrap_used)] // pattern is a compile-time constant
fn epoch_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+!").unwrap())
}

impl Pep440 {
    /// Parse a canonical PEP 440 version string.
    ///
    /// Epochs (`N!...`) are rejected: they have no SemVer counterpart.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        if epoch_re().is_match(s) {
            return Err(VersionError::EpochUnsupported(s.to_string()));
        }
        let caps = pep440_re()
            .captures(s)
            .ok_or_else(|| VersionError::Invalid(s.to_string()))?;

        let release = caps[1]
            .split('.')
            .map(|part| part.parse::<u64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| VersionError::Invalid(s.to_string()))?;

        let pre = match (caps.get(2), caps.get(3)) {
            (Some(kind), Some(num)) => {
                let kind = match kind.as_str() {
                    "a" => PreKind::Alpha,
                    "b" => PreKind::Beta,
                    _ => PreKind::Rc,
                };
                let num = num
                    .as_str()
                    .parse::<u64>()
                    .map_err(|_| VersionError::Invalid(s.to_string()))?;
                Some((kind, num))
            }
            _ => None,
        };

        let parse_num = |m: Option<regex::Match<'_>>| -> Result<Option<u64>, VersionError> {
            m.map(|m| {
                m.as_str()
                    .parse::<u64>()
                    .map_err(|_| VersionError::Invalid(s.to_string()))
            })
            .transpose()
        };

        Ok(Self {
            release,
            pre,
            post: parse_num(caps.get(4))?,
            dev: parse_num(caps.get(5))?,
            local: caps.get(6).map(|m| m.as_str().to_string()),
        })
    }

    /// Convert to SemVer components.
    ///
    /// The release must have exactly three components. Dev goes to the
    /// prerelease unless a post release is present, in which case it rides
    /// in build metadata with the post number.
    pub fn to_semver(&self) -> Result<Semver, VersionError> {
        if self.release.len() != 3 {
            return Err(VersionError::NotThreeComponents(self.to_string()));
        }

        let mut prerelease_parts: Vec<String> = Vec::new();
        if let Some((kind, num)) = self.pre {
            prerelease_parts.push(kind.semver().to_string());
            prerelease_parts.push(num.to_string());
        }
        if let (Some(dev), None) = (self.dev, self.post) {
            prerelease_parts.push("dev".to_string());
            prerelease_parts.push(dev.to_string());
        }

        let mut build_parts: Vec<String> = Vec::new();
        if let Some(post) = self.post {
            build_parts.push("post".to_string());
            build_parts.push(post.to_string());
            if let Some(dev) = self.dev {
                build_parts.push("dev".to_string());
                build_parts.push(dev.to_string());
            }
        }
        if let Some(local) = &self.local {
            build_parts.push(local.clone());
        }

        Ok(Semver {
            major: self.release[0],
            minor: self.release[1],
            patch: self.release[2],
            prerelease: (!prerelease_parts.is_empty()).then(|| prerelease_parts.join(".")),
            build: (!build_parts.is_empty()).then(|| build_parts.join(".")),
        })
    }
}

impl std::fmt::Display for Pep440 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let release = self
            .release
            .iter()
            .map(|n| n.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{release}")?;
        if let Some((kind, num)) = self.pre {
            write!(f, "{}{num}", kind.pep440())?;
        }
        if let Some(post) = self.post {
            write!(f, ".post{post}")?;
        }
        if let Some(dev) = self.dev {
            write!(f, ".dev{dev}")?;
        }
        if let Some(local) = &self.local {
            write!(f, "+{local}")?;
        }
        Ok(())
    }
}

/// Parsed components of a SemVer version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Semver {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
    pub build: Option<String>,
}

#[allow(clippy::unwrap_used)] // pattern is a compile-time constant
fn semver_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$",
        )
        .unwrap()
    })
}

impl Semver {
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        let caps = semver_re()
            .captures(s)
            .ok_or_else(|| VersionError::Invalid(s.to_string()))?;
        let num = |i: usize| -> Result<u64, VersionError> {
            caps[i]
                .parse::<u64>()
                .map_err(|_| VersionError::Invalid(s.to_string()))
        };
        Ok(Self {
            major: num(1)?,
            minor: num(2)?,
            patch: num(3)?,
            prerelease: caps.get(4).map(|m| m.as_str().to_string()),
            build: caps.get(5).map(|m| m.as_str().to_string()),
        })
    }

    /// Convert to PEP 440 components (reverse of [`Pep440::to_semver`]).
    pub fn to_pep440(&self) -> Result<Pep440, VersionError> {
        let mut pre: Option<(PreKind, u64)> = None;
        let mut dev: Option<u64> = None;

        if let Some(prerelease) = &self.prerelease {
            let parts: Vec<&str> = prerelease.split('.').collect();
            let mut i = 0;
            while i < parts.len() {
                let part = parts[i];
                if let Some(kind) = PreKind::from_semver(part) {
                    let num = parts
                        .get(i + 1)
                        .and_then(|n| n.parse::<u64>().ok())
                        .ok_or_else(|| {
                            VersionError::UnrecognizedPrerelease(
                                part.to_string(),
                                self.to_string(),
                            )
                        })?;
                    pre = Some((kind, num));
                    i += 2;
                } else if part == "dev" {
                    let num = parts
                        .get(i + 1)
                        .and_then(|n| n.parse::<u64>().ok())
                        .ok_or_else(|| {
                            VersionError::UnrecognizedPrerelease(
                                part.to_string(),
                                self.to_string(),
                            )
                        })?;
                    dev = Some(num);
                    i += 2;
                } else {
                    return Err(VersionError::UnrecognizedPrerelease(
                        part.to_string(),
                        self.to_string(),
                    ));
                }
            }
        }

        // Build metadata: [post.N[.dev.M]][.local...]
        let mut post: Option<u64> = None;
        let mut local: Option<String> = None;
        if let Some(build) = &self.build {
            let parts: Vec<&str> = build.split('.').collect();
            let mut i = 0;
            if parts.get(i) == Some(&"post") {
                if let Some(n) = parts.get(i + 1).and_then(|n| n.parse::<u64>().ok()) {
                    post = Some(n);
                    i += 2;
                    if parts.get(i) == Some(&"dev") {
                        if let Some(m) = parts.get(i + 1).and_then(|n| n.parse::<u64>().ok()) {
                            dev = Some(m);
                            i += 2;
                        }
                    }
                }
            }
            if i < parts.len() {
                local = Some(parts[i..].join("."));
            }
        }

        Ok(Pep440 {
            release: vec![self.major, self.minor, self.patch],
            pre,
            post,
            dev,
            local,
        })
    }
}

impl std::fmt::Display for Semver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(prerelease) = &self.prerelease {
            write!(f, "-{prerelease}")?;
        }
        if let Some(build) = &self.build {
            write!(f, "+{build}")?;
        }
        Ok(())
    }
}

// Ordering key following PEP 440 semantics over the canonical components.
// Variant declaration order is the sort order.

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum Ident {
    Str(String),
    Num(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum PreKey {
    // bare `.devN` sorts below everything in its release
    DevOnly,
    Known(PreKind, u64),
    // prerelease identifiers with no PEP 440 counterpart (SemVer-only)
    Other(Vec<Ident>),
    NoPre,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum PostKey {
    NoPost,
    Val(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum DevKey {
    Val(u64),
    NoDev,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum LocalKey {
    NoLocal,
    Segs(Vec<Ident>),
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
struct Key {
    release: Vec<u64>,
    pre: PreKey,
    post: PostKey,
    dev: DevKey,
    local: LocalKey,
}

fn ident(s: &str) -> Ident {
    match s.parse::<u64>() {
        Ok(n) => Ident::Num(n),
        Err(_) => Ident::Str(s.to_string()),
    }
}

impl Key {
    fn from_pep(pep: &Pep440) -> Self {
        let mut release = pep.release.clone();
        while release.len() > 1 && release.last() == Some(&0) {
            release.pop();
        }
        let pre = match (pep.pre, pep.post, pep.dev) {
            (Some((kind, num)), _, _) => PreKey::Known(kind, num),
            (None, None, Some(_)) => PreKey::DevOnly,
            _ => PreKey::NoPre,
        };
        Self {
            release,
            pre,
            post: pep.post.map_or(PostKey::NoPost, PostKey::Val),
            dev: pep.dev.map_or(DevKey::NoDev, DevKey::Val),
            local: pep.local.as_deref().map_or(LocalKey::NoLocal, |local| {
                LocalKey::Segs(local.split('.').map(ident).collect())
            }),
        }
    }

    fn from_semver(sem: &Semver) -> Self {
        // Only reached when the prerelease has no PEP 440 counterpart;
        // build metadata is ignored for precedence, as SemVer specifies.
        let pre = match &sem.prerelease {
            None => PreKey::NoPre,
            Some(pr) => PreKey::Other(pr.split('.').map(ident).collect()),
        };
        Self {
            release: vec![sem.major, sem.minor, sem.patch],
            pre,
            post: PostKey::NoPost,
            dev: DevKey::NoDev,
            local: LocalKey::NoLocal,
        }
    }
}

/// A version parsed from either grammar.
///
/// Keeps the original string and the grammar it was parsed with; equality
/// and ordering ignore both and work over the canonical components.
#[derive(Debug, Clone)]
pub struct Version {
    original: String,
    grammar: Grammar,
    pep: Option<Pep440>,
    sem: Option<Semver>,
}

impl Version {
    /// Parse with grammar auto-detection: SemVer first, then PEP 440.
    ///
    /// Stable versions valid in both grammars are recorded as SemVer.
    pub fn parse(s: &str) -> Result<Self, VersionError> {
        if let Ok(version) = Self::parse_semver(s) {
            return Ok(version);
        }
        Self::parse_pep440(s)
    }

    pub fn parse_pep440(s: &str) -> Result<Self, VersionError> {
        let pep = Pep440::parse(s)?;
        let sem = pep.to_semver().ok();
        Ok(Self {
            original: s.to_string(),
            grammar: Grammar::Pep440,
            pep: Some(pep),
            sem,
        })
    }

    pub fn parse_semver(s: &str) -> Result<Self, VersionError> {
        let sem = Semver::parse(s)?;
        let pep = sem.to_pep440().ok();
        Ok(Self {
            original: s.to_string(),
            grammar: Grammar::Semver,
            pep,
            sem: Some(sem),
        })
    }

    /// The string this version was parsed from, verbatim.
    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// Canonical PEP 440 rendering, when representable.
    pub fn pep440_string(&self) -> Option<String> {
        self.pep.as_ref().map(|p| p.to_string())
    }

    /// SemVer rendering, when representable.
    pub fn semver_string(&self) -> Option<String> {
        self.sem.as_ref().map(|s| s.to_string())
    }

    /// True when this version is anything but a plain release.
    pub fn is_prerelease(&self) -> bool {
        match &self.pep {
            Some(pep) => pep.pre.is_some() || pep.dev.is_some(),
            None => self
                .sem
                .as_ref()
                .is_some_and(|sem| sem.prerelease.is_some()),
        }
    }

    /// A copy with any `.devN` component removed.
    ///
    /// Used when looking up the release a dev build belongs to: the dev of
    /// a prerelease should resolve to that prerelease.
    pub fn without_dev(&self) -> Version {
        match &self.pep {
            Some(pep) if pep.dev.is_some() => {
                let stripped = Pep440 {
                    dev: None,
                    ..pep.clone()
                };
                let sem = stripped.to_semver().ok();
                Version {
                    original: stripped.to_string(),
                    grammar: Grammar::Pep440,
                    pep: Some(stripped),
                    sem,
                }
            }
            _ => self.clone(),
        }
    }

    fn key(&self) -> Key {
        match (&self.pep, &self.sem) {
            (Some(pep), _) => Key::from_pep(pep),
            (None, Some(sem)) => Key::from_semver(sem),
            // Unreachable by construction: parsing always fills one side.
            (None, None) => Key {
                release: Vec::new(),
                pre: PreKey::NoPre,
                post: PostKey::NoPost,
                dev: DevKey::NoDev,
                local: LocalKey::NoLocal,
            },
        }
    }
}

impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.original)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Version {}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl Hash for Version {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

#[allow(clippy::unwrap_used)] // pattern is a compile-time constant
fn token_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\d+\.\d+\.\d+(?:(?:a|b|rc)\d+)?(?:[-+.][0-9A-Za-z.-]+)*").unwrap()
    })
}

/// Extract exactly one version token from command output.
///
/// Accepts both grammars (e.g. `"pc-switcher 0.1.0a1"` or
/// `"pc-switcher 0.1.0-alpha.1"`). Fails on zero or multiple tokens.
pub fn find_one_version(text: &str) -> Result<Version, VersionError> {
    let mut matches = token_re().find_iter(text);
    let first = matches
        .next()
        .ok_or_else(|| VersionError::NotFound(text.trim().to_string()))?;
    if matches.next().is_some() {
        return Err(VersionError::Ambiguous(text.trim().to_string()));
    }
    Version::parse(first.as_str())
}

#[cfg(test)]
#[path = "version_tests.rs"]
mod tests;
