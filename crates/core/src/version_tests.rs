// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    stable        = { "1.0.0", "1.0.0" },
    alpha         = { "1.0.0a1", "1.0.0-alpha.1" },
    beta          = { "1.0.0b2", "1.0.0-beta.2" },
    rc            = { "1.0.0rc1", "1.0.0-rc.1" },
    dev           = { "1.0.0.dev3", "1.0.0-dev.3" },
    alpha_dev     = { "1.0.0a2.dev3", "1.0.0-alpha.2.dev.3" },
    post          = { "1.0.0.post2", "1.0.0+post.2" },
    post_dev      = { "1.0.0.post2.dev3", "1.0.0+post.2.dev.3" },
    local         = { "1.0.0+local", "1.0.0+local" },
    post_local    = { "1.0.0.post2+local", "1.0.0+post.2.local" },
    post_dev_local = { "1.0.0.post2.dev3+local", "1.0.0+post.2.dev.3.local" },
)]
fn pep440_to_semver_and_back(pep_str: &str, semver_str: &str) {
    let version = Version::parse_pep440(pep_str).unwrap();
    assert_eq!(version.semver_string().unwrap(), semver_str);

    // Symmetric: parse the SemVer form, render PEP 440, compare equal.
    let from_semver = Version::parse_semver(semver_str).unwrap();
    assert_eq!(from_semver.pep440_string().unwrap(), pep_str);
    assert_eq!(version, from_semver);
}

#[test]
fn equality_ignores_grammar() {
    let pep = Version::parse_pep440("0.1.0a1").unwrap();
    let sem = Version::parse_semver("0.1.0-alpha.1").unwrap();
    assert_eq!(pep, sem);

    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};
    let hash = |v: &Version| {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    };
    assert_eq!(hash(&pep), hash(&sem));
}

#[test]
fn auto_detection_prefers_semver_for_stable() {
    let version = Version::parse("1.2.3").unwrap();
    assert_eq!(version.grammar(), Grammar::Semver);
    assert_eq!(version.original(), "1.2.3");

    let pep_only = Version::parse("1.2.3.post1").unwrap();
    assert_eq!(pep_only.grammar(), Grammar::Pep440);
}

#[test]
fn original_string_is_preserved() {
    let version = Version::parse("0.1.0-alpha.1").unwrap();
    assert_eq!(version.to_string(), "0.1.0-alpha.1");
    assert_eq!(version.pep440_string().unwrap(), "0.1.0a1");
}

#[test]
fn epoch_is_rejected() {
    assert!(matches!(
        Version::parse_pep440("1!2.0.0"),
        Err(VersionError::EpochUnsupported(_))
    ));
}

#[test]
fn semver_conversion_requires_three_components() {
    let pep = Pep440::parse("1.0").unwrap();
    assert!(matches!(
        pep.to_semver(),
        Err(VersionError::NotThreeComponents(_))
    ));
}

#[yare::parameterized(
    dev_before_alpha   = { "1.0.0.dev1", "1.0.0a1" },
    alpha_before_beta  = { "1.0.0a2", "1.0.0b1" },
    beta_before_rc     = { "1.0.0b9", "1.0.0rc1" },
    rc_before_release  = { "1.0.0rc1", "1.0.0" },
    release_before_post = { "1.0.0", "1.0.0.post1" },
    dev_of_pre_before_pre = { "1.0.0a1.dev1", "1.0.0a1" },
    plain_before_local = { "1.0.0", "1.0.0+local" },
    release_ordering   = { "1.9.0", "1.10.0" },
)]
fn pep440_ordering(lower: &str, higher: &str) {
    let lo = Version::parse(lower).unwrap();
    let hi = Version::parse(higher).unwrap();
    assert!(lo < hi, "{lower} should sort below {higher}");
}

#[test]
fn ordering_is_grammar_independent() {
    let sem = Version::parse_semver("1.0.0-beta.1").unwrap();
    let pep = Version::parse_pep440("1.0.0rc1").unwrap();
    assert!(sem < pep);
}

#[test]
fn trailing_zeros_do_not_affect_comparison() {
    assert_eq!(
        Version::parse_pep440("1.0").unwrap(),
        Version::parse_pep440("1.0.0").unwrap()
    );
}

#[test]
fn without_dev_strips_only_dev() {
    let version = Version::parse_pep440("1.0.0a1.dev2").unwrap();
    let stripped = version.without_dev();
    assert_eq!(stripped, Version::parse_pep440("1.0.0a1").unwrap());

    let plain = Version::parse("1.0.0").unwrap();
    assert_eq!(plain.without_dev(), plain);
}

#[yare::parameterized(
    with_prefix       = { "pc-switcher 0.1.0", "0.1.0" },
    semver_prerelease = { "pc-switcher 0.1.0-alpha.1\n", "0.1.0-alpha.1" },
    pep440_prerelease = { "pc-switcher 0.1.0a1", "0.1.0a1" },
    bare              = { "0.1.0-rc.2", "0.1.0-rc.2" },
)]
fn find_one_version_extracts_token(output: &str, expected: &str) {
    let version = find_one_version(output).unwrap();
    assert_eq!(version.original(), expected);
}

#[test]
fn find_one_version_cli_output_renders_both_grammars() {
    let version = find_one_version("pc-switcher 0.1.0-alpha.1\n").unwrap();
    assert_eq!(version.pep440_string().unwrap(), "0.1.0a1");
    assert_eq!(version.semver_string().unwrap(), "0.1.0-alpha.1");
}

#[test]
fn find_one_version_rejects_zero_and_multiple() {
    assert!(matches!(
        find_one_version("no version here"),
        Err(VersionError::NotFound(_))
    ));
    assert!(matches!(
        find_one_version("0.1.0 and 0.2.0"),
        Err(VersionError::Ambiguous(_))
    ));
}

#[test]
fn is_prerelease_detection() {
    assert!(Version::parse("1.0.0-alpha.1").unwrap().is_prerelease());
    assert!(Version::parse("1.0.0.dev1").unwrap().is_prerelease());
    assert!(!Version::parse("1.0.0").unwrap().is_prerelease());
    assert!(!Version::parse("1.0.0.post1").unwrap().is_prerelease());
}
