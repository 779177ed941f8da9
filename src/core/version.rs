//! Tool version handling for capability gates.
//!
//! Buildx and BuildKit report versions in a few shapes: plain semver with a
//! `v` prefix, vendor builds with a suffix (`v0.18.0-desktop.2`), and
//! development builds that only carry a short commit hash. Gates compare the
//! numeric `major.minor.patch` only. Development builds are assumed to be
//! newer than any release and satisfy every requirement.

use std::fmt;

use semver::{Comparator, Op, Prerelease, Version, VersionReq};

/// A version reported by an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolVersion {
    /// A tagged release (possibly a pre-release).
    Release(Version),
    /// A development build identified only by its commit.
    Dev(String),
}

impl ToolVersion {
    /// Parse a version string as printed by the tool.
    ///
    /// Returns `None` when the string is neither a (lenient) semver version
    /// nor a commit hash.
    pub fn parse(s: &str) -> Option<ToolVersion> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }

        let trimmed = s.strip_prefix('v').unwrap_or(s);
        if let Some(v) = parse_version_lenient(trimmed) {
            return Some(ToolVersion::Release(v));
        }

        if is_commit_hash(s) {
            return Some(ToolVersion::Dev(s.to_string()));
        }

        None
    }

    /// Check whether this version satisfies a requirement.
    ///
    /// Any suffix is ignored: `0.16.0-desktop.1` is a build of the 0.16.0
    /// release and has its capabilities.
    pub fn satisfies(&self, req: &VersionReq) -> bool {
        match self {
            ToolVersion::Dev(_) => true,
            ToolVersion::Release(v) => req.matches(&Version::new(v.major, v.minor, v.patch)),
        }
    }
}

impl fmt::Display for ToolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolVersion::Release(v) => write!(f, "{}", v),
            ToolVersion::Dev(commit) => write!(f, "dev ({})", commit),
        }
    }
}

/// Build a `>=major.minor.patch` requirement.
pub fn at_least(major: u64, minor: u64, patch: u64) -> VersionReq {
    VersionReq {
        comparators: vec![Comparator {
            op: Op::GreaterEq,
            major,
            minor: Some(minor),
            patch: Some(patch),
            pre: Prerelease::EMPTY,
        }],
    }
}

/// Parse a version string, allowing for incomplete versions.
///
/// `0.18` becomes `0.18.0`, `1` becomes `1.0.0`.
pub fn parse_version_lenient(s: &str) -> Option<Version> {
    if let Ok(v) = s.parse() {
        return Some(v);
    }

    // Split off any pre-release or build suffix before padding
    let (core, rest) = match s.find(['-', '+']) {
        Some(idx) => s.split_at(idx),
        None => (s, ""),
    };

    let parts: Vec<&str> = core.split('.').collect();
    let padded = match parts.len() {
        1 => format!("{}.0.0{}", parts[0], rest),
        2 => format!("{}.{}.0{}", parts[0], parts[1], rest),
        _ => return None,
    };

    padded.parse().ok()
}

fn is_commit_hash(s: &str) -> bool {
    (7..=40).contains(&s.len()) && s.chars().all(|c| c.is_ascii_hexdigit())
}
