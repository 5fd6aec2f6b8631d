//! Version strings and version requests
//!
//! Catalog headers and references use a loose version vocabulary: the literal
//! `latest`, x-patterns such as `0.0.x`, caret/tilde ranges such as `^1.0.0`,
//! and strict semantic versions. This module checks that vocabulary and
//! resolves a requested version against the set of versions recorded for an
//! id.

use std::collections::BTreeSet;

use regex::Regex;
use semver::{Version, VersionReq};

/// Version recorded for resources that declare none
pub const LATEST: &str = "latest";

/// Compiled patterns for the header version vocabulary
#[derive(Debug, Clone)]
pub struct VersionFormat {
    /// `N.N.N` with optional `-pre` and `+build` parts
    semver: Regex,
    /// `N(.N)*.x`, e.g. `1.x` or `2.1.x`
    x_pattern: Regex,
}

impl Default for VersionFormat {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionFormat {
    pub fn new() -> Self {
        Self {
            semver: Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+(-[A-Za-z0-9_.\-]+)?(\+[A-Za-z0-9_.\-]+)?$")
                .unwrap(),
            x_pattern: Regex::new(r"^[0-9]+(\.[0-9]+)*\.x$").unwrap(),
        }
    }

    pub fn is_strict_semver(&self, version: &str) -> bool {
        self.semver.is_match(version)
    }

    pub fn is_x_pattern(&self, version: &str) -> bool {
        self.x_pattern.is_match(version)
    }

    /// Whether a header `version` value uses an accepted format
    pub fn is_valid(&self, version: &str) -> bool {
        if version == LATEST {
            return true;
        }
        if version.contains(".x") {
            return self.is_x_pattern(version);
        }
        if let Some(rest) = version.strip_prefix('^').or_else(|| version.strip_prefix('~')) {
            return self.is_strict_semver(rest);
        }
        self.is_strict_semver(version)
    }
}

/// Does a requested version resolve against the versions recorded for an id?
///
/// Resolution order:
/// 1. nothing recorded never matches
/// 2. no request, or `latest`, matches anything recorded
/// 3. an exact string match always wins, valid semver or not
/// 4. `.x` patterns match recorded versions sharing the stripped prefix
/// 5. `^`/`~` ranges match recorded versions that are valid semver
///
/// `latest` entries never take part in steps 4 and 5. Unparseable input
/// never matches.
pub fn version_satisfies(requested: Option<&str>, recorded: &BTreeSet<String>) -> bool {
    if recorded.is_empty() {
        return false;
    }

    let requested = match requested {
        None | Some(LATEST) => return true,
        Some(v) => v,
    };

    if recorded.contains(requested) {
        return true;
    }

    let mut concrete = recorded.iter().map(String::as_str).filter(|v| *v != LATEST);

    if requested.contains(".x") {
        let prefix = requested.replace(".x", "");
        return concrete.any(|v| v.starts_with(&prefix));
    }

    if let Some(rest) = requested.strip_prefix('^').or_else(|| requested.strip_prefix('~')) {
        if Version::parse(rest).is_err() {
            return false;
        }
        let Ok(range) = VersionReq::parse(requested) else {
            return false;
        };
        return concrete
            .filter_map(|v| Version::parse(v).ok())
            .any(|v| range.matches(&v));
    }

    false
}
