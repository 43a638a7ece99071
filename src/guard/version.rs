//! Semantic version check for entity versions.

use regex_lite::Regex;
use std::sync::OnceLock;

// MAJOR.MINOR.PATCH with optional pre-release and build metadata
const SEMVER_PATTERN: &str = r"^(0|[1-9]\d*)\.(0|[1-9]\d*)\.(0|[1-9]\d*)(?:-((?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*)(?:\.(?:0|[1-9]\d*|\d*[a-zA-Z-][0-9a-zA-Z-]*))*))?(?:\+([0-9a-zA-Z-]+(?:\.[0-9a-zA-Z-]+)*))?$";

fn semver_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(SEMVER_PATTERN).expect("semver pattern is a valid regex"))
}

/// Whether `version` is a semantic version string.
pub fn is_semver(version: &str) -> bool {
    semver_re().is_match(version)
}
