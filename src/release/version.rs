//! Version lookup in the packaging manifest.

use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;

/// Placeholder shown when no version can be read.
pub const UNKNOWN_VERSION: &str = "unknown";

fn version_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"version\s*=\s*["']([^"']+)["']"#).expect("invalid version regex")
    })
}

/// Extract the first `version = "..."` assignment from manifest source text.
pub fn parse_version(source: &str) -> Option<String> {
    version_pattern()
        .captures(source)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Read the version from the manifest at `path`, for display only.
pub fn read_version(path: &Path) -> String {
    fs::read_to_string(path)
        .ok()
        .and_then(|content| parse_version(&content))
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}
