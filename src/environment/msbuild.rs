//! Minimal reader for MSBuild-style project files.
//!
//! Only what discovery and restore need is extracted: `ProjectReference` and
//! `PackageReference` items in document order, and the literal value of a
//! property such as `BaseIntermediateOutputPath`. The file is not evaluated;
//! property values that contain `$(...)` expressions are treated as unset so
//! callers fall back to their defaults.

use crate::environment::DependencyEntry;
use regex::Regex;
use std::path::{MAIN_SEPARATOR, PathBuf};
use std::sync::OnceLock;

fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"<(ProjectReference|PackageReference)\b[^>]*?\bInclude\s*=\s*"([^"]*)""#)
            .expect("reference pattern is valid")
    })
}

/// Extract dependency entries in the order they are declared.
#[must_use]
pub fn parse_dependencies(contents: &str) -> Vec<DependencyEntry> {
    reference_pattern()
        .captures_iter(contents)
        .filter_map(|caps| {
            let include = caps.get(2)?.as_str().trim();
            if include.is_empty() {
                return None;
            }
            match caps.get(1)?.as_str() {
                "ProjectReference" => Some(DependencyEntry::project(include)),
                _ => Some(DependencyEntry::package(include)),
            }
        })
        .collect()
}

/// Literal value of property `name`, last definition wins.
///
/// Returns `None` when the property is absent, empty, or uses an MSBuild
/// expression that would need evaluation.
#[must_use]
pub fn read_property(contents: &str, name: &str) -> Option<String> {
    let escaped = regex::escape(name);
    let pattern = Regex::new(&format!(r"<{escaped}(?:\s[^>]*)?>([^<]*)</{escaped}>")).ok()?;

    let value = pattern.captures_iter(contents).filter_map(|caps| caps.get(1)).last()?;
    let value = value.as_str().trim();

    if value.is_empty() || value.contains("$(") {
        tracing::debug!(target: "environment", "Ignoring property {name}='{value}'");
        return None;
    }
    Some(value.to_string())
}

/// Convert a path written in a project file to the platform's separator.
///
/// Project files written on Windows use backslashes, which would otherwise
/// become part of a single file name on Unix.
#[must_use]
pub fn to_native_path(declared: &str) -> PathBuf {
    if MAIN_SEPARATOR == '\\' {
        PathBuf::from(declared.replace('/', "\\"))
    } else {
        PathBuf::from(declared.replace('\\', "/"))
    }
}
