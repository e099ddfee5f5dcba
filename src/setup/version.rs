//! Config version stamping.
//!
//! The first line of the config file records the version that wrote it. A
//! missing file triggers first-run setup; an older stamp is migrated.

use anyhow::anyhow;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::path::Path;

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// What startup has to do with the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupNeeded {
    /// No config file yet.
    Missing,
    /// Written by an older version (or unstamped); holds the old version.
    Outdated(String),
}

/// Represents a semantic version (major.minor.patch)
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd)]
struct SemanticVersion {
    major: u32,
    minor: u32,
    patch: u32,
}

impl SemanticVersion {
    /// Parse a version string like "0.1.0" into a SemanticVersion
    fn parse(version_str: &str) -> anyhow::Result<Self> {
        let parts: Vec<&str> = version_str.trim().split('.').collect();
        let [major, minor, patch] = parts.as_slice() else {
            return Err(anyhow!(
                "Invalid version format: '{}'. Expected 'major.minor.patch'",
                version_str
            ));
        };

        let number = |part: &str, label: &str| {
            part.parse::<u32>()
                .map_err(|_| anyhow!("Invalid {label} version: '{part}'"))
        };

        Ok(SemanticVersion {
            major: number(*major, "major")?,
            minor: number(*minor, "minor")?,
            patch: number(*patch, "patch")?,
        })
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Reads the `config_version = "X.Y.Z"` stamp from the first line of `content`.
fn read_config_version(content: &str) -> anyhow::Result<Option<String>> {
    let Some(first_line) = content.lines().next() else {
        return Ok(None);
    };

    let regex = Regex::new(r#"^\s*config_version\s*=\s*"([^"]+)""#)?;
    Ok(regex
        .captures(first_line)
        .map(|caps| caps[1].to_string()))
}

/// Determines whether the config file needs setup or migration.
///
/// Returns `None` when the file exists and is stamped with this version (or
/// a newer one, which is logged and tolerated).
pub fn check_setup_needed(config_path: &Path) -> anyhow::Result<Option<SetupNeeded>> {
    if !config_path.exists() {
        return Ok(Some(SetupNeeded::Missing));
    }

    let content = std::fs::read_to_string(config_path)?;
    let Some(config_version) = read_config_version(&content)? else {
        return Ok(Some(SetupNeeded::Outdated(
            "unknown (unversioned config)".to_string(),
        )));
    };

    let config_parsed = SemanticVersion::parse(&config_version)?;
    let current_parsed = SemanticVersion::parse(CURRENT_VERSION)?;

    match config_parsed.cmp(&current_parsed) {
        Ordering::Less => Ok(Some(SetupNeeded::Outdated(config_version))),
        Ordering::Equal => Ok(None),
        Ordering::Greater => {
            tracing::warn!(
                "Config version {} is newer than app version {}",
                config_parsed,
                CURRENT_VERSION
            );
            Ok(None)
        }
    }
}

/// Rewrites the version stamp as the first line, keeping every other line.
pub fn update_config_version(config_path: &Path) -> anyhow::Result<()> {
    let content = std::fs::read_to_string(config_path)?;

    let lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().starts_with("config_version"))
        .collect();

    let version_line = format!(r#"config_version = "{}""#, CURRENT_VERSION);
    let new_content = if lines.is_empty() {
        version_line
    } else {
        format!("{}\n{}", version_line, lines.join("\n"))
    };

    std::fs::write(config_path, new_content)?;
    Ok(())
}
