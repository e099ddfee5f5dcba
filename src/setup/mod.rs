//! First-run setup.
//!
//! Writes the default configuration file, stamped with the running version,
//! when it is missing or older than the binary.

pub mod version;

use std::path::Path;

/// Embedded default configuration template.
const DEFAULT_CONFIG: &str = include_str!("../../environments/whistle.toml");

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Writes the default config file to `config_path`.
///
/// # Errors
/// Returns an error if the directory or file cannot be written.
pub fn run_setup(config_path: &Path) -> anyhow::Result<()> {
    if let Some(config_dir) = config_path.parent() {
        std::fs::create_dir_all(config_dir)?;
    }

    std::fs::write(config_path, default_config_contents())?;
    tracing::info!("Default configuration written to {}", config_path.display());
    Ok(())
}

/// Default configuration with the version line first.
fn default_config_contents() -> String {
    format!("config_version = \"{CURRENT_VERSION}\"\n{DEFAULT_CONFIG}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_writes_versioned_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whistle").join("whistle.toml");

        run_setup(&path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with(&format!("config_version = \"{CURRENT_VERSION}\"")));
        assert_eq!(version::check_setup_needed(&path).unwrap(), None);
    }
}
