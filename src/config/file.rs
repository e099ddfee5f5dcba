//! Configuration file management for whistle.
//!
//! This module handles loading application configuration from TOML files.
//! Configuration is stored in the user's config directory.

use crate::flow::WHISTLE_FILE_NAME;
use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

/// Audio input configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// Audio device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `whistle list-devices`
    /// - device name from `whistle list-devices`
    #[serde(default = "default_device")]
    pub device: String,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: default_device(),
        }
    }
}

fn default_device() -> String {
    "default".to_string()
}

/// Playback configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaybackConfig {
    /// "auto" (afplay, ffplay, then mpv) or a command line; the file path is appended
    #[serde(default = "default_player")]
    pub player: String,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            player: default_player(),
        }
    }
}

fn default_player() -> String {
    "auto".to_string()
}

/// Where the whistle file lives.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory for whistle.m4a; empty or missing means ~/.local/share/whistle
    #[serde(default)]
    pub directory: Option<PathBuf>,
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WhistleConfig {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl WhistleConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = get_config_path()?;
        let config_content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read {}", config_path.display()))?;
        Self::parse(&config_content)
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> anyhow::Result<Self> {
        let config: WhistleConfig = toml::from_str(content)?;
        Ok(config)
    }

    /// Directory that holds the whistle file.
    ///
    /// # Errors
    /// - If no directory is configured and the home directory cannot be determined
    pub fn storage_dir(&self) -> anyhow::Result<PathBuf> {
        match &self.storage.directory {
            Some(dir) if !dir.as_os_str().is_empty() => Ok(dir.clone()),
            _ => Ok(dirs::home_dir()
                .ok_or_else(|| anyhow!("Could not determine home directory"))?
                .join(".local")
                .join("share")
                .join("whistle")),
        }
    }

    /// Fixed path of the whistle file, overwritten by every take.
    pub fn whistle_path(&self) -> anyhow::Result<PathBuf> {
        Ok(self.storage_dir()?.join(WHISTLE_FILE_NAME))
    }
}

/// Retrieves the path to the config file, creating its directory if needed.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the config directory cannot be created
pub fn get_config_path() -> anyhow::Result<PathBuf> {
    let config_dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("whistle");

    fs::create_dir_all(&config_dir)
        .map_err(|e| anyhow!("Failed to create config directory: {e}"))?;

    Ok(config_dir.join("whistle.toml"))
}
