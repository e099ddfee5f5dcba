//! Configuration management for whistle.
//!
//! Loads the TOML configuration from `~/.config/whistle/whistle.toml` and
//! resolves where the whistle file is stored.

pub mod file;

pub use file::{get_config_path, WhistleConfig};
