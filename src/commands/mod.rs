//! Command handlers for whistle.
//!
//! # Commands
//! - `record`: the whistle flow (home, record, genre, comments)
//! - `play`: play the stored whistle
//! - `genres`: print the genre list
//! - `config`: open the configuration file in the user's editor
//! - `list_devices`: list available audio input devices
//! - `logs`: display recent log entries

pub mod config;
pub mod genres;
pub mod list_devices;
pub mod logs;
pub mod play;
pub mod record;

pub use config::handle_config;
pub use genres::handle_genres;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use play::handle_play;
pub use record::handle_record;
