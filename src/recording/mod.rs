//! Host audio implementations of the whistle flow's collaborators.
//!
//! Provides the cpal capture service, the system-player playback service,
//! and the capability broker, plus device and tool discovery.

pub mod audio;
pub mod binaries;
pub mod broker;
pub mod device;
pub mod player;

pub use audio::CpalCapture;
pub use broker::CpalBroker;
pub use player::SystemPlayer;
