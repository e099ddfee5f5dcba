//! Plays the stored whistle with the configured player.

use crate::config::WhistleConfig;
use crate::recording::SystemPlayer;

/// Plays the whistle file to the end.
///
/// # Errors
/// - If the configuration cannot be loaded
/// - If no whistle has been recorded yet
/// - If the player cannot be found or fails
pub fn handle_play() -> anyhow::Result<()> {
    let config = WhistleConfig::load()?;
    let whistle_path = config.whistle_path()?;

    if !whistle_path.exists() {
        return Err(anyhow::anyhow!(
            "No whistle recorded yet: {} does not exist. Run 'whistle' to record one.",
            whistle_path.display()
        ));
    }

    tracing::info!("Playing {}", whistle_path.display());
    SystemPlayer::new(config.playback.player)
        .play_to_end(&whistle_path)
        .map_err(|e| {
            tracing::error!("{}", e);
            anyhow::Error::new(e)
        })
}
