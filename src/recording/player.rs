//! Playback through the system audio player.
//!
//! The player runs as a child process so playback never blocks the UI loop.
//! Completion is observed by polling the child's exit status.

use super::binaries::{find_player, PlayerCommand};
use crate::flow::{ActivePlayback, PlaybackService, WhistleError};
use anyhow::anyhow;
use std::path::Path;
use std::process::{Child, Command, Stdio};

/// Starts the configured player for each playback.
pub struct SystemPlayer {
    /// "auto" or an explicit command line
    player: String,
}

impl SystemPlayer {
    pub fn new(player: String) -> Self {
        Self { player }
    }

    fn command(&self) -> Result<PlayerCommand, WhistleError> {
        find_player(&self.player).map_err(WhistleError::PlaybackFailed)
    }

    /// Plays `path` to the end, blocking the caller.
    pub fn play_to_end(&self, path: &Path) -> Result<(), WhistleError> {
        let command = self.command()?;
        let status = Command::new(&command.program)
            .args(&command.args)
            .arg(path)
            .status()
            .map_err(|e| WhistleError::PlaybackFailed(anyhow!("Failed to start player: {e}")))?;

        if status.success() {
            Ok(())
        } else {
            Err(WhistleError::PlaybackFailed(anyhow!(
                "Player exited with {status}"
            )))
        }
    }
}

impl PlaybackService for SystemPlayer {
    type Handle = PlayerProcess;

    fn play(&mut self, path: &Path) -> Result<PlayerProcess, WhistleError> {
        if !path.exists() {
            return Err(WhistleError::PlaybackFailed(anyhow!(
                "Whistle file not found: {}",
                path.display()
            )));
        }

        let command = self.command()?;
        let child = Command::new(&command.program)
            .args(&command.args)
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| {
                WhistleError::PlaybackFailed(anyhow!(
                    "Failed to start {}: {e}",
                    command.program.display()
                ))
            })?;

        tracing::info!("Playing {} with {}", path.display(), command.program.display());
        Ok(PlayerProcess { child: Some(child) })
    }
}

/// A running player. Dropping it kills the player.
pub struct PlayerProcess {
    child: Option<Child>,
}

impl ActivePlayback for PlayerProcess {
    fn poll(&mut self) -> Option<Result<(), WhistleError>> {
        let child = self.child.as_mut()?;
        let result = match child.try_wait() {
            Ok(None) => return None,
            Ok(Some(status)) if status.success() => Ok(()),
            Ok(Some(status)) => Err(WhistleError::PlaybackFailed(anyhow!(
                "Player exited with {status}"
            ))),
            Err(e) => Err(WhistleError::PlaybackFailed(anyhow!(
                "Failed to query player: {e}"
            ))),
        };
        self.child = None;
        Some(result)
    }
}

impl Drop for PlayerProcess {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(process: &mut PlayerProcess) -> Result<(), WhistleError> {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(result) = process.poll() {
                return result;
            }
            assert!(Instant::now() < deadline, "player did not exit");
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    #[test]
    fn test_successful_player_completes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whistle.m4a");
        std::fs::write(&path, b"audio").unwrap();

        let mut player = SystemPlayer::new("true".into());
        let mut process = player.play(&path).unwrap();
        assert!(wait_for(&mut process).is_ok());
        assert!(process.poll().is_none());
        assert_eq!(std::fs::read(&path).unwrap(), b"audio");
    }

    #[test]
    fn test_failing_player_reports_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("whistle.m4a");
        std::fs::write(&path, b"audio").unwrap();

        let mut player = SystemPlayer::new("false".into());
        let mut process = player.play(&path).unwrap();
        assert!(matches!(
            wait_for(&mut process),
            Err(WhistleError::PlaybackFailed(_))
        ));
    }

    #[test]
    fn test_missing_file_fails_before_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let mut player = SystemPlayer::new("true".into());
        assert!(player.play(&dir.path().join("missing.m4a")).is_err());
    }
}
