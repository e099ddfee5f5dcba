//! Failure kinds of the whistle flow and the notices they turn into.
//!
//! None of these errors leave the screen that produced them: each one is
//! converted into a [`Notice`] (or a static message on the recording screen)
//! and logged.

use thiserror::Error;

/// Errors raised by the permission, capture, and playback collaborators.
#[derive(Debug, Error)]
pub enum WhistleError {
    /// The capability broker refused microphone access.
    #[error("Microphone access was denied")]
    PermissionDenied,
    /// The audio session could not be activated or the device could not be queried.
    #[error("Audio session setup failed: {0}")]
    SessionSetupFailed(#[source] anyhow::Error),
    /// Opening, running, or finalizing a capture failed.
    #[error("Recording failed: {0}")]
    CaptureFailed(#[source] anyhow::Error),
    /// The stored whistle could not be played.
    #[error("Playback failed: {0}")]
    PlaybackFailed(#[source] anyhow::Error),
}

/// A dismissible message shown over the current screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Notice {
    pub title: &'static str,
    pub message: &'static str,
}

impl Notice {
    pub const RECORD_FAILED: Notice = Notice {
        title: "Record failed",
        message: "There was a problem recording your whistle; please try again.",
    };

    pub const PLAYBACK_FAILED: Notice = Notice {
        title: "Playback failed",
        message: "There was a problem playing your whistle; please try re-recording.",
    };
}

impl From<&WhistleError> for Notice {
    fn from(error: &WhistleError) -> Self {
        match error {
            WhistleError::PlaybackFailed(_) => Notice::PLAYBACK_FAILED,
            _ => Notice::RECORD_FAILED,
        }
    }
}
