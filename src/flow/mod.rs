//! The whistle flow: permission, recording, genre, comments.
//!
//! Everything here is independent of the terminal and of the host audio
//! stack. Screens drive these types; the `recording` module supplies the
//! real capture, playback, and capability implementations.

pub mod comments;
pub mod error;
pub mod genre;
pub mod payload;
pub mod permission;
pub mod session;

pub use comments::CommentsEntry;
pub use error::{Notice, WhistleError};
pub use genre::{Genre, GenrePicker};
pub use payload::{GenreChosen, RecordedWhistle, Submission};
pub use permission::{CapabilityBroker, GateOutcome, MicrophoneAccess, PermissionGate};
pub use session::{
    ActiveCapture, ActivePlayback, CaptureService, CaptureSettings, PlaybackService,
    RecordingSession, RecordingState, WHISTLE_FILE_NAME,
};
