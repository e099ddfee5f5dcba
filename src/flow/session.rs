//! Record / stop / play / re-record state machine for the whistle file.
//!
//! The session owns the capture and playback collaborators and the single
//! whistle path. The open capture handle lives inside the `Recording` phase
//! and the open playback handle inside the `Playing` phase, so no other
//! phase can hold one. Completion signals from the device and the player are
//! picked up by [`RecordingSession::tick`], which the UI loop calls on every
//! frame.

use super::error::{Notice, WhistleError};
use super::payload::RecordedWhistle;
use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Fixed capture format: AAC in an M4A container, mono, low sample rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    /// ffmpeg audio codec name.
    pub codec: &'static str,
    pub sample_rate: u32,
    pub channels: u16,
    /// Encoder bitrate; high quality for a 12 kHz mono stream.
    pub bitrate_kbps: u32,
}

/// The one capture configuration whistles are recorded with.
pub const WHISTLE_CAPTURE: CaptureSettings = CaptureSettings {
    codec: "aac",
    sample_rate: 12_000,
    channels: 1,
    bitrate_kbps: 64,
};

/// File name of the whistle inside the storage directory.
pub const WHISTLE_FILE_NAME: &str = "whistle.m4a";

/// Starts captures.
pub trait CaptureService {
    type Handle: ActiveCapture;

    /// Opens a capture that will be written to `path` when finished.
    fn start(&mut self, path: &Path, settings: &CaptureSettings)
        -> Result<Self::Handle, WhistleError>;
}

/// An open capture.
pub trait ActiveCapture {
    /// Whether the device reported a failure since the capture started.
    fn interrupted(&self) -> bool;

    /// Current input level, 0-100.
    fn level(&self) -> u8 {
        0
    }

    /// Stops the capture and writes the file.
    fn finish(self) -> Result<(), WhistleError>;
}

/// Starts playback of a stored file.
pub trait PlaybackService {
    type Handle: ActivePlayback;

    fn play(&mut self, path: &Path) -> Result<Self::Handle, WhistleError>;
}

/// A running playback. Dropping it stops playback.
pub trait ActivePlayback {
    /// `None` while playing, then the final result once.
    fn poll(&mut self) -> Option<Result<(), WhistleError>>;
}

/// Observable state of the recording screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingState {
    Idle,
    Recording,
    Recorded,
    Playing,
    /// The permission gate did not grant access; no session exists.
    Failed,
}

enum Phase<H, Q> {
    Idle,
    Recording { handle: H, started_at: Instant },
    /// `recorded_at` is when the take was finished.
    Recorded { recorded_at: DateTime<Local> },
    Playing { handle: Q, recorded_at: DateTime<Local> },
}

/// State machine for one whistle take at a time.
pub struct RecordingSession<C: CaptureService, P: PlaybackService> {
    capture: C,
    playback: P,
    path: PathBuf,
    settings: CaptureSettings,
    phase: Phase<C::Handle, P::Handle>,
    notice: Option<Notice>,
}

impl<C: CaptureService, P: PlaybackService> RecordingSession<C, P> {
    /// Creates an idle session writing to `path`.
    pub fn new(capture: C, playback: P, path: PathBuf) -> Self {
        Self {
            capture,
            playback,
            path,
            settings: WHISTLE_CAPTURE,
            phase: Phase::Idle,
            notice: None,
        }
    }

    pub fn state(&self) -> RecordingState {
        match self.phase {
            Phase::Idle => RecordingState::Idle,
            Phase::Recording { .. } => RecordingState::Recording,
            Phase::Recorded { .. } => RecordingState::Recorded,
            Phase::Playing { .. } => RecordingState::Playing,
        }
    }

    pub fn whistle_path(&self) -> &Path {
        &self.path
    }

    /// Label of the record button.
    pub fn record_label(&self) -> &'static str {
        match self.phase {
            Phase::Idle => "Tap to Record",
            Phase::Recording { .. } => "Tap to Stop",
            Phase::Recorded { .. } | Phase::Playing { .. } => "Tap to Re-record",
        }
    }

    /// Whether the play action is shown.
    pub fn can_play(&self) -> bool {
        matches!(self.phase, Phase::Recorded { .. } | Phase::Playing { .. })
    }

    /// Whether the forward ("Next") action is shown.
    pub fn can_proceed(&self) -> bool {
        matches!(self.phase, Phase::Recorded { .. } | Phase::Playing { .. })
    }

    /// Live input level while recording, 0 otherwise.
    pub fn input_level(&self) -> u8 {
        match &self.phase {
            Phase::Recording { handle, .. } => handle.level(),
            _ => 0,
        }
    }

    /// Elapsed time of the take in progress.
    pub fn elapsed(&self) -> Option<Duration> {
        match &self.phase {
            Phase::Recording { started_at, .. } => Some(started_at.elapsed()),
            _ => None,
        }
    }

    pub fn notice(&self) -> Option<Notice> {
        self.notice
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Record button: starts a take, or stops the one in progress.
    pub fn toggle_record(&mut self) {
        if matches!(self.phase, Phase::Recording { .. }) {
            self.stop();
        } else {
            self.start();
        }
    }

    /// Starts a new take, replacing any previous one.
    ///
    /// Ignored while already recording. Playback in progress is stopped.
    pub fn start(&mut self) {
        if matches!(self.phase, Phase::Recording { .. }) {
            return;
        }
        // Dropping a playback handle stops the player.
        self.phase = Phase::Idle;

        tracing::info!("Starting whistle capture: {}", self.path.display());
        match self.capture.start(&self.path, &self.settings) {
            Ok(handle) => {
                self.phase = Phase::Recording {
                    handle,
                    started_at: Instant::now(),
                };
            }
            Err(e) => self.fail_capture(e),
        }
    }

    /// Stops the take in progress and finalizes the file.
    pub fn stop(&mut self) {
        let handle = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Recording { handle, .. } => handle,
            other => {
                self.phase = other;
                return;
            }
        };

        match handle.finish() {
            Ok(()) => {
                tracing::info!("Whistle recorded: {}", self.path.display());
                self.phase = Phase::Recorded {
                    recorded_at: Local::now(),
                };
            }
            Err(e) => self.fail_capture(e),
        }
    }

    /// Plays the recorded take without blocking.
    pub fn play(&mut self) {
        let Phase::Recorded { recorded_at } = self.phase else {
            return;
        };

        match self.playback.play(&self.path) {
            Ok(handle) => {
                tracing::debug!("Playback started");
                self.phase = Phase::Playing {
                    handle,
                    recorded_at,
                };
            }
            Err(e) => self.fail_playback(e),
        }
    }

    /// Picks up asynchronous completions from the device and the player.
    pub fn tick(&mut self) {
        match &mut self.phase {
            Phase::Recording { handle, .. } if handle.interrupted() => {
                tracing::warn!("Capture interrupted by the audio device");
                self.stop_failed();
            }
            Phase::Playing {
                handle,
                recorded_at,
            } => {
                let recorded_at = *recorded_at;
                match handle.poll() {
                    None => {}
                    Some(Ok(())) => {
                        tracing::debug!("Playback finished");
                        self.phase = Phase::Recorded { recorded_at };
                    }
                    Some(Err(e)) => {
                        self.phase = Phase::Recorded { recorded_at };
                        self.fail_playback(e);
                    }
                }
            }
            _ => {}
        }
    }

    /// Hands the recorded take to the next screen.
    ///
    /// Returns `None` unless a take is recorded; stops playback in progress.
    /// The whistle carries the time the take was finished.
    pub fn proceed(&mut self) -> Option<RecordedWhistle> {
        let recorded_at = match std::mem::replace(&mut self.phase, Phase::Idle) {
            Phase::Recorded { recorded_at } | Phase::Playing { recorded_at, .. } => recorded_at,
            other => {
                self.phase = other;
                return None;
            }
        };
        self.phase = Phase::Recorded { recorded_at };
        Some(RecordedWhistle::new(self.path.clone(), recorded_at))
    }

    /// Closes the handle of a take the device gave up on.
    fn stop_failed(&mut self) {
        if let Phase::Recording { handle, .. } = std::mem::replace(&mut self.phase, Phase::Idle) {
            // The take is unusable whatever finishing reports.
            let result = handle.finish();
            let error = match result {
                Ok(()) => WhistleError::CaptureFailed(anyhow::anyhow!("Audio device stopped")),
                Err(e) => e,
            };
            self.fail_capture(error);
        }
    }

    fn fail_capture(&mut self, error: WhistleError) {
        tracing::error!("{}", error);
        self.phase = Phase::Idle;
        if self.path.exists() {
            if let Err(e) = std::fs::remove_file(&self.path) {
                tracing::warn!("Failed to remove unusable whistle file: {}", e);
            }
        }
        self.notice = Some(Notice::from(&error));
    }

    fn fail_playback(&mut self, error: WhistleError) {
        tracing::error!("{}", error);
        self.notice = Some(Notice::from(&error));
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::fs;
    use std::rc::Rc;

    /// Capture fake writing a numbered take to the target path.
    #[derive(Default)]
    pub(crate) struct FakeCapture {
        takes: Rc<Cell<u32>>,
        fail_start: bool,
        fail_finish: Rc<Cell<bool>>,
        interrupt: Rc<Cell<bool>>,
    }

    pub(crate) struct FakeTake {
        path: PathBuf,
        number: u32,
        fail_finish: Rc<Cell<bool>>,
        interrupt: Rc<Cell<bool>>,
    }

    impl CaptureService for FakeCapture {
        type Handle = FakeTake;

        fn start(
            &mut self,
            path: &Path,
            settings: &CaptureSettings,
        ) -> Result<FakeTake, WhistleError> {
            assert_eq!(*settings, WHISTLE_CAPTURE);
            if self.fail_start {
                return Err(WhistleError::CaptureFailed(anyhow::anyhow!("busy")));
            }
            self.takes.set(self.takes.get() + 1);
            Ok(FakeTake {
                path: path.to_path_buf(),
                number: self.takes.get(),
                fail_finish: Rc::clone(&self.fail_finish),
                interrupt: Rc::clone(&self.interrupt),
            })
        }
    }

    impl ActiveCapture for FakeTake {
        fn interrupted(&self) -> bool {
            self.interrupt.get()
        }

        fn level(&self) -> u8 {
            42
        }

        fn finish(self) -> Result<(), WhistleError> {
            if self.fail_finish.get() {
                // A half-written file, as a broken encoder would leave it.
                fs::write(&self.path, b"partial").unwrap();
                return Err(WhistleError::CaptureFailed(anyhow::anyhow!("encoder")));
            }
            fs::write(&self.path, format!("take {}", self.number)).unwrap();
            Ok(())
        }
    }

    /// Playback fake with a scripted result, recording what it played.
    #[derive(Default)]
    pub(crate) struct FakePlayback {
        fail_start: bool,
        outcome: Rc<RefCell<Option<Result<(), String>>>>,
        played: Rc<RefCell<Vec<String>>>,
    }

    pub(crate) struct FakePlay {
        outcome: Rc<RefCell<Option<Result<(), String>>>>,
    }

    impl PlaybackService for FakePlayback {
        type Handle = FakePlay;

        fn play(&mut self, path: &Path) -> Result<FakePlay, WhistleError> {
            if self.fail_start {
                return Err(WhistleError::PlaybackFailed(anyhow::anyhow!("no player")));
            }
            self.played
                .borrow_mut()
                .push(fs::read_to_string(path).unwrap());
            Ok(FakePlay {
                outcome: Rc::clone(&self.outcome),
            })
        }
    }

    impl ActivePlayback for FakePlay {
        fn poll(&mut self) -> Option<Result<(), WhistleError>> {
            self.outcome
                .borrow_mut()
                .take()
                .map(|r| r.map_err(|e| WhistleError::PlaybackFailed(anyhow::anyhow!(e))))
        }
    }

    fn session_in(
        dir: &tempfile::TempDir,
    ) -> RecordingSession<FakeCapture, FakePlayback> {
        RecordingSession::new(
            FakeCapture::default(),
            FakePlayback::default(),
            dir.path().join(WHISTLE_FILE_NAME),
        )
    }

    #[test]
    fn test_initial_state_is_idle() {
        let dir = tempfile::tempdir().unwrap();
        let session = session_in(&dir);
        assert_eq!(session.state(), RecordingState::Idle);
        assert_eq!(session.record_label(), "Tap to Record");
        assert!(!session.can_play());
        assert!(!session.can_proceed());
    }

    #[test]
    fn test_record_tap_toggles_start_and_stop() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        session.toggle_record();
        assert_eq!(session.state(), RecordingState::Recording);
        assert_eq!(session.record_label(), "Tap to Stop");
        assert_eq!(session.input_level(), 42);
        assert!(session.elapsed().is_some());
        assert!(!session.can_proceed());

        session.toggle_record();
        assert_eq!(session.state(), RecordingState::Recorded);
        assert_eq!(session.record_label(), "Tap to Re-record");
        assert!(session.can_play());
        assert!(session.can_proceed());
        assert_eq!(session.input_level(), 0);
    }

    #[test]
    fn test_rerecording_keeps_only_latest_take() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        session.start();
        session.stop();
        session.start();
        assert!(!session.can_play());
        session.stop();

        let files: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(fs::read_to_string(session.whistle_path()).unwrap(), "take 2");
    }

    #[test]
    fn test_failed_stop_returns_to_idle_without_forward_action() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.capture.fail_finish.set(true);

        session.start();
        session.stop();

        assert_eq!(session.state(), RecordingState::Idle);
        assert!(!session.can_proceed());
        assert!(session.proceed().is_none());
        assert_eq!(session.notice(), Some(Notice::RECORD_FAILED));
        assert!(!session.whistle_path().exists());

        session.dismiss_notice();
        assert_eq!(session.notice(), None);
    }

    #[test]
    fn test_failed_rerecord_discards_previous_take() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        session.start();
        session.stop();
        session.capture.fail_finish.set(true);
        session.start();
        session.stop();

        assert_eq!(session.state(), RecordingState::Idle);
        assert!(!session.can_proceed());
        assert!(!session.whistle_path().exists());
    }

    #[test]
    fn test_capture_that_cannot_open_fails_to_idle() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.capture.fail_start = true;

        session.toggle_record();
        assert_eq!(session.state(), RecordingState::Idle);
        assert_eq!(session.record_label(), "Tap to Record");
        assert_eq!(session.notice(), Some(Notice::RECORD_FAILED));
    }

    #[test]
    fn test_device_interruption_is_a_failed_stop() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);

        session.start();
        session.capture.interrupt.set(true);
        session.tick();

        assert_eq!(session.state(), RecordingState::Idle);
        assert!(!session.can_proceed());
        assert_eq!(session.notice(), Some(Notice::RECORD_FAILED));
        assert!(!session.whistle_path().exists());
    }

    #[test]
    fn test_playback_returns_to_recorded_and_leaves_file_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.start();
        session.stop();

        session.play();
        assert_eq!(session.state(), RecordingState::Playing);
        session.tick();
        assert_eq!(session.state(), RecordingState::Playing);

        *session.playback.outcome.borrow_mut() = Some(Ok(()));
        session.tick();
        assert_eq!(session.state(), RecordingState::Recorded);
        assert_eq!(session.notice(), None);
        assert_eq!(session.playback.played.borrow().as_slice(), ["take 1"]);
        assert_eq!(fs::read_to_string(session.whistle_path()).unwrap(), "take 1");
    }

    #[test]
    fn test_playback_failure_keeps_recording() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.start();
        session.stop();

        session.play();
        *session.playback.outcome.borrow_mut() = Some(Err("decoder".into()));
        session.tick();

        assert_eq!(session.state(), RecordingState::Recorded);
        assert_eq!(session.notice(), Some(Notice::PLAYBACK_FAILED));
        assert_eq!(fs::read_to_string(session.whistle_path()).unwrap(), "take 1");
    }

    #[test]
    fn test_player_that_cannot_start_keeps_recording() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.playback.fail_start = true;
        session.start();
        session.stop();

        session.play();
        assert_eq!(session.state(), RecordingState::Recorded);
        assert_eq!(session.notice(), Some(Notice::PLAYBACK_FAILED));
        assert!(session.can_proceed());
    }

    #[test]
    fn test_play_is_ignored_before_a_take_exists() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.play();
        assert_eq!(session.state(), RecordingState::Idle);
        assert!(session.playback.played.borrow().is_empty());
    }

    #[test]
    fn test_rerecord_while_playing_stops_playback() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.start();
        session.stop();
        session.play();

        session.toggle_record();
        assert_eq!(session.state(), RecordingState::Recording);
        session.toggle_record();
        assert_eq!(fs::read_to_string(session.whistle_path()).unwrap(), "take 2");
    }

    #[test]
    fn test_proceed_hands_over_the_whistle_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.start();
        session.stop();
        session.play();

        let whistle = session.proceed().unwrap();
        assert_eq!(whistle.path(), session.whistle_path());
        assert_eq!(session.state(), RecordingState::Recorded);
    }

    #[test]
    fn test_proceed_keeps_the_time_the_take_finished() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session_in(&dir);
        session.start();
        let before_stop = Local::now();
        session.stop();
        let after_stop = Local::now();

        std::thread::sleep(Duration::from_millis(20));
        let first = session.proceed().unwrap();
        session.play();
        std::thread::sleep(Duration::from_millis(20));
        let second = session.proceed().unwrap();

        assert_eq!(first.recorded_at(), second.recorded_at());
        assert!(first.recorded_at() >= before_stop);
        assert!(first.recorded_at() <= after_stop);
    }
}
