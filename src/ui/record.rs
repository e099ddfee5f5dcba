//! Recording screen: permission result, record button, playback, level meter.

use super::notice::render_notice;
use super::{render_chrome, BG, HELP_FG};
use crate::flow::{
    CaptureService, GateOutcome, PlaybackService, RecordedWhistle, RecordingSession,
    RecordingState,
};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{Paragraph, Sparkline, Wrap},
};
use std::time::Duration;

const RECORDING_BG: Color = Color::Rgb(153, 0, 0);
const RECORDED_BG: Color = Color::Rgb(0, 153, 0);

/// Level samples kept for the meter; wider terminals show the zero-padded tail.
const LEVEL_HISTORY_LEN: usize = 256;

#[derive(Debug, Clone, PartialEq)]
pub enum RecordAction {
    None,
    /// A take was accepted; go to genre selection.
    Next(RecordedWhistle),
    Back,
}

enum View<C: CaptureService, P: PlaybackService> {
    /// Waiting for the permission gate.
    Requesting,
    /// Access missing: static message, no controls.
    Unavailable(&'static str),
    Ready(RecordingSession<C, P>),
}

pub struct RecordScreen<C: CaptureService, P: PlaybackService> {
    view: View<C, P>,
    level_history: Vec<u64>,
}

impl<C: CaptureService, P: PlaybackService> RecordScreen<C, P> {
    /// Screen shown while the permission request is in flight.
    pub fn requesting() -> Self {
        Self {
            view: View::Requesting,
            level_history: vec![0; LEVEL_HISTORY_LEN],
        }
    }

    /// Applies the gate outcome. The session is only built when access is granted.
    pub fn resolve<F>(&mut self, outcome: GateOutcome, make_session: F)
    where
        F: FnOnce() -> RecordingSession<C, P>,
    {
        if !matches!(self.view, View::Requesting) {
            return;
        }
        self.view = match outcome {
            GateOutcome::Granted => View::Ready(make_session()),
            GateOutcome::Unavailable(message) => View::Unavailable(message),
        };
    }

    /// Session state; `Failed` once access was refused.
    pub fn state(&self) -> Option<RecordingState> {
        match &self.view {
            View::Requesting => None,
            View::Unavailable(_) => Some(RecordingState::Failed),
            View::Ready(session) => Some(session.state()),
        }
    }

    /// Advances the session and samples the input level for the meter.
    pub fn tick(&mut self) {
        let View::Ready(session) = &mut self.view else {
            return;
        };
        session.tick();

        if session.state() == RecordingState::Recording {
            self.level_history.push(u64::from(session.input_level()));
            if self.level_history.len() > LEVEL_HISTORY_LEN {
                self.level_history.remove(0);
            }
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> RecordAction {
        let session = match &mut self.view {
            View::Ready(session) => session,
            View::Requesting | View::Unavailable(_) => {
                return match key.code {
                    KeyCode::Esc | KeyCode::Char('q') => RecordAction::Back,
                    _ => RecordAction::None,
                };
            }
        };

        if session.notice().is_some() {
            session.dismiss_notice();
            return RecordAction::None;
        }

        match key.code {
            KeyCode::Char(' ') | KeyCode::Char('r') => {
                if session.state() != RecordingState::Recording {
                    self.level_history.fill(0);
                }
                session.toggle_record();
                RecordAction::None
            }
            KeyCode::Char('p') => {
                session.play();
                RecordAction::None
            }
            KeyCode::Char('n') | KeyCode::Enter => match session.proceed() {
                Some(whistle) => {
                    tracing::info!("Whistle accepted: {}", whistle.path().display());
                    RecordAction::Next(whistle)
                }
                None => RecordAction::None,
            },
            KeyCode::Esc | KeyCode::Char('q') => RecordAction::Back,
            _ => RecordAction::None,
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let state = self.state();
        let bg = match state {
            Some(RecordingState::Recording) => RECORDING_BG,
            Some(RecordingState::Recorded | RecordingState::Playing) => RECORDED_BG,
            Some(RecordingState::Idle | RecordingState::Failed) | None => BG,
        };

        let session = match &self.view {
            View::Requesting => {
                let content = render_chrome(frame, "Record your whistle", "esc back", bg);
                render_message(frame, content, "Requesting microphone access...");
                return;
            }
            View::Unavailable(message) => {
                let content = render_chrome(frame, "Record your whistle", "esc back", bg);
                render_message(frame, content, message);
                return;
            }
            View::Ready(session) => session,
        };

        let content = render_chrome(frame, "Record your whistle", &help_text(session), bg);

        let [meter_area, _, button_area, status_area] = Layout::vertical([
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(content);

        let width = meter_area.width as usize;
        let start = self.level_history.len().saturating_sub(width);
        let meter = Sparkline::default()
            .data(&self.level_history[start..])
            .max(100)
            .style(Style::default().bg(bg).fg(Color::Rgb(206, 224, 220)));
        frame.render_widget(meter, meter_area);

        let button = Paragraph::new(Line::from(format!("[ {} ]", session.record_label())).bold())
            .alignment(Alignment::Center);
        frame.render_widget(button, button_area);

        let status = match state {
            Some(RecordingState::Recording) => {
                let elapsed = session.elapsed().unwrap_or_default();
                format!("● {} / {}%", format_elapsed(elapsed), session.input_level())
            }
            Some(RecordingState::Playing) => "▶ Playing".to_string(),
            Some(RecordingState::Recorded) => {
                format!("Saved to {}", session.whistle_path().display())
            }
            Some(RecordingState::Idle | RecordingState::Failed) | None => String::new(),
        };
        let status = Paragraph::new(status).alignment(Alignment::Center);
        frame.render_widget(status, status_area);

        if let Some(notice) = session.notice() {
            render_notice(frame, frame.area(), &notice);
        }
    }
}

fn help_text<C: CaptureService, P: PlaybackService>(session: &RecordingSession<C, P>) -> String {
    let mut help = String::from("space record");
    if session.can_play() {
        help.push_str(", p play");
    }
    if session.can_proceed() {
        help.push_str(", enter next");
    }
    help.push_str(", esc back");
    help
}

fn render_message(frame: &mut Frame, area: Rect, message: &str) {
    let [_, message_area, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(3),
        Constraint::Fill(1),
    ])
    .areas(area);

    let paragraph = Paragraph::new(message)
        .alignment(Alignment::Center)
        .style(Style::default().fg(HELP_FG))
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, message_area);
}

/// Formats a duration as `m:ss`.
fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::permission::tests::ScriptedBroker;
    use crate::flow::permission::ACCESS_FAILED_MESSAGE;
    use crate::flow::session::tests::{FakeCapture, FakePlayback};
    use crate::flow::{MicrophoneAccess, PermissionGate, WHISTLE_FILE_NAME};
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    type TestScreen = RecordScreen<FakeCapture, FakePlayback>;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn granted_screen(dir: &tempfile::TempDir) -> TestScreen {
        let mut screen = TestScreen::requesting();
        let path = dir.path().join(WHISTLE_FILE_NAME);
        screen.resolve(GateOutcome::Granted, || {
            RecordingSession::new(FakeCapture::default(), FakePlayback::default(), path)
        });
        screen
    }

    fn screen_text(screen: &TestScreen) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| screen.render(frame)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|cell| cell.symbol())
            .collect()
    }

    #[tokio::test]
    async fn test_denial_never_builds_a_session() {
        let broker = Arc::new(ScriptedBroker::answering(MicrophoneAccess::Denied));
        let mut gate = PermissionGate::new(broker);
        let mut screen = TestScreen::requesting();
        assert_eq!(screen.state(), None);

        let outcome = gate.request().await;
        screen.resolve(outcome, || panic!("session built without access"));

        assert_eq!(screen.state(), Some(RecordingState::Failed));
        assert!(matches!(screen.view, View::Unavailable(_)));
        assert_eq!(screen.handle_key(press(KeyCode::Char(' '))), RecordAction::None);
        assert_eq!(screen.state(), Some(RecordingState::Failed));
        assert!(screen_text(&screen).contains("please ensure the app has access"));
        assert!(ACCESS_FAILED_MESSAGE.starts_with("Recording failed"));
    }

    #[test]
    fn test_grant_shows_idle_controls() {
        let dir = tempfile::tempdir().unwrap();
        let screen = granted_screen(&dir);
        assert_eq!(screen.state(), Some(RecordingState::Idle));
        let text = screen_text(&screen);
        assert!(text.contains("Tap to Record"));
        assert!(!text.contains("enter next"));
    }

    #[test]
    fn test_record_stop_then_next() {
        let dir = tempfile::tempdir().unwrap();
        let mut screen = granted_screen(&dir);

        assert_eq!(screen.handle_key(press(KeyCode::Enter)), RecordAction::None);
        screen.handle_key(press(KeyCode::Char(' ')));
        assert_eq!(screen.state(), Some(RecordingState::Recording));
        screen.tick();
        assert_eq!(screen.level_history.last(), Some(&42));
        assert!(screen_text(&screen).contains("Tap to Stop"));

        screen.handle_key(press(KeyCode::Char(' ')));
        assert_eq!(screen.state(), Some(RecordingState::Recorded));
        assert!(screen_text(&screen).contains("Tap to Re-record"));

        match screen.handle_key(press(KeyCode::Enter)) {
            RecordAction::Next(whistle) => {
                assert_eq!(whistle.path(), dir.path().join(WHISTLE_FILE_NAME))
            }
            other => panic!("expected Next, got {other:?}"),
        }
    }

    #[test]
    fn test_escape_goes_back() {
        let mut screen = TestScreen::requesting();
        assert_eq!(screen.handle_key(press(KeyCode::Esc)), RecordAction::Back);
    }

    #[test]
    fn test_format_elapsed() {
        assert_eq!(format_elapsed(Duration::from_secs(0)), "0:00");
        assert_eq!(format_elapsed(Duration::from_secs(75)), "1:15");
    }
}
