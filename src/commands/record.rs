//! The whistle flow: home, record, genre, comments.
//!
//! Screens live on a navigation stack. Forward actions push the next screen
//! with its typed payload; back pops it, so returning to a screen finds it as
//! it was left. A completed flow hands its [`Submission`] to stdout or a file.

use crate::config::WhistleConfig;
use crate::flow::{PermissionGate, RecordingSession, Submission};
use crate::recording::{CpalBroker, CpalCapture, SystemPlayer};
use crate::ui::{
    CommentsAction, CommentsScreen, ErrorScreen, GenreAction, GenreScreen, HomeAction,
    HomeScreen, RecordAction, RecordScreen, WhistleTui,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

enum Screen {
    Home(HomeScreen),
    Record {
        screen: Box<RecordScreen<CpalCapture, SystemPlayer>>,
        gate: PermissionGate<CpalBroker>,
    },
    Genre(GenreScreen),
    Comments(CommentsScreen),
}

enum Transition {
    Stay,
    Pop,
    OpenRecord,
    Push(Screen),
    Finish(Submission),
    Cancel,
}

/// Runs the flow and writes the submission, if any.
///
/// # Errors
/// - If the terminal cannot be set up or drawn
/// - If the submission cannot be written
pub async fn handle_record(output: Option<String>) -> anyhow::Result<()> {
    tracing::info!("=== whistle started ===");

    let mut tui = WhistleTui::new()?;

    let config = match WhistleConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("Failed to load configuration: {err:#}");
            let message = format!(
                "Configuration Error:\n\n{err:#}\n\nPlease check your ~/.config/whistle/whistle.toml file and try again."
            );
            ErrorScreen::new(message).show(&mut tui)?;
            tui.cleanup()?;
            return Err(anyhow::anyhow!("Configuration error: {err}"));
        }
    };

    let whistle_path = match prepare_storage(&config) {
        Ok(path) => path,
        Err(err) => {
            tracing::error!("Failed to prepare storage: {err:#}");
            ErrorScreen::new(format!("Storage Error:\n\n{err:#}")).show(&mut tui)?;
            tui.cleanup()?;
            return Err(err);
        }
    };

    tracing::info!(
        "Configuration loaded: device={}, player={}, whistle={}",
        config.audio.device,
        config.playback.player,
        whistle_path.display()
    );

    let terminate = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&terminate))
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let result = run_flow(&mut tui, &config, whistle_path, &terminate).await;
    tui.cleanup()?;

    match result? {
        Some(submission) => write_submission(&submission, output.as_deref())?,
        None => tracing::info!("Flow cancelled, nothing submitted"),
    }

    tracing::info!("=== whistle exited ===");
    Ok(())
}

async fn run_flow(
    tui: &mut WhistleTui,
    config: &WhistleConfig,
    whistle_path: PathBuf,
    terminate: &AtomicBool,
) -> anyhow::Result<Option<Submission>> {
    let mut stack = vec![Screen::Home(HomeScreen)];

    loop {
        if terminate.load(Ordering::Relaxed) {
            tracing::info!("Received SIGTERM, leaving the flow");
            release_all(&stack);
            return Ok(None);
        }

        if let Some(Screen::Record { screen, .. }) = stack.last_mut() {
            screen.tick();
        }

        tui.draw(|frame| match stack.last_mut() {
            Some(Screen::Home(home)) => home.render(frame),
            Some(Screen::Record { screen, .. }) => screen.render(frame),
            Some(Screen::Genre(genre)) => genre.render(frame),
            Some(Screen::Comments(comments)) => comments.render(frame),
            None => {}
        })?;

        let Some(key) = next_key()? else {
            continue;
        };

        let transition = if is_interrupt(&key) {
            Transition::Cancel
        } else {
            route_key(&mut stack, key)
        };

        match transition {
            Transition::Stay => {}
            Transition::Pop => {
                if let Some(Screen::Record { gate, .. }) = stack.pop() {
                    gate.release();
                }
                if stack.is_empty() {
                    return Ok(None);
                }
            }
            Transition::OpenRecord => {
                let screen = open_record_screen(tui, config, &whistle_path).await?;
                stack.push(screen);
            }
            Transition::Push(screen) => stack.push(screen),
            Transition::Finish(submission) => {
                release_all(&stack);
                return Ok(Some(submission));
            }
            Transition::Cancel => {
                tracing::debug!("Ctrl+C pressed: cancelling");
                release_all(&stack);
                return Ok(None);
            }
        }
    }
}

/// Hands a key to the top screen and turns its action into a stack change.
fn route_key(stack: &mut [Screen], key: KeyEvent) -> Transition {
    match stack.last_mut() {
        Some(Screen::Home(home)) => match home.handle_key(key) {
            HomeAction::None => Transition::Stay,
            HomeAction::AddWhistle => Transition::OpenRecord,
            HomeAction::Quit => Transition::Pop,
        },
        Some(Screen::Record { screen, .. }) => match screen.handle_key(key) {
            RecordAction::None => Transition::Stay,
            RecordAction::Next(whistle) => Transition::Push(Screen::Genre(GenreScreen::new(whistle))),
            RecordAction::Back => Transition::Pop,
        },
        Some(Screen::Genre(genre)) => match genre.handle_key(key) {
            GenreAction::None => Transition::Stay,
            GenreAction::Chosen(chosen) => {
                Transition::Push(Screen::Comments(CommentsScreen::new(chosen)))
            }
            GenreAction::Back => Transition::Pop,
        },
        Some(Screen::Comments(comments)) => match comments.handle_key(key) {
            CommentsAction::None => Transition::Stay,
            CommentsAction::Submit(submission) => Transition::Finish(submission),
            CommentsAction::Back => Transition::Pop,
        },
        None => Transition::Pop,
    }
}

/// Shows the record screen, then runs the permission gate before any control appears.
async fn open_record_screen(
    tui: &mut WhistleTui,
    config: &WhistleConfig,
    whistle_path: &Path,
) -> anyhow::Result<Screen> {
    let mut screen = Box::new(RecordScreen::requesting());
    tui.draw(|frame| screen.render(frame))?;

    let broker = Arc::new(CpalBroker::new(config.audio.device.clone()));
    let mut gate = PermissionGate::new(broker);
    let outcome = gate.request().await;

    screen.resolve(outcome, || {
        RecordingSession::new(
            CpalCapture::new(config.audio.device.clone()),
            SystemPlayer::new(config.playback.player.clone()),
            whistle_path.to_path_buf(),
        )
    });

    Ok(Screen::Record { screen, gate })
}

/// Waits up to one poll interval for a key press.
fn next_key() -> anyhow::Result<Option<KeyEvent>> {
    if !event::poll(POLL_INTERVAL)? {
        return Ok(None);
    }
    match event::read()? {
        Event::Key(key) if key.kind == KeyEventKind::Press => Ok(Some(key)),
        _ => Ok(None),
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL)
}

fn release_all(stack: &[Screen]) {
    for screen in stack {
        if let Screen::Record { gate, .. } = screen {
            gate.release();
        }
    }
}

/// Creates the storage directory and returns the whistle path inside it.
fn prepare_storage(config: &WhistleConfig) -> anyhow::Result<PathBuf> {
    let storage_dir = config.storage_dir()?;
    std::fs::create_dir_all(&storage_dir).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create storage directory {}: {e}",
            storage_dir.display()
        )
    })?;
    config.whistle_path()
}

/// Serializes the submission as TOML to `output_file`, or stdout when `None`.
fn write_submission(submission: &Submission, output_file: Option<&str>) -> anyhow::Result<()> {
    let rendered = toml::to_string(submission)
        .map_err(|e| anyhow::anyhow!("Failed to serialize submission: {e}"))?;

    if let Some(file_path) = output_file {
        std::fs::write(file_path, &rendered)
            .map_err(|e| anyhow::anyhow!("Failed to write to file '{file_path}': {e}"))?;
        tracing::debug!("Submission written to file: {file_path}");
    } else {
        print!("{rendered}");
        tracing::debug!("Submission printed to stdout");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::{Genre, RecordedWhistle};
    use chrono::Local;

    #[test]
    fn test_submission_is_written_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("submission.toml");
        let submission = RecordedWhistle::new(dir.path().join("whistle.m4a"), Local::now())
            .with_genre(Genre::Soul)
            .with_comments("sounds like a sea shanty".to_string());

        write_submission(&submission, Some(output.to_str().unwrap())).unwrap();

        let written = std::fs::read_to_string(&output).unwrap();
        assert!(written.contains("genre = \"Soul\""));
        assert!(written.contains("comments = \"sounds like a sea shanty\""));
    }

    #[test]
    fn test_genre_screen_routes_back_and_forward() {
        let whistle = RecordedWhistle::new(PathBuf::from("/tmp/whistle.m4a"), Local::now());
        let mut stack = vec![
            Screen::Home(HomeScreen),
            Screen::Genre(GenreScreen::new(whistle)),
        ];
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert!(matches!(route_key(&mut stack, esc), Transition::Pop));

        let enter = KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE);
        match route_key(&mut stack, enter) {
            Transition::Push(Screen::Comments(_)) => {}
            _ => panic!("expected the comments screen"),
        }
    }

    #[test]
    fn test_ctrl_c_is_an_interrupt() {
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(is_interrupt(&key));
        assert!(!is_interrupt(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE)));
    }
}
