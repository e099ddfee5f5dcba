//! Title screen.

use super::{render_chrome, BG};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{prelude::*, widgets::Paragraph};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HomeAction {
    None,
    AddWhistle,
    Quit,
}

#[derive(Debug, Default)]
pub struct HomeScreen;

impl HomeScreen {
    pub fn handle_key(&mut self, key: KeyEvent) -> HomeAction {
        match key.code {
            KeyCode::Char('+') | KeyCode::Char('a') | KeyCode::Enter => HomeAction::AddWhistle,
            KeyCode::Char('q') | KeyCode::Esc => HomeAction::Quit,
            _ => HomeAction::None,
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let content = render_chrome(frame, "What's that Whistle?", "+ add whistle, q quit", BG);

        let [_, body_area, _] = Layout::vertical([
            Constraint::Fill(1),
            Constraint::Length(3),
            Constraint::Fill(1),
        ])
        .areas(content);

        let body = Paragraph::new(vec![
            Line::from("Whistle a tune you can't name."),
            Line::from(""),
            Line::from("Press + to record it."),
        ])
        .alignment(Alignment::Center);
        frame.render_widget(body, body_area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn test_plus_adds_a_whistle() {
        let mut home = HomeScreen;
        let key = KeyEvent::new(KeyCode::Char('+'), KeyModifiers::SHIFT);
        assert_eq!(home.handle_key(key), HomeAction::AddWhistle);
        let key = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        assert_eq!(home.handle_key(key), HomeAction::Quit);
    }
}
