//! Genre selection list.

use super::{render_chrome, BG, HIGHLIGHT_BG};
use crate::flow::{GenreChosen, GenrePicker, RecordedWhistle};
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    prelude::*,
    widgets::{List, ListItem, ListState},
};

#[derive(Debug, Clone, PartialEq)]
pub enum GenreAction {
    None,
    Chosen(GenreChosen),
    Back,
}

/// One row per genre; choosing a row moves on to comments.
pub struct GenreScreen {
    whistle: RecordedWhistle,
    picker: GenrePicker,
    list_state: ListState,
}

impl GenreScreen {
    pub fn new(whistle: RecordedWhistle) -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            whistle,
            picker: GenrePicker::new(),
            list_state,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> GenreAction {
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.picker.previous();
                self.list_state.select(Some(self.picker.cursor()));
                GenreAction::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.picker.next();
                self.list_state.select(Some(self.picker.cursor()));
                GenreAction::None
            }
            KeyCode::Enter => {
                let row = self.picker.cursor();
                self.choose(row)
            }
            KeyCode::Esc | KeyCode::Char('q') => GenreAction::Back,
            _ => GenreAction::None,
        }
    }

    /// Selects `row` and hands the take on with that genre.
    pub fn choose(&mut self, row: usize) -> GenreAction {
        match self.picker.choose(row) {
            Some(genre) => {
                tracing::info!("Genre chosen: {}", genre);
                GenreAction::Chosen(self.whistle.clone().with_genre(genre))
            }
            None => GenreAction::None,
        }
    }

    pub fn render(&mut self, frame: &mut Frame) {
        let content = render_chrome(frame, "Select genre", "↑/↓ move, enter choose, esc back", BG);

        let items: Vec<ListItem> = self
            .picker
            .rows()
            .iter()
            .map(|genre| ListItem::new(format!("  {genre}")))
            .collect();

        let list = List::new(items).highlight_style(Style::default().bg(HIGHLIGHT_BG).bold());
        frame.render_stateful_widget(list, content, &mut self.list_state);
    }
}
