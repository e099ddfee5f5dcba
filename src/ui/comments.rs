//! Multi-line comments entry and final submission.

use super::{render_chrome, BG, FG, HELP_FG};
use crate::flow::{CommentsEntry, GenreChosen, Submission};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, Wrap},
};
use tui_input::InputRequest;

#[derive(Debug, Clone, PartialEq)]
pub enum CommentsAction {
    None,
    Submit(Submission),
    Back,
}

pub struct CommentsScreen {
    chosen: GenreChosen,
    entry: CommentsEntry,
}

impl CommentsScreen {
    pub fn new(chosen: GenreChosen) -> Self {
        Self {
            chosen,
            entry: CommentsEntry::new(),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> CommentsAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('s') => self.submit(),
                _ => CommentsAction::None,
            };
        }

        let request = match key.code {
            KeyCode::Esc => return CommentsAction::Back,
            KeyCode::Char(c) => InputRequest::InsertChar(c),
            KeyCode::Enter => InputRequest::InsertChar('\n'),
            KeyCode::Backspace => InputRequest::DeletePrevChar,
            KeyCode::Delete => InputRequest::DeleteNextChar,
            KeyCode::Left => InputRequest::GoToPrevChar,
            KeyCode::Right => InputRequest::GoToNextChar,
            KeyCode::Home => InputRequest::GoToStart,
            KeyCode::End => InputRequest::GoToEnd,
            _ => return CommentsAction::None,
        };
        self.entry.apply(request);
        CommentsAction::None
    }

    /// Completes the flow with the current text.
    pub fn submit(&self) -> CommentsAction {
        let comments = self.entry.submit();
        tracing::info!(
            "Submitting whistle: genre {}, {} characters of comments",
            self.chosen.genre(),
            comments.chars().count()
        );
        CommentsAction::Submit(self.chosen.clone().with_comments(comments))
    }

    pub fn render(&self, frame: &mut Frame) {
        let content = render_chrome(frame, "Comments", "ctrl+s submit, esc back", BG);

        let [genre_area, input_area] =
            Layout::vertical([Constraint::Length(2), Constraint::Min(3)]).areas(content);

        let recorded_at = self.chosen.whistle().recorded_at().format("%H:%M:%S");
        let genre_line = Line::from(vec![
            Span::styled("Genre: ", Style::default().fg(HELP_FG)),
            Span::raw(self.chosen.genre().label()),
            Span::styled(format!("  recorded {recorded_at}"), Style::default().fg(HELP_FG)),
        ]);
        frame.render_widget(Paragraph::new(genre_line), genre_area);

        let input_block = Block::default().borders(Borders::ALL);
        let inner = input_block.inner(input_area);
        frame.render_widget(input_block, input_area);

        if self.entry.shows_placeholder() {
            let placeholder = Paragraph::new(self.entry.text())
                .style(Style::default().fg(HELP_FG))
                .wrap(Wrap { trim: false });
            frame.render_widget(placeholder, inner);
            frame.set_cursor_position(Position::new(inner.x, inner.y));
            return;
        }

        let width = inner.width as usize;
        let (col, row) = cursor_position(self.entry.text(), self.entry.cursor(), width);
        let rows = wrap_lines(self.entry.text(), width);

        // Keep the cursor row visible.
        let visible = inner.height.max(1);
        let scroll = row.saturating_sub(visible - 1);
        let text: Vec<Line> = rows.into_iter().map(Line::from).collect();
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(FG))
            .scroll((scroll, 0));
        frame.render_widget(paragraph, inner);

        frame.set_cursor_position(Position::new(inner.x + col, inner.y + row - scroll));
    }
}

/// Splits `text` into display rows: at newlines, then every `width` chars.
fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut rows = Vec::new();
    for line in text.split('\n') {
        let chars: Vec<char> = line.chars().collect();
        if chars.is_empty() {
            rows.push(String::new());
            continue;
        }
        rows.extend(chars.chunks(width).map(|chunk| chunk.iter().collect()));
    }
    rows
}

/// Column and row of the char-index `cursor` in the rows built by [`wrap_lines`].
///
/// A cursor right after a full row stays at its end when a newline follows.
fn cursor_position(text: &str, cursor: usize, width: usize) -> (u16, u16) {
    let width = width.max(1);
    let (mut col, mut row) = (0usize, 0usize);
    for c in text.chars().take(cursor) {
        if c == '\n' {
            row += 1;
            col = 0;
            continue;
        }
        if col == width {
            row += 1;
            col = 0;
        }
        col += 1;
    }
    if col == width && text.chars().nth(cursor) != Some('\n') {
        row += 1;
        col = 0;
    }
    (col as u16, row as u16)
}
