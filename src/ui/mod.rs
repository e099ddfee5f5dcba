//! Terminal screens of the whistle flow.
//!
//! Screens do not own the terminal. Each one renders into a frame handed to
//! it and turns key events into an action for the navigation loop.

pub mod comments;
pub mod error;
pub mod genre;
pub mod home;
pub mod notice;
pub mod record;
pub mod terminal;

pub use comments::{CommentsAction, CommentsScreen};
pub use error::ErrorScreen;
pub use genre::{GenreAction, GenreScreen};
pub use home::{HomeAction, HomeScreen};
pub use record::{RecordAction, RecordScreen};
pub use terminal::WhistleTui;

use ratatui::{
    prelude::*,
    widgets::{Block, Padding, Paragraph},
};

const BG: Color = Color::Rgb(0, 0, 0);
const FG: Color = Color::Rgb(255, 255, 255);
const HELP_FG: Color = Color::Rgb(100, 100, 100);
const HIGHLIGHT_BG: Color = Color::Rgb(20, 20, 20);

/// Paints the shared screen frame: padded background, title header, help footer.
///
/// Returns the content area between header and footer.
fn render_chrome(frame: &mut Frame, title: &str, help: &str, bg: Color) -> Rect {
    let area = frame.area();

    let padding_block = Block::default()
        .padding(Padding::uniform(1))
        .style(Style::default().bg(bg).fg(FG));
    frame.render_widget(&padding_block, area);
    let inner_area = padding_block.inner(area);

    let [header_area, content_area, footer_area] = Layout::vertical([
        Constraint::Length(2),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(inner_area);

    let header = Paragraph::new(Line::from(title).bold()).alignment(Alignment::Left);
    frame.render_widget(header, header_area);

    let help_paragraph = Paragraph::new(help)
        .alignment(Alignment::Center)
        .style(Style::default().fg(HELP_FG));
    frame.render_widget(help_paragraph, footer_area);

    content_area
}
