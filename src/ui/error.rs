//! Full-screen display for errors that end the flow.

use super::terminal::WhistleTui;
use crossterm::event::{self, Event, KeyEventKind};
use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph, Wrap},
};

const ERROR_BG: Color = Color::Rgb(255, 0, 0);
const ERROR_FG: Color = Color::Rgb(255, 255, 255);

/// Red screen with a centered, wrapped message.
pub struct ErrorScreen {
    message: String,
}

impl ErrorScreen {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        frame.render_widget(Block::default().style(Style::default().bg(ERROR_BG)), area);

        let padding_x = area.width / 10;
        let text_width = (area.width * 80) / 100;
        let centered_area = Rect {
            x: area.x + padding_x,
            y: area.y + area.height / 2,
            width: text_width,
            height: area.height / 2,
        };

        let paragraph = Paragraph::new(self.message.as_str())
            .alignment(Alignment::Center)
            .style(Style::default().fg(ERROR_FG).bg(ERROR_BG))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, centered_area);
    }

    /// Shows the message until any key is pressed.
    pub fn show(&self, tui: &mut WhistleTui) -> anyhow::Result<()> {
        loop {
            tui.draw(|frame| self.render(frame))?;

            if event::poll(std::time::Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}
