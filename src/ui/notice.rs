//! Centered modal for dismissible notices.

use crate::flow::Notice;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

const NOTICE_BG: Color = Color::Rgb(255, 255, 255);
const NOTICE_FG: Color = Color::Rgb(0, 0, 0);

/// Renders `notice` over `screen_area`; any key dismisses it.
pub fn render_notice(frame: &mut Frame, screen_area: Rect, notice: &Notice) {
    let modal_width = (notice.message.len() as u16 / 2)
        .max(notice.title.len() as u16 + 4)
        .clamp(20, screen_area.width.max(20))
        .min(screen_area.width);
    let modal_height = 7.min(screen_area.height);

    let modal_area = Rect {
        x: screen_area.x + screen_area.width.saturating_sub(modal_width) / 2,
        y: screen_area.y + screen_area.height.saturating_sub(modal_height) / 2,
        width: modal_width,
        height: modal_height,
    };

    frame.render_widget(Clear, modal_area);

    let modal_block = Block::default()
        .title(Line::from(format!(" {} ", notice.title)).bold())
        .title_alignment(Alignment::Center)
        .borders(Borders::ALL)
        .style(Style::default().bg(NOTICE_BG).fg(NOTICE_FG));
    let inner_area = modal_block.inner(modal_area);
    frame.render_widget(modal_block, modal_area);

    let text = vec![
        Line::from(notice.message),
        Line::from(""),
        Line::from("Press any key").style(Style::default().fg(Color::Rgb(100, 100, 100))),
    ];
    let body = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(body, inner_area);
}
