use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph},
};

use super::help_overlay::centered_rect;
use crate::app::Prompt;

pub fn render(frame: &mut Frame, prompt: &Prompt, area: Rect) {
    let answers = if prompt.is_question() {
        "  y/n"
    } else {
        "  any key"
    };
    let line = Line::from(vec![
        Span::styled(
            prompt.question(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(answers, Style::default().fg(Color::Yellow)),
    ]);
    // 2 for borders, 2 for padding
    let width = (line.width() as u16 + 4).min(area.width);
    let popup = centered_rect(width, 3u16.min(area.height), area);

    frame.render_widget(Clear, popup);
    let paragraph = Paragraph::new(line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(paragraph, popup);
}
