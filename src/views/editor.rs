//! Popup for the open reply or edit.

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use super::DIM;
use crate::app::App;
use crate::session::{EditTarget, Editor};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(editor) = app.session.active_editor() else {
        return;
    };
    let title = title(app, editor.target());

    let height = (area.height / 2).clamp(6u16.min(area.height), 14);
    let popup = Rect::new(
        area.x,
        area.y + area.height.saturating_sub(height),
        area.width,
        height,
    );
    frame.render_widget(Clear, popup);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [text_area, footer_area] =
        Layout::vertical([Constraint::Min(0), Constraint::Length(1)]).areas(inner);

    let text = Paragraph::new(editor_lines(editor)).wrap(Wrap { trim: false });
    frame.render_widget(text, text_area);
    frame.render_widget(Paragraph::new(footer(editor)), footer_area);
}

fn title(app: &App, target: EditTarget) -> String {
    let author = |id| {
        app.session
            .tree()
            .get(id)
            .map(|node| node.author_text().to_string())
            .unwrap_or_default()
    };
    match target {
        EditTarget::Reply(Some(id)) => format!("Reply to {}", author(id)),
        EditTarget::Reply(None) => "New comment".to_string(),
        EditTarget::Edit(_) => "Edit comment".to_string(),
    }
}

fn editor_lines(editor: &Editor) -> Vec<Line<'static>> {
    let mut lines: Vec<Line> = editor
        .text()
        .split('\n')
        .map(|line| Line::from(line.to_string()))
        .collect();
    if !editor.is_submitting()
        && let Some(last) = lines.last_mut()
    {
        last.push_span(Span::styled(
            "▏",
            Style::default().add_modifier(Modifier::SLOW_BLINK),
        ));
    }
    lines
}

fn footer(editor: &Editor) -> Line<'static> {
    if editor.is_submitting() {
        return Line::from(Span::styled("Sending…", Style::default().fg(Color::Yellow)));
    }
    let mut spans = vec![Span::styled("C-s send  Esc cancel", Style::default().fg(DIM))];
    if let Some(error) = editor.error() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            error.to_string(),
            Style::default().fg(Color::Red),
        ));
    }
    Line::from(spans)
}
