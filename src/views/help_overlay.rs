//! Help overlay view showing keybindings.

use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Padding, Paragraph},
};

use super::DIM;
use crate::app::App;
use crate::help::overlay_sections;
use crate::keys::{Keymap, comments_keymap, global_keymap, navigation_keymap};

/// A section title, or a bound key and its label.
enum Row {
    Title(&'static str),
    Binding(String, &'static str),
}

fn rows(keymap: &Keymap) -> Vec<Row> {
    let mut rows = Vec::new();
    for section in overlay_sections() {
        let bindings: Vec<Row> = section
            .items
            .iter()
            .filter_map(|item| item.format_for_overlay(keymap))
            .map(|(keys, label)| Row::Binding(keys, label))
            .collect();
        if bindings.is_empty() {
            continue;
        }
        rows.push(Row::Title(section.title));
        rows.extend(bindings);
    }
    rows
}

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    if !app.show_help {
        return;
    }

    let keymap = global_keymap()
        .extend(navigation_keymap())
        .extend(comments_keymap());
    let rows = rows(&keymap);

    let mut key_width = 0;
    let mut row_width = 0;
    for row in &rows {
        match row {
            Row::Title(title) => row_width = row_width.max(title.len()),
            Row::Binding(keys, label) => {
                key_width = key_width.max(keys.len());
                row_width = row_width.max(keys.len() + 3 + label.len());
            }
        }
    }
    let row_width = row_width.max(key_width);

    // borders plus one column of padding on each side
    let width = (row_width as u16 + 4).min(area.width.saturating_sub(2));
    let height = (rows.len() as u16 + 2).min(area.height.saturating_sub(2));
    let popup = centered_rect(width, height, area);

    let lines: Vec<Line> = rows
        .iter()
        .map(|row| match row {
            Row::Title(title) => Line::from(Span::styled(
                *title,
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )),
            Row::Binding(keys, label) => Line::from(vec![
                Span::styled(
                    format!(" {keys:<key_width$}  "),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(*label),
            ]),
        })
        .collect();

    frame.render_widget(Clear, popup);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(DIM))
        .title(" Keys ")
        .title_bottom(Line::from(" ? to close ").right_aligned())
        .padding(Padding::horizontal(1));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestAppBuilder;
    use crate::views::tests::render_to_string;

    #[test]
    fn test_help_overlay_lists_bindings() {
        let mut app = TestAppBuilder::new().build();
        app.show_help = true;

        let output = render_to_string(80, 30, |frame| {
            render(frame, &app, frame.area());
        });

        assert!(output.contains("Keys"));
        assert!(output.contains("Navigation"));
        assert!(output.contains("General"));
        assert!(output.contains("Next sibling"));
        assert!(output.contains("Switch comment order"));
        assert!(output.contains("Open author profile"));
    }

    #[test]
    fn test_help_overlay_hidden_when_closed() {
        let app = TestAppBuilder::new().build();

        let output = render_to_string(80, 24, |frame| {
            render(frame, &app, frame.area());
        });

        assert!(output.trim().is_empty());
    }

    #[test]
    fn test_centered_rect() {
        let area = Rect::new(0, 0, 80, 24);
        assert_eq!(centered_rect(20, 10, area), Rect::new(30, 7, 20, 10));
    }
}
