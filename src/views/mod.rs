pub mod comments;
pub mod editor;
pub mod help_overlay;
pub mod prompt;
pub mod status_bar;
pub mod tree;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::App;
use crate::help::{editor_hint, format_items, thread_hint};
use crate::keys::{comments_keymap, editor_keymap, global_keymap, navigation_keymap};
use status_bar::StatusBar;

pub const DIM: Color = Color::DarkGray;

/// Colors for different nesting depths (cycles after 6)
const DEPTH_COLORS: [Color; 6] = [
    Color::Cyan,
    Color::Green,
    Color::Yellow,
    Color::Magenta,
    Color::Blue,
    Color::Red,
];

pub fn depth_color(depth: usize) -> Color {
    DEPTH_COLORS[depth % DEPTH_COLORS.len()]
}

pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();
    let chunks = Layout::vertical([
        Constraint::Length(1), // Title
        Constraint::Min(0),    // Comments
        Constraint::Length(1), // Status bar
    ])
    .split(area);

    render_header(frame, app, chunks[0]);
    comments::render(frame, app, chunks[1]);
    render_status_bar(frame, app, chunks[2]);

    if app.editing() {
        editor::render(frame, app, chunks[1]);
    }
    if let Some(prompt) = &app.prompt {
        prompt::render(frame, prompt, area);
    }
    help_overlay::render(frame, app, area);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let count = app.session.tree().len();
    let noun = if count == 1 { "comment" } else { "comments" };
    let header = Line::from(vec![
        Span::styled(
            app.title.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!("  {count} {noun}"), Style::default().fg(DIM)),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let tree = app.session.tree();
    let help = if app.editing() {
        format_items(&editor_hint(), &editor_keymap())
    } else {
        let keymap = global_keymap()
            .extend(navigation_keymap())
            .extend(comments_keymap());
        format_items(&thread_hint(), &keymap)
    };

    let mut bar = StatusBar::new()
        .label(tree.order().label())
        .help(&help);
    if let Some(focused) = app.session.focused()
        && let Some(index) = tree.visible().position(|id| id == focused)
    {
        bar = bar.position(index + 1, tree.visible().count());
    }
    if let Some(error) = &app.error {
        bar = bar.error(error);
    } else if let Some(status) = &app.status {
        bar = bar.message(status);
    }
    bar.render(frame, area);
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::test_utils::TestAppBuilder;
    use ratatui::{Terminal, backend::TestBackend};

    pub fn render_to_string<F>(width: u16, height: u16, render_fn: F) -> String
    where
        F: FnOnce(&mut Frame),
    {
        let backend = TestBackend::new(width, height);
        let mut terminal = Terminal::new(backend).unwrap();
        terminal.draw(|frame| render_fn(frame)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        let mut output = String::new();
        for y in 0..buffer.area.height {
            for x in 0..buffer.area.width {
                output.push(buffer[(x, y)].symbol().chars().next().unwrap_or(' '));
            }
            output.push('\n');
        }
        output
    }

    #[test]
    fn test_full_screen_layout() {
        let mut app = TestAppBuilder::new().build();
        let output = render_to_string(80, 30, |frame| render(frame, &mut app));
        let first_line = output.lines().next().unwrap();
        assert!(first_line.contains("Test thread"));
        assert!(first_line.contains("6 comments"));
        let last_line = output.lines().last().unwrap();
        assert!(last_line.contains("Chronological"));
        assert!(last_line.contains("1/6"));
        assert!(last_line.contains("?:help"));
    }

    #[test]
    fn test_error_replaces_status_message() {
        let mut app = TestAppBuilder::new().build();
        app.status = Some("Comment posted".into());
        app.error = Some("log in to comment".into());
        let output = render_to_string(100, 20, |frame| render(frame, &mut app));
        let last_line = output.lines().last().unwrap();
        assert!(last_line.contains("log in to comment"));
        assert!(!last_line.contains("Comment posted"));
    }

    #[test]
    fn test_depth_colors_cycle() {
        assert_eq!(depth_color(0), depth_color(6));
        assert_ne!(depth_color(0), depth_color(1));
    }
}
