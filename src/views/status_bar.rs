use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::DIM;

/// Builder for the status bar:
/// `[Order] Position | Error or message | Help Text`
pub struct StatusBar<'a> {
    label: &'a str,
    position: Option<(usize, usize)>,
    message: Option<&'a str>,
    error: Option<&'a str>,
    help_text: &'a str,
}

impl<'a> StatusBar<'a> {
    pub fn new() -> Self {
        Self {
            label: "",
            position: None,
            message: None,
            error: None,
            help_text: "",
        }
    }

    pub fn label(mut self, label: &'a str) -> Self {
        self.label = label;
        self
    }

    pub fn position(mut self, current: usize, total: usize) -> Self {
        self.position = Some((current, total));
        self
    }

    pub fn message(mut self, text: &'a str) -> Self {
        self.message = Some(text);
        self
    }

    pub fn error(mut self, text: &'a str) -> Self {
        self.error = Some(text);
        self
    }

    pub fn help(mut self, text: &'a str) -> Self {
        self.help_text = text;
        self
    }

    pub fn render(self, frame: &mut Frame, area: Rect) {
        let mut spans = vec![
            Span::styled(
                format!(" {} ", self.label),
                Style::default().bg(Color::Green).fg(Color::Black),
            ),
            Span::raw(" "),
        ];

        if let Some((current, total)) = self.position {
            spans.push(Span::styled(
                format!("{}/{}", current, total),
                Style::default().fg(DIM),
            ));
            spans.push(Span::raw(" | "));
        }

        if let Some(error) = self.error {
            spans.push(Span::styled(
                error.to_string(),
                Style::default().fg(Color::Red),
            ));
            spans.push(Span::raw(" | "));
        } else if let Some(message) = self.message {
            spans.push(Span::styled(
                message.to_string(),
                Style::default().fg(Color::Yellow),
            ));
            spans.push(Span::raw(" | "));
        }

        spans.push(Span::styled(
            self.help_text.to_string(),
            Style::default().fg(DIM),
        ));

        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}
