use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::UnicodeWidthStr;

use super::tree::{body_prefix, header_prefix, sibling_context};
use super::{DIM, depth_color};
use crate::app::App;
use crate::comment_tree::{CommentNode, Content, NodeId};
use crate::session::CommentSession;
use crate::text::Segment;
use crate::widgets::thread_view::{ThreadItem, ThreadView};

const HIGHLIGHT_BG: Color = Color::Rgb(40, 40, 40);
const LINK: Color = Color::Blue;

pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let tree = app.session.tree();
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Comments · {}", tree.order().label()));

    if tree.is_empty() {
        let empty = Paragraph::new("No comments yet")
            .style(Style::default().fg(DIM))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    // 2 for borders, 2 for the highlight symbol
    let width = area.width.saturating_sub(4) as usize;
    let focused = app.session.focused();
    let mut selected = None;
    let items: Vec<ThreadItem> = tree
        .visible()
        .enumerate()
        .map(|(index, id)| {
            if Some(id) == focused {
                selected = Some(index);
            }
            ThreadItem::new(comment_lines(&app.session, id, Some(id) == focused, width))
        })
        .collect();

    app.thread.select(selected);
    let view = ThreadView::new(items)
        .block(block)
        .highlight_style(Style::default().bg(HIGHLIGHT_BG))
        .highlight_symbol("▶ ");
    frame.render_stateful_widget(view, area, &mut app.thread);
}

/// Lay out one comment: header, body and a spacer line.
pub fn comment_lines(
    session: &CommentSession,
    id: NodeId,
    focused: bool,
    width: usize,
) -> Vec<Line<'static>> {
    let tree = session.tree();
    let Some(node) = tree.get(id) else {
        return Vec::new();
    };
    let depth = node.depth();
    let context = sibling_context(tree, id);

    let mut header = header_prefix(depth, &context, depth_color);
    if node.hidden {
        header.push(Span::styled(
            format!("Comment by {} hidden", node.author_text()),
            Style::default().fg(DIM).add_modifier(Modifier::ITALIC),
        ));
        return vec![Line::from(header)];
    }
    header.extend(header_spans(node, tree.descendant_count(id), depth));

    let has_children = node.first_visible_child().is_some();
    let prefix = || body_prefix(depth, &context, has_children, depth_color);
    let body_width = width.saturating_sub(4 * (depth + 1)).max(20);

    let mut lines = vec![Line::from(header)];
    for body_line in body_lines(node, body_width) {
        let mut spans = prefix();
        spans.extend(body_line);
        lines.push(Line::from(spans));
    }
    if focused && !session.controls_hidden(id) {
        let controls = controls_text(session, id);
        if !controls.is_empty() {
            let mut spans = prefix();
            spans.push(Span::styled(controls, Style::default().fg(DIM)));
            lines.push(Line::from(spans));
        }
    }
    lines.push(Line::from(prefix()));
    lines
}

fn header_spans(node: &CommentNode, replies: usize, depth: usize) -> Vec<Span<'static>> {
    let author_style = match (&node.author, node.profile_url()) {
        (None, _) => Style::default().fg(DIM).add_modifier(Modifier::ITALIC),
        (Some(_), Some(_)) => Style::default()
            .fg(depth_color(depth))
            .add_modifier(Modifier::BOLD),
        (Some(_), None) => Style::default().fg(depth_color(depth)),
    };
    let mut spans = vec![Span::styled(node.author_text().to_string(), author_style)];

    if let Some(date) = &node.date_text {
        spans.push(Span::styled(" · ", Style::default().fg(DIM)));
        spans.push(Span::styled(date.short.clone(), Style::default().fg(DIM)));
    }
    if let Some(edited) = &node.edited_text {
        spans.push(Span::styled(
            format!(" · edited {}", edited.short),
            Style::default().fg(DIM).add_modifier(Modifier::ITALIC),
        ));
    }
    if !node.expanded && replies > 0 {
        let noun = if replies == 1 { "reply" } else { "replies" };
        spans.push(Span::styled(
            format!(" [+{replies} {noun}]"),
            Style::default().fg(Color::Yellow),
        ));
    }
    if node.busy {
        spans.push(Span::styled(" (saving…)", Style::default().fg(Color::Yellow)));
    }
    spans
}

fn body_lines(node: &CommentNode, width: usize) -> Vec<Vec<Span<'static>>> {
    match &node.content {
        Content::Paragraphs(paragraphs) => {
            let mut lines = Vec::new();
            for (i, paragraph) in paragraphs.iter().enumerate() {
                if i > 0 {
                    lines.push(Vec::new());
                }
                lines.extend(wrap_segments(paragraph, width));
            }
            lines
        }
        Content::Deleted => vec![placeholder("deleted")],
        Content::Unavailable => vec![placeholder("unavailable")],
    }
}

fn placeholder(text: &'static str) -> Vec<Span<'static>> {
    vec![Span::styled(
        text,
        Style::default().fg(DIM).add_modifier(Modifier::ITALIC),
    )]
}

fn segment_style(segment: &Segment) -> Style {
    match segment {
        Segment::Text(_) => Style::default(),
        Segment::Url { .. } | Segment::Email { .. } => Style::default()
            .fg(LINK)
            .add_modifier(Modifier::UNDERLINED),
    }
}

/// Greedy word wrap that keeps each segment's style. Words only break at
/// whitespace, so a link glued to punctuation stays on one line.
pub fn wrap_segments(paragraph: &[Segment], width: usize) -> Vec<Vec<Span<'static>>> {
    let mut words: Vec<Vec<Span<'static>>> = Vec::new();
    let mut current: Vec<Span<'static>> = Vec::new();
    for segment in paragraph {
        let style = segment_style(segment);
        for (i, piece) in segment.text().split(char::is_whitespace).enumerate() {
            if i > 0 && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            if !piece.is_empty() {
                current.push(Span::styled(piece.to_string(), style));
            }
        }
    }
    if !current.is_empty() {
        words.push(current);
    }

    let width = width.max(1);
    let mut lines = Vec::new();
    let mut line: Vec<Span<'static>> = Vec::new();
    let mut used = 0;
    for word in words {
        let word_width: usize = word.iter().map(|span| span.content.as_ref().width()).sum();
        if used > 0 && used + 1 + word_width > width {
            lines.push(std::mem::take(&mut line));
            used = 0;
        }
        if used > 0 {
            line.push(Span::raw(" "));
            used += 1;
        }
        line.extend(word);
        used += word_width;
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

fn controls_text(session: &CommentSession, id: NodeId) -> String {
    let mut controls = Vec::new();
    if session.can_reply(id) {
        controls.push("r reply");
    }
    if session.can_edit(id) {
        controls.push("e edit");
    }
    if session.can_delete(id) {
        controls.push("d delete");
    }
    controls.join("  ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::navigation::Command;
    use crate::test_utils::{RecordBuilder, TestAppBuilder};
    use crate::text::tokenize;
    use crate::views::tests::render_to_string;

    fn plain(lines: &[Vec<Span>]) -> Vec<String> {
        lines
            .iter()
            .map(|spans| spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_wrap_keeps_words_whole() {
        let paragraph = &tokenize("the quick brown fox jumps")[0];
        assert_eq!(
            plain(&wrap_segments(paragraph, 10)),
            vec!["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn test_wrap_styles_links() {
        let paragraph = &tokenize("see http://example.com/x now")[0];
        let lines = wrap_segments(paragraph, 80);
        assert_eq!(plain(&lines), vec!["see http://example.com/x now"]);
        let link = lines[0]
            .iter()
            .find(|span| span.content == "http://example.com/x")
            .unwrap();
        assert_eq!(link.style.fg, Some(LINK));
    }

    #[test]
    fn test_wrap_link_glued_to_punctuation() {
        let paragraph = &tokenize("(http://a.com/b) end")[0];
        let lines = wrap_segments(paragraph, 16);
        assert_eq!(plain(&lines), vec!["(http://a.com/b)", "end"]);
    }

    #[test]
    fn test_collapsed_header_counts_replies() {
        let mut app = TestAppBuilder::new().build();
        app.update(crate::app::Message::Navigate(Command::ToggleExpand));
        let id = app.session.focused().unwrap();
        let lines = comment_lines(&app.session, id, true, 80);
        assert!(line_text(&lines[0]).contains("[+3 replies]"));
    }

    #[test]
    fn test_missing_author_and_body_placeholders() {
        let app = TestAppBuilder::new()
            .records(vec![RecordBuilder::new(1).no_name().no_body().deleted().build()])
            .build();
        let id = app.session.focused().unwrap();
        let lines = comment_lines(&app.session, id, false, 80);
        assert!(line_text(&lines[0]).starts_with("deleted"));
        assert!(line_text(&lines[1]).contains("deleted"));
    }

    #[test]
    fn test_controls_only_on_focused_comment() {
        let app = TestAppBuilder::new().build();
        let id = app.session.focused().unwrap();
        let focused = comment_lines(&app.session, id, true, 80);
        let unfocused = comment_lines(&app.session, id, false, 80);
        assert_eq!(focused.len(), unfocused.len() + 1);
        assert!(focused.iter().any(|line| line_text(line).contains("r reply")));
    }

    #[test]
    fn test_render_shows_tree_connectors() {
        let mut app = TestAppBuilder::new().build();
        let output = render_to_string(60, 30, |frame| render(frame, &mut app, frame.area()));
        assert!(output.contains("Comments · Chronological"));
        assert!(output.contains("├─ Commenter 2"));
        assert!(output.contains("└─ Commenter 4"));
        assert!(output.contains("▶ Commenter 1"));
    }

    #[test]
    fn test_render_empty_thread() {
        let mut app = TestAppBuilder::new().records(Vec::new()).build();
        let output = render_to_string(40, 5, |frame| render(frame, &mut app, frame.area()));
        assert!(output.contains("No comments yet"));
    }
}
