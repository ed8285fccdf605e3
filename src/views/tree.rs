//! Tree prefixes (│, ├─, └─) for nested comments.
//!
//! The connectors are read straight off the sibling links: a level shows a
//! continuation line when the ancestor at that level has a next sibling.

use ratatui::{style::Style, text::Span};

use crate::comment_tree::{CommentTree, NodeId};

/// For each depth `0..=depth(id)`, whether the node's ancestor at that depth
/// (the node itself for the last entry) has a next sibling.
pub fn sibling_context(tree: &CommentTree, id: NodeId) -> Vec<bool> {
    let mut context: Vec<bool> =
        std::iter::successors(Some(id), |&current| tree.parent(current))
            .map(|node| tree.next_sibling(node).is_some())
            .collect();
    context.reverse();
    context
}

fn continuation<F>(depth: usize, has_more: &[bool], depth_color: &F) -> Vec<Span<'static>>
where
    F: Fn(usize) -> ratatui::style::Color,
{
    (1..depth)
        .map(|d| {
            let text = if has_more.get(d).copied().unwrap_or(false) {
                " │  "
            } else {
                "    "
            };
            Span::styled(text, Style::default().fg(depth_color(d)))
        })
        .collect()
}

/// Prefix for a comment's header line.
pub fn header_prefix<F>(depth: usize, has_more: &[bool], depth_color: F) -> Vec<Span<'static>>
where
    F: Fn(usize) -> ratatui::style::Color,
{
    if depth == 0 {
        return vec![];
    }
    let mut spans = continuation(depth, has_more, &depth_color);
    let connector = if has_more.get(depth).copied().unwrap_or(false) {
        " ├─ "
    } else {
        " └─ "
    };
    spans.push(Span::styled(
        connector,
        Style::default().fg(depth_color(depth)),
    ));
    spans
}

/// Prefix for body lines. Extends one level deeper when the comment's own
/// replies follow.
pub fn body_prefix<F>(
    depth: usize,
    has_more: &[bool],
    has_children: bool,
    depth_color: F,
) -> Vec<Span<'static>>
where
    F: Fn(usize) -> ratatui::style::Color,
{
    let mut spans = continuation(depth + 1, has_more, &depth_color);
    let child_text = if has_children { " │  " } else { "    " };
    spans.push(Span::styled(
        child_text,
        Style::default().fg(depth_color(depth + 1)),
    ));
    spans
}
