//! Plain-text rendering of a thread for `--print`.

use std::fmt::Write;

use crate::comment_tree::{CommentTree, Content};
use crate::text::paragraph_text;

/// Write the visible part of `tree` as indented, wrapped text. Collapsed and
/// hidden comments are shown the way the viewer shows them.
pub fn render_plain(tree: &CommentTree, width: usize) -> String {
    let mut out = String::new();
    for id in tree.visible() {
        let Some(node) = tree.get(id) else {
            continue;
        };
        let indent = "    ".repeat(node.depth());

        if node.hidden {
            let _ = writeln!(out, "{indent}[Comment by {} hidden]\n", node.author_text());
            continue;
        }

        let mut header = format!("{indent}{}", node.author_text());
        if let Some(date) = &node.date_text {
            let _ = write!(header, " · {}", date.short);
        }
        if let Some(edited) = &node.edited_text {
            let _ = write!(header, " · edited {}", edited.short);
        }
        let replies = tree.descendant_count(id);
        if !node.expanded && replies > 0 {
            let _ = write!(header, " [+{replies}]");
        }
        let _ = writeln!(out, "{header}");

        let body_indent = format!("{indent}  ");
        let options = textwrap::Options::new(width.max(body_indent.len() + 10))
            .initial_indent(&body_indent)
            .subsequent_indent(&body_indent);
        match &node.content {
            Content::Paragraphs(paragraphs) => {
                for (i, paragraph) in paragraphs.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    for line in textwrap::wrap(&paragraph_text(paragraph), &options) {
                        let _ = writeln!(out, "{line}");
                    }
                }
            }
            Content::Deleted => {
                let _ = writeln!(out, "{body_indent}[deleted]");
            }
            Content::Unavailable => {
                let _ = writeln!(out, "{body_indent}[unavailable]");
            }
        }
        out.push('\n');
    }
    out
}
