//! Keyboard traversal of the comment tree.
//!
//! The only state is which node holds focus. Each [`Command`] maps the
//! focused node to a [`Transition`]; commands whose target does not exist are
//! no-ops.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use tracing::trace;

use crate::comment_tree::{CommentTree, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    ToggleExpand,
    GoToRoot,
    NextSibling,
    PreviousSibling,
    GoToParent,
    NextComment,
    PreviousComment,
}

impl Command {
    pub fn description(self) -> &'static str {
        match self {
            Self::ToggleExpand => "Collapse/expand thread",
            Self::GoToRoot => "Top-level comment",
            Self::NextSibling => "Next sibling",
            Self::PreviousSibling => "Previous sibling",
            Self::GoToParent => "Parent comment",
            Self::NextComment => "Next comment",
            Self::PreviousComment => "Previous comment",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Focus(NodeId),
    Toggled { node: NodeId, expanded: bool },
    NoOp,
}

/// Modifiers that make a key event belong to something else.
const FOREIGN_MODIFIERS: KeyModifiers = KeyModifiers::CONTROL
    .union(KeyModifiers::ALT)
    .union(KeyModifiers::SUPER)
    .union(KeyModifiers::META)
    .union(KeyModifiers::HYPER);

/// Map a key to a traversal command. Shift selects sibling movement (and the
/// root for `H`); any other modifier leaves the key unhandled.
pub fn command_for_key(key: &KeyEvent) -> Option<Command> {
    if key.kind == KeyEventKind::Release || key.modifiers.intersects(FOREIGN_MODIFIERS) {
        return None;
    }
    let shift = key.modifiers.contains(KeyModifiers::SHIFT);
    match key.code {
        KeyCode::Enter => Some(Command::ToggleExpand),
        KeyCode::Down => Some(Command::NextComment),
        KeyCode::Up => Some(Command::PreviousComment),
        KeyCode::Char(c) => {
            let sibling = shift || c.is_ascii_uppercase();
            match (c.to_ascii_lowercase(), sibling) {
                ('h', false) => Some(Command::GoToParent),
                ('h', true) => Some(Command::GoToRoot),
                ('j', false) => Some(Command::NextComment),
                ('j', true) => Some(Command::NextSibling),
                ('k', false) => Some(Command::PreviousComment),
                ('k', true) => Some(Command::PreviousSibling),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Holds the focused node and applies commands to it.
#[derive(Debug, Clone, Default)]
pub struct NavigationController {
    focused: Option<NodeId>,
}

impl NavigationController {
    /// Focus the first top-level comment, if any.
    pub fn new(tree: &CommentTree) -> Self {
        Self {
            focused: tree.roots().first(),
        }
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn focus(&mut self, id: NodeId) {
        self.focused = Some(id);
    }

    /// Apply `command` to the focused node.
    pub fn apply(&mut self, tree: &mut CommentTree, command: Command) -> Transition {
        let Some(current) = self.focused.filter(|&id| tree.contains(id)) else {
            return Transition::NoOp;
        };
        let target = match command {
            Command::ToggleExpand => {
                return match tree.toggle_expanded(current) {
                    Some(expanded) => Transition::Toggled {
                        node: current,
                        expanded,
                    },
                    None => Transition::NoOp,
                };
            }
            Command::GoToRoot => tree.root_of(current),
            Command::NextSibling => tree.next_sibling(current),
            Command::PreviousSibling => tree.prev_sibling(current),
            Command::GoToParent => tree.parent(current),
            Command::NextComment => tree.find_next(current),
            Command::PreviousComment => tree.find_previous(current),
        };
        match target {
            Some(id) if id != current => {
                trace!(?command, from = ?current, to = ?id, "focus moved");
                self.focused = Some(id);
                Transition::Focus(id)
            }
            _ => Transition::NoOp,
        }
    }

    /// Move focus off a node that no longer exists: to `fallback` if given,
    /// else to the first top-level comment.
    pub fn repair(&mut self, tree: &CommentTree, fallback: Option<NodeId>) {
        if self.focused.is_some_and(|id| tree.contains(id)) {
            return;
        }
        self.focused = fallback
            .filter(|&id| tree.contains(id))
            .or_else(|| tree.roots().first());
    }

    /// Move focus to the collapsed ancestor if the focused node was folded
    /// away.
    pub fn ensure_visible(&mut self, tree: &CommentTree) {
        if let Some(id) = self.focused {
            self.focused = Some(visible_ancestor(tree, id));
        }
    }
}

/// `id` if it is visible, otherwise the outermost ancestor hiding it.
pub fn visible_ancestor(tree: &CommentTree, id: NodeId) -> NodeId {
    let mut result = id;
    let mut current = tree.parent(id);
    while let Some(ancestor) = current {
        if tree.get(ancestor).is_some_and(|node| !node.shows_children()) {
            result = ancestor;
        }
        current = tree.parent(ancestor);
    }
    result
}

/// Expand every ancestor of `id`. A hidden ancestor stays hidden, so `id`
/// is only part of the visible sequence if none is.
pub fn reveal(tree: &mut CommentTree, id: NodeId) {
    let mut current = tree.parent(id);
    while let Some(ancestor) = current {
        if let Some(node) = tree.get_mut(ancestor) {
            node.expanded = true;
        }
        current = tree.parent(ancestor);
    }
}
