//! Help text generated from keymaps.

use crate::app::Message;
use crate::keys::{Keymap, format_key};
use crate::navigation::Command;

/// One or more related actions and the label shown for them.
pub struct HelpItem {
    /// Keys for these messages are joined with "/".
    messages: Vec<Message>,
    label: &'static str,
}

impl HelpItem {
    pub fn new(message: Message, label: &'static str) -> Self {
        Self {
            messages: vec![message],
            label,
        }
    }

    pub fn pair(first: Message, second: Message, label: &'static str) -> Self {
        Self {
            messages: vec![first, second],
            label,
        }
    }

    fn keys(&self, keymap: &Keymap) -> Option<String> {
        let keys: Vec<String> = self
            .messages
            .iter()
            .filter_map(|msg| {
                keymap
                    .find_key(msg)
                    .map(|(code, mods)| format_key(code, mods))
            })
            .collect();
        (!keys.is_empty()).then(|| keys.join("/"))
    }

    /// `keys:label`, or None if nothing is bound.
    pub fn format(&self, keymap: &Keymap) -> Option<String> {
        self.keys(keymap)
            .map(|keys| format!("{}:{}", keys, self.label))
    }

    /// (keys, label) for the overlay, or None if nothing is bound.
    pub fn format_for_overlay(&self, keymap: &Keymap) -> Option<(String, &'static str)> {
        self.keys(keymap).map(|keys| (keys, self.label))
    }
}

pub fn format_items(items: &[HelpItem], keymap: &Keymap) -> String {
    items
        .iter()
        .filter_map(|item| item.format(keymap))
        .collect::<Vec<_>>()
        .join("  ")
}

/// Status bar hint while reading.
pub fn thread_hint() -> Vec<HelpItem> {
    vec![
        HelpItem::pair(
            Message::Navigate(Command::NextComment),
            Message::Navigate(Command::PreviousComment),
            "nav",
        ),
        HelpItem::new(Message::Navigate(Command::ToggleExpand), "toggle"),
        HelpItem::new(Message::Reply, "reply"),
        HelpItem::new(Message::ToggleHelp, "help"),
    ]
}

/// Status bar hint while an editor is open.
pub fn editor_hint() -> Vec<HelpItem> {
    vec![
        HelpItem::new(Message::SubmitEditor, "send"),
        HelpItem::new(Message::CancelEditor, "cancel"),
    ]
}

/// A titled group of bindings in the help overlay.
pub struct HelpSection {
    pub title: &'static str,
    pub items: Vec<HelpItem>,
}

/// Every binding, grouped for the help overlay. Traversal labels come from
/// [`Command::description`].
pub fn overlay_sections() -> Vec<HelpSection> {
    use Command::{
        GoToParent, GoToRoot, NextComment, NextSibling, PreviousComment, PreviousSibling,
        ToggleExpand,
    };
    let navigation = [
        NextComment,
        PreviousComment,
        NextSibling,
        PreviousSibling,
        GoToParent,
        GoToRoot,
        ToggleExpand,
    ]
    .into_iter()
    .map(|command| HelpItem::new(Message::Navigate(command), command.description()))
    .collect();

    vec![
        HelpSection {
            title: "Navigation",
            items: navigation,
        },
        HelpSection {
            title: "Comments",
            items: vec![
                HelpItem::new(Message::ToggleOrder, "Switch comment order"),
                HelpItem::new(Message::Reply, "Reply"),
                HelpItem::new(Message::NewComment, "New comment"),
                HelpItem::new(Message::Edit, "Edit your comment"),
                HelpItem::new(Message::Delete, "Delete your comment"),
                HelpItem::new(Message::OpenLink, "Open first link"),
                HelpItem::new(Message::OpenProfile, "Open author profile"),
            ],
        },
        HelpSection {
            title: "General",
            items: vec![
                HelpItem::new(Message::ToggleHelp, "Close help"),
                HelpItem::new(Message::Quit, "Quit"),
            ],
        },
    ]
}
