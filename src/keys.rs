use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{App, Message};
use crate::navigation::{Command, command_for_key};

/// A declarative keybinding map that can be composed and extended.
#[derive(Clone)]
pub struct Keymap {
    bindings: Vec<(KeyCode, KeyModifiers, Message)>,
}

impl Keymap {
    pub const fn new() -> Self {
        Self {
            bindings: Vec::new(),
        }
    }

    /// Add a key binding with no modifiers.
    pub fn bind(mut self, code: KeyCode, message: Message) -> Self {
        self.bindings.push((code, KeyModifiers::NONE, message));
        self
    }

    /// Add a key binding with Ctrl modifier.
    pub fn bind_ctrl(mut self, code: KeyCode, message: Message) -> Self {
        self.bindings.push((code, KeyModifiers::CONTROL, message));
        self
    }

    /// Look up a message for a key event. Shift is carried by the character
    /// itself, so it is ignored; every other modifier must match exactly.
    /// Later bindings take precedence over earlier ones.
    pub fn get(&self, event: &KeyEvent) -> Option<Message> {
        let mods = event.modifiers.difference(KeyModifiers::SHIFT);
        self.bindings
            .iter()
            .rev()
            .find(|(code, bound, _)| *code == event.code && *bound == mods)
            .map(|(_, _, msg)| msg.clone())
    }

    /// Extend this keymap with another. The other keymap's bindings take precedence.
    pub fn extend(mut self, other: Self) -> Self {
        self.bindings.extend(other.bindings);
        self
    }

    /// Find the first key bound to a specific message.
    pub fn find_key(&self, message: &Message) -> Option<(KeyCode, KeyModifiers)> {
        self.bindings
            .iter()
            .find(|(_, _, msg)| msg == message)
            .map(|(code, mods, _)| (*code, *mods))
    }
}

/// Format a key binding for display in help text.
pub fn format_key(code: KeyCode, mods: KeyModifiers) -> String {
    let key_str = match code {
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Up => "↑".to_string(),
        KeyCode::Down => "↓".to_string(),
        KeyCode::Backspace => "Bksp".to_string(),
        _ => "?".to_string(),
    };
    if mods.contains(KeyModifiers::CONTROL) {
        format!("C-{key_str}")
    } else {
        key_str
    }
}

impl Default for Keymap {
    fn default() -> Self {
        Self::new()
    }
}

/// Keys that work whenever no editor or prompt has the keyboard.
pub fn global_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Char('q'), Message::Quit)
        .bind_ctrl(KeyCode::Char('c'), Message::Quit)
        .bind(KeyCode::Char('?'), Message::ToggleHelp)
}

/// Traversal keys. Lookup goes through [`command_for_key`], which applies the
/// modifier rules; this map exists so help text can show the keys.
pub fn navigation_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Char('j'), Message::Navigate(Command::NextComment))
        .bind(KeyCode::Down, Message::Navigate(Command::NextComment))
        .bind(KeyCode::Char('k'), Message::Navigate(Command::PreviousComment))
        .bind(KeyCode::Up, Message::Navigate(Command::PreviousComment))
        .bind(KeyCode::Char('J'), Message::Navigate(Command::NextSibling))
        .bind(KeyCode::Char('K'), Message::Navigate(Command::PreviousSibling))
        .bind(KeyCode::Char('h'), Message::Navigate(Command::GoToParent))
        .bind(KeyCode::Char('H'), Message::Navigate(Command::GoToRoot))
        .bind(KeyCode::Enter, Message::Navigate(Command::ToggleExpand))
}

/// Comment actions.
pub fn comments_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Char('s'), Message::ToggleOrder)
        .bind(KeyCode::Char('r'), Message::Reply)
        .bind(KeyCode::Char('R'), Message::NewComment)
        .bind(KeyCode::Char('e'), Message::Edit)
        .bind(KeyCode::Char('d'), Message::Delete)
        .bind(KeyCode::Char('x'), Message::OpenLink)
        .bind(KeyCode::Char('p'), Message::OpenProfile)
}

/// Keys for an open editor. Plain characters are typed, see [`handle_key`].
pub fn editor_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Esc, Message::CancelEditor)
        .bind(KeyCode::Enter, Message::EditorNewline)
        .bind(KeyCode::Backspace, Message::EditorBackspace)
        .bind_ctrl(KeyCode::Char('s'), Message::SubmitEditor)
        .bind_ctrl(KeyCode::Char('c'), Message::Quit)
}

fn prompt_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Char('y'), Message::Confirm)
        .bind(KeyCode::Enter, Message::Confirm)
        .bind(KeyCode::Char('n'), Message::Dismiss)
        .bind(KeyCode::Esc, Message::Dismiss)
        .bind_ctrl(KeyCode::Char('c'), Message::Dismiss)
}

/// Keybindings for the help overlay popup.
fn help_overlay_keymap() -> Keymap {
    Keymap::new()
        .bind(KeyCode::Char('?'), Message::ToggleHelp)
        .bind(KeyCode::Esc, Message::ToggleHelp)
        .bind(KeyCode::Char('q'), Message::ToggleHelp)
        .bind_ctrl(KeyCode::Char('c'), Message::ToggleHelp)
}

pub fn handle_key(key: KeyEvent, app: &App) -> Option<Message> {
    if key.kind == KeyEventKind::Release {
        return None;
    }

    // A prompt takes every key until answered
    match &app.prompt {
        Some(prompt) if prompt.is_question() => return prompt_keymap().get(&key),
        Some(_) => return Some(Message::Dismiss),
        None => {}
    }

    if app.show_help {
        return help_overlay_keymap().get(&key);
    }

    // An open editor is nested inside the comment: traversal never sees its keys
    if app.editing() {
        if let Some(msg) = editor_keymap().get(&key) {
            return Some(msg);
        }
        return match key.code {
            KeyCode::Char(c)
                if !key
                    .modifiers
                    .intersects(KeyModifiers::CONTROL | KeyModifiers::ALT) =>
            {
                Some(Message::EditorInput(c))
            }
            _ => None,
        };
    }

    if let Some(msg) = global_keymap().get(&key) {
        return Some(msg);
    }

    if let Some(command) = command_for_key(&key) {
        return Some(Message::Navigate(command));
    }

    comments_keymap().get(&key)
}
