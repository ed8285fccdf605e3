pub mod api;
pub mod app;
pub mod cli;
pub mod comment_tree;
pub mod date;
pub mod event;
pub mod help;
pub mod keys;
pub mod logging;
pub mod navigation;
pub mod options;
pub mod print;
pub mod profile;
pub mod session;
pub mod settings;
pub mod text;
pub mod tui;
pub mod views;
pub mod widgets;

#[cfg(test)]
mod test_utils;
