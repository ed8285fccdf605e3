use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::api::CommentSort;

#[derive(Parser, Debug)]
#[command(name = "acx")]
#[command(about = "A terminal viewer for threaded Substack comments", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Comments JSON file (an array of comments, or an object with a `comments` array)
    pub file: Option<PathBuf>,

    /// Order the comments in FILE are stored in
    #[arg(long, value_enum, default_value_t = SortArg::OldestFirst)]
    pub sort: SortArg,

    /// Id of the logged-in user (overrides settings)
    #[arg(long, value_name = "ID")]
    pub user_id: Option<u64>,

    /// Post id; enables commenting through the live API
    #[arg(long, value_name = "ID", conflicts_with = "demo")]
    pub post_id: Option<u64>,

    /// Site root for the live API (default: settings, then astralcodexten.com)
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Accept comment changes locally without talking to a server
    #[arg(long)]
    pub demo: bool,

    /// Print the thread as plain text instead of opening the viewer
    #[arg(long)]
    pub print: bool,

    /// Wrap width for --print
    #[arg(long, default_value_t = 80, requires = "print")]
    pub width: usize,

    /// Custom config directory (default: ~/.config/acx)
    #[arg(long, value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Enable verbose logging (prints log path, sets DEBUG level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
pub enum SortArg {
    OldestFirst,
    MostRecentFirst,
}

impl From<SortArg> for CommentSort {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::OldestFirst => Self::OldestFirst,
            SortArg::MostRecentFirst => Self::MostRecentFirst,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage comment options
    Options(OptionsArgs),
}

#[derive(Args, Debug)]
pub struct OptionsArgs {
    #[command(subcommand)]
    pub command: OptionsCommands,
}

#[derive(Subcommand, Debug)]
pub enum OptionsCommands {
    /// List options with their descriptions and current values
    List,
    /// Change an option and save it to the settings file
    Set {
        /// Option key, e.g. collapseDepth
        key: String,
        /// New value
        value: String,
    },
}
