use std::path::PathBuf;

use basket_core::{ListMode, ResolutionStrategy, ShareRole};
use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

#[derive(Parser)]
#[command(name = "basket")]
#[command(about = "Shopping lists that sync through a shared folder")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Optional directory acting as the remote file host
    #[arg(long, global = true, value_name = "DIR")]
    pub remote_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new list and make it active
    New {
        /// List title
        title: Vec<String>,
    },
    /// Show stored lists
    Lists {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Switch the active list
    Use {
        /// List ID or unique ID prefix
        id: String,
    },
    /// Print the active list
    Show {
        /// Hide checked items
        #[arg(long)]
        hide_checked: bool,
    },
    /// Rename the active list
    Rename {
        /// New title
        title: Vec<String>,
    },
    /// Switch the active list between edit and shopping mode
    Mode {
        #[arg(value_enum)]
        mode: ModeArg,
    },
    /// Delete a list locally (its remote file is kept)
    Delete {
        /// List ID or unique ID prefix
        id: String,
    },
    /// Manage categories of the active list
    #[command(subcommand, alias = "cat")]
    Category(CategoryCommands),
    /// Manage items of the active list
    #[command(subcommand)]
    Item(ItemCommands),
    /// Synchronize the active list with the remote folder
    Sync {
        /// How to resolve a conflict if one is found
        #[arg(long, value_enum)]
        strategy: Option<StrategyArg>,
    },
    /// Show sync status of the active list
    Status,
    /// Share the active list and print its link
    Share {
        /// Access granted to anyone with the link
        #[arg(long, value_enum)]
        role: Option<RoleArg>,
    },
    /// Import a shared list from a link or file ID
    Import {
        /// Share link or remote file ID
        link: String,
    },
    /// List application files on the remote
    Remote {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Keep the active list synced in the background until interrupted
    Watch {
        /// Poll interval in seconds (defaults to the configured interval)
        #[arg(long, value_name = "SECS")]
        interval: Option<u64>,
    },
    /// Export the active list
    Export {
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Manage sign-in state
    #[command(subcommand)]
    Auth(AuthCommands),
    /// Manage CLI configuration
    #[command(subcommand)]
    Config(ConfigCommands),
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum CategoryCommands {
    /// Add a category
    Add {
        /// Category name
        name: String,
        /// Parent category name or ID prefix (defaults to the root)
        #[arg(long)]
        parent: Option<String>,
    },
    /// Rename a category
    Rename {
        /// Category name or ID prefix
        category: String,
        /// New name
        name: String,
    },
    /// Move a category under another one
    Move {
        /// Category name or ID prefix
        category: String,
        /// New parent category name or ID prefix
        parent: String,
    },
    /// Delete a category, its subcategories, and move their items to the root
    #[command(alias = "rm")]
    Delete {
        /// Category name or ID prefix
        category: String,
    },
}

#[derive(Subcommand)]
pub enum ItemCommands {
    /// Add an item
    Add {
        /// Item label
        label: Vec<String>,
        /// Quantity, e.g. "2" or "a few"
        #[arg(short, long)]
        qty: Option<String>,
        /// Unit, e.g. "bags"
        #[arg(short, long)]
        unit: Option<String>,
        /// Category name or ID prefix (defaults to the root)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Edit an item
    Edit {
        /// Item ID prefix or exact label
        item: String,
        /// New label
        #[arg(long)]
        label: Option<String>,
        /// New quantity (empty clears it)
        #[arg(short, long)]
        qty: Option<String>,
        /// New unit (empty clears it)
        #[arg(short, long)]
        unit: Option<String>,
        /// Move to category (name or ID prefix)
        #[arg(short, long)]
        category: Option<String>,
    },
    /// Toggle an item's checked state
    Check {
        /// Item ID prefix or exact label
        item: String,
    },
    /// Delete an item
    #[command(alias = "rm")]
    Delete {
        /// Item ID prefix or exact label
        item: String,
    },
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Sign in with an access token
    Login {
        /// Access token (generated locally when omitted)
        #[arg(long)]
        token: Option<String>,
    },
    /// Sign out
    Logout,
    /// Show sign-in state
    Status,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Write CLI configuration
    Init {
        /// Directory acting as the remote file host
        #[arg(long, value_name = "DIR")]
        remote_dir: Option<PathBuf>,
        /// Local database path
        #[arg(long, value_name = "PATH")]
        db_path: Option<PathBuf>,
        /// Remote folder holding list files
        #[arg(long)]
        folder_name: Option<String>,
        /// Background poll interval in seconds
        #[arg(long, value_name = "SECS")]
        poll_interval: Option<u64>,
    },
    /// Print the effective configuration
    Show,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

impl From<ExportFormat> for basket_core::export::ExportFormat {
    fn from(format: ExportFormat) -> Self {
        match format {
            ExportFormat::Json => Self::Json,
            ExportFormat::Markdown => Self::Markdown,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ModeArg {
    Edit,
    Shopping,
}

impl From<ModeArg> for ListMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Edit => Self::Edit,
            ModeArg::Shopping => Self::Shopping,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StrategyArg {
    /// Discard local changes
    Remote,
    /// Overwrite the remote copy
    Mine,
    /// Merge both sides
    Merge,
}

impl From<StrategyArg> for ResolutionStrategy {
    fn from(strategy: StrategyArg) -> Self {
        match strategy {
            StrategyArg::Remote => Self::Remote,
            StrategyArg::Mine => Self::Mine,
            StrategyArg::Merge => Self::Merge,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum RoleArg {
    Reader,
    Writer,
}

impl From<RoleArg> for ShareRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Reader => Self::Reader,
            RoleArg::Writer => Self::Writer,
        }
    }
}
