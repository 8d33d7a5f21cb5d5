use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] basket_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("List title cannot be empty")]
    EmptyTitle,
    #[error("Item label cannot be empty")]
    EmptyLabel,
    #[error("No active list. Create one with `basket new <title>` or pick one with `basket use <id>`")]
    NoActiveList,
    #[error("List not found for id/prefix: {0}")]
    ListNotFound(String),
    #[error("Category not found: {0}")]
    CategoryNotFound(String),
    #[error("Item not found: {0}")]
    ItemNotFound(String),
    #[error("{0}")]
    Ambiguous(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Remote is not configured. Run `basket config init --remote-dir <DIR>` or set BASKET_REMOTE_DIR."
    )]
    RemoteNotConfigured,
    #[error("Conflict detected; rerun with `basket sync --strategy <remote|mine|merge>`")]
    ConflictUnresolved,
}
