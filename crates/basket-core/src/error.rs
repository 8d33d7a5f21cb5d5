//! Error types for basket-core

use thiserror::Error;

/// Result type alias using basket-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in basket-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Referenced list, category, or item does not exist (or is tombstoned)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation would break a document invariant (e.g. a cyclic category move)
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Network or authorization failure talking to the remote file host
    #[error("Remote unavailable: {0}")]
    RemoteUnavailable(String),

    /// Push or share attempted before the document has a remote file
    #[error("Sync metadata missing: {0}")]
    SyncMetadataMissing(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// libSQL error
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether the error came from the remote side and is worth retrying later.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::RemoteUnavailable(_))
    }
}
