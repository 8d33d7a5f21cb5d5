//! basket-core - Core library for Basket
//!
//! This crate contains the shopping list document model, the merge engine and
//! conflict summarizer, and the sync controller that keeps a local replica in
//! step with one JSON file per list on a remote file host.

pub mod auth;
pub mod config;
pub mod conflict;
pub mod db;
pub mod error;
pub mod export;
pub mod merge;
pub mod models;
pub mod remote;
pub mod services;
pub mod state;
pub mod store;
pub mod sync;
pub mod tree;
pub mod util;

pub use auth::{AccessToken, CredentialProvider, StaticCredentials};
pub use config::SyncSettings;
pub use conflict::{summarize_conflict, ConflictSummary, EntityDiff};
pub use error::{Error, Result};
pub use merge::{merge_docs, merge_entities};
pub use models::{
    Category, CategoryId, ConflictRecord, Item, ItemId, ItemPatch, ListDocument, ListId,
    ListMode, NewItem, ResolutionStrategy,
};
pub use remote::{FileRef, FolderRemote, MemoryRemote, RemoteFileService, ShareRole};
pub use services::LibSqlListStore;
pub use state::SyncState;
pub use store::{ListStore, MemoryListStore};
pub use sync::{
    spawn_poller, PollerHandle, SessionStatus, SyncController, SyncOutcome, SyncSession,
    SyncStatus, SyncTrigger,
};
pub use tree::{build_tree, flatten_tree, CategoryTree};
