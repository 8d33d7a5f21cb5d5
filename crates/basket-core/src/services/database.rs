//! Shared database service wrapper used across clients.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::db::{
    Database, LibSqlListRepository, LibSqlSettingsRepository, ListRepository, SettingsRepository,
};
use crate::models::{ListDocument, ListId};
use crate::store::ListStore;
use crate::Result;

/// Thread-safe libSQL-backed [`ListStore`].
#[derive(Clone)]
pub struct LibSqlListStore {
    db: Arc<Mutex<Database>>,
    db_path: Option<PathBuf>,
}

impl LibSqlListStore {
    /// Open a store at the given filesystem path, creating parent directories.
    pub async fn open_path(db_path: impl Into<PathBuf>) -> Result<Self> {
        let db_path = db_path.into();
        tracing::info!("Opening local list store at {}", db_path.display());
        let db = Database::open(&db_path).await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: Some(db_path),
        })
    }

    /// Open an in-memory store (primarily for tests).
    pub async fn open_in_memory() -> Result<Self> {
        let db = Database::open_in_memory().await?;
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            db_path: None,
        })
    }

    /// Filesystem location, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }
}

#[async_trait]
impl ListStore for LibSqlListStore {
    async fn get(&self, id: &ListId) -> Result<Option<ListDocument>> {
        let db = self.db.lock().await;
        let repo = LibSqlListRepository::new(db.connection());
        repo.get(id).await
    }

    async fn get_all(&self) -> Result<Vec<ListDocument>> {
        let db = self.db.lock().await;
        let repo = LibSqlListRepository::new(db.connection());
        repo.list().await
    }

    async fn put(&self, doc: &ListDocument) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlListRepository::new(db.connection());
        repo.put(doc).await
    }

    async fn delete(&self, id: &ListId) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlListRepository::new(db.connection());
        repo.delete(id).await
    }

    async fn active_list(&self) -> Result<Option<ListId>> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.active_list().await
    }

    async fn set_active_list(&self, id: Option<&ListId>) -> Result<()> {
        let db = self.db.lock().await;
        let repo = LibSqlSettingsRepository::new(db.connection());
        repo.set_active_list(id).await
    }
}
