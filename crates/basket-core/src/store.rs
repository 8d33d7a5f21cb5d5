//! Local list storage seam used by the sync session.

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::error::Result;
use crate::models::{ListDocument, ListId};

/// Keyed storage for the local replica of every list.
///
/// Writes replace the whole document; no transactions beyond single-record
/// atomicity are expected.
#[async_trait]
pub trait ListStore: Send + Sync {
    async fn get(&self, id: &ListId) -> Result<Option<ListDocument>>;

    /// All stored lists, most recently updated first
    async fn get_all(&self) -> Result<Vec<ListDocument>>;

    async fn put(&self, doc: &ListDocument) -> Result<()>;

    async fn delete(&self, id: &ListId) -> Result<()>;

    /// The list the user last opened, if remembered
    async fn active_list(&self) -> Result<Option<ListId>>;

    async fn set_active_list(&self, id: Option<&ListId>) -> Result<()>;
}

#[async_trait]
impl<T: ListStore + ?Sized> ListStore for Arc<T> {
    async fn get(&self, id: &ListId) -> Result<Option<ListDocument>> {
        (**self).get(id).await
    }

    async fn get_all(&self) -> Result<Vec<ListDocument>> {
        (**self).get_all().await
    }

    async fn put(&self, doc: &ListDocument) -> Result<()> {
        (**self).put(doc).await
    }

    async fn delete(&self, id: &ListId) -> Result<()> {
        (**self).delete(id).await
    }

    async fn active_list(&self) -> Result<Option<ListId>> {
        (**self).active_list().await
    }

    async fn set_active_list(&self, id: Option<&ListId>) -> Result<()> {
        (**self).set_active_list(id).await
    }
}

/// In-process store for tests and embedding callers
#[derive(Debug, Default)]
pub struct MemoryListStore {
    lists: Mutex<HashMap<ListId, ListDocument>>,
    active: Mutex<Option<ListId>>,
    read_only: AtomicBool,
}

impl MemoryListStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail, as a full or locked disk would
    pub fn set_read_only(&self, read_only: bool) {
        self.read_only.store(read_only, Ordering::SeqCst);
    }

    fn ensure_writable(&self) -> Result<()> {
        if self.read_only.load(Ordering::SeqCst) {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "list store is read-only").into())
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ListStore for MemoryListStore {
    async fn get(&self, id: &ListId) -> Result<Option<ListDocument>> {
        Ok(self.lists.lock().await.get(id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<ListDocument>> {
        let mut lists = self.lists.lock().await.values().cloned().collect::<Vec<_>>();
        lists.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then_with(|| a.id.cmp(&b.id)));
        Ok(lists)
    }

    async fn put(&self, doc: &ListDocument) -> Result<()> {
        self.ensure_writable()?;
        self.lists.lock().await.insert(doc.id.clone(), doc.clone());
        Ok(())
    }

    async fn delete(&self, id: &ListId) -> Result<()> {
        self.ensure_writable()?;
        self.lists.lock().await.remove(id);
        Ok(())
    }

    async fn active_list(&self) -> Result<Option<ListId>> {
        Ok(self.active.lock().await.clone())
    }

    async fn set_active_list(&self, id: Option<&ListId>) -> Result<()> {
        *self.active.lock().await = id.cloned();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn memory_store_round_trips_and_orders_newest_first() {
        let store = MemoryListStore::new();
        let mut older = ListDocument::new("Older");
        older.updated_at = 1;
        let mut newer = ListDocument::new("Newer");
        newer.updated_at = 2;
        store.put(&older).await.unwrap();
        store.put(&newer).await.unwrap();

        assert_eq!(store.get(&older.id).await.unwrap(), Some(older.clone()));
        let titles = store
            .get_all()
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.title)
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["Newer".to_string(), "Older".to_string()]);

        store.delete(&older.id).await.unwrap();
        assert!(store.get(&older.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn memory_store_remembers_active_list() {
        let store = MemoryListStore::new();
        assert!(store.active_list().await.unwrap().is_none());

        let id = ListId::from("list-1");
        store.set_active_list(Some(&id)).await.unwrap();
        assert_eq!(store.active_list().await.unwrap(), Some(id));
    }

    #[tokio::test]
    async fn read_only_store_rejects_writes() {
        let store = MemoryListStore::new();
        store.set_read_only(true);
        let doc = ListDocument::new("Weekly");

        assert!(matches!(store.put(&doc).await, Err(crate::Error::Io(_))));
        assert!(store.get(&doc.id).await.unwrap().is_none());

        store.set_read_only(false);
        store.put(&doc).await.unwrap();
    }
}
