//! List repository implementation

use crate::error::{Error, Result};
use crate::models::{ListDocument, ListId};
use libsql::{params, Connection, Row};

/// Trait for list storage operations (async)
#[allow(async_fn_in_trait)]
pub trait ListRepository {
    /// Get a list by ID
    async fn get(&self, id: &ListId) -> Result<Option<ListDocument>>;

    /// All lists, most recently updated first
    async fn list(&self) -> Result<Vec<ListDocument>>;

    /// Insert or replace a list
    async fn put(&self, doc: &ListDocument) -> Result<()>;

    /// Remove a list; missing ids are not an error
    async fn delete(&self, id: &ListId) -> Result<()>;
}

/// libSQL implementation of `ListRepository`
pub struct LibSqlListRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlListRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Parse a list from its stored JSON body
    fn parse_list(row: &Row) -> Result<ListDocument> {
        let body: String = row.get(0)?;
        let value: serde_json::Value = serde_json::from_str(&body)?;
        ListDocument::from_json(value)
    }
}

impl ListRepository for LibSqlListRepository<'_> {
    async fn get(&self, id: &ListId) -> Result<Option<ListDocument>> {
        let mut rows = self
            .conn
            .query("SELECT body FROM lists WHERE id = ?", [id.as_str()])
            .await?;

        match rows.next().await? {
            Some(row) => Self::parse_list(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<ListDocument>> {
        let mut rows = self
            .conn
            .query("SELECT body FROM lists ORDER BY updated_at DESC, id ASC", ())
            .await?;

        let mut lists = Vec::new();
        while let Some(row) = rows.next().await? {
            match Self::parse_list(&row) {
                Ok(doc) => lists.push(doc),
                Err(Error::Serialization(e)) => {
                    tracing::warn!("Skipping unreadable stored list: {}", e);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(lists)
    }

    async fn put(&self, doc: &ListDocument) -> Result<()> {
        let body = serde_json::to_string(doc)?;
        self.conn
            .execute(
                "INSERT INTO lists (id, title, updated_at, body) VALUES (?, ?, ?, ?)
                 ON CONFLICT(id) DO UPDATE SET
                     title = excluded.title,
                     updated_at = excluded.updated_at,
                     body = excluded.body",
                params![doc.id.as_str(), doc.title.as_str(), doc.updated_at, body],
            )
            .await?;
        Ok(())
    }

    async fn delete(&self, id: &ListId) -> Result<()> {
        self.conn
            .execute("DELETE FROM lists WHERE id = ?", [id.as_str()])
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::NewItem;
    use pretty_assertions::assert_eq;

    async fn setup() -> Database {
        Database::open_in_memory().await.unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_and_get() {
        let db = setup().await;
        let repo = LibSqlListRepository::new(db.connection());

        let mut doc = ListDocument::new("Weekly");
        doc.add_item(NewItem::new("Milk").with_quantity("2")).unwrap();
        repo.put(&doc).await.unwrap();

        let fetched = repo.get(&doc.id).await.unwrap().unwrap();
        assert_eq!(fetched, doc);
        assert!(repo.get(&ListId::new()).await.unwrap().is_none());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_put_replaces_existing() {
        let db = setup().await;
        let repo = LibSqlListRepository::new(db.connection());

        let mut doc = ListDocument::new("Weekly");
        repo.put(&doc).await.unwrap();
        doc.rename("Party");
        repo.put(&doc).await.unwrap();

        let lists = repo.list().await.unwrap();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].title, "Party");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_list_newest_first() {
        let db = setup().await;
        let repo = LibSqlListRepository::new(db.connection());

        let mut older = ListDocument::new("Older");
        older.updated_at = 100;
        let mut newer = ListDocument::new("Newer");
        newer.updated_at = 200;
        repo.put(&older).await.unwrap();
        repo.put(&newer).await.unwrap();

        let titles = repo
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|doc| doc.title)
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["Newer".to_string(), "Older".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_delete() {
        let db = setup().await;
        let repo = LibSqlListRepository::new(db.connection());

        let doc = ListDocument::new("To delete");
        repo.put(&doc).await.unwrap();
        repo.delete(&doc.id).await.unwrap();
        repo.delete(&doc.id).await.unwrap();

        assert!(repo.get(&doc.id).await.unwrap().is_none());
        assert!(repo.list().await.unwrap().is_empty());
    }
}
