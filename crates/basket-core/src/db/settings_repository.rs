//! Local key/value settings that never replicate

use crate::error::Result;
use crate::models::ListId;
use libsql::Connection;

const ACTIVE_LIST_KEY: &str = "active_list_id";

/// Trait for settings storage operations (async)
#[allow(async_fn_in_trait)]
pub trait SettingsRepository {
    /// The list the user last opened
    async fn active_list(&self) -> Result<Option<ListId>>;

    /// Remember (or forget, with `None`) the active list
    async fn set_active_list(&self, id: Option<&ListId>) -> Result<()>;
}

/// libSQL implementation of `SettingsRepository`
pub struct LibSqlSettingsRepository<'a> {
    conn: &'a Connection,
}

impl<'a> LibSqlSettingsRepository<'a> {
    /// Create a new repository with the given connection
    pub const fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }
}

impl SettingsRepository for LibSqlSettingsRepository<'_> {
    async fn active_list(&self) -> Result<Option<ListId>> {
        Ok(self
            .get_setting(ACTIVE_LIST_KEY)
            .await?
            .filter(|value| !value.trim().is_empty())
            .map(|value| ListId::from(value.as_str())))
    }

    async fn set_active_list(&self, id: Option<&ListId>) -> Result<()> {
        match id {
            Some(id) => self.set_setting(ACTIVE_LIST_KEY, id.as_str()).await,
            None => self.remove_setting(ACTIVE_LIST_KEY).await,
        }
    }
}

impl LibSqlSettingsRepository<'_> {
    async fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let mut rows = self
            .conn
            .query("SELECT value FROM settings WHERE key = ?", [key])
            .await?;

        if let Some(row) = rows.next().await? {
            let value: String = row.get(0)?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                "INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)",
                [key, value],
            )
            .await?;
        Ok(())
    }

    async fn remove_setting(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM settings WHERE key = ?", [key])
            .await?;
        Ok(())
    }
}
