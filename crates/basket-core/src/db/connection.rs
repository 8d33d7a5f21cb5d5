//! Local libSQL database handle

use std::path::Path;

use libsql::{Builder, Connection};

use super::migrations;
use crate::error::Result;

const MEMORY: &str = ":memory:";

/// Open connection to the on-device list store, migrated to the latest schema
pub struct Database {
    // Dropping the database closes every connection made from it
    _db: libsql::Database,
    conn: Connection,
}

impl Database {
    /// Open (or create) the store file at `path`
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        Self::connect(&path.to_string_lossy()).await
    }

    pub async fn open_in_memory() -> Result<Self> {
        Self::connect(MEMORY).await
    }

    async fn connect(location: &str) -> Result<Self> {
        let db = Builder::new_local(location).build().await?;
        let conn = db.connect()?;

        if location != MEMORY {
            // Returns the resulting mode as a row, so it goes through query
            conn.query("PRAGMA journal_mode = WAL", ()).await?;
        }
        conn.execute("PRAGMA synchronous = NORMAL", ()).await?;
        migrations::run(&conn).await?;

        tracing::debug!("Opened list store at {location}");
        Ok(Self { _db: db, conn })
    }

    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
