//! Schema migrations for the local list store
//!
//! Every entry in [`MIGRATIONS`] runs once, in order, inside its own
//! transaction. Applied versions are recorded in `schema_version`.

use crate::error::Result;
use libsql::Connection;

/// One schema step: target version plus the statements that reach it
struct Migration {
    version: i32,
    statements: &'static [&'static str],
}

const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    statements: &[
        // One row per list; the full document lives in `body`
        "CREATE TABLE IF NOT EXISTS lists (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            updated_at INTEGER NOT NULL,
            body TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_lists_updated ON lists(updated_at DESC)",
        "CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
    ],
}];

/// Latest schema version known to this build
pub const fn latest_version() -> i32 {
    match MIGRATIONS.last() {
        Some(migration) => migration.version,
        None => 0,
    }
}

/// Bring the schema up to [`latest_version`]
pub async fn run(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY)",
        (),
    )
    .await?;

    let current = applied_version(conn).await?;
    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        apply(conn, migration).await?;
        tracing::info!("Migrated list store to schema v{}", migration.version);
    }

    Ok(())
}

async fn applied_version(conn: &Connection) -> Result<i32> {
    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_version", ())
        .await?;
    match rows.next().await? {
        Some(row) => Ok(row.get(0)?),
        None => Ok(0),
    }
}

async fn apply(conn: &Connection, migration: &Migration) -> Result<()> {
    let tx = conn.transaction().await?;
    for stmt in migration.statements {
        tx.execute(stmt, ()).await?;
    }
    tx.execute(
        "INSERT INTO schema_version (version) VALUES (?)",
        [migration.version],
    )
    .await?;
    tx.commit().await?;
    Ok(())
}
