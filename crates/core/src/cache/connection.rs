//! Store connection management with pragma configuration.
//!
//! This module handles opening a store's SQLite file, applying the pragmas
//! required for performance and concurrency (WAL mode), and running
//! migrations.

use super::migrations;
use crate::Error;
use std::path::Path;
use tokio_rusqlite::rusqlite;
use tokio_rusqlite::{Connection, params};

/// One per-project cache store.
///
/// Wraps a tokio-rusqlite Connection that runs store operations on a
/// background thread. Handles are cheap to clone.
#[derive(Clone, Debug)]
pub struct CacheDb {
    pub(crate) conn: Connection,
}

impl CacheDb {
    /// Open a store at the specified path.
    ///
    /// Creates the file if it doesn't exist, applies performance pragmas,
    /// and runs any pending migrations.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        let conn = Connection::open(path).await.map_err(|e| Error::Database(e.into()))?;
        Self::initialize(conn).await
    }

    /// Open an in-memory store for testing.
    pub async fn open_in_memory() -> Result<Self, Error> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| Error::Database(e.into()))?;
        Self::initialize(conn).await
    }

    async fn initialize(conn: Connection) -> Result<Self, Error> {
        conn.call(|conn| {
            conn.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;
                 PRAGMA temp_store=MEMORY;
                 PRAGMA foreign_keys=ON;",
            )?;
            Ok(())
        })
        .await
        .map_err(Error::Database)?;

        migrations::run(&conn).await?;

        Ok(Self { conn })
    }

    /// Record which project root this store belongs to.
    ///
    /// First writer wins; reopening an existing store keeps the original
    /// provenance row.
    pub async fn record_project_root(&self, project_root: &str) -> Result<(), Error> {
        let root = project_root.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO store_meta (key, value) VALUES ('project_root', ?1)",
                    params![root],
                )?;
                conn.execute(
                    "INSERT OR IGNORE INTO store_meta (key, value) VALUES ('created_at', ?1)",
                    params![now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Project root recorded at creation, if any.
    pub async fn project_root(&self) -> Result<Option<String>, Error> {
        self.conn
            .call(|conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT value FROM store_meta WHERE key = 'project_root'",
                    [],
                    |row| row.get(0),
                );
                match result {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_in_memory() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let version = db
            .conn
            .call(|conn| conn.query_row("SELECT sqlite_version()", [], |row| row.get::<_, String>(0)))
            .await
            .unwrap();
        assert!(!version.is_empty());
    }

    #[tokio::test]
    async fn test_project_root_unset() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.project_root().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_project_root_first_writer_wins() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.record_project_root("/projects/alpha").await.unwrap();
        db.record_project_root("/projects/beta").await.unwrap();
        assert_eq!(db.project_root().await.unwrap().as_deref(), Some("/projects/alpha"));
    }
}
