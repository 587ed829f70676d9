//! Per-project store pool.
//!
//! One cache bucket per project root: created on project open, destroyed
//! when the project's cache is cleared or its root deleted. The pool owns
//! that mapping for SQLite-backed stores.

use std::collections::HashMap;
use std::path::PathBuf;

use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

use super::connection::CacheDb;
use crate::Error;

/// Owns the mapping from project root to open cache store.
///
/// Stores are opened on demand and handles are reused. Store operations
/// run on each connection's background thread, so sharing a handle across
/// tasks needs no further locking.
pub struct CachePool {
    cache_dir: PathBuf,
    stores: RwLock<HashMap<String, CacheDb>>,
}

impl CachePool {
    /// Create a pool rooted at a cache directory.
    ///
    /// The directory is created lazily on the first store open.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self { cache_dir: cache_dir.into(), stores: RwLock::new(HashMap::new()) }
    }

    /// Store file name for a project root.
    ///
    /// Project roots are arbitrary paths; the name is a digest prefix so
    /// two roots never collide and the name stays filesystem-safe.
    pub fn store_name(project_root: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(project_root.as_bytes());
        let digest = hex::encode(hasher.finalize());
        format!("vfs-{}.sqlite", &digest[..16])
    }

    fn store_path(&self, project_root: &str) -> PathBuf {
        self.cache_dir.join(Self::store_name(project_root))
    }

    /// Get the store for a project root, opening it if needed.
    pub async fn open(&self, project_root: &str) -> Result<CacheDb, Error> {
        if project_root.is_empty() {
            return Err(Error::InvalidInput("project root cannot be empty".into()));
        }

        {
            let stores = self.stores.read().await;
            if let Some(db) = stores.get(project_root) {
                return Ok(db.clone());
            }
        }

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(Error::StoreIo)?;

        let db = CacheDb::open(self.store_path(project_root)).await?;
        db.record_project_root(project_root).await?;

        tracing::debug!(
            project_root,
            store = %Self::store_name(project_root),
            "opened live-dev cache store"
        );

        let mut stores = self.stores.write().await;
        // Another task may have opened the same store while we were; keep
        // the first handle so both tasks share one connection.
        Ok(stores.entry(project_root.to_string()).or_insert(db).clone())
    }

    /// Delete every entry in a project's store. Returns the number deleted.
    pub async fn clear(&self, project_root: &str) -> Result<u64, Error> {
        let db = self.open(project_root).await?;
        db.clear_responses().await
    }

    /// Drop a project's store entirely, deleting the backing files.
    pub async fn destroy(&self, project_root: &str) -> Result<(), Error> {
        let mut stores = self.stores.write().await;
        stores.remove(project_root);
        drop(stores);

        let base = self.store_path(project_root);
        for suffix in ["", "-wal", "-shm"] {
            let mut path = base.clone().into_os_string();
            path.push(suffix);
            match tokio::fs::remove_file(PathBuf::from(path)).await {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => return Err(Error::StoreIo(err)),
            }
        }

        tracing::debug!(project_root, "destroyed live-dev cache store");
        Ok(())
    }
}
