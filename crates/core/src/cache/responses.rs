//! Response record CRUD and the read seam the interceptor consumes.
//!
//! Records are keyed by the stripped URL. The interceptor is a pure
//! reader; population and purging go through the write operations here,
//! driven by the editor's file-sync side.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

use super::connection::CacheDb;
use super::key::cache_key;
use crate::Error;

/// A stored response, as recorded by the cache writer.
///
/// `url` is always the stripped form; the constructor strips, so the key
/// invariant holds regardless of what the writer passes in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    pub url: String,
    pub status: u16,
    pub content_type: Option<String>,
    pub headers_json: Option<String>,
    pub body: Vec<u8>,
    pub stored_at: String,
}

impl CachedResponse {
    /// Build a record for a URL, stripping the key.
    pub fn new(url: &str, status: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            url: cache_key(url).to_string(),
            status,
            content_type,
            headers_json: None,
            body,
            stored_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Attach recorded response headers.
    pub fn with_headers(mut self, headers: &[(String, String)]) -> Self {
        self.headers_json = serde_json::to_string(headers).ok();
        self
    }

    /// Recorded headers as name/value pairs.
    pub fn headers(&self) -> Vec<(String, String)> {
        self.headers_json
            .as_deref()
            .and_then(|json| serde_json::from_str(json).ok())
            .unwrap_or_default()
    }
}

/// Read interface consumed by the interceptor.
#[async_trait]
pub trait ResponseStore: Send + Sync {
    /// Look up a record under a stripped-URL key.
    async fn lookup(&self, url: &str) -> Result<Option<CachedResponse>, Error>;
}

#[async_trait]
impl ResponseStore for CacheDb {
    async fn lookup(&self, url: &str) -> Result<Option<CachedResponse>, Error> {
        self.get_response(url).await
    }
}

impl CacheDb {
    /// Insert or update a response record.
    ///
    /// Uses UPSERT semantics: inserts if the key doesn't exist, replaces
    /// all fields if it does.
    pub async fn upsert_response(&self, record: &CachedResponse) -> Result<(), Error> {
        let record = record.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO responses (url, status, content_type, headers_json, body, stored_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(url) DO UPDATE SET
                        status = excluded.status,
                        content_type = excluded.content_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        cache_key(&record.url),
                        record.status as i64,
                        &record.content_type,
                        &record.headers_json,
                        &record.body,
                        &record.stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a record by URL.
    ///
    /// The key is stripped before the query; returns None if no entry
    /// exists.
    pub async fn get_response(&self, url: &str) -> Result<Option<CachedResponse>, Error> {
        let key = cache_key(url).to_string();
        self.conn
            .call(move |conn| -> Result<Option<CachedResponse>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT url, status, content_type, headers_json, body, stored_at
                     FROM responses WHERE url = ?1",
                )?;

                let result = stmt.query_row(params![key], |row| {
                    Ok(CachedResponse {
                        url: row.get(0)?,
                        status: row.get::<_, i64>(1)? as u16,
                        content_type: row.get(2)?,
                        headers_json: row.get(3)?,
                        body: row.get(4)?,
                        stored_at: row.get(5)?,
                    })
                });

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Remove one record. Returns true if an entry existed.
    pub async fn remove_response(&self, url: &str) -> Result<bool, Error> {
        let key = cache_key(url).to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM responses WHERE url = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every record. Returns the number of deleted entries.
    pub async fn clear_responses(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM responses", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Number of records in the store.
    pub async fn count_responses(&self) -> Result<u64, Error> {
        self.conn
            .call(|conn| -> Result<u64, Error> {
                let count: i64 = conn.query_row("SELECT COUNT(*) FROM responses", [], |row| row.get(0))?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
