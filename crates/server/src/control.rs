//! Cache control surface.
//!
//! The editor's file-sync side populates and prunes the store through
//! these routes, keeping the interceptor itself a pure reader. Routes live
//! under the reserved `/_livedev` prefix and take precedence over
//! interception.

use axum::Json;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, header};
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use livedev_core::{CachedResponse, Error};

use crate::error::ApiError;
use crate::serve::AppState;

/// Status override header for stored entries.
const STATUS_HEADER: &str = "x-livedev-status";

/// Query parameters for cache entry routes.
#[derive(Debug, Deserialize)]
pub struct EntryQuery {
    pub url: Option<String>,
}

/// Reply for a stored entry.
#[derive(Debug, Serialize)]
pub struct StoredReply {
    /// The stripped key the entry was stored under.
    pub key: String,
}

/// Reply for delete operations.
#[derive(Debug, Serialize)]
pub struct PurgeReply {
    pub deleted: u64,
}

/// Store identity and size, for diagnostics.
#[derive(Debug, Serialize)]
pub struct StatsReply {
    pub project_root: Option<String>,
    pub entries: u64,
}

/// Store the request body under the stripped form of `url`.
///
/// The recorded status comes from the `x-livedev-status` header (default
/// 200) and the content type from the request's own Content-Type.
pub async fn put_entry(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<StoredReply>, ApiError> {
    let url = match query.url {
        Some(url) if !url.is_empty() => url,
        _ => return Err(Error::InvalidInput("url query parameter is required".into()).into()),
    };

    let status = headers
        .get(STATUS_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(200);

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string());

    let record = CachedResponse::new(&url, status, content_type, body.to_vec());
    state.store.upsert_response(&record).await?;

    tracing::debug!(key = %record.url, bytes = record.body.len(), "stored live-dev cache entry");

    Ok(Json(StoredReply { key: record.url }))
}

/// Remove one entry (`?url=`) or clear the whole store (no query).
pub async fn delete_entry(
    State(state): State<AppState>,
    Query(query): Query<EntryQuery>,
) -> Result<Json<PurgeReply>, ApiError> {
    let deleted = match query.url {
        Some(url) if !url.is_empty() => u64::from(state.store.remove_response(&url).await?),
        Some(_) => return Err(Error::InvalidInput("url cannot be empty".into()).into()),
        None => state.store.clear_responses().await?,
    };

    Ok(Json(PurgeReply { deleted }))
}

/// Entry count and store identity.
pub async fn stats(State(state): State<AppState>) -> Result<Json<StatsReply>, ApiError> {
    let entries = state.store.count_responses().await?;
    let project_root = state.store.project_root().await?;

    Ok(Json(StatsReply { project_root, entries }))
}
