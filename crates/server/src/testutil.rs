//! Shared fakes for interceptor and handler tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::http::{HeaderMap, StatusCode};
use bytes::Bytes;

use livedev_client::{FetchedResponse, Fetcher, InterceptedRequest, Url};
use livedev_core::{CacheDb, CachedResponse, Error};

use crate::fallback::FallbackPolicy;
use crate::interceptor::Interceptor;
use crate::serve::AppState;

#[derive(Debug, Clone)]
enum Scripted {
    Respond(u16, &'static str),
    TransportError,
}

/// A `Fetcher` that records every URL it is asked for and answers from a
/// script. Unscripted URLs get a 200 with a fixed body, so passthrough
/// tests don't have to script the world.
#[derive(Default)]
pub struct RecordingFetcher {
    calls: Mutex<Vec<String>>,
    script: Mutex<HashMap<String, Scripted>>,
}

impl RecordingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a response for a URL.
    pub fn respond(&self, url: &str, status: u16, body: &'static str) {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::Respond(status, body));
    }

    /// Script a transport failure for a URL.
    pub fn fail(&self, url: &str) {
        self.script
            .lock()
            .unwrap()
            .insert(url.to_string(), Scripted::TransportError);
    }

    /// Every URL fetched, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn response_for(&self, url: &str) -> Result<FetchedResponse, Error> {
        self.calls.lock().unwrap().push(url.to_string());

        match self.script.lock().unwrap().get(url) {
            Some(Scripted::Respond(status, body)) => Ok(make_response(url, *status, body)),
            Some(Scripted::TransportError) => Err(Error::HttpError(format!("connection refused: {url}"))),
            None => Ok(make_response(url, 200, "network")),
        }
    }
}

fn make_response(url: &str, status: u16, body: &'static str) -> FetchedResponse {
    FetchedResponse {
        url: Url::parse(url).unwrap(),
        status: StatusCode::from_u16(status).unwrap(),
        content_type: Some("text/html".to_string()),
        headers: HeaderMap::new(),
        body: Bytes::from_static(body.as_bytes()),
        fetch_ms: 1,
    }
}

#[async_trait]
impl Fetcher for RecordingFetcher {
    async fn forward(&self, request: &InterceptedRequest) -> Result<FetchedResponse, Error> {
        self.response_for(request.raw_url())
    }

    async fn get(&self, url: &str) -> Result<FetchedResponse, Error> {
        let response = self.response_for(url)?;
        if !response.status.is_success() {
            return Err(Error::ErrorDocUnavailable(format!(
                "{}: status {}",
                url,
                response.status.as_u16()
            )));
        }
        Ok(response)
    }
}

/// An interceptor over an in-memory store seeded with `records`, plus the
/// recording fetcher behind it.
pub async fn interceptor_with(records: &[CachedResponse]) -> (Interceptor, Arc<RecordingFetcher>) {
    let db = CacheDb::open_in_memory().await.unwrap();
    for record in records {
        db.upsert_response(record).await.unwrap();
    }

    let fetcher = Arc::new(RecordingFetcher::new());
    let interceptor = Interceptor::new(
        Arc::new(db),
        fetcher.clone(),
        FallbackPolicy::new("http://errors.test/live-dev-error", "en-US"),
    );

    (interceptor, fetcher)
}

/// Full app state over an in-memory store, for handler tests.
pub async fn test_state() -> (AppState, Arc<RecordingFetcher>) {
    let store = CacheDb::open_in_memory().await.unwrap();
    let fetcher = Arc::new(RecordingFetcher::new());

    let interceptor = Interceptor::new(
        Arc::new(store.clone()),
        fetcher.clone(),
        FallbackPolicy::new("http://errors.test/live-dev-error", "en-US"),
    );

    let state = AppState {
        interceptor: Arc::new(interceptor),
        store,
        max_body_bytes: 5_242_880,
    };

    (state, fetcher)
}
