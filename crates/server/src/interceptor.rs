//! The live-dev cache interceptor.
//!
//! One instance per gateway process, constructed at boot with its store
//! and fetcher. Holds no per-request state: each intercepted request
//! resolves to exactly one of a cache hit, an error document, or a network
//! passthrough.

use std::sync::Arc;

use axum::http::header::HeaderName;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use bytes::Bytes;

use livedev_client::livedev::LiveDevUrl;
use livedev_client::{FetchedResponse, Fetcher, InterceptedRequest};
use livedev_core::{CachedResponse, Error, ResponseStore};

use crate::fallback::FallbackPolicy;

const STATIC_ERROR_BODY: &str = "<!doctype html><title></title><p>There was an error serving your content. Try restarting your web browser to clear your cache.";
const STATIC_ERROR_STATUS_TEXT: &str = "Live dev server failed to find cached URL";

/// How a request was resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Served from the cache store.
    CacheHit,
    /// Live-dev URL with no cache entry; served a fetched error document.
    ErrorDocument { locale: String },
    /// Live-dev URL with no cache entry and no reachable error document;
    /// served the inline static page.
    StaticError,
    /// Not a live-dev URL; served whatever the network returned.
    Passthrough,
    /// An internal failure was caught and the original request was
    /// fetched from the network as a last resort.
    Recovered,
}

/// A response produced by the interceptor.
#[derive(Debug, Clone)]
pub struct Served {
    pub outcome: Outcome,
    pub status: StatusCode,
    /// Reason phrase recorded for diagnostics; HTTP/2 has no place for it
    /// on the wire.
    pub status_text: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Served {
    /// Rebuild a response from a stored record, as recorded.
    fn from_cache(record: CachedResponse) -> Result<Self, Error> {
        let status = StatusCode::from_u16(record.status)
            .map_err(|_| Error::InvalidInput(format!("stored status {} out of range", record.status)))?;

        let mut headers = HeaderMap::new();
        for (name, value) in record.headers() {
            if let (Ok(name), Ok(value)) = (name.parse::<HeaderName>(), HeaderValue::from_str(&value)) {
                headers.append(name, value);
            }
        }
        if !headers.contains_key(header::CONTENT_TYPE)
            && let Some(content_type) = record.content_type.as_deref()
            && let Ok(value) = HeaderValue::from_str(content_type)
        {
            headers.insert(header::CONTENT_TYPE, value);
        }

        Ok(Self {
            outcome: Outcome::CacheHit,
            status,
            status_text: None,
            headers,
            body: Bytes::from(record.body),
        })
    }

    fn from_fetched(outcome: Outcome, response: FetchedResponse) -> Self {
        Self {
            outcome,
            status: response.status,
            status_text: None,
            headers: response.headers,
            body: response.body,
        }
    }

    /// A fetched localized error document, served verbatim.
    pub(crate) fn error_document(locale: &str, doc: FetchedResponse) -> Self {
        Self::from_fetched(Outcome::ErrorDocument { locale: locale.to_string() }, doc)
    }

    /// The terminal inline 500 page.
    pub(crate) fn static_error() -> Self {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));

        Self {
            outcome: Outcome::StaticError,
            status: StatusCode::INTERNAL_SERVER_ERROR,
            status_text: Some(STATIC_ERROR_STATUS_TEXT.to_string()),
            headers,
            body: Bytes::from_static(STATIC_ERROR_BODY.as_bytes()),
        }
    }
}

/// The interceptor: cache lookup, fallback policy, network passthrough.
pub struct Interceptor {
    store: Arc<dyn ResponseStore>,
    fetcher: Arc<dyn Fetcher>,
    fallback: FallbackPolicy,
}

impl Interceptor {
    pub fn new(store: Arc<dyn ResponseStore>, fetcher: Arc<dyn Fetcher>, fallback: FallbackPolicy) -> Self {
        Self { store, fetcher, fallback }
    }

    /// Resolve one intercepted request to a response.
    ///
    /// Recoverable failures are absorbed here; the only `Err` is a failed
    /// network fetch on the passthrough path, which the caller surfaces
    /// through its own request-failure handling.
    pub async fn intercept(&self, request: &InterceptedRequest) -> Result<Served, Error> {
        let mut recovered = false;

        match self.lookup_or_fallback(request.stripped_url()).await {
            Ok(Some(served)) => return Ok(served),
            // Ordinary resource, not subject to caching.
            Ok(None) => {}
            Err(err) => {
                tracing::warn!(
                    url = request.raw_url(),
                    error = %err,
                    "could not serve intercepted URL, degrading to network fetch"
                );
                recovered = true;
            }
        }

        let response = self.fetcher.forward(request).await?;
        let outcome = if recovered { Outcome::Recovered } else { Outcome::Passthrough };
        Ok(Served::from_fetched(outcome, response))
    }

    /// Cache lookup plus the expected-to-be-cached fallback.
    ///
    /// `Ok(None)` means the URL is not subject to caching and should go to
    /// the network. A live-dev URL never returns `Ok(None)`: a miss there
    /// is an internal consistency failure and resolves to an error
    /// document.
    async fn lookup_or_fallback(&self, stripped_url: &str) -> Result<Option<Served>, Error> {
        if let Some(record) = self.store.lookup(stripped_url).await? {
            return Served::from_cache(record).map(Some);
        }

        if let Some(live_dev) = LiveDevUrl::recognize(stripped_url) {
            let served = self.fallback.resolve(self.fetcher.as_ref(), live_dev.locale).await;
            return Ok(Some(served));
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{RecordingFetcher, interceptor_with};

    use async_trait::async_trait;
    use livedev_core::CacheDb;

    const LIVE_DEV_URL: &str = "https://x/thimble-sw-vfs-cached-url/fr/index.html";
    const FR_DOC: &str = "http://errors.test/live-dev-error/fr/error.html";
    const EN_US_DOC: &str = "http://errors.test/live-dev-error/en-US/error.html";

    fn cached(url: &str, body: &str) -> CachedResponse {
        CachedResponse::new(url, 200, Some("text/html".to_string()), body.as_bytes().to_vec())
    }

    #[tokio::test]
    async fn test_cache_hit_served_verbatim() {
        let (interceptor, fetcher) = interceptor_with(&[cached(LIVE_DEV_URL, "cached!")]).await;

        let request = InterceptedRequest::get(format!("{LIVE_DEV_URL}?v=2"));
        let served = interceptor.intercept(&request).await.unwrap();

        assert_eq!(served.outcome, Outcome::CacheHit);
        assert_eq!(served.status, StatusCode::OK);
        assert_eq!(served.body.as_ref(), b"cached!");
        assert_eq!(served.headers.get(header::CONTENT_TYPE).unwrap(), "text/html");
        assert!(fetcher.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cache_hit_status_preserved() {
        let record = CachedResponse::new("https://x/thimble-sw-vfs-cached-url/fr/gone.html", 404, None, b"gone".to_vec());
        let (interceptor, _fetcher) = interceptor_with(&[record]).await;

        let request = InterceptedRequest::get("https://x/thimble-sw-vfs-cached-url/fr/gone.html");
        let served = interceptor.intercept(&request).await.unwrap();

        assert_eq!(served.outcome, Outcome::CacheHit);
        assert_eq!(served.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_query_and_stripped_form_agree() {
        let (interceptor, _fetcher) = interceptor_with(&[cached(LIVE_DEV_URL, "cached!")]).await;

        let with_query = interceptor
            .intercept(&InterceptedRequest::get(format!("{LIVE_DEV_URL}?v=2#frag")))
            .await
            .unwrap();
        let stripped = interceptor
            .intercept(&InterceptedRequest::get(LIVE_DEV_URL))
            .await
            .unwrap();

        assert_eq!(with_query.outcome, stripped.outcome);
        assert_eq!(with_query.body, stripped.body);
    }

    #[tokio::test]
    async fn test_miss_serves_localized_error_document() {
        let (interceptor, fetcher) = interceptor_with(&[]).await;
        fetcher.respond(FR_DOC, 200, "<html>erreur");

        let request = InterceptedRequest::get(format!("{LIVE_DEV_URL}?v=2"));
        let served = interceptor.intercept(&request).await.unwrap();

        assert_eq!(served.outcome, Outcome::ErrorDocument { locale: "fr".to_string() });
        assert_eq!(served.body.as_ref(), b"<html>erreur");
        assert_eq!(fetcher.calls(), vec![FR_DOC.to_string()]);
    }

    #[tokio::test]
    async fn test_miss_retries_default_locale_once() {
        let (interceptor, fetcher) = interceptor_with(&[]).await;
        fetcher.respond(FR_DOC, 404, "not here");
        fetcher.respond(EN_US_DOC, 200, "<html>error");

        let served = interceptor
            .intercept(&InterceptedRequest::get(LIVE_DEV_URL))
            .await
            .unwrap();

        assert_eq!(served.outcome, Outcome::ErrorDocument { locale: "en-US".to_string() });
        assert_eq!(served.body.as_ref(), b"<html>error");
        assert_eq!(fetcher.calls(), vec![FR_DOC.to_string(), EN_US_DOC.to_string()]);
    }

    #[tokio::test]
    async fn test_miss_double_failure_serves_static_page() {
        let (interceptor, fetcher) = interceptor_with(&[]).await;
        fetcher.fail(FR_DOC);
        fetcher.fail(EN_US_DOC);

        let served = interceptor
            .intercept(&InterceptedRequest::get(LIVE_DEV_URL))
            .await
            .unwrap();

        assert_eq!(served.outcome, Outcome::StaticError);
        assert_eq!(served.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(served.status_text.as_deref(), Some(STATIC_ERROR_STATUS_TEXT));
        assert!(String::from_utf8_lossy(&served.body).contains("error serving your content"));
        assert_eq!(fetcher.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_miss_without_locale_goes_straight_to_default() {
        let (interceptor, fetcher) = interceptor_with(&[]).await;
        fetcher.respond(EN_US_DOC, 200, "<html>error");

        let served = interceptor
            .intercept(&InterceptedRequest::get("https://x/thimble-sw-vfs-cached-url/index.html"))
            .await
            .unwrap();

        assert_eq!(served.outcome, Outcome::ErrorDocument { locale: "en-US".to_string() });
        assert_eq!(fetcher.calls(), vec![EN_US_DOC.to_string()]);
    }

    #[tokio::test]
    async fn test_default_locale_failure_without_retry_serves_static_page() {
        let (interceptor, fetcher) = interceptor_with(&[]).await;
        fetcher.respond(EN_US_DOC, 500, "broken");

        let served = interceptor
            .intercept(&InterceptedRequest::get("https://x/thimble-sw-vfs-cached-url/en-US/index.html"))
            .await
            .unwrap();

        assert_eq!(served.outcome, Outcome::StaticError);
        assert_eq!(fetcher.calls(), vec![EN_US_DOC.to_string()]);
    }

    #[tokio::test]
    async fn test_ordinary_miss_passes_through_unstripped() {
        let (interceptor, fetcher) = interceptor_with(&[]).await;
        fetcher.respond("https://x/assets/logo.png?v=3", 200, "png bytes");

        let request = InterceptedRequest::get("https://x/assets/logo.png?v=3");
        let served = interceptor.intercept(&request).await.unwrap();

        assert_eq!(served.outcome, Outcome::Passthrough);
        assert_eq!(served.body.as_ref(), b"png bytes");
        // Exactly one network fetch, of the original unstripped request.
        assert_eq!(fetcher.calls(), vec!["https://x/assets/logo.png?v=3".to_string()]);
    }

    #[tokio::test]
    async fn test_passthrough_preserves_status() {
        let (interceptor, fetcher) = interceptor_with(&[]).await;
        fetcher.respond("https://x/missing.png", 404, "nope");

        let served = interceptor
            .intercept(&InterceptedRequest::get("https://x/missing.png"))
            .await
            .unwrap();

        assert_eq!(served.outcome, Outcome::Passthrough);
        assert_eq!(served.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_passthrough_network_failure_propagates() {
        let (interceptor, fetcher) = interceptor_with(&[]).await;
        fetcher.fail("https://x/unreachable.png");

        let result = interceptor
            .intercept(&InterceptedRequest::get("https://x/unreachable.png"))
            .await;

        assert!(matches!(result, Err(Error::HttpError(_))));
        assert_eq!(fetcher.calls().len(), 1);
    }

    struct FailingStore;

    #[async_trait]
    impl ResponseStore for FailingStore {
        async fn lookup(&self, _url: &str) -> Result<Option<CachedResponse>, Error> {
            Err(Error::InvalidInput("lookup exploded".into()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_recovers_via_network() {
        let fetcher = Arc::new(RecordingFetcher::new());
        fetcher.respond("https://x/page.html", 200, "from network");

        let interceptor = Interceptor::new(
            Arc::new(FailingStore),
            fetcher.clone(),
            FallbackPolicy::new("http://errors.test/live-dev-error", "en-US"),
        );

        let served = interceptor
            .intercept(&InterceptedRequest::get("https://x/page.html"))
            .await
            .unwrap();

        assert_eq!(served.outcome, Outcome::Recovered);
        assert_eq!(served.body.as_ref(), b"from network");
        assert_eq!(fetcher.calls(), vec!["https://x/page.html".to_string()]);
    }

    #[tokio::test]
    async fn test_intercept_is_idempotent_and_never_writes() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.upsert_response(&cached(LIVE_DEV_URL, "cached!")).await.unwrap();

        let fetcher = Arc::new(RecordingFetcher::new());
        let interceptor = Interceptor::new(
            Arc::new(db.clone()),
            fetcher.clone(),
            FallbackPolicy::new("http://errors.test/live-dev-error", "en-US"),
        );

        let request = InterceptedRequest::get(LIVE_DEV_URL);
        let first = interceptor.intercept(&request).await.unwrap();
        let second = interceptor.intercept(&request).await.unwrap();

        assert_eq!(first.outcome, second.outcome);
        assert_eq!(first.body, second.body);
        assert_eq!(db.count_responses().await.unwrap(), 1);
    }
}
