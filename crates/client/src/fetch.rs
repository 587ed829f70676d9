//! HTTP fetch seam for the interceptor.
//!
//! Two operations with deliberately different failure semantics:
//! `forward` passes an intercepted request through to the real network and
//! returns whatever it yields, any status; `get` retrieves a well-known
//! static document and treats non-2xx as failure so the caller can fall
//! back to the default locale.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode, Url, header};

use livedev_core::Error;

use crate::request::InterceptedRequest;

/// Configuration for the fetch client.
#[derive(Debug, Clone)]
pub struct FetchConfig {
    /// User agent string (default: "livedev-gateway/0.1")
    pub user_agent: String,

    /// Request timeout (default: 20s)
    pub timeout: Duration,

    /// Maximum number of redirects to follow (default: 5)
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "livedev-gateway/0.1".to_string(),
            timeout: Duration::from_millis(20_000),
            max_redirects: 5,
        }
    }
}

/// Response from a network fetch.
#[derive(Debug, Clone)]
pub struct FetchedResponse {
    /// The final URL after redirects
    pub url: Url,
    /// HTTP status code
    pub status: StatusCode,
    /// Content-Type header
    pub content_type: Option<String>,
    /// Response headers
    pub headers: header::HeaderMap,
    /// Response body bytes
    pub body: Bytes,
    /// Time taken to fetch in milliseconds
    pub fetch_ms: u64,
}

/// Network seam consumed by the interceptor.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Pass an intercepted request through to the real network.
    ///
    /// Any status is returned verbatim; only transport failures error.
    async fn forward(&self, request: &InterceptedRequest) -> Result<FetchedResponse, Error>;

    /// Plain GET for a well-known static document.
    ///
    /// Non-2xx statuses are failures here.
    async fn get(&self, url: &str) -> Result<FetchedResponse, Error>;
}

/// Reqwest-backed fetcher.
pub struct HttpFetcher {
    http: Client,
}

impl HttpFetcher {
    /// Create a new fetcher with the given configuration.
    pub fn new(config: FetchConfig) -> Result<Self, Error> {
        let http = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .use_rustls_tls()
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .build()
            .map_err(|e| Error::HttpError(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { http })
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<FetchedResponse, Error> {
        let start = Instant::now();

        let response = request
            .send()
            .await
            .map_err(|e| Error::HttpError(format!("network error: {}", e)))?;

        let status = response.status();
        let url = response.url().clone();
        let headers = response.headers().clone();

        let content_type = headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| Error::HttpError(format!("failed to read response: {}", e)))?;

        let fetch_ms = start.elapsed().as_millis() as u64;

        tracing::debug!(
            "fetched {} in {}ms ({} bytes, status {})",
            url,
            fetch_ms,
            body.len(),
            status.as_u16()
        );

        Ok(FetchedResponse { url, status, content_type, headers, body, fetch_ms })
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn forward(&self, request: &InterceptedRequest) -> Result<FetchedResponse, Error> {
        let mut builder = self.http.request(request.method().clone(), request.raw_url());

        // Host and Content-Length belong to the outgoing connection;
        // reqwest derives them from the URL and body.
        let mut headers = request.headers().clone();
        headers.remove(header::HOST);
        headers.remove(header::CONTENT_LENGTH);
        builder = builder.headers(headers);

        if !request.body().is_empty() {
            builder = builder.body(request.body().clone());
        }

        self.send(builder).await
    }

    async fn get(&self, url: &str) -> Result<FetchedResponse, Error> {
        let response = self.send(self.http.get(url)).await?;

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
