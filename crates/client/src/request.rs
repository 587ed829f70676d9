//! The ephemeral value representing one intercepted request.

use bytes::Bytes;
use reqwest::Method;
use reqwest::header::HeaderMap;

use livedev_core::cache::cache_key;

/// One intercepted network request.
///
/// Carries the raw URL plus the request metadata needed for a network
/// passthrough. The stripped form (query and fragment removed) is the
/// cache key; it is derived, never stored.
#[derive(Debug, Clone)]
pub struct InterceptedRequest {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Bytes,
}

impl InterceptedRequest {
    /// Build a request from its wire parts.
    pub fn new(method: Method, url: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        Self { method, url: url.into(), headers, body }
    }

    /// A bare GET with no headers or body.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url, HeaderMap::new(), Bytes::new())
    }

    /// The URL as it arrived, query and fragment included.
    pub fn raw_url(&self) -> &str {
        &self.url
    }

    /// The cache-key form of the URL.
    pub fn stripped_url(&self) -> &str {
        cache_key(&self.url)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }
}
