//! The catch-all gateway handler.
//!
//! Every request not claimed by the control surface is run through the
//! interceptor: the raw URL is reconstructed from the request line and
//! Host header, and the interceptor's answer is replayed to the client.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{StatusCode, header, request::Parts, response::Response};
use axum::response::IntoResponse;

use livedev_client::InterceptedRequest;
use livedev_core::CacheDb;

use crate::interceptor::{Interceptor, Served};

/// Shared state behind the router.
#[derive(Clone)]
pub struct AppState {
    pub interceptor: Arc<Interceptor>,
    pub store: CacheDb,
    pub max_body_bytes: usize,
}

/// Headers that describe the connection rather than the entity; never
/// replayed onto a proxied response.
const HOP_BY_HOP: &[&str] = &[
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
];

pub async fn serve(State(state): State<AppState>, request: Request) -> Response<Body> {
    let (parts, body) = request.into_parts();

    let raw_url = reconstruct_url(&parts);

    let body = match axum::body::to_bytes(body, state.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            return (StatusCode::PAYLOAD_TOO_LARGE, "request body too large").into_response();
        }
    };

    let intercepted = InterceptedRequest::new(parts.method, raw_url, parts.headers, body);

    match state.interceptor.intercept(&intercepted).await {
        Ok(served) => into_http_response(served),
        Err(err) => (StatusCode::BAD_GATEWAY, err.to_string()).into_response(),
    }
}

/// Rebuild the absolute URL the client asked for.
///
/// Proxied requests arrive in absolute form and are used as-is; origin
/// form targets are joined with the Host header, which is the same shape
/// the cache writer keys entries under.
fn reconstruct_url(parts: &Parts) -> String {
    if parts.uri.scheme().is_some() {
        return parts.uri.to_string();
    }

    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");

    format!("http://{}{}", host, parts.uri)
}

fn into_http_response(served: Served) -> Response<Body> {
    // The reason phrase never goes on the wire; surface it in the logs.
    if let Some(reason) = served.status_text.as_deref() {
        tracing::debug!(status = served.status.as_u16(), reason, "serving synthesized error response");
    }

    let mut builder = Response::builder().status(served.status);

    if let Some(headers) = builder.headers_mut() {
        for (name, value) in served.headers.iter() {
            if HOP_BY_HOP.contains(&name.as_str()) || name == &header::CONTENT_LENGTH {
                continue;
            }
            headers.append(name.clone(), value.clone());
        }
    }

    builder
        .body(Body::from(served.body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
