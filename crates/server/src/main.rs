//! Live-dev cache gateway entry point.
//!
//! This is the main binary that boots the gateway: it opens the configured
//! project's cache store, builds the interceptor once, and binds the HTTP
//! surface. Logging goes to stderr as JSON.

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, put};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use livedev_client::{FetchConfig, HttpFetcher};
use livedev_core::cache::CachePool;
use livedev_core::AppConfig;

mod control;
mod error;
mod fallback;
mod interceptor;
mod serve;
#[cfg(test)]
mod testutil;

use fallback::FallbackPolicy;
use interceptor::Interceptor;
use serve::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;

    let pool = CachePool::new(&config.cache_dir);
    let store = pool.open(&config.project_root).await?;

    let fetcher = HttpFetcher::new(FetchConfig {
        user_agent: config.user_agent.clone(),
        timeout: config.timeout(),
        max_redirects: config.max_redirects,
    })?;

    let fallback = FallbackPolicy::new(config.error_doc_base.as_str(), config.default_locale.as_str());

    let interceptor = Interceptor::new(Arc::new(store.clone()), Arc::new(fetcher), fallback);

    let state = AppState {
        interceptor: Arc::new(interceptor),
        store,
        max_body_bytes: config.max_bytes,
    };

    let app = Router::new()
        .route(
            "/_livedev/cache",
            put(control::put_entry).delete(control::delete_entry),
        )
        .route("/_livedev/stats", get(control::stats))
        .fallback(serve::serve)
        .layer(DefaultBodyLimit::max(config.max_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    tracing::info!(
        addr = %config.listen_addr,
        project_root = %config.project_root,
        "starting live-dev cache gateway"
    );

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
