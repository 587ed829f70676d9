//! SQLite-backed per-project cache of live-dev responses.
//!
//! Each project root gets its own store file under the cache directory,
//! named from a digest of the root. A store maps stripped URLs to recorded
//! responses. The editor's file-sync side writes entries; the interceptor
//! only reads. Supports:
//!
//! - Stripped-URL keying enforced on both the write and lookup paths
//! - Automatic schema migrations
//! - WAL mode for concurrent access
//! - Store lifecycle operations (clear, destroy)

pub mod connection;
pub mod key;
pub mod migrations;
pub mod pool;
pub mod responses;

pub use crate::Error;

pub use connection::CacheDb;
pub use key::cache_key;
pub use pool::CachePool;
pub use responses::{CachedResponse, ResponseStore};
