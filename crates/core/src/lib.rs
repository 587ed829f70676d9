//! Core types and shared functionality for the live-dev cache gateway.
//!
//! This crate provides:
//! - Per-project response cache with SQLite backend
//! - Unified error types
//! - Layered configuration

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{CacheDb, CachePool, CachedResponse, ResponseStore};
pub use config::AppConfig;
pub use error::Error;
