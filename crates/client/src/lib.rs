//! Client code for the live-dev cache gateway.
//!
//! This crate provides the intercepted-request model, live-dev URL
//! recognition, and the HTTP fetch seam shared by the server.

pub mod fetch;
pub mod livedev;
pub mod request;

pub use fetch::{FetchConfig, FetchedResponse, Fetcher, HttpFetcher};
pub use livedev::{LIVE_DEV_MARKER, LiveDevUrl};
pub use request::InterceptedRequest;

pub use reqwest::Url;
