//! Canonical cache keys.

/// Derive the canonical cache key for a URL by truncating at the first
/// `?` or `#`.
///
/// Both sides of a store must agree on this: entries are keyed by the
/// stripped form at write time and lookups strip the same way, otherwise
/// URLs that legitimately carry query strings in the live environment
/// could never hit.
pub fn cache_key(url: &str) -> &str {
    match url.find(['?', '#']) {
        Some(idx) => &url[..idx],
        None => url,
    }
}
