//! Live-dev URL recognition.
//!
//! Live-dev URLs are synthetic virtual-filesystem URLs the editor side
//! keys cache entries under. A cache miss for one of these is an internal
//! consistency failure, not a normal miss, so recognition decides the
//! fallback behavior.

use std::sync::LazyLock;

use regex::Regex;

/// Path segment marking a URL as a synthetic virtual-filesystem URL.
///
/// The value is shared with the editor-side cache writer; both sides must
/// agree on it exactly.
pub const LIVE_DEV_MARKER: &str = "thimble-sw-vfs-cached-url";

// Marker segment, then optionally a locale segment up to the next slash.
static LIVE_DEV_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{LIVE_DEV_MARKER}/(?:([^/]+)/)?")).expect("live-dev URL pattern")
});

/// A URL recognized as a live-dev virtual-filesystem URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiveDevUrl<'a> {
    /// Locale segment following the marker, when one is present.
    pub locale: Option<&'a str>,
}

impl<'a> LiveDevUrl<'a> {
    /// Recognize a live-dev URL, capturing the locale segment if one
    /// follows the marker.
    ///
    /// Callers pass the stripped URL; recognition itself does no
    /// stripping.
    pub fn recognize(url: &'a str) -> Option<Self> {
        LIVE_DEV_URL_RE
            .captures(url)
            .map(|caps| Self { locale: caps.get(1).map(|m| m.as_str()) })
    }
}
