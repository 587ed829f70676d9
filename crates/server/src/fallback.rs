//! Fallback policy for live-dev URLs missing from the cache.
//!
//! A live-dev URL was expected to be cached; when it isn't, the user gets
//! a rendered error document instead of the browser's generic network
//! error page. The document is fetched from a well-known hosted path
//! parameterized by locale, with one retry against the default locale and
//! an inline static page as the terminal step.

use livedev_client::Fetcher;

use crate::interceptor::Served;

/// Where localized error documents live and which locale to retry.
#[derive(Debug, Clone)]
pub struct FallbackPolicy {
    base: String,
    default_locale: String,
}

impl FallbackPolicy {
    pub fn new(base: impl Into<String>, default_locale: impl Into<String>) -> Self {
        let base = base.into().trim_end_matches('/').to_string();
        Self { base, default_locale: default_locale.into() }
    }

    /// Well-known path of the error document for a locale.
    pub fn error_doc_url(&self, locale: &str) -> String {
        format!("{}/{}/error.html", self.base, locale)
    }

    /// Produce the deterministic fallback for an expected-but-missing
    /// cached URL: the localized error document, the default-locale
    /// document if that fails, the inline static page if both fail.
    pub async fn resolve(&self, fetcher: &dyn Fetcher, locale: Option<&str>) -> Served {
        let locale = locale.unwrap_or(&self.default_locale);

        match fetcher.get(&self.error_doc_url(locale)).await {
            Ok(doc) => return Served::error_document(locale, doc),
            Err(err) => {
                tracing::debug!(locale, error = %err, "error document fetch failed");
            }
        }

        if locale != self.default_locale {
            match fetcher.get(&self.error_doc_url(&self.default_locale)).await {
                Ok(doc) => return Served::error_document(&self.default_locale, doc),
                Err(err) => {
                    tracing::debug!(
                        locale = %self.default_locale,
                        error = %err,
                        "default-locale error document fetch failed"
                    );
                }
            }
        }

        Served::static_error()
    }
}
