//! Gateway configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (LIVEDEV_*)
//! 2. TOML config file (if LIVEDEV_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Gateway configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (LIVEDEV_*)
/// 2. TOML config file (if LIVEDEV_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Address the gateway listens on.
    ///
    /// Set via LIVEDEV_LISTEN_ADDR environment variable.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Directory holding the per-project store files.
    ///
    /// Set via LIVEDEV_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// Project root whose store this gateway serves.
    ///
    /// Set via LIVEDEV_PROJECT_ROOT environment variable.
    #[serde(default = "default_project_root")]
    pub project_root: String,

    /// Base URL of the hosted localized error documents.
    ///
    /// Set via LIVEDEV_ERROR_DOC_BASE environment variable.
    #[serde(default = "default_error_doc_base")]
    pub error_doc_base: String,

    /// Locale retried when a localized error document is unavailable.
    ///
    /// Set via LIVEDEV_DEFAULT_LOCALE environment variable.
    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// User-Agent string for outgoing HTTP requests.
    ///
    /// Set via LIVEDEV_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via LIVEDEV_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects to follow on outgoing requests.
    ///
    /// Set via LIVEDEV_MAX_REDIRECTS environment variable.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,

    /// Maximum request body size accepted by the gateway, in bytes.
    ///
    /// Set via LIVEDEV_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

fn default_listen_addr() -> String {
    "127.0.0.1:35728".into()
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./livedev-cache")
}

fn default_project_root() -> String {
    "/".into()
}

fn default_error_doc_base() -> String {
    "http://127.0.0.1:35729/live-dev-error".into()
}

fn default_locale() -> String {
    "en-US".into()
}

fn default_user_agent() -> String {
    "livedev-gateway/0.1".into()
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            cache_dir: default_cache_dir(),
            project_root: default_project_root(),
            error_doc_base: default_error_doc_base(),
            default_locale: default_locale(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
            max_bytes: default_max_bytes(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `LIVEDEV_`
    /// 2. TOML file from `LIVEDEV_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be read or validation
    /// fails after loading.
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("LIVEDEV_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("LIVEDEV_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
