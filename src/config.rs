//! Application configuration parsed from environment variables.
//!
//! Webhook URLs default to paths under a single base URL so a local
//! automation instance works without further setup. The catalog backend has
//! no sensible default and stays optional until a catalog command needs it.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_WEBHOOK_BASE_URL: &str = "http://localhost:5678/webhook";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_WEBHOOK_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DATA_DIR: &str = ".rigbuild";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set.
    #[error("missing config: env var {var} not set")]
    Missing { var: &'static str },

    /// A configured URL does not parse.
    #[error("invalid URL in {var}: {value}")]
    InvalidUrl { var: &'static str, value: String },
}

impl crate::error::ErrorCode for ConfigError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Missing { .. } => "E_CONFIG_MISSING",
            Self::InvalidUrl { .. } => "E_CONFIG_URL",
        }
    }
}

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    /// Default per-request timeout.
    pub request_secs: u64,
    /// Extended timeout for calls that may trigger slow automation pipelines.
    pub webhook_secs: u64,
    pub connect_secs: u64,
}

impl Timeouts {
    #[must_use]
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    #[must_use]
    pub fn webhook(&self) -> Duration {
        Duration::from_secs(self.webhook_secs)
    }

    #[must_use]
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            webhook_secs: DEFAULT_WEBHOOK_TIMEOUT_SECS,
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

/// One URL per automation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookUrls {
    pub pc_config: String,
    pub component_suggestion: String,
    pub game_suggestion: String,
    pub beginner_price: String,
    pub intermediate_price: String,
    pub quick_search: String,
}

impl WebhookUrls {
    /// Derive every endpoint from a base URL.
    #[must_use]
    pub fn from_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            pc_config: format!("{base}/pc-config"),
            component_suggestion: format!("{base}/component-suggestion"),
            game_suggestion: format!("{base}/game-suggestion"),
            beginner_price: format!("{base}/price-search-beginner"),
            intermediate_price: format!("{base}/price-search-intermediate"),
            quick_search: format!("{base}/quick-search"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    /// Project URL of the hosted table store, without the `/rest/v1` suffix.
    pub url: String,
    /// Public (anon) key sent in the `apikey` header.
    pub api_key: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub webhooks: WebhookUrls,
    pub catalog: Option<CatalogConfig>,
    pub timeouts: Timeouts,
    pub data_dir: PathBuf,
}

impl AppConfig {
    /// Build typed config from environment variables.
    ///
    /// Optional:
    /// - `RIGBUILD_WEBHOOK_BASE_URL`: default `http://localhost:5678/webhook`
    /// - `RIGBUILD_WEBHOOK_<NAME>_URL`: per-endpoint override
    /// - `RIGBUILD_CATALOG_URL` + `RIGBUILD_CATALOG_KEY`: catalog backend
    /// - `RIGBUILD_REQUEST_TIMEOUT_SECS`: default 60
    /// - `RIGBUILD_WEBHOOK_TIMEOUT_SECS`: default 120
    /// - `RIGBUILD_CONNECT_TIMEOUT_SECS`: default 10
    /// - `RIGBUILD_DATA_DIR`: default `.rigbuild`
    ///
    /// # Errors
    ///
    /// Returns an error if a configured URL is malformed or only one of the
    /// two catalog variables is set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base = std::env::var("RIGBUILD_WEBHOOK_BASE_URL").unwrap_or_else(|_| DEFAULT_WEBHOOK_BASE_URL.to_string());
        let defaults = WebhookUrls::from_base(&base);

        let webhooks = WebhookUrls {
            pc_config: env_url("RIGBUILD_WEBHOOK_PC_CONFIG_URL", defaults.pc_config)?,
            component_suggestion: env_url(
                "RIGBUILD_WEBHOOK_COMPONENT_SUGGESTION_URL",
                defaults.component_suggestion,
            )?,
            game_suggestion: env_url("RIGBUILD_WEBHOOK_GAME_SUGGESTION_URL", defaults.game_suggestion)?,
            beginner_price: env_url("RIGBUILD_WEBHOOK_BEGINNER_PRICE_URL", defaults.beginner_price)?,
            intermediate_price: env_url("RIGBUILD_WEBHOOK_INTERMEDIATE_PRICE_URL", defaults.intermediate_price)?,
            quick_search: env_url("RIGBUILD_WEBHOOK_QUICK_SEARCH_URL", defaults.quick_search)?,
        };

        let catalog = match (std::env::var("RIGBUILD_CATALOG_URL").ok(), std::env::var("RIGBUILD_CATALOG_KEY").ok()) {
            (Some(url), Some(api_key)) => {
                let url = env_url_value("RIGBUILD_CATALOG_URL", url)?;
                Some(CatalogConfig { url, api_key })
            }
            (None, None) => None,
            (Some(_), None) => return Err(ConfigError::Missing { var: "RIGBUILD_CATALOG_KEY" }),
            (None, Some(_)) => return Err(ConfigError::Missing { var: "RIGBUILD_CATALOG_URL" }),
        };

        let timeouts = Timeouts {
            request_secs: env_parse("RIGBUILD_REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS),
            webhook_secs: env_parse("RIGBUILD_WEBHOOK_TIMEOUT_SECS", DEFAULT_WEBHOOK_TIMEOUT_SECS),
            connect_secs: env_parse("RIGBUILD_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS),
        };

        let data_dir = std::env::var("RIGBUILD_DATA_DIR").map_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);

        Ok(Self { webhooks, catalog, timeouts, data_dir })
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_url(var: &'static str, default: String) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) => env_url_value(var, value),
        Err(_) => Ok(default),
    }
}

fn env_url_value(var: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim().trim_end_matches('/').to_string();
    if reqwest::Url::parse(&trimmed).is_err() {
        return Err(ConfigError::InvalidUrl { var, value });
    }
    Ok(trimmed)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
