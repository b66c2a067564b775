//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required (one of)
//! - `VEXAPARTS_SOURCE_BASE_URL` - Page URL that `products.json` candidates are derived from
//! - `VEXAPARTS_SOURCE_LOCATIONS` - Comma-separated explicit candidates (URLs or paths)
//!
//! ## Optional
//! - `VEXAPARTS_STORAGE_DIR` - Directory of the local store (default: .vexaparts)
//! - `VEXAPARTS_FRESHNESS_WINDOW_MS` - Cache freshness window (default: 3600000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;

use thiserror::Error;
use url::Url;

use crate::cache::DEFAULT_FRESHNESS_WINDOW_MS;
use crate::source::{SourceLocation, candidate_urls};

const DEFAULT_STORAGE_DIR: &str = ".vexaparts";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorefrontConfig {
    /// Directory holding one file per storage key
    pub storage_dir: PathBuf,
    /// Base page URL the default candidates are derived from
    pub source_base_url: Option<Url>,
    /// Explicit candidates, tried before the derived ones
    pub source_locations: Vec<SourceLocation>,
    /// Cache freshness window in milliseconds
    pub freshness_window_ms: i64,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is malformed or no product source
    /// location is configured.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let storage_dir = PathBuf::from(
            get("VEXAPARTS_STORAGE_DIR").unwrap_or_else(|| DEFAULT_STORAGE_DIR.to_string()),
        );

        let source_base_url = get("VEXAPARTS_SOURCE_BASE_URL")
            .map(|raw| {
                Url::parse(raw.trim()).map_err(|e| {
                    ConfigError::InvalidEnvVar("VEXAPARTS_SOURCE_BASE_URL".to_string(), e.to_string())
                })
            })
            .transpose()?;

        let source_locations = get("VEXAPARTS_SOURCE_LOCATIONS")
            .map(|raw| parse_locations(&raw))
            .transpose()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("VEXAPARTS_SOURCE_LOCATIONS".to_string(), e.to_string())
            })?
            .unwrap_or_default();

        let freshness_window_ms = get("VEXAPARTS_FRESHNESS_WINDOW_MS")
            .map(|raw| {
                raw.trim()
                    .parse::<i64>()
                    .ok()
                    .filter(|ms| *ms >= 0)
                    .ok_or_else(|| {
                        ConfigError::InvalidEnvVar(
                            "VEXAPARTS_FRESHNESS_WINDOW_MS".to_string(),
                            format!("expected a non-negative integer, got '{raw}'"),
                        )
                    })
            })
            .transpose()?
            .unwrap_or(DEFAULT_FRESHNESS_WINDOW_MS);

        let config = Self {
            storage_dir,
            source_base_url,
            source_locations,
            freshness_window_ms,
            sentry_dsn: get("SENTRY_DSN"),
            sentry_environment: get("SENTRY_ENVIRONMENT"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that at least one source location is configured.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` naming the base URL variable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.candidate_locations().is_empty() {
            return Err(ConfigError::MissingEnvVar(
                "VEXAPARTS_SOURCE_BASE_URL or VEXAPARTS_SOURCE_LOCATIONS".to_string(),
            ));
        }
        Ok(())
    }

    /// All source locations in the order they are tried: explicit entries
    /// first, then the candidates derived from the base URL.
    #[must_use]
    pub fn candidate_locations(&self) -> Vec<SourceLocation> {
        let mut locations = self.source_locations.clone();
        if let Some(base) = &self.source_base_url {
            for url in candidate_urls(base) {
                let location = SourceLocation::Url(url);
                if !locations.contains(&location) {
                    locations.push(location);
                }
            }
        }
        locations
    }
}

/// Parse a comma-separated list of source locations.
///
/// # Errors
///
/// Returns the URL parse error of the first malformed `http(s)://` entry.
pub fn parse_locations(raw: &str) -> Result<Vec<SourceLocation>, url::ParseError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::parse)
        .collect()
}
