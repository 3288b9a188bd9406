//! Converter configuration.

use std::path::PathBuf;
use std::time::Duration;

use tcurrency_common::{constants, CurrencyCode};
use tcurrency_fx::{RateCacheConfig, RateRepositoryConfig, DEFAULT_RATE_ENDPOINT};

use crate::error::{ConverterError, ConverterResult};

/// Runtime configuration for a converter session.
#[derive(Debug, Clone)]
pub struct ConverterConfig {
    /// Rate endpoint; the base code is appended as the last path segment.
    pub rate_endpoint: String,
    /// Base currency rate tables are requested in.
    pub base_currency: String,
    /// How long a fetched table is served without refetching.
    pub freshness_window: Duration,
    /// Per-request timeout for the HTTP source.
    pub request_timeout: Duration,
    /// JSON file for settings and selection. In-memory when unset.
    pub settings_path: Option<PathBuf>,
    /// Log level.
    pub log_level: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            rate_endpoint: DEFAULT_RATE_ENDPOINT.to_string(),
            base_currency: "USD".to_string(),
            freshness_window: constants::rate_freshness_window()
                .to_std()
                .unwrap_or(Duration::from_secs(300)),
            request_timeout: constants::rate_request_timeout()
                .to_std()
                .unwrap_or(Duration::from_secs(10)),
            settings_path: None,
            log_level: "info".to_string(),
        }
    }
}

impl ConverterConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(endpoint) = std::env::var("TCURRENCY_RATE_ENDPOINT") {
            config.rate_endpoint = endpoint;
        }

        if let Ok(base) = std::env::var("TCURRENCY_BASE_CURRENCY") {
            config.base_currency = base;
        }

        if let Ok(secs) = std::env::var("TCURRENCY_FRESHNESS_SECS") {
            if let Ok(secs) = secs.parse() {
                config.freshness_window = Duration::from_secs(secs);
            }
        }

        if let Ok(secs) = std::env::var("TCURRENCY_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse() {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        if let Ok(path) = std::env::var("TCURRENCY_SETTINGS_PATH") {
            if !path.is_empty() {
                config.settings_path = Some(PathBuf::from(path));
            }
        }

        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.log_level = level;
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> ConverterResult<()> {
        if self.rate_endpoint.trim().is_empty() {
            return Err(ConverterError::Config("Rate endpoint cannot be empty".to_string()));
        }

        CurrencyCode::parse(&self.base_currency)
            .map_err(|e| ConverterError::Config(e.to_string()))?;

        if self.freshness_window.is_zero() {
            return Err(ConverterError::Config("Freshness window cannot be 0".to_string()));
        }

        if self.request_timeout.is_zero() {
            return Err(ConverterError::Config("Request timeout cannot be 0".to_string()));
        }

        Ok(())
    }

    /// Parsed base currency.
    pub fn base(&self) -> ConverterResult<CurrencyCode> {
        CurrencyCode::parse(&self.base_currency).map_err(|e| ConverterError::Config(e.to_string()))
    }

    /// Repository settings derived from this configuration.
    pub fn repository_config(&self) -> RateRepositoryConfig {
        let freshness_window = chrono::Duration::from_std(self.freshness_window)
            .unwrap_or_else(|_| constants::rate_freshness_window());

        RateRepositoryConfig {
            cache: RateCacheConfig { freshness_window },
        }
    }
}
