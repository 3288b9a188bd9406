//! tCurrency FX Engine
//!
//! Exchange rate fetching, caching and conversion.
//!
//! # Features
//!
//! - Pluggable rate sources (HTTP, file, mock)
//! - Per-base rate table cache with a freshness window and stale-on-error fallback
//! - Pivot conversion through the table's base currency
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tcurrency_common::CurrencyCode;
//! use tcurrency_fx::{ConversionEngine, HttpRateSource, RateRepository, RateRepositoryConfig};
//!
//! let source = Arc::new(HttpRateSource::new(DEFAULT_RATE_ENDPOINT, timeout)?);
//! let repository = RateRepository::new(source, RateRepositoryConfig::default());
//!
//! let table = repository.fetch(&CurrencyCode::usd()).await?;
//! let eur = ConversionEngine::convert(100.0, &CurrencyCode::usd(), &CurrencyCode::eur(), &table)?;
//! ```

pub mod table;
pub mod provider;
pub mod cache;
pub mod repository;
pub mod conversion;
pub mod error;

pub use table::{parse_rate_payload, RateTable};
pub use provider::{FileRateSource, HttpRateSource, RateSource, DEFAULT_RATE_ENDPOINT};
#[cfg(any(test, feature = "test-utils"))]
pub use provider::MockRateSource;
pub use cache::{CacheStats, RateCache, RateCacheConfig};
pub use repository::{RateRepository, RateRepositoryConfig, RepositoryStats};
pub use conversion::{ConversionEngine, Converted};
pub use error::{FxError, FxResult};
