//! tCurrency Converter
//!
//! The session layer behind the converter screen: a calculator keypad that
//! feeds the active currency, persisted settings and currency selection, and
//! rate loading with refresh.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tcurrency_converter::{Converter, ConverterConfig, KeyEvent, MemorySettingsStore};
//! use tcurrency_fx::HttpRateSource;
//!
//! let config = ConverterConfig::from_env();
//! let source = Arc::new(HttpRateSource::new(&config.rate_endpoint, config.request_timeout)?);
//! let converter = Converter::with_source(config, source, Arc::new(MemorySettingsStore::new()))?;
//!
//! converter.load().await?;
//! converter.on_key_press("5".parse::<KeyEvent>()?);
//! println!("{:?}", converter.snapshot().rows);
//! ```

pub mod calculator;
pub mod config;
pub mod error;
pub mod session;
pub mod settings;
pub mod store;

pub use calculator::{CalculatorInputMachine, CalculatorState, KeyEvent, Operator, UnknownKey};
pub use config::ConverterConfig;
pub use error::{ConverterError, ConverterResult};
pub use session::Converter;
pub use settings::{ExchangeSource, Settings, SettingsPatch, MAX_DECIMAL_PLACES};
pub use store::{JsonFileSettingsStore, MemorySettingsStore, SettingsStore, StoreError};
