//! Error types for the converter session.

use tcurrency_fx::FxError;
use tcurrency_ledger::SelectionError;
use thiserror::Error;

/// Main error type for converter operations.
#[derive(Error, Debug)]
pub enum ConverterError {
    /// Rate fetch or conversion failed.
    #[error(transparent)]
    Fx(#[from] FxError),

    /// Currency selection edit rejected.
    #[error(transparent)]
    Selection(#[from] SelectionError),

    /// Settings could not be persisted.
    #[error("Settings store error: {0}")]
    Store(String),

    /// Invalid settings value.
    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    /// Invalid runtime configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ConverterError {
    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ConverterError::Fx(e) if e.is_retryable())
    }
}

/// Result type alias for converter operations.
pub type ConverterResult<T> = std::result::Result<T, ConverterError>;
