//! FX error types.

use thiserror::Error;

/// Errors that can occur while fetching rates or converting amounts.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FxError {
    /// Transport failure or non-success status from the rate source.
    #[error("Network error: {0}")]
    Network(String),

    /// Payload could not be decoded or carried no rates mapping.
    #[error("Invalid rate source response: {0}")]
    InvalidResponse(String),

    /// Conversion attempted against a missing or garbled rate table.
    #[error("Invalid rate table: {0}")]
    InvalidRateTable(String),
}

impl FxError {
    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, FxError::Network(_))
    }

    /// Get error code for display and logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::Network(_) => "NETWORK_ERROR",
            FxError::InvalidResponse(_) => "INVALID_RESPONSE",
            FxError::InvalidRateTable(_) => "INVALID_RATE_TABLE",
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_network_errors_retry() {
        assert!(FxError::Network("timeout".into()).is_retryable());
        assert!(!FxError::InvalidResponse("no rates".into()).is_retryable());
        assert!(!FxError::InvalidRateTable("empty".into()).is_retryable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(FxError::Network(String::new()).error_code(), "NETWORK_ERROR");
        assert_eq!(
            FxError::InvalidRateTable(String::new()).error_code(),
            "INVALID_RATE_TABLE"
        );
    }
}
