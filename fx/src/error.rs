//! FX error types.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while obtaining or validating a rate.
///
/// None of these reach callers of the soft-fail refresh path; they are
/// logged there and the previous rate keeps serving.
#[derive(Debug, Error)]
pub enum FxError {
    /// Network failure or non-success answer from the rate endpoint.
    #[error("Rate provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// The endpoint answered with an unexpected payload.
    #[error("Malformed rate response: {0}")]
    MalformedResponse(String),

    /// The provider did not answer within the request timeout.
    #[error("Rate request timed out after {0:?}")]
    Timeout(Duration),

    /// A rate that is zero, negative or not finite.
    #[error("Invalid exchange rate: {0}")]
    InvalidRate(f64),

    /// Invalid service configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FxError {
    /// Check if this error may go away on a later attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FxError::ProviderUnavailable(_) | FxError::Timeout(_)
        )
    }

    /// Get a stable error code for logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            FxError::ProviderUnavailable(_) => "PROVIDER_UNAVAILABLE",
            FxError::MalformedResponse(_) => "MALFORMED_RESPONSE",
            FxError::Timeout(_) => "TIMEOUT",
            FxError::InvalidRate(_) => "INVALID_RATE",
            FxError::Configuration(_) => "CONFIGURATION_ERROR",
        }
    }
}

impl From<reqwest::Error> for FxError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FxError::MalformedResponse(err.to_string())
        } else {
            FxError::ProviderUnavailable(err.to_string())
        }
    }
}

/// Result type for FX operations.
pub type FxResult<T> = Result<T, FxError>;
