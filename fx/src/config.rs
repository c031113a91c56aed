//! Currency service configuration.

use std::time::Duration;

use estatefx_common::{constants, DurationExt};

use crate::error::{FxError, FxResult};
use crate::fetcher::RateFetcherConfig;

/// Main currency service configuration.
#[derive(Debug, Clone)]
pub struct FxServiceConfig {
    /// URL of the backend rate function.
    pub endpoint: String,
    /// Key sent as bearer token and `apikey` header.
    pub api_key: Option<String>,
    /// How long a fetched rate stays valid.
    pub cache_duration: Duration,
    /// Upper bound on a single provider request.
    pub request_timeout: Duration,
    /// Tick of the background refresh task.
    pub refresh_interval: Duration,
    /// Rate served until the provider answers.
    pub fallback_usd_to_aed: f64,
}

impl Default for FxServiceConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:54321/functions/v1/currency-rates".to_string(),
            api_key: None,
            cache_duration: constants::cache_duration().as_std(),
            request_timeout: constants::request_timeout().as_std(),
            refresh_interval: constants::refresh_interval().as_std(),
            fallback_usd_to_aed: constants::FALLBACK_USD_TO_AED,
        }
    }
}

impl FxServiceConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(endpoint) = std::env::var("FX_RATE_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Ok(key) = std::env::var("FX_API_KEY") {
            if !key.is_empty() {
                config.api_key = Some(key);
            }
        }

        if let Ok(secs) = std::env::var("FX_CACHE_DURATION_SECS") {
            if let Ok(secs) = secs.parse() {
                config.cache_duration = Duration::from_secs(secs);
            }
        }

        if let Ok(ms) = std::env::var("FX_REQUEST_TIMEOUT_MS") {
            if let Ok(ms) = ms.parse() {
                config.request_timeout = Duration::from_millis(ms);
            }
        }

        if let Ok(secs) = std::env::var("FX_REFRESH_INTERVAL_SECS") {
            if let Ok(secs) = secs.parse() {
                config.refresh_interval = Duration::from_secs(secs);
            }
        }

        if let Ok(rate) = std::env::var("FX_FALLBACK_RATE") {
            if let Ok(rate) = rate.parse() {
                config.fallback_usd_to_aed = rate;
            }
        }

        config
    }

    /// Validate configuration.
    pub fn validate(&self) -> FxResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(FxError::Configuration("Rate endpoint cannot be empty".to_string()));
        }

        if self.request_timeout.is_zero() {
            return Err(FxError::Configuration("Request timeout cannot be 0".to_string()));
        }

        if self.refresh_interval.is_zero() {
            return Err(FxError::Configuration("Refresh interval cannot be 0".to_string()));
        }

        if !self.fallback_usd_to_aed.is_finite() || self.fallback_usd_to_aed <= 0.0 {
            return Err(FxError::Configuration(format!(
                "Fallback rate must be positive, got {}",
                self.fallback_usd_to_aed
            )));
        }

        Ok(())
    }

    /// Settings handed to the rate fetcher.
    pub fn fetcher_config(&self) -> RateFetcherConfig {
        RateFetcherConfig {
            cache_duration: chrono::Duration::from_std(self.cache_duration)
                .unwrap_or_else(|_| constants::cache_duration()),
            request_timeout: self.request_timeout,
        }
    }
}
