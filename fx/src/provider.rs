//! Rate provider trait and implementations.

use async_trait::async_trait;
use estatefx_common::{now, Timestamp};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::error::{FxError, FxResult};
use crate::rate::{ExchangeRate, RateSource};

/// Relative disagreement allowed between the two directions a provider reports.
const DIRECTION_MISMATCH_TOLERANCE: f64 = 1e-4;

/// Trait for USD/AED rate providers.
#[async_trait]
pub trait RateProvider: Send + Sync {
    /// Get the provider name.
    fn name(&self) -> &str;

    /// Fetch the current rate pair.
    async fn fetch_rates(&self) -> FxResult<ExchangeRate>;
}

/// Response body of the backend rate function.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateResponse {
    pub success: bool,
    #[serde(default)]
    pub rates: Option<RateTable>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Both directions as reported by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateTable {
    #[serde(rename = "USD_TO_AED")]
    pub usd_to_aed: f64,
    #[serde(rename = "AED_TO_USD", default)]
    pub aed_to_usd: Option<f64>,
}

/// Turn a decoded response into a rate stamped with `received_at`.
///
/// `USD_TO_AED` is authoritative; the reverse direction is only checked.
pub fn parse_rate_response(response: RateResponse, received_at: Timestamp) -> FxResult<ExchangeRate> {
    if !response.success {
        return Err(FxError::ProviderUnavailable(
            response
                .error
                .unwrap_or_else(|| "provider reported failure".to_string()),
        ));
    }

    let table = response
        .rates
        .ok_or_else(|| FxError::MalformedResponse("missing rates".to_string()))?;

    let rate = ExchangeRate::new(table.usd_to_aed, received_at, RateSource::Provider)?;

    if let Some(reported) = table.aed_to_usd {
        if (reported * table.usd_to_aed - 1.0).abs() > DIRECTION_MISMATCH_TOLERANCE {
            warn!(
                usd_to_aed = table.usd_to_aed,
                aed_to_usd = reported,
                derived = rate.aed_to_usd(),
                "Provider directions disagree, using derived inverse"
            );
        }
    }

    debug!(
        upstream_source = response.source.as_deref().unwrap_or("unknown"),
        upstream_updated = response.last_updated.as_deref().unwrap_or("unknown"),
        usd_to_aed = rate.usd_to_aed(),
        "Parsed rate response"
    );

    Ok(rate)
}

/// Decode a raw response body.
pub fn parse_rate_body(body: &str, received_at: Timestamp) -> FxResult<ExchangeRate> {
    let response: RateResponse = serde_json::from_str(body)
        .map_err(|e| FxError::MalformedResponse(e.to_string()))?;
    parse_rate_response(response, received_at)
}

/// Provider backed by the platform's rate function over HTTP.
pub struct HttpRateProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: Option<String>,
    timeout: Duration,
}

impl HttpRateProvider {
    /// Create a provider for the given endpoint.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>, timeout: Duration) -> FxResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("estatefx/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FxError::Configuration(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key,
            timeout,
        })
    }

    /// Report the client's own deadline the same way as the fetcher's.
    fn classify(&self, err: reqwest::Error) -> FxError {
        if err.is_timeout() {
            FxError::Timeout(self.timeout)
        } else {
            err.into()
        }
    }
}

#[async_trait]
impl RateProvider for HttpRateProvider {
    fn name(&self) -> &str {
        "HTTP"
    }

    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    async fn fetch_rates(&self) -> FxResult<ExchangeRate> {
        let mut request = self.client.post(&self.endpoint).json(&serde_json::json!({}));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key).header("apikey", key);
        }

        let response = request.send().await.map_err(|e| self.classify(e))?;
        let status = response.status();
        debug!(status = %status, "Received rate response");

        if !status.is_success() {
            return Err(FxError::ProviderUnavailable(format!("HTTP {}", status)));
        }

        let body = response.text().await.map_err(|e| self.classify(e))?;
        parse_rate_body(&body, now())
    }
}

/// Scripted answer for [`MockRateProvider`].
#[cfg(any(test, feature = "test-utils"))]
#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Answer with this USD to AED rate.
    Rate(f64),
    /// Answer like an endpoint returning `success: false`.
    Unavailable,
    /// Answer with a payload that does not decode.
    Malformed,
}

/// Mock rate provider for testing.
#[cfg(any(test, feature = "test-utils"))]
pub struct MockRateProvider {
    name: String,
    outcome: parking_lot::Mutex<MockOutcome>,
    delay: Option<Duration>,
    calls: std::sync::atomic::AtomicUsize,
}

#[cfg(any(test, feature = "test-utils"))]
impl MockRateProvider {
    /// Create a new mock provider answering with `usd_to_aed`.
    pub fn new(name: impl Into<String>, usd_to_aed: f64) -> Self {
        Self {
            name: name.into(),
            outcome: parking_lot::Mutex::new(MockOutcome::Rate(usd_to_aed)),
            delay: None,
            calls: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    /// Delay every answer.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Change the scripted answer.
    pub fn set_outcome(&self, outcome: MockOutcome) {
        *self.outcome.lock() = outcome;
    }

    /// Number of fetches issued so far.
    pub fn calls(&self) -> usize {
        self.calls.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[async_trait]
impl RateProvider for MockRateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch_rates(&self) -> FxResult<ExchangeRate> {
        self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let outcome = self.outcome.lock().clone();
        match outcome {
            MockOutcome::Rate(usd_to_aed) => {
                let body = serde_json::json!({
                    "success": true,
                    "rates": { "USD_TO_AED": usd_to_aed, "AED_TO_USD": 1.0 / usd_to_aed },
                    "lastUpdated": now().to_rfc3339(),
                    "source": self.name,
                });
                parse_rate_body(&body.to_string(), now())
            }
            MockOutcome::Unavailable => {
                parse_rate_body(r#"{"success": false, "error": "upstream down"}"#, now())
            }
            MockOutcome::Malformed => parse_rate_body(r#"{"rates": "nope"}"#, now()),
        }
    }
}
