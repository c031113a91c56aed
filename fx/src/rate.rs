//! The USD/AED exchange rate snapshot.

use estatefx_common::{constants, epoch, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FxError, FxResult};

/// Tolerance for the `usd_to_aed * aed_to_usd == 1` invariant.
pub const INVERSE_TOLERANCE: f64 = 1e-6;

/// Where a rate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RateSource {
    /// Live answer from the rate provider.
    Provider,
    /// Hardcoded default.
    Fallback,
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RateSource::Provider => f.write_str("PROVIDER"),
            RateSource::Fallback => f.write_str("FALLBACK"),
        }
    }
}

/// USD/AED rate pair.
///
/// Fields are private so the two directions can only change together;
/// `aed_to_usd` is always derived from `usd_to_aed`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExchangeRate {
    usd_to_aed: f64,
    aed_to_usd: f64,
    last_updated: Timestamp,
    source: RateSource,
}

impl ExchangeRate {
    /// Create a rate pair from the USD to AED direction.
    pub fn new(usd_to_aed: f64, last_updated: Timestamp, source: RateSource) -> FxResult<Self> {
        if !usd_to_aed.is_finite() || usd_to_aed <= 0.0 {
            return Err(FxError::InvalidRate(usd_to_aed));
        }

        Ok(Self {
            usd_to_aed,
            aed_to_usd: 1.0 / usd_to_aed,
            last_updated,
            source,
        })
    }

    /// The hardcoded default, marked as never refreshed.
    pub fn fallback() -> Self {
        let usd_to_aed = constants::FALLBACK_USD_TO_AED;
        Self {
            usd_to_aed,
            aed_to_usd: 1.0 / usd_to_aed,
            last_updated: epoch(),
            source: RateSource::Fallback,
        }
    }

    /// A fallback with a configured value.
    pub fn fallback_with(usd_to_aed: f64) -> FxResult<Self> {
        Self::new(usd_to_aed, epoch(), RateSource::Fallback)
    }

    /// AED per 1 USD.
    pub fn usd_to_aed(&self) -> f64 {
        self.usd_to_aed
    }

    /// USD per 1 AED.
    pub fn aed_to_usd(&self) -> f64 {
        self.aed_to_usd
    }

    /// When the rate was last refreshed from the provider.
    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }

    /// Where the rate came from.
    pub fn source(&self) -> RateSource {
        self.source
    }

    /// Check the inverse invariant.
    pub fn is_consistent(&self) -> bool {
        (self.usd_to_aed * self.aed_to_usd - 1.0).abs() < INVERSE_TOLERANCE
    }
}

impl fmt::Display for ExchangeRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "1 USD = {} AED ({}, {})",
            self.usd_to_aed,
            self.source,
            self.last_updated.to_rfc3339()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use estatefx_common::now;

    #[test]
    fn test_inverse_is_derived() {
        let rate = ExchangeRate::new(3.6725, now(), RateSource::Provider).unwrap();
        assert!(rate.is_consistent());
        assert!((rate.aed_to_usd() - 0.272294).abs() < 1e-6);
    }

    #[test]
    fn test_rejects_invalid_rates() {
        for bad in [0.0, -3.67, f64::NAN, f64::INFINITY] {
            let result = ExchangeRate::new(bad, now(), RateSource::Provider);
            assert!(matches!(result, Err(FxError::InvalidRate(_))));
        }
    }

    #[test]
    fn test_fallback_is_never_refreshed() {
        let rate = ExchangeRate::fallback();
        assert_eq!(rate.usd_to_aed(), 3.6725);
        assert_eq!(rate.source(), RateSource::Fallback);
        assert_eq!(rate.last_updated(), epoch());
    }

    #[test]
    fn test_serializes_camel_case() {
        let rate = ExchangeRate::fallback();
        let json = serde_json::to_value(rate).unwrap();
        assert_eq!(json["usdToAed"], 3.6725);
        assert_eq!(json["source"], "FALLBACK");
    }
}
