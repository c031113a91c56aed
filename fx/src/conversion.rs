//! USD/AED conversion over the cached rate.

use std::str::FromStr;

use estatefx_common::{Currency, Timestamp};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::cache::SharedRateCache;
use crate::rate::ExchangeRate;

/// Magnitude above which an `f64` no longer carries cent resolution.
const DECIMAL_ROUNDING_LIMIT: f64 = 1e13;

/// Round to `places` decimals, halves away from zero.
///
/// Rounds the shortest decimal that reads back as `value`, so `1.005`
/// becomes `1.01` although its binary value sits just below the tie.
pub fn round_dp(value: f64, places: u32) -> f64 {
    if !value.is_finite() {
        return value;
    }

    let scale = 10f64.powi(places as i32);
    if value.abs() * scale * 10.0 < 1.0 {
        return 0.0;
    }

    let rounded = if value.abs() < DECIMAL_ROUNDING_LIMIT {
        Decimal::from_str(&value.to_string())
            .ok()
            .map(|d| d.round_dp_with_strategy(places, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|d| d.to_string().parse::<f64>().ok())
            .unwrap_or(value)
    } else if (value * scale).is_finite() {
        (value * scale).round() / scale
    } else {
        value
    };

    // Normalise -0.0 so callers never render "-0".
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Round to the display precision of `currency`.
pub fn round_amount(value: f64, currency: Currency) -> f64 {
    round_dp(value, currency.decimal_places())
}

/// Both sides of a conversion, taken from one rate snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub usd: f64,
    pub aed: f64,
    pub rate: f64,
    pub last_updated: Timestamp,
}

impl ConversionResult {
    /// Build a snapshot from a USD amount and a rate.
    pub fn from_usd(usd: f64, rate: &ExchangeRate) -> Self {
        Self {
            usd,
            aed: round_amount(usd * rate.usd_to_aed(), Currency::Aed),
            rate: rate.usd_to_aed(),
            last_updated: rate.last_updated(),
        }
    }
}

/// Rate-based currency math.
///
/// Every call reads the cache once and never fails, however stale the
/// cached rate is.
#[derive(Clone)]
pub struct CurrencyConverter {
    cache: SharedRateCache,
}

impl CurrencyConverter {
    /// Create a converter reading from `cache`.
    pub fn new(cache: SharedRateCache) -> Self {
        Self { cache }
    }

    /// The rate the next conversion will use.
    pub fn current_rate(&self) -> ExchangeRate {
        self.cache.get_current_rates()
    }

    /// Convert USD to AED.
    pub fn to_aed(&self, usd: f64) -> f64 {
        round_amount(usd * self.current_rate().usd_to_aed(), Currency::Aed)
    }

    /// Convert AED to USD.
    pub fn to_usd(&self, aed: f64) -> f64 {
        round_amount(aed / self.current_rate().usd_to_aed(), Currency::Usd)
    }

    /// Convert between any two supported currencies.
    pub fn convert(&self, amount: f64, from: Currency, to: Currency) -> f64 {
        if to != from.opposite() {
            return amount;
        }
        match from {
            Currency::Usd => self.to_aed(amount),
            Currency::Aed => self.to_usd(amount),
        }
    }

    /// Snapshot both directions for a USD amount.
    pub fn get_conversion(&self, usd: f64) -> ConversionResult {
        ConversionResult::from_usd(usd, &self.current_rate())
    }
}
