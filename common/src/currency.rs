//! Display currencies for EstateFX.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A currency the platform quotes property prices in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    /// United States dollar.
    Usd,
    /// United Arab Emirates dirham.
    Aed,
}

impl Currency {
    /// Get the ISO 4217 code.
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Aed => "AED",
        }
    }

    /// Prefix used by the short display form.
    pub fn short_prefix(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Aed => "AED ",
        }
    }

    /// Get the other side of the USD/AED pair.
    pub fn opposite(&self) -> Self {
        match self {
            Currency::Usd => Currency::Aed,
            Currency::Aed => Currency::Usd,
        }
    }

    /// Standard decimal places for display rounding.
    pub fn decimal_places(&self) -> u32 {
        2
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error returned when parsing an unsupported currency code.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unsupported currency: {0}")]
pub struct UnknownCurrencyError(pub String);

impl FromStr for Currency {
    type Err = UnknownCurrencyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" | "$" => Ok(Currency::Usd),
            "AED" => Ok(Currency::Aed),
            other => Err(UnknownCurrencyError(other.to_string())),
        }
    }
}
