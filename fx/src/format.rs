//! Localized, optionally dual-currency display strings.

use estatefx_common::Currency;
use serde::{Deserialize, Serialize};

use crate::conversion::{round_dp, CurrencyConverter};

/// Display style for an amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayFormat {
    /// `$1,234` / `AED 1,234`
    #[default]
    Short,
    /// `1,234 USD` / `1,234 AED`
    Long,
}

/// Options for [`CurrencyFormatter::format_currency`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DisplayOptions {
    /// Append the amount in its original currency when it differs from `primary`.
    pub show_both: bool,
    /// Currency of the headline figure.
    pub primary: Currency,
    pub format: DisplayFormat,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        Self {
            show_both: false,
            primary: Currency::Aed,
            format: DisplayFormat::Short,
        }
    }
}

impl DisplayOptions {
    /// Show both currencies.
    pub fn with_both(mut self) -> Self {
        self.show_both = true;
        self
    }

    /// Set the headline currency.
    pub fn primary(mut self, currency: Currency) -> Self {
        self.primary = currency;
        self
    }

    /// Use the long display form.
    pub fn long(mut self) -> Self {
        self.format = DisplayFormat::Long;
        self
    }
}

/// Render a number with `,` grouping and at most `places` fraction digits.
///
/// Returns the sign separately so callers can place it before a prefix.
fn render_number(value: f64, places: u32) -> (bool, String) {
    if !value.is_finite() {
        return (false, value.to_string());
    }

    let rounded = round_dp(value, places);
    let fixed = format!("{:.*}", places as usize, rounded.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, digit) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let frac = frac_part.trim_end_matches('0');
    if !frac.is_empty() {
        grouped.push('.');
        grouped.push_str(frac);
    }

    (rounded < 0.0, grouped)
}

/// Format a single amount without any conversion.
pub fn format_amount(amount: f64, currency: Currency, format: DisplayFormat) -> String {
    let (negative, number) = render_number(amount, currency.decimal_places());
    let sign = if negative { "-" } else { "" };

    match format {
        DisplayFormat::Short => format!("{}{}{}", sign, currency.short_prefix(), number),
        DisplayFormat::Long => format!("{}{} {}", sign, number, currency.code()),
    }
}

/// Renders amounts in the configured primary currency.
#[derive(Clone)]
pub struct CurrencyFormatter {
    converter: CurrencyConverter,
}

impl CurrencyFormatter {
    /// Create a formatter converting through `converter`.
    pub fn new(converter: CurrencyConverter) -> Self {
        Self { converter }
    }

    /// Format `amount`, given in `currency`, for display.
    ///
    /// The headline is always in `options.primary`. The parenthetical is
    /// only added when `show_both` is set and `currency` differs from the
    /// primary, so `$1,234 ($1,234)` can never be produced.
    pub fn format_currency(&self, amount: f64, currency: Currency, options: &DisplayOptions) -> String {
        let headline = self.converter.convert(amount, currency, options.primary);
        let mut out = format_amount(headline, options.primary, options.format);

        if options.show_both && currency == options.primary.opposite() {
            out.push_str(" (");
            out.push_str(&format_amount(amount, currency, options.format));
            out.push(')');
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::RateCache;
    use std::sync::Arc;

    fn formatter() -> CurrencyFormatter {
        CurrencyFormatter::new(CurrencyConverter::new(Arc::new(RateCache::new())))
    }

    #[test]
    fn test_render_number() {
        assert_eq!(render_number(0.0, 2), (false, "0".to_string()));
        assert_eq!(render_number(999.0, 2), (false, "999".to_string()));
        assert_eq!(render_number(1234.0, 2), (false, "1,234".to_string()));
        assert_eq!(render_number(3672.5, 2), (false, "3,672.5".to_string()));
        assert_eq!(render_number(1234567.891, 2), (false, "1,234,567.89".to_string()));
        assert_eq!(render_number(-1000.0, 2), (true, "1,000".to_string()));
        assert_eq!(render_number(-0.001, 2), (false, "0".to_string()));
        assert_eq!(render_number(1.005, 2), (false, "1.01".to_string()));
        assert_eq!(render_number(1234.5, 0), (false, "1,235".to_string()));
    }

    #[test]
    fn test_format_amount_styles() {
        assert_eq!(format_amount(1234.0, Currency::Usd, DisplayFormat::Short), "$1,234");
        assert_eq!(format_amount(1234.0, Currency::Aed, DisplayFormat::Short), "AED 1,234");
        assert_eq!(format_amount(1234.0, Currency::Usd, DisplayFormat::Long), "1,234 USD");
        assert_eq!(format_amount(1234.0, Currency::Aed, DisplayFormat::Long), "1,234 AED");
        assert_eq!(format_amount(-1234.0, Currency::Usd, DisplayFormat::Short), "-$1,234");
        assert_eq!(format_amount(-1234.0, Currency::Aed, DisplayFormat::Long), "-1,234 AED");
    }

    #[test]
    fn test_non_finite_amounts() {
        assert_eq!(format_amount(f64::NAN, Currency::Usd, DisplayFormat::Long), "NaN USD");
        assert_eq!(format_amount(f64::INFINITY, Currency::Aed, DisplayFormat::Short), "AED inf");
    }

    #[test]
    fn test_huge_amounts_render_digits() {
        let short = format_amount(1.7e307, Currency::Usd, DisplayFormat::Short);
        assert!(short.starts_with("$16,999,999,"), "{}", short);
        assert!(!short.contains("inf"));

        let options = DisplayOptions::default().with_both();
        let dual = formatter().format_currency(1e300, Currency::Usd, &options);
        assert!(dual.starts_with("AED 3,672,"), "{}", dual);
        assert!(dual.contains(" ($1,000,000,"), "{}", dual);
        assert!(!dual.contains("inf"));
    }

    #[test]
    fn test_no_redundant_parenthetical() {
        let options = DisplayOptions::default().with_both().primary(Currency::Usd);

        assert_eq!(formatter().format_currency(1234.0, Currency::Usd, &options), "$1,234");
    }

    #[test]
    fn test_dual_currency_with_aed_primary() {
        let options = DisplayOptions::default().with_both().primary(Currency::Aed);

        assert_eq!(
            formatter().format_currency(1000.0, Currency::Usd, &options),
            "AED 3,672.5 ($1,000)"
        );
    }

    #[test]
    fn test_dual_currency_with_usd_primary() {
        let options = DisplayOptions::default().with_both().primary(Currency::Usd);

        assert_eq!(
            formatter().format_currency(4531.87, Currency::Aed, &options),
            "$1,234 (AED 4,531.87)"
        );
    }

    #[test]
    fn test_long_dual_currency() {
        let options = DisplayOptions::default().with_both().long();

        assert_eq!(
            formatter().format_currency(100.0, Currency::Usd, &options),
            "367.25 AED (100 USD)"
        );
    }

    #[test]
    fn test_default_options_convert_to_aed() {
        let options = DisplayOptions::default();

        assert_eq!(formatter().format_currency(100.0, Currency::Usd, &options), "AED 367.25");
        assert_eq!(formatter().format_currency(500.0, Currency::Aed, &options), "AED 500");
    }

    #[test]
    fn test_options_deserialize_with_defaults() {
        let options: DisplayOptions = serde_json::from_str(r#"{"showBoth": true}"#).unwrap();

        assert!(options.show_both);
        assert_eq!(options.primary, Currency::Aed);
        assert_eq!(options.format, DisplayFormat::Short);
    }
}
