//! Dubai market figures used to seed listings and previews.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lowest annual rental yield, in percent.
pub const MIN_YIELD: f64 = 6.0;
/// Highest annual rental yield, in percent.
pub const MAX_YIELD: f64 = 12.0;

/// Kind of Dubai property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Studio,
    Apartment,
    Townhouse,
    Villa,
    Penthouse,
    Office,
}

impl PropertyType {
    pub const ALL: [PropertyType; 6] = [
        PropertyType::Studio,
        PropertyType::Apartment,
        PropertyType::Townhouse,
        PropertyType::Villa,
        PropertyType::Penthouse,
        PropertyType::Office,
    ];

    /// Typical asking price in AED per square foot.
    pub fn price_per_sqft(&self) -> f64 {
        match self {
            PropertyType::Studio => 1_650.0,
            PropertyType::Apartment => 1_500.0,
            PropertyType::Townhouse => 1_250.0,
            PropertyType::Villa => 1_400.0,
            PropertyType::Penthouse => 3_000.0,
            PropertyType::Office => 1_350.0,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Studio => "studio",
            PropertyType::Apartment => "apartment",
            PropertyType::Townhouse => "townhouse",
            PropertyType::Villa => "villa",
            PropertyType::Penthouse => "penthouse",
            PropertyType::Office => "office",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        PropertyType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| format!("Unknown property type: {}", s))
    }
}

/// Estimated price in AED, rounded to the whole dirham.
///
/// Non-positive or non-finite sizes price at zero.
pub fn dubai_property_price(property_type: PropertyType, size_sqft: f64) -> f64 {
    if !size_sqft.is_finite() || size_sqft <= 0.0 {
        return 0.0;
    }
    (size_sqft * property_type.price_per_sqft()).round()
}

/// Random annual yield in `[MIN_YIELD, MAX_YIELD]`, one decimal place.
pub fn realistic_yield() -> f64 {
    realistic_yield_with(&mut rand::thread_rng())
}

/// Same as [`realistic_yield`] with a caller-supplied generator.
pub fn realistic_yield_with<R: Rng>(rng: &mut R) -> f64 {
    let raw: f64 = rng.gen_range(MIN_YIELD..=MAX_YIELD);
    ((raw * 10.0).round() / 10.0).clamp(MIN_YIELD, MAX_YIELD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_price_is_positive() {
        for t in PropertyType::ALL {
            let price = dubai_property_price(t, 850.0);
            assert!(price > 0.0, "{} priced at {}", t, price);
        }
        assert_eq!(dubai_property_price(PropertyType::Apartment, 1000.0), 1_500_000.0);
    }

    #[test]
    fn test_price_of_invalid_size() {
        assert_eq!(dubai_property_price(PropertyType::Villa, 0.0), 0.0);
        assert_eq!(dubai_property_price(PropertyType::Villa, -10.0), 0.0);
        assert_eq!(dubai_property_price(PropertyType::Villa, f64::NAN), 0.0);
    }

    #[test]
    fn test_yield_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1000 {
            let y = realistic_yield_with(&mut rng);
            assert!((MIN_YIELD..=MAX_YIELD).contains(&y), "yield {}", y);
        }
        assert!((MIN_YIELD..=MAX_YIELD).contains(&realistic_yield()));
    }

    #[test]
    fn test_parse_property_type() {
        assert_eq!("Villa".parse::<PropertyType>().unwrap(), PropertyType::Villa);
        assert!("castle".parse::<PropertyType>().is_err());
    }
}
