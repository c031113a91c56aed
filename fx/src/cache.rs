//! In-memory holder for the current USD/AED rate.

use chrono::Duration;
use estatefx_common::{age, Timestamp};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

use crate::rate::{ExchangeRate, RateSource};

/// Thread-safe single-slot rate cache.
///
/// Readers always get the last completed write. Only the fetcher writes.
pub struct RateCache {
    current: RwLock<ExchangeRate>,
}

impl RateCache {
    /// Create a cache seeded with the built-in fallback rate.
    pub fn new() -> Self {
        Self::with_rate(ExchangeRate::fallback())
    }

    /// Create a cache seeded with a specific rate.
    pub fn with_rate(rate: ExchangeRate) -> Self {
        Self {
            current: RwLock::new(rate),
        }
    }

    /// Get the current snapshot.
    pub fn get_current_rates(&self) -> ExchangeRate {
        *self.current.read()
    }

    /// Replace the snapshot atomically.
    pub fn set_rates(&self, rates: ExchangeRate) {
        debug!(
            usd_to_aed = rates.usd_to_aed(),
            source = %rates.source(),
            "Replacing cached rate"
        );
        *self.current.write() = rates;
    }

    /// Time since the cached rate was last refreshed.
    pub fn rate_age(&self, now: Timestamp) -> Duration {
        age(self.get_current_rates().last_updated(), now)
    }

    /// Check if the cache still holds the hardcoded default.
    pub fn is_fallback(&self) -> bool {
        self.get_current_rates().source() == RateSource::Fallback
    }
}

impl Default for RateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared rate cache.
pub type SharedRateCache = Arc<RateCache>;

#[cfg(test)]
mod tests {
    use super::*;
    use estatefx_common::now;
    use std::thread;

    #[test]
    fn test_starts_with_fallback() {
        let cache = RateCache::new();
        let rate = cache.get_current_rates();

        assert!(cache.is_fallback());
        assert_eq!(rate.usd_to_aed(), 3.6725);
    }

    #[test]
    fn test_set_and_get() {
        let cache = RateCache::new();
        let fresh = ExchangeRate::new(3.67, now(), RateSource::Provider).unwrap();

        cache.set_rates(fresh);

        assert_eq!(cache.get_current_rates(), fresh);
        assert!(!cache.is_fallback());
        assert!(cache.rate_age(now()) < Duration::seconds(5));
    }

    #[test]
    fn test_concurrent_readers_see_consistent_pairs() {
        let cache = Arc::new(RateCache::new());
        let writer = {
            let cache = cache.clone();
            thread::spawn(move || {
                for i in 1..=200 {
                    let rate = ExchangeRate::new(3.0 + i as f64 / 100.0, now(), RateSource::Provider)
                        .unwrap();
                    cache.set_rates(rate);
                }
            })
        };

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let cache = cache.clone();
                thread::spawn(move || {
                    for _ in 0..200 {
                        assert!(cache.get_current_rates().is_consistent());
                    }
                })
            })
            .collect();

        writer.join().unwrap();
        for reader in readers {
            reader.join().unwrap();
        }
    }
}
