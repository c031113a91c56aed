//! Keeps the rate cache fresh without overloading the provider.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use estatefx_common::{constants, is_within, now, DurationExt, Timestamp};
use parking_lot::Mutex;
use tracing::{debug, info, instrument, warn};

use crate::cache::SharedRateCache;
use crate::error::{FxError, FxResult};
use crate::provider::RateProvider;
use crate::rate::ExchangeRate;

/// Configuration for the rate fetcher.
#[derive(Debug, Clone)]
pub struct RateFetcherConfig {
    /// How long a refresh (successful or not) suppresses the next one.
    pub cache_duration: chrono::Duration,
    /// Upper bound on a single provider request.
    pub request_timeout: Duration,
}

impl Default for RateFetcherConfig {
    fn default() -> Self {
        Self {
            cache_duration: constants::cache_duration(),
            request_timeout: constants::request_timeout().as_std(),
        }
    }
}

/// Counters describing fetcher activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub attempts: u64,
    pub successes: u64,
    pub failures: u64,
    pub skipped: u64,
}

#[derive(Default)]
struct Counters {
    attempts: AtomicU64,
    successes: AtomicU64,
    failures: AtomicU64,
    skipped: AtomicU64,
}

/// Refreshes a [`RateCache`](crate::cache::RateCache) from a provider.
pub struct RateFetcher {
    provider: Arc<dyn RateProvider>,
    cache: SharedRateCache,
    config: RateFetcherConfig,
    /// Staleness clock: time of the last provider answer or failure.
    last_checked: Mutex<Timestamp>,
    /// Held for the duration of a provider request.
    in_flight: tokio::sync::Mutex<()>,
    counters: Counters,
}

impl RateFetcher {
    /// Create a fetcher writing into `cache`.
    pub fn new(provider: Arc<dyn RateProvider>, cache: SharedRateCache, config: RateFetcherConfig) -> Self {
        let last_checked = cache.get_current_rates().last_updated();
        Self {
            provider,
            cache,
            config,
            last_checked: Mutex::new(last_checked),
            in_flight: tokio::sync::Mutex::new(()),
            counters: Counters::default(),
        }
    }

    /// Refresh the cache if the last check is older than the cache duration.
    ///
    /// Never fails: on any provider error the previous rate keeps serving.
    /// Concurrent callers share one in-flight request.
    pub async fn refresh_if_stale(&self) {
        if self.is_fresh(now()) {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            debug!("Cached rate still valid, skipping refresh");
            return;
        }

        let _guard = self.in_flight.lock().await;

        // Another caller may have finished a refresh while we waited.
        if self.is_fresh(now()) {
            self.counters.skipped.fetch_add(1, Ordering::Relaxed);
            debug!("Rate refreshed by concurrent caller");
            return;
        }

        if let Err(e) = self.fetch_and_store().await {
            self.log_fallback(&e);
        }
    }

    /// Refresh regardless of staleness and report the outcome.
    ///
    /// The cache follows the same rule as [`refresh_if_stale`](Self::refresh_if_stale):
    /// it is only written on success.
    pub async fn force_refresh(&self) -> FxResult<ExchangeRate> {
        let _guard = self.in_flight.lock().await;

        let result = self.fetch_and_store().await;
        if let Err(e) = &result {
            self.log_fallback(e);
        }
        result
    }

    /// Check whether the staleness clock is inside the cache duration.
    pub fn is_fresh(&self, at: Timestamp) -> bool {
        is_within(*self.last_checked.lock(), self.config.cache_duration, at)
    }

    /// Time of the last provider answer or failure.
    pub fn last_checked(&self) -> Timestamp {
        *self.last_checked.lock()
    }

    /// The cache this fetcher writes into.
    pub fn cache(&self) -> &SharedRateCache {
        &self.cache
    }

    /// Get fetcher statistics.
    pub fn stats(&self) -> RefreshStats {
        RefreshStats {
            attempts: self.counters.attempts.load(Ordering::Relaxed),
            successes: self.counters.successes.load(Ordering::Relaxed),
            failures: self.counters.failures.load(Ordering::Relaxed),
            skipped: self.counters.skipped.load(Ordering::Relaxed),
        }
    }

    #[instrument(skip(self), fields(provider = self.provider.name()))]
    async fn fetch_and_store(&self) -> FxResult<ExchangeRate> {
        self.counters.attempts.fetch_add(1, Ordering::Relaxed);

        let result = match tokio::time::timeout(self.config.request_timeout, self.provider.fetch_rates()).await {
            Ok(result) => result,
            Err(_) => Err(FxError::Timeout(self.config.request_timeout)),
        };

        match result {
            Ok(rate) => {
                self.cache.set_rates(rate);
                *self.last_checked.lock() = rate.last_updated();
                self.counters.successes.fetch_add(1, Ordering::Relaxed);

                info!(
                    usd_to_aed = rate.usd_to_aed(),
                    aed_to_usd = rate.aed_to_usd(),
                    "Exchange rate refreshed"
                );
                Ok(rate)
            }
            Err(e) => {
                *self.last_checked.lock() = now();
                self.counters.failures.fetch_add(1, Ordering::Relaxed);
                Err(e)
            }
        }
    }

    fn log_fallback(&self, e: &FxError) {
        let current = self.cache.get_current_rates();
        warn!(
            error = %e,
            code = e.error_code(),
            usd_to_aed = current.usd_to_aed(),
            source = %current.source(),
            "Rate refresh failed, keeping previous rate"
        );
    }
}
