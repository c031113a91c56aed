//! Currency service: wires cache, fetcher, converter and formatter together.

use std::sync::Arc;

use estatefx_common::{Currency, Timestamp};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use crate::cache::{RateCache, SharedRateCache};
use crate::config::FxServiceConfig;
use crate::conversion::{ConversionResult, CurrencyConverter};
use crate::error::{FxError, FxResult};
use crate::fetcher::{RateFetcher, RefreshStats};
use crate::format::{CurrencyFormatter, DisplayOptions};
use crate::provider::{HttpRateProvider, RateProvider};
use crate::rate::ExchangeRate;

struct BackgroundRefresh {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

/// An explicitly constructed currency service.
///
/// Each instance owns its own cache, so tests and tenants never share state.
/// Call [`init`](Self::init) to start periodic refreshing and
/// [`dispose`](Self::dispose) to stop it.
pub struct CurrencyService {
    config: FxServiceConfig,
    cache: SharedRateCache,
    fetcher: Arc<RateFetcher>,
    converter: CurrencyConverter,
    formatter: CurrencyFormatter,
    background: Mutex<Option<BackgroundRefresh>>,
}

impl CurrencyService {
    /// Create a service talking to the configured HTTP endpoint.
    pub fn new(config: FxServiceConfig) -> FxResult<Self> {
        config.validate()?;
        let provider = HttpRateProvider::new(
            config.endpoint.clone(),
            config.api_key.clone(),
            config.request_timeout,
        )?;
        Self::with_provider(Arc::new(provider), config)
    }

    /// Create a service with a custom provider.
    pub fn with_provider(provider: Arc<dyn RateProvider>, config: FxServiceConfig) -> FxResult<Self> {
        config.validate()?;

        let fallback = ExchangeRate::fallback_with(config.fallback_usd_to_aed)?;
        let cache = Arc::new(RateCache::with_rate(fallback));
        let fetcher = Arc::new(RateFetcher::new(provider, cache.clone(), config.fetcher_config()));
        let converter = CurrencyConverter::new(cache.clone());
        let formatter = CurrencyFormatter::new(converter.clone());

        Ok(Self {
            config,
            cache,
            fetcher,
            converter,
            formatter,
            background: Mutex::new(None),
        })
    }

    /// Start the background refresh task.
    ///
    /// The first tick fires immediately. Calling `init` on a running
    /// service does nothing. Must be called from within a Tokio runtime.
    #[instrument(skip(self))]
    pub fn init(&self) -> FxResult<()> {
        let mut background = self.background.lock();
        if background.is_some() {
            debug!("Background refresh already running");
            return Ok(());
        }

        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| FxError::Configuration(format!("No async runtime: {}", e)))?;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let fetcher = self.fetcher.clone();
        let period = self.config.refresh_interval;

        let handle = runtime.spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => fetcher.refresh_if_stale().await,
                    // Only `true` is ever sent; a dropped sender also ends the loop.
                    _ = shutdown_rx.changed() => break,
                }
            }

            debug!("Background refresh loop exited");
        });

        *background = Some(BackgroundRefresh { shutdown_tx, handle });

        info!(
            refresh_interval = ?self.config.refresh_interval,
            cache_duration = ?self.config.cache_duration,
            "Currency service started"
        );
        Ok(())
    }

    /// Stop the background refresh task and wait for it to finish.
    ///
    /// The cache keeps serving its last rate afterwards.
    #[instrument(skip(self))]
    pub async fn dispose(&self) {
        let task = self.background.lock().take();
        let Some(task) = task else {
            return;
        };

        let _ = task.shutdown_tx.send(true);
        if let Err(e) = task.handle.await {
            warn!(error = %e, "Background refresh task ended abnormally");
        }

        info!("Currency service stopped");
    }

    /// Check if the background refresh task is running.
    pub fn is_running(&self) -> bool {
        self.background.lock().is_some()
    }

    /// Get the current rate snapshot.
    pub fn get_current_rates(&self) -> ExchangeRate {
        self.cache.get_current_rates()
    }

    /// Refresh the rate if stale; never fails.
    pub async fn refresh_if_stale(&self) {
        self.fetcher.refresh_if_stale().await
    }

    /// Refresh now and report the outcome.
    pub async fn force_refresh(&self) -> FxResult<ExchangeRate> {
        self.fetcher.force_refresh().await
    }

    /// Convert USD to AED.
    pub fn to_aed(&self, usd: f64) -> f64 {
        self.converter.to_aed(usd)
    }

    /// Convert AED to USD.
    pub fn to_usd(&self, aed: f64) -> f64 {
        self.converter.to_usd(aed)
    }

    /// Snapshot both directions for a USD amount.
    pub fn get_conversion(&self, usd: f64) -> ConversionResult {
        self.converter.get_conversion(usd)
    }

    /// Format an amount for display.
    pub fn format_currency(&self, amount: f64, currency: Currency, options: &DisplayOptions) -> String {
        self.formatter.format_currency(amount, currency, options)
    }

    /// Time of the last provider answer or failure.
    pub fn last_checked(&self) -> Timestamp {
        self.fetcher.last_checked()
    }

    /// Get fetcher statistics.
    pub fn stats(&self) -> RefreshStats {
        self.fetcher.stats()
    }

    /// The active configuration.
    pub fn config(&self) -> &FxServiceConfig {
        &self.config
    }
}

impl Drop for CurrencyService {
    fn drop(&mut self) {
        if let Some(task) = self.background.get_mut().take() {
            task.handle.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{MockOutcome, MockRateProvider};
    use crate::rate::RateSource;
    use std::time::Duration;

    fn setup(provider: Arc<MockRateProvider>) -> CurrencyService {
        let config = FxServiceConfig {
            refresh_interval: Duration::from_millis(20),
            ..Default::default()
        };
        CurrencyService::with_provider(provider, config).unwrap()
    }

    #[tokio::test]
    async fn test_init_refreshes_and_dispose_stops() {
        let provider = Arc::new(MockRateProvider::new("test", 3.6731));
        let service = setup(provider.clone());
        assert_eq!(service.get_current_rates().source(), RateSource::Fallback);

        service.init().unwrap();
        assert!(service.is_running());
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(service.get_current_rates().usd_to_aed(), 3.6731);
        // Later ticks fall inside the cache duration.
        assert_eq!(provider.calls(), 1);
        assert!(service.stats().skipped >= 1);

        service.dispose().await;
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let provider = Arc::new(MockRateProvider::new("test", 3.6731));
        let service = setup(provider.clone());

        service.init().unwrap();
        service.init().unwrap();
        tokio::time::sleep(Duration::from_millis(60)).await;
        service.dispose().await;

        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn test_dispose_without_init() {
        let service = setup(Arc::new(MockRateProvider::new("test", 3.6731)));

        service.dispose().await;

        assert!(!service.is_running());
    }

    #[test]
    fn test_init_outside_runtime_fails() {
        let service = setup(Arc::new(MockRateProvider::new("test", 3.6731)));

        assert!(matches!(service.init(), Err(FxError::Configuration(_))));
        assert!(!service.is_running());
    }

    #[tokio::test]
    async fn test_failing_provider_keeps_fallback() {
        let provider = Arc::new(MockRateProvider::new("test", 3.6731));
        provider.set_outcome(MockOutcome::Unavailable);
        let service = setup(provider.clone());

        service.refresh_if_stale().await;
        let checked = service.last_checked();
        service.refresh_if_stale().await;

        assert_eq!(provider.calls(), 1);
        assert!(checked > estatefx_common::epoch());
        assert_eq!(service.last_checked(), checked);
        assert_eq!(service.get_current_rates(), ExchangeRate::fallback());
        assert_eq!(service.to_aed(100.0), 367.25);
    }

    #[tokio::test]
    async fn test_service_formats_with_live_rate() {
        let provider = Arc::new(MockRateProvider::new("test", 4.0));
        let service = setup(provider);

        service.refresh_if_stale().await;

        let options = DisplayOptions::default().with_both();
        assert_eq!(
            service.format_currency(1000.0, Currency::Usd, &options),
            "AED 4,000 ($1,000)"
        );
        assert_eq!(service.get_conversion(10.0).aed, 40.0);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = FxServiceConfig {
            fallback_usd_to_aed: -1.0,
            ..Default::default()
        };

        let result = CurrencyService::with_provider(Arc::new(MockRateProvider::new("test", 3.67)), config);

        assert!(result.is_err());
    }
}
