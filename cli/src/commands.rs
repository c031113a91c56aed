//! Subcommand implementations.

use std::time::Duration;

use anyhow::Context;
use serde::Serialize;
use tracing::{info, warn};

use estatefx_common::Currency;
use estatefx_fx::{
    dubai_property_price, format_amount, realistic_yield, CurrencyService, DisplayFormat,
    DisplayOptions, FxServiceConfig, PropertyType,
};

/// How often `watch` logs the current rate.
const WATCH_LOG_INTERVAL: Duration = Duration::from_secs(10);

fn build_service(config: FxServiceConfig) -> anyhow::Result<CurrencyService> {
    CurrencyService::new(config).context("Failed to build currency service")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Print the current rate, refreshing it first.
pub async fn rates(config: FxServiceConfig, force: bool) -> anyhow::Result<()> {
    let service = build_service(config)?;

    if force {
        service
            .force_refresh()
            .await
            .context("Rate provider did not return a rate")?;
    } else {
        service.refresh_if_stale().await;
    }

    print_json(&service.get_current_rates())
}

/// Print an amount in both currencies.
pub async fn convert(config: FxServiceConfig, amount: f64, from: Currency) -> anyhow::Result<()> {
    let service = build_service(config)?;
    service.refresh_if_stale().await;

    let usd = match from {
        Currency::Usd => amount,
        Currency::Aed => service.to_usd(amount),
    };
    let mut result = service.get_conversion(usd);
    if from == Currency::Aed {
        result.aed = amount;
    }

    print_json(&result)
}

/// Print an amount as the app would display it.
pub async fn format(
    config: FxServiceConfig,
    amount: f64,
    currency: Currency,
    primary: Currency,
    both: bool,
    long: bool,
) -> anyhow::Result<()> {
    let service = build_service(config)?;
    service.refresh_if_stale().await;

    let mut options = DisplayOptions::default().primary(primary);
    if both {
        options = options.with_both();
    }
    if long {
        options = options.long();
    }

    println!("{}", service.format_currency(amount, currency, &options));
    Ok(())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceEstimate {
    property_type: PropertyType,
    size_sqft: f64,
    price_aed: f64,
    price_usd: f64,
    display: String,
    annual_yield_pct: f64,
}

/// Print a Dubai price estimate in both currencies.
pub async fn price(config: FxServiceConfig, property_type: PropertyType, size_sqft: f64) -> anyhow::Result<()> {
    let service = build_service(config)?;
    service.refresh_if_stale().await;

    let price_aed = dubai_property_price(property_type, size_sqft);
    if price_aed == 0.0 {
        warn!(size_sqft, "Size must be a positive number of square feet");
    }

    let estimate = PriceEstimate {
        property_type,
        size_sqft,
        price_aed,
        price_usd: service.to_usd(price_aed),
        display: service.format_currency(
            price_aed,
            Currency::Aed,
            &DisplayOptions::default().with_both().primary(Currency::Aed),
        ),
        annual_yield_pct: realistic_yield(),
    };

    print_json(&estimate)
}

/// Run the background refresh and log the rate until stopped.
pub async fn watch(config: FxServiceConfig, duration: u64) -> anyhow::Result<()> {
    let service = build_service(config)?;
    service.init().context("Failed to start background refresh")?;
    info!(
        endpoint = %service.config().endpoint,
        refresh_interval = ?service.config().refresh_interval,
        duration_secs = duration,
        "Watching exchange rate"
    );

    let deadline = if duration > 0 {
        Some(tokio::time::Instant::now() + Duration::from_secs(duration))
    } else {
        None
    };

    let mut ticker = tokio::time::interval(WATCH_LOG_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let rate = service.get_current_rates();
                let stats = service.stats();
                info!(
                    usd_to_aed = rate.usd_to_aed(),
                    source = %rate.source(),
                    sample = %format_amount(service.to_aed(1_000_000.0), Currency::Aed, DisplayFormat::Short),
                    last_checked = %service.last_checked(),
                    attempts = stats.attempts,
                    failures = stats.failures,
                    "Current rate"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
            _ = async {
                match deadline {
                    Some(at) => tokio::time::sleep_until(at).await,
                    None => std::future::pending().await,
                }
            } => {
                info!("Watch duration elapsed");
                break;
            }
        }
    }

    service.dispose().await;

    let stats = service.stats();
    info!(
        attempts = stats.attempts,
        successes = stats.successes,
        failures = stats.failures,
        skipped = stats.skipped,
        "Watch complete"
    );
    Ok(())
}
