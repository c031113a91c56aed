//! EstateFX CLI
//!
//! Inspect and exercise the USD/AED currency service from a terminal.

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use estatefx_common::Currency;
use estatefx_fx::{FxServiceConfig, PropertyType};

mod commands;

/// EstateFX currency CLI
#[derive(Parser, Debug)]
#[command(name = "estatefx")]
#[command(about = "USD/AED rates, conversion and display formatting")]
struct Args {
    /// Rate function endpoint (overrides FX_RATE_ENDPOINT)
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// API key for the rate function (overrides FX_API_KEY)
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch and print the current rate
    Rates {
        /// Report provider errors instead of falling back silently
        #[arg(long)]
        force: bool,
    },

    /// Convert an amount between USD and AED
    Convert {
        #[arg(allow_hyphen_values = true)]
        amount: f64,

        /// Currency of the amount
        #[arg(long, default_value = "USD")]
        from: Currency,
    },

    /// Render an amount the way the app displays it
    Format {
        #[arg(allow_hyphen_values = true)]
        amount: f64,

        /// Currency of the amount
        #[arg(long, default_value = "USD")]
        currency: Currency,

        /// Headline currency
        #[arg(long, default_value = "AED")]
        primary: Currency,

        /// Append the original currency in parentheses
        #[arg(long)]
        both: bool,

        /// Use the long form (`1,234 AED`)
        #[arg(long)]
        long: bool,
    },

    /// Estimate a Dubai property price
    Price {
        property_type: PropertyType,
        size_sqft: f64,
    },

    /// Keep the rate fresh in the background and log it
    Watch {
        /// Stop after this many seconds (0 = until Ctrl+C)
        #[arg(long, default_value = "0")]
        duration: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
    );
    if args.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }

    // Load configuration
    let mut config = FxServiceConfig::from_env();
    if let Some(endpoint) = args.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(key) = args.api_key {
        config.api_key = Some(key);
    }

    info!(endpoint = %config.endpoint, "Starting EstateFX CLI");

    match args.command {
        Command::Rates { force } => commands::rates(config, force).await,
        Command::Convert { amount, from } => commands::convert(config, amount, from).await,
        Command::Format {
            amount,
            currency,
            primary,
            both,
            long,
        } => commands::format(config, amount, currency, primary, both, long).await,
        Command::Price {
            property_type,
            size_sqft,
        } => commands::price(config, property_type, size_sqft).await,
        Command::Watch { duration } => commands::watch(config, duration).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_command() {
        let args = Args::try_parse_from([
            "estatefx", "format", "1000", "--currency", "usd", "--primary", "AED", "--both",
        ])
        .unwrap();

        match args.command {
            Command::Format {
                amount,
                currency,
                primary,
                both,
                long,
            } => {
                assert_eq!(amount, 1000.0);
                assert_eq!(currency, Currency::Usd);
                assert_eq!(primary, Currency::Aed);
                assert!(both);
                assert!(!long);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_parse_negative_amount_and_global_flags() {
        let args = Args::try_parse_from([
            "estatefx", "convert", "-250", "--from", "AED", "--endpoint", "http://rates.test",
        ])
        .unwrap();

        assert_eq!(args.endpoint.as_deref(), Some("http://rates.test"));
        assert!(matches!(
            args.command,
            Command::Convert { amount, from: Currency::Aed } if amount == -250.0
        ));
    }

    #[test]
    fn test_rejects_unknown_currency() {
        let result = Args::try_parse_from(["estatefx", "convert", "10", "--from", "EUR"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_price_command() {
        let args = Args::try_parse_from(["estatefx", "price", "villa", "3200"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Price { property_type: PropertyType::Villa, .. }
        ));
    }
}
