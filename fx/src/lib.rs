//! EstateFX currency engine
//!
//! USD/AED rate handling for property prices.
//!
//! # Features
//!
//! - Single-slot rate cache seeded with the pegged fallback rate
//! - Provider refresh with a 15 minute validity window and one in-flight request
//! - Soft-fail policy: provider errors are logged and the last good rate keeps serving
//! - Two-decimal conversion and dual-currency display strings
//!
//! # Example
//!
//! ```rust,ignore
//! use estatefx_fx::{CurrencyService, DisplayOptions, FxServiceConfig};
//! use estatefx_common::Currency;
//!
//! let service = CurrencyService::new(FxServiceConfig::from_env())?;
//! service.init()?;
//!
//! let label = service.format_currency(1000.0, Currency::Usd, &DisplayOptions::default().with_both());
//! // "AED 3,672.5 ($1,000)"
//!
//! service.dispose().await;
//! ```

pub mod cache;
pub mod config;
pub mod conversion;
pub mod error;
pub mod fetcher;
pub mod format;
pub mod market;
pub mod provider;
pub mod rate;
pub mod service;

pub use cache::{RateCache, SharedRateCache};
pub use config::FxServiceConfig;
pub use conversion::{ConversionResult, CurrencyConverter};
pub use error::{FxError, FxResult};
pub use fetcher::{RateFetcher, RateFetcherConfig, RefreshStats};
pub use format::{format_amount, CurrencyFormatter, DisplayFormat, DisplayOptions};
pub use market::{dubai_property_price, realistic_yield, PropertyType};
pub use provider::{HttpRateProvider, RateProvider};
pub use rate::{ExchangeRate, RateSource};
pub use service::CurrencyService;
