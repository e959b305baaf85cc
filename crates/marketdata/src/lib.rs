#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/marketdata-rs/marketdata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Market-data access layer.
//!
//! This crate re-exports the core types, the cache stores and the source
//! clients, and provides [`MarketDataService`], which wires them together
//! behind cached, normalized accessors.
//!
//! # Configuration
//!
//! [`ServiceConfig::from_env`] reads:
//!
//! - `MARKETDATA_GATEWAY_URL` - URL of the proxy function (required)
//! - `MARKETDATA_GATEWAY_TOKEN` - bearer token of the proxy
//! - `MARKETDATA_LIVE_TTL_SECS` - TTL of quotes, company data, rates and news
//! - `MARKETDATA_SERIES_TTL_SECS` - TTL of series, indicators and statements
//! - `MARKETDATA_CACHE_MAX_ENTRIES` - cache size bound (unbounded if unset)
//! - `MARKETDATA_REQUEST_TIMEOUT_SECS` - HTTP request timeout
//!
//! # Example
//!
//! ```rust,ignore
//! use marketdata::{Interval, MarketDataService, ServiceConfig, Symbol, DEFAULT_RSI_PERIOD};
//!
//! #[tokio::main]
//! async fn main() -> marketdata::Result<()> {
//!     let service = MarketDataService::from_config(ServiceConfig::from_env())?;
//!
//!     let symbols = [Symbol::new("AAPL"), Symbol::new("MSFT"), Symbol::new("PKN.WA")];
//!     for quote in service.quotes(&symbols).await {
//!         println!("{}: {:.2} ({:+.2}%)", quote.symbol, quote.price, quote.change_percent);
//!     }
//!
//!     let rsi = service
//!         .rsi(&Symbol::new("AAPL"), Interval::Daily, DEFAULT_RSI_PERIOD)
//!         .await
//!         .unwrap_or_default();
//!     if let Some(latest) = rsi.first() {
//!         println!("RSI {:.1} -> {:?}", latest.value, latest.signal);
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use marketdata_core::*;

// Cache implementations
pub use marketdata_cache::{InMemoryCache, NoopCache};

// Sources
pub use marketdata_alphavantage::{ProxyGateway, normalize};
pub use marketdata_nbp::NbpProvider;
pub use marketdata_stooq::StooqProvider;

mod config;
mod service;

pub use config::{
    CachePolicy, DEFAULT_CURRENCIES, DEFAULT_LIVE_TTL, DEFAULT_POLISH_SUFFIX, DEFAULT_SERIES_TTL,
    ServiceConfig,
};
pub use service::{
    DEFAULT_NEWS_LIMIT, DEFAULT_RSI_PERIOD, DEFAULT_SMA_PERIOD, MARKET_INDICES,
    MarketDataService, MarketDataServiceBuilder,
};
