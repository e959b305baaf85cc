#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/marketdata-rs/marketdata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the market-data access layer.
//!
//! This crate provides the foundational abstractions shared by every source:
//!
//! - [`Gateway`](provider::Gateway) - Proxy that forwards named upstream queries
//! - [`QuoteProvider`](provider::QuoteProvider) - Direct quote sources
//! - [`ExchangeRateProvider`](provider::ExchangeRateProvider) - Direct exchange-rate sources
//! - [`DataCache`](cache::DataCache) - TTL-bounded cache abstraction
//! - [`Fetched`](fetch::Fetched) - Outcome of a cached lookup
//! - [`CacheKey`](key::CacheKey) - Collision-free cache keys

/// Cache trait for storing normalized payloads.
pub mod cache;
/// Error types for data operations.
pub mod error;
/// Outcome type returned by domain accessors.
pub mod fetch;
/// Conversion of bar series into polars frames.
pub mod frame;
/// Indicator interval and series size definitions.
pub mod interval;
/// Cache keys and TTL classes.
pub mod key;
/// Source traits for fetching market data.
pub mod provider;
/// Normalized record types (Symbol, Quote, HistoricalBar, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::DataCache;
pub use error::{DataError, Result};
pub use fetch::Fetched;
pub use frame::bars_to_frame;
pub use interval::{Interval, OutputSize};
pub use key::{CacheKey, DataKind, TtlClass};
pub use provider::{
    DEFAULT_REQUEST_TIMEOUT, DataProvider, ExchangeRateProvider, Gateway, GatewayRequest, ParamValue, QuoteProvider,
};
pub use types::{
    BalanceSheet, CompanyInfo, EarningsReport, ExchangeRateSet, HistoricalBar, IncomeStatement,
    IndicatorPoint, MacdPoint, MarketMovers, Mover, NewsItem, Quote, SectorChange, Sentiment,
    Signal, Symbol, SymbolMatch,
};
