//! Cache keys and TTL classes.
//!
//! A [`CacheKey`] pairs the [`DataKind`] that produced a payload with the
//! parameters it was produced from. Keys compare structurally, so two
//! different accessor/parameter combinations can never share an entry.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Freshness class of a cached payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TtlClass {
    /// Quotes, company snapshots, exchange rates and news.
    Live,
    /// Price series, indicators, statements and market-wide rankings.
    Series,
}

/// The kind of data a cache entry holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataKind {
    /// US equity quote from the gateway.
    UsQuote,
    /// Warsaw exchange quote from the CSV source.
    PolishQuote,
    /// Crypto quote against USD.
    CryptoQuote,
    /// Company overview snapshot.
    Company,
    /// Central-bank exchange rates.
    ExchangeRates,
    /// Financial news feed.
    News,
    /// Daily price series.
    DailySeries,
    /// Weekly price series.
    WeeklySeries,
    /// Relative strength index.
    Rsi,
    /// Moving average convergence/divergence.
    Macd,
    /// Simple moving average.
    Sma,
    /// Annual income statements.
    IncomeStatement,
    /// Annual balance sheets.
    BalanceSheet,
    /// Quarterly earnings.
    Earnings,
    /// Sector performance rankings.
    SectorPerformance,
    /// Top gainers, losers and most active tickers.
    MarketMovers,
}

impl DataKind {
    /// Returns the stable prefix used when rendering keys of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::UsQuote => "us_stock",
            Self::PolishQuote => "polish_stock",
            Self::CryptoQuote => "crypto",
            Self::Company => "company",
            Self::ExchangeRates => "exchange_rates",
            Self::News => "financial_news",
            Self::DailySeries => "daily",
            Self::WeeklySeries => "weekly",
            Self::Rsi => "rsi",
            Self::Macd => "macd",
            Self::Sma => "sma",
            Self::IncomeStatement => "income",
            Self::BalanceSheet => "balance",
            Self::Earnings => "earnings",
            Self::SectorPerformance => "sector_performance",
            Self::MarketMovers => "top_gainers_losers",
        }
    }

    /// Returns the freshness class entries of this kind belong to.
    #[must_use]
    pub const fn ttl_class(&self) -> TtlClass {
        match self {
            Self::UsQuote
            | Self::PolishQuote
            | Self::CryptoQuote
            | Self::Company
            | Self::ExchangeRates
            | Self::News => TtlClass::Live,
            Self::DailySeries
            | Self::WeeklySeries
            | Self::Rsi
            | Self::Macd
            | Self::Sma
            | Self::IncomeStatement
            | Self::BalanceSheet
            | Self::Earnings
            | Self::SectorPerformance
            | Self::MarketMovers => TtlClass::Series,
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key identifying one cached payload.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    kind: DataKind,
    params: Vec<String>,
}

impl CacheKey {
    /// Creates a key with no parameters.
    #[must_use]
    pub const fn new(kind: DataKind) -> Self {
        Self {
            kind,
            params: Vec::new(),
        }
    }

    /// Appends a parameter to the key.
    #[must_use]
    pub fn with(mut self, param: impl fmt::Display) -> Self {
        self.params.push(param.to_string());
        self
    }

    /// Returns the kind of data this key addresses.
    #[must_use]
    pub const fn kind(&self) -> DataKind {
        self.kind
    }

    /// Returns the key parameters in insertion order.
    #[must_use]
    pub fn params(&self) -> &[String] {
        &self.params
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.kind.as_str())?;
        for param in &self.params {
            write!(f, ":{param}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let key = CacheKey::new(DataKind::Rsi)
            .with("AAPL")
            .with("daily")
            .with(14);
        assert_eq!(key.to_string(), "rsi:AAPL:daily:14");
        assert_eq!(CacheKey::new(DataKind::SectorPerformance).to_string(), "sector_performance");
    }

    #[test]
    fn test_keys_do_not_collide_across_parameter_sets() {
        let a = CacheKey::new(DataKind::Sma).with("AAPL").with("daily").with(20);
        let b = CacheKey::new(DataKind::Sma).with("AAPL").with("daily").with(50);
        let c = CacheKey::new(DataKind::Rsi).with("AAPL").with("daily").with(20);
        // Parameters containing the separator stay distinct structurally.
        let d = CacheKey::new(DataKind::Company).with("A:B");
        let e = CacheKey::new(DataKind::Company).with("A").with("B");

        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(d, e);
    }

    #[test]
    fn test_ttl_classes() {
        assert_eq!(DataKind::UsQuote.ttl_class(), TtlClass::Live);
        assert_eq!(DataKind::ExchangeRates.ttl_class(), TtlClass::Live);
        assert_eq!(DataKind::Rsi.ttl_class(), TtlClass::Series);
        assert_eq!(DataKind::Earnings.ttl_class(), TtlClass::Series);
    }
}
