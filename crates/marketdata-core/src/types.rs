//! Normalized record types for market data.
//!
//! Every accessor returns one of these shapes regardless of how the upstream
//! source names its fields:
//!
//! - [`Symbol`] - Trading symbol/ticker
//! - [`Quote`] - Last price and day-over-day change
//! - [`HistoricalBar`] - One OHLCV bar of a daily or weekly series
//! - [`IndicatorPoint`] / [`MacdPoint`] - Technical-indicator samples
//! - [`CompanyInfo`] - Company overview snapshot
//! - [`IncomeStatement`], [`BalanceSheet`], [`EarningsReport`] - Statement lines
//! - [`NewsItem`] - News article with classified sentiment
//! - [`ExchangeRateSet`] - Currency code to mid-market rate
//! - [`SymbolMatch`], [`MarketMovers`], [`SectorChange`] - Market-wide lookups

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// RSI level above which a series is considered overbought.
pub const RSI_OVERBOUGHT: f64 = 70.0;

/// RSI level below which a series is considered oversold.
pub const RSI_OVERSOLD: f64 = 30.0;

/// Sentiment score above which a news item is positive.
pub const POSITIVE_SENTIMENT: f64 = 0.35;

/// Sentiment score below which a news item is negative.
pub const NEGATIVE_SENTIMENT: f64 = -0.35;

/// A trading symbol/ticker.
///
/// Symbols are automatically uppercased on creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Symbol(String);

impl Symbol {
    /// Creates a new symbol from a string, converting to uppercase.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into().trim().to_uppercase())
    }

    /// Returns the symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the symbol carries the given exchange suffix (e.g. `.WA`).
    /// An empty suffix matches nothing.
    #[must_use]
    pub fn has_suffix(&self, suffix: &str) -> bool {
        let suffix = suffix.trim();
        !suffix.is_empty() && self.0.ends_with(&suffix.to_uppercase())
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Symbol {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

/// Last price and day-over-day change for a symbol.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quote {
    /// Quoted symbol.
    pub symbol: Symbol,
    /// Last traded price.
    pub price: f64,
    /// Absolute change against the reference price.
    pub change: f64,
    /// Change in percent against the reference price.
    pub change_percent: f64,
    /// Traded volume.
    pub volume: u64,
    /// Trading day or timestamp the quote refers to, as reported by the source.
    pub last_updated: String,
}

/// One OHLCV bar of a daily or weekly series.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoricalBar {
    /// Trading day (or week-ending day) of the bar.
    pub date: NaiveDate,
    /// Opening price.
    pub open: f64,
    /// Highest price during the period.
    pub high: f64,
    /// Lowest price during the period.
    pub low: f64,
    /// Closing price.
    pub close: f64,
    /// Trading volume.
    pub volume: u64,
}

/// Trading signal derived from an indicator value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Signal {
    /// Oversold; consider buying.
    Buy,
    /// Overbought; consider selling.
    Sell,
    /// Neither threshold crossed.
    Hold,
}

impl Signal {
    /// Classifies an RSI value: above 70 sells, below 30 buys, otherwise hold.
    ///
    /// Both thresholds are strict, so exactly 70 and exactly 30 hold.
    #[must_use]
    pub fn from_rsi(value: f64) -> Self {
        if value > RSI_OVERBOUGHT {
            Self::Sell
        } else if value < RSI_OVERSOLD {
            Self::Buy
        } else {
            Self::Hold
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Buy => "BUY",
            Self::Sell => "SELL",
            Self::Hold => "HOLD",
        })
    }
}

/// One sample of a single-valued technical indicator (RSI, SMA).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IndicatorPoint {
    /// Sample date, or date and time for intraday intervals.
    pub timestamp: String,
    /// Indicator value.
    pub value: f64,
    /// Derived signal, for indicators that define one.
    pub signal: Option<Signal>,
}

/// One sample of the MACD indicator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MacdPoint {
    /// Sample date, or date and time for intraday intervals.
    pub timestamp: String,
    /// MACD line.
    pub macd: f64,
    /// Signal line.
    pub signal: f64,
    /// Histogram (MACD minus signal).
    pub histogram: f64,
}

/// Company overview snapshot.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyInfo {
    /// Stock symbol.
    pub symbol: Symbol,
    /// Company name.
    pub name: String,
    /// Business sector.
    pub sector: String,
    /// Industry within the sector.
    pub industry: String,
    /// Market capitalization.
    pub market_cap: f64,
    /// Price-to-earnings ratio.
    pub pe: f64,
    /// Beta coefficient.
    pub beta: f64,
    /// Dividend yield.
    pub dividend_yield: f64,
    /// Business description.
    pub description: String,
}

/// One annual income-statement line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeStatement {
    /// End of the fiscal period.
    pub fiscal_date_ending: String,
    /// Total revenue.
    pub total_revenue: f64,
    /// Gross profit.
    pub gross_profit: f64,
    /// Net income.
    pub net_income: f64,
    /// Reported earnings per share.
    pub eps: f64,
}

/// One annual balance-sheet line.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BalanceSheet {
    /// End of the fiscal period.
    pub fiscal_date_ending: String,
    /// Total assets.
    pub total_assets: f64,
    /// Total liabilities.
    pub total_liabilities: f64,
    /// Total shareholder equity.
    pub total_shareholder_equity: f64,
}

/// One quarterly earnings report.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EarningsReport {
    /// End of the fiscal quarter.
    pub fiscal_date_ending: String,
    /// Reported earnings per share.
    pub reported_eps: f64,
    /// Consensus estimate of earnings per share.
    pub estimated_eps: f64,
    /// Reported minus estimated EPS.
    pub surprise: f64,
    /// Surprise relative to the estimate, in percent.
    pub surprise_percentage: f64,
}

/// Three-way sentiment classification of a news item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    /// Score above 0.35.
    Positive,
    /// Score below -0.35.
    Negative,
    /// Anything in between, bounds included.
    Neutral,
}

impl Sentiment {
    /// Classifies a continuous sentiment score.
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score > POSITIVE_SENTIMENT {
            Self::Positive
        } else if score < NEGATIVE_SENTIMENT {
            Self::Negative
        } else {
            Self::Neutral
        }
    }
}

/// News article with classified sentiment.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    /// Headline.
    pub title: String,
    /// Short summary.
    pub summary: String,
    /// Publisher.
    pub source: String,
    /// Publication time as reported by the source.
    pub published_at: String,
    /// Classified overall sentiment.
    pub sentiment: Sentiment,
    /// Tickers the article is relevant to.
    pub relevant_symbols: Vec<Symbol>,
    /// Link to the article.
    pub url: String,
}

/// Mid-market exchange rates keyed by ISO currency code.
///
/// Refreshed and cached as a unit.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeRateSet(BTreeMap<String, f64>);

impl ExchangeRateSet {
    /// Creates an empty rate set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Records the rate for a currency.
    pub fn insert(&mut self, currency: impl Into<String>, rate: f64) {
        self.0.insert(currency.into().to_uppercase(), rate);
    }

    /// Returns the rate for a currency, if present.
    #[must_use]
    pub fn get(&self, currency: &str) -> Option<f64> {
        self.0.get(&currency.to_uppercase()).copied()
    }

    /// Returns the number of currencies in the set.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the set holds no rates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over `(currency, rate)` pairs in currency order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(code, rate)| (code.as_str(), *rate))
    }
}

impl FromIterator<(String, f64)> for ExchangeRateSet {
    fn from_iter<I: IntoIterator<Item = (String, f64)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (code, rate) in iter {
            set.insert(code, rate);
        }
        set
    }
}

/// One result of a symbol search.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SymbolMatch {
    /// Matched symbol.
    pub symbol: Symbol,
    /// Instrument name.
    pub name: String,
    /// Instrument type (e.g. "Equity", "ETF").
    pub kind: String,
    /// Listing region.
    pub region: String,
    /// Trading currency.
    pub currency: String,
    /// Relevance between 0 and 1.
    pub match_score: f64,
}

/// One entry of a top-movers ranking.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Mover {
    /// Ticker.
    pub ticker: Symbol,
    /// Last price.
    pub price: f64,
    /// Absolute change.
    pub change_amount: f64,
    /// Change in percent.
    pub change_percent: f64,
    /// Traded volume.
    pub volume: u64,
}

/// Top gainers, losers and most actively traded tickers of the US market.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MarketMovers {
    /// Time of the ranking as reported by the source.
    pub last_updated: String,
    /// Largest percentage gains.
    pub top_gainers: Vec<Mover>,
    /// Largest percentage losses.
    pub top_losers: Vec<Mover>,
    /// Highest traded volume.
    pub most_actively_traded: Vec<Mover>,
}

/// Performance of one sector over one timeframe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SectorChange {
    /// Timeframe label (e.g. "Real-Time Performance", "1 Year Performance").
    pub timeframe: String,
    /// Sector name.
    pub sector: String,
    /// Change in percent.
    pub change_percent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symbol_normalization() {
        let symbol = Symbol::new(" pkn.wa ");
        assert_eq!(symbol.as_str(), "PKN.WA");
        assert!(symbol.has_suffix(".wa"));
        assert!(!Symbol::new("AAPL").has_suffix(".WA"));
        assert!(!Symbol::new("AAPL").has_suffix(""));
        assert!(!symbol.has_suffix("  "));
    }

    #[test]
    fn test_rsi_signal_thresholds() {
        let signals: Vec<Signal> = [71.0, 70.0, 69.0, 31.0, 30.0, 29.0]
            .into_iter()
            .map(Signal::from_rsi)
            .collect();
        assert_eq!(
            signals,
            vec![
                Signal::Sell,
                Signal::Hold,
                Signal::Hold,
                Signal::Hold,
                Signal::Hold,
                Signal::Buy
            ]
        );
    }

    #[test]
    fn test_sentiment_boundaries() {
        let classes: Vec<Sentiment> = [0.36, 0.35, 0.34, -0.34, -0.35, -0.36]
            .into_iter()
            .map(Sentiment::from_score)
            .collect();
        assert_eq!(
            classes,
            vec![
                Sentiment::Positive,
                Sentiment::Neutral,
                Sentiment::Neutral,
                Sentiment::Neutral,
                Sentiment::Neutral,
                Sentiment::Negative
            ]
        );
    }

    #[test]
    fn test_signal_wire_format() {
        assert_eq!(serde_json::to_string(&Signal::Buy).unwrap(), "\"BUY\"");
        assert_eq!(Signal::Hold.to_string(), "HOLD");
        assert_eq!(
            serde_json::to_string(&Sentiment::Positive).unwrap(),
            "\"positive\""
        );
    }

    #[test]
    fn test_exchange_rate_set() {
        let rates: ExchangeRateSet = vec![("usd".to_string(), 3.95), ("EUR".to_string(), 4.31)]
            .into_iter()
            .collect();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates.get("USD"), Some(3.95));
        assert_eq!(rates.get("gbp"), None);

        let json = serde_json::to_value(&rates).unwrap();
        assert_eq!(json, serde_json::json!({"EUR": 4.31, "USD": 3.95}));
    }
}
