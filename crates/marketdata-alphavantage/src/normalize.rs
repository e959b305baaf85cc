//! Data-shape normalizers for Alpha Vantage payloads.
//!
//! Each function is pure: raw upstream JSON in, normalized record(s) out.
//! `None` means the payload lacked the container the record lives in, which
//! callers treat as "no data". Malformed figures inside a record never fail;
//! they coerce to zero.

use chrono::NaiveDate;
use marketdata_core::{
    BalanceSheet, CompanyInfo, EarningsReport, HistoricalBar, IncomeStatement, IndicatorPoint,
    MacdPoint, MarketMovers, Mover, NewsItem, Quote, SectorChange, Sentiment, Signal, Symbol,
    SymbolMatch,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use crate::lenient;

/// Number of annual reports kept by the statement normalizers.
pub const ANNUAL_PERIODS: usize = 5;

/// Number of quarterly reports kept by the earnings normalizer.
pub const EARNINGS_QUARTERS: usize = 8;

const GLOBAL_QUOTE: &str = "Global Quote";
const DAILY_SERIES: &str = "Time Series (Daily)";
const WEEKLY_SERIES: &str = "Weekly Time Series";
const RSI_SERIES: &str = "Technical Analysis: RSI";
const SMA_SERIES: &str = "Technical Analysis: SMA";
const MACD_SERIES: &str = "Technical Analysis: MACD";
const EXCHANGE_RATE: &str = "Realtime Currency Exchange Rate";

/// Normalizes a `GLOBAL_QUOTE` payload.
///
/// A missing or empty `Global Quote` object means the symbol is unknown.
#[must_use]
pub fn quote(symbol: &Symbol, raw: &Value) -> Option<Quote> {
    let quote: AvGlobalQuote = record(non_empty_object(raw.get(GLOBAL_QUOTE)?)?)?;

    Some(Quote {
        symbol: symbol.clone(),
        price: quote.price,
        change: quote.change,
        change_percent: quote.change_percent,
        volume: quote.volume,
        last_updated: quote.latest_trading_day,
    })
}

/// Normalizes a `CURRENCY_EXCHANGE_RATE` payload into a quote.
///
/// The endpoint reports no change or volume, so those fields are zero.
#[must_use]
pub fn crypto_quote(symbol: &Symbol, raw: &Value) -> Option<Quote> {
    let rate: AvExchangeRate = record(non_empty_object(raw.get(EXCHANGE_RATE)?)?)?;

    Some(Quote {
        symbol: symbol.clone(),
        price: rate.exchange_rate,
        change: 0.0,
        change_percent: 0.0,
        volume: 0,
        last_updated: rate.last_refreshed,
    })
}

/// Normalizes a `TIME_SERIES_DAILY` payload, most recent bar first.
#[must_use]
pub fn daily_series(raw: &Value) -> Option<Vec<HistoricalBar>> {
    series(raw, DAILY_SERIES)
}

/// Normalizes a `TIME_SERIES_WEEKLY` payload, most recent bar first.
#[must_use]
pub fn weekly_series(raw: &Value) -> Option<Vec<HistoricalBar>> {
    series(raw, WEEKLY_SERIES)
}

fn series(raw: &Value, field: &str) -> Option<Vec<HistoricalBar>> {
    let entries = raw.get(field)?.as_object()?;

    let bars = entries
        .iter()
        .filter_map(|(date, values)| {
            let Ok(date) = NaiveDate::parse_from_str(date, "%Y-%m-%d") else {
                debug!(key = %date, "Skipping series entry with unparseable date");
                return None;
            };
            let bar: AvBar = record(values)?;
            Some(HistoricalBar {
                date,
                open: bar.open,
                high: bar.high,
                low: bar.low,
                close: bar.close,
                volume: bar.volume,
            })
        })
        .collect();

    Some(bars)
}

/// Normalizes an `RSI` payload, deriving a [`Signal`] for every point.
///
/// A point whose reading is missing or not numeric keeps a value of `0.0`
/// but is always [`Signal::Hold`].
#[must_use]
pub fn rsi(raw: &Value) -> Option<Vec<IndicatorPoint>> {
    indicator(raw, RSI_SERIES, "RSI", |reading| {
        Some(reading.map_or(Signal::Hold, Signal::from_rsi))
    })
}

/// Normalizes an `SMA` payload. Points carry no signal.
#[must_use]
pub fn sma(raw: &Value) -> Option<Vec<IndicatorPoint>> {
    indicator(raw, SMA_SERIES, "SMA", |_| None)
}

fn indicator(
    raw: &Value,
    field: &str,
    value_key: &str,
    signal: impl Fn(Option<f64>) -> Option<Signal>,
) -> Option<Vec<IndicatorPoint>> {
    let entries = raw.get(field)?.as_object()?;

    let points = entries
        .iter()
        .map(|(timestamp, values)| {
            let reading = values.get(value_key).and_then(lenient::try_number_from);
            IndicatorPoint {
                timestamp: timestamp.clone(),
                value: reading.unwrap_or(0.0),
                signal: signal(reading),
            }
        })
        .collect();

    Some(points)
}

/// Normalizes a `MACD` payload.
#[must_use]
pub fn macd(raw: &Value) -> Option<Vec<MacdPoint>> {
    let entries = raw.get(MACD_SERIES)?.as_object()?;

    let points = entries
        .iter()
        .map(|(timestamp, values)| {
            let field = |key: &str| values.get(key).map_or(0.0, lenient::number_from);
            MacdPoint {
                timestamp: timestamp.clone(),
                macd: field("MACD"),
                signal: field("MACD_Signal"),
                histogram: field("MACD_Hist"),
            }
        })
        .collect();

    Some(points)
}

/// Normalizes an `INCOME_STATEMENT` payload, keeping the first `limit` annual reports.
#[must_use]
pub fn income_statements(raw: &Value, limit: usize) -> Option<Vec<IncomeStatement>> {
    let reports: Vec<AvIncomeReport> = reports(raw, "annualReports", limit)?;

    Some(
        reports
            .into_iter()
            .map(|r| IncomeStatement {
                fiscal_date_ending: r.fiscal_date_ending,
                total_revenue: r.total_revenue,
                gross_profit: r.gross_profit,
                net_income: r.net_income,
                eps: r.reported_eps,
            })
            .collect(),
    )
}

/// Normalizes a `BALANCE_SHEET` payload, keeping the first `limit` annual reports.
#[must_use]
pub fn balance_sheets(raw: &Value, limit: usize) -> Option<Vec<BalanceSheet>> {
    let reports: Vec<AvBalanceReport> = reports(raw, "annualReports", limit)?;

    Some(
        reports
            .into_iter()
            .map(|r| BalanceSheet {
                fiscal_date_ending: r.fiscal_date_ending,
                total_assets: r.total_assets,
                total_liabilities: r.total_liabilities,
                total_shareholder_equity: r.total_shareholder_equity,
            })
            .collect(),
    )
}

/// Normalizes an `EARNINGS` payload, keeping the first `limit` quarterly reports.
#[must_use]
pub fn earnings(raw: &Value, limit: usize) -> Option<Vec<EarningsReport>> {
    let reports: Vec<AvEarningsReport> = reports(raw, "quarterlyEarnings", limit)?;

    Some(
        reports
            .into_iter()
            .map(|r| EarningsReport {
                fiscal_date_ending: r.fiscal_date_ending,
                reported_eps: r.reported_eps,
                estimated_eps: r.estimated_eps,
                surprise: r.surprise,
                surprise_percentage: r.surprise_percentage,
            })
            .collect(),
    )
}

fn reports<T: DeserializeOwned>(raw: &Value, field: &str, limit: usize) -> Option<Vec<T>> {
    let reports = raw.get(field)?.as_array()?;
    Some(reports.iter().filter_map(record).take(limit).collect())
}

/// Normalizes an `OVERVIEW` payload.
///
/// The overview exists only if it carries a `Symbol`; anything else is "not
/// found" rather than a partially populated record.
#[must_use]
pub fn company(raw: &Value) -> Option<CompanyInfo> {
    let symbol = raw.get("Symbol")?.as_str().filter(|s| !s.is_empty())?;
    let overview: AvOverview = record(raw)?;

    Some(CompanyInfo {
        symbol: Symbol::new(symbol),
        name: overview.name,
        sector: or_na(overview.sector),
        industry: or_na(overview.industry),
        market_cap: overview.market_capitalization,
        pe: overview.pe_ratio,
        beta: overview.beta,
        dividend_yield: overview.dividend_yield,
        description: overview.description,
    })
}

fn or_na(value: String) -> String {
    if value.is_empty() || value == "None" {
        "N/A".to_string()
    } else {
        value
    }
}

/// Normalizes a `NEWS_SENTIMENT` payload.
#[must_use]
pub fn news(raw: &Value) -> Option<Vec<NewsItem>> {
    let feed = raw.get("feed")?.as_array()?;

    let items = feed
        .iter()
        .filter_map(record::<AvNewsItem>)
        .map(|item| NewsItem {
            title: item.title,
            summary: item.summary,
            source: item.source,
            published_at: item.time_published,
            sentiment: Sentiment::from_score(item.overall_sentiment_score),
            relevant_symbols: item
                .ticker_sentiment
                .into_iter()
                .filter(|t| !t.ticker.is_empty())
                .map(|t| Symbol::new(t.ticker))
                .collect(),
            url: item.url,
        })
        .collect();

    Some(items)
}

/// Normalizes a `SYMBOL_SEARCH` payload.
#[must_use]
pub fn symbol_matches(raw: &Value) -> Option<Vec<SymbolMatch>> {
    let matches = raw.get("bestMatches")?.as_array()?;

    let matches = matches
        .iter()
        .filter_map(record::<AvSymbolMatch>)
        .filter(|m| !m.symbol.is_empty())
        .map(|m| SymbolMatch {
            symbol: Symbol::new(m.symbol),
            name: m.name,
            kind: m.kind,
            region: m.region,
            currency: m.currency,
            match_score: m.match_score,
        })
        .collect();

    Some(matches)
}

/// Normalizes a `TOP_GAINERS_LOSERS` payload.
#[must_use]
pub fn market_movers(raw: &Value) -> Option<MarketMovers> {
    let object = raw.as_object()?;
    if !["top_gainers", "top_losers", "most_actively_traded"]
        .iter()
        .any(|field| object.contains_key(*field))
    {
        return None;
    }

    let movers = |field: &str| -> Vec<Mover> {
        object
            .get(field)
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(record::<AvMover>)
                    .map(|m| Mover {
                        ticker: Symbol::new(m.ticker),
                        price: m.price,
                        change_amount: m.change_amount,
                        change_percent: m.change_percentage,
                        volume: m.volume,
                    })
                    .collect()
            })
            .unwrap_or_default()
    };

    Some(MarketMovers {
        last_updated: object
            .get("last_updated")
            .map(lenient::text_from)
            .unwrap_or_default(),
        top_gainers: movers("top_gainers"),
        top_losers: movers("top_losers"),
        most_actively_traded: movers("most_actively_traded"),
    })
}

/// Normalizes a `SECTOR` payload.
///
/// Every `Rank X: <timeframe>` object contributes one entry per sector.
#[must_use]
pub fn sector_performance(raw: &Value) -> Option<Vec<SectorChange>> {
    let object = raw.as_object()?;

    let ranks: Vec<(&str, &Map<String, Value>)> = object
        .iter()
        .filter(|(key, _)| key.starts_with("Rank "))
        .filter_map(|(key, value)| {
            let (_, timeframe) = key.split_once(": ")?;
            Some((timeframe, value.as_object()?))
        })
        .collect();

    if ranks.is_empty() {
        return None;
    }

    let changes = ranks
        .into_iter()
        .flat_map(|(timeframe, sectors)| {
            sectors.iter().map(move |(sector, change)| SectorChange {
                timeframe: timeframe.to_string(),
                sector: sector.clone(),
                change_percent: lenient::number_from(change),
            })
        })
        .collect();

    Some(changes)
}

fn non_empty_object(value: &Value) -> Option<&Value> {
    value.as_object().filter(|o| !o.is_empty()).map(|_| value)
}

fn record<T: DeserializeOwned>(value: &Value) -> Option<T> {
    match T::deserialize(value) {
        Ok(record) => Some(record),
        Err(e) => {
            debug!(error = %e, "Skipping malformed record");
            None
        }
    }
}

// ============================================================================
// Alpha Vantage Response Types
// ============================================================================

/// `Global Quote` object.
#[derive(Debug, Deserialize)]
struct AvGlobalQuote {
    #[serde(rename = "05. price", default, deserialize_with = "lenient::number")]
    price: f64,
    #[serde(rename = "06. volume", default, deserialize_with = "lenient::count")]
    volume: u64,
    #[serde(rename = "07. latest trading day", default, deserialize_with = "lenient::text")]
    latest_trading_day: String,
    #[serde(rename = "09. change", default, deserialize_with = "lenient::number")]
    change: f64,
    #[serde(rename = "10. change percent", default, deserialize_with = "lenient::number")]
    change_percent: f64,
}

/// `Realtime Currency Exchange Rate` object.
#[derive(Debug, Deserialize)]
struct AvExchangeRate {
    #[serde(rename = "5. Exchange Rate", default, deserialize_with = "lenient::number")]
    exchange_rate: f64,
    #[serde(rename = "6. Last Refreshed", default, deserialize_with = "lenient::text")]
    last_refreshed: String,
}

/// One entry of a date-keyed price series.
#[derive(Debug, Deserialize)]
struct AvBar {
    #[serde(rename = "1. open", default, deserialize_with = "lenient::number")]
    open: f64,
    #[serde(rename = "2. high", default, deserialize_with = "lenient::number")]
    high: f64,
    #[serde(rename = "3. low", default, deserialize_with = "lenient::number")]
    low: f64,
    #[serde(rename = "4. close", default, deserialize_with = "lenient::number")]
    close: f64,
    #[serde(rename = "5. volume", default, deserialize_with = "lenient::count")]
    volume: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvIncomeReport {
    #[serde(default, deserialize_with = "lenient::text")]
    fiscal_date_ending: String,
    #[serde(default, deserialize_with = "lenient::number")]
    total_revenue: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    gross_profit: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    net_income: f64,
    #[serde(rename = "reportedEPS", default, deserialize_with = "lenient::number")]
    reported_eps: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvBalanceReport {
    #[serde(default, deserialize_with = "lenient::text")]
    fiscal_date_ending: String,
    #[serde(default, deserialize_with = "lenient::number")]
    total_assets: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    total_liabilities: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    total_shareholder_equity: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AvEarningsReport {
    #[serde(default, deserialize_with = "lenient::text")]
    fiscal_date_ending: String,
    #[serde(rename = "reportedEPS", default, deserialize_with = "lenient::number")]
    reported_eps: f64,
    #[serde(rename = "estimatedEPS", default, deserialize_with = "lenient::number")]
    estimated_eps: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    surprise: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    surprise_percentage: f64,
}

/// `OVERVIEW` payload. The API returns many more fields than are mapped here.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AvOverview {
    #[serde(default, deserialize_with = "lenient::text")]
    name: String,
    #[serde(default, deserialize_with = "lenient::text")]
    sector: String,
    #[serde(default, deserialize_with = "lenient::text")]
    industry: String,
    #[serde(default, deserialize_with = "lenient::number")]
    market_capitalization: f64,
    #[serde(rename = "PERatio", default, deserialize_with = "lenient::number")]
    pe_ratio: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    beta: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    dividend_yield: f64,
    #[serde(default, deserialize_with = "lenient::text")]
    description: String,
}

#[derive(Debug, Deserialize)]
struct AvNewsItem {
    #[serde(default, deserialize_with = "lenient::text")]
    title: String,
    #[serde(default, deserialize_with = "lenient::text")]
    summary: String,
    #[serde(default, deserialize_with = "lenient::text")]
    source: String,
    #[serde(default, deserialize_with = "lenient::text")]
    time_published: String,
    #[serde(default, deserialize_with = "lenient::text")]
    url: String,
    #[serde(default, deserialize_with = "lenient::number")]
    overall_sentiment_score: f64,
    #[serde(default)]
    ticker_sentiment: Vec<AvTickerSentiment>,
}

#[derive(Debug, Deserialize)]
struct AvTickerSentiment {
    #[serde(default, deserialize_with = "lenient::text")]
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct AvSymbolMatch {
    #[serde(rename = "1. symbol", default, deserialize_with = "lenient::text")]
    symbol: String,
    #[serde(rename = "2. name", default, deserialize_with = "lenient::text")]
    name: String,
    #[serde(rename = "3. type", default, deserialize_with = "lenient::text")]
    kind: String,
    #[serde(rename = "4. region", default, deserialize_with = "lenient::text")]
    region: String,
    #[serde(rename = "8. currency", default, deserialize_with = "lenient::text")]
    currency: String,
    #[serde(rename = "9. matchScore", default, deserialize_with = "lenient::number")]
    match_score: f64,
}

#[derive(Debug, Deserialize)]
struct AvMover {
    #[serde(default, deserialize_with = "lenient::text")]
    ticker: String,
    #[serde(default, deserialize_with = "lenient::number")]
    price: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    change_amount: f64,
    #[serde(default, deserialize_with = "lenient::number")]
    change_percentage: f64,
    #[serde(default, deserialize_with = "lenient::count")]
    volume: u64,
}
