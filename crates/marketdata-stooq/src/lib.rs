#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/marketdata-rs/marketdata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Stooq quote source.
//!
//! # Example
//!
//! ```no_run
//! use marketdata_stooq::StooqProvider;
//! use marketdata_core::{QuoteProvider, Symbol};
//!
//! # async fn example() -> marketdata_core::Result<()> {
//! let provider = StooqProvider::new();
//! if let Some(quote) = provider.quote(&Symbol::new("PKN.WA")).await? {
//!     println!("{} {} ({:+.2}%)", quote.symbol, quote.price, quote.change_percent);
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use marketdata_core::{
    DEFAULT_REQUEST_TIMEOUT, DataError, DataProvider, Quote, QuoteProvider, Result, Symbol,
};
use tracing::debug;

/// Stooq base URL.
const STOOQ_BASE_URL: &str = "https://stooq.pl";

/// Field selector: symbol, date, time, open, high, low, close, volume.
const FIELDS: &str = "sd2t2ohlcv";

/// Marker Stooq writes into every column of an unknown symbol.
const NO_DATA: &str = "N/D";

/// Stooq CSV quote provider.
///
/// Implements [`DataProvider`] and [`QuoteProvider`].
#[derive(Debug, Clone)]
pub struct StooqProvider {
    client: reqwest::Client,
    base_url: String,
}

impl StooqProvider {
    /// Create a new Stooq provider with the default request timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a new Stooq provider with a custom request timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(client)
    }

    /// Create a new Stooq provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: STOOQ_BASE_URL.to_string(),
        }
    }

    /// Point the provider at another host (for testing with wiremock).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for StooqProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for StooqProvider {
    fn name(&self) -> &str {
        "Stooq"
    }

    fn description(&self) -> &str {
        "Stooq CSV quotes for Warsaw Stock Exchange symbols"
    }
}

#[async_trait]
impl QuoteProvider for StooqProvider {
    async fn quote(&self, symbol: &Symbol) -> Result<Option<Quote>> {
        let url = format!("{}/q/l/", self.base_url);
        let ticker = symbol.as_str().to_lowercase();
        debug!(symbol = %symbol, "Stooq request");

        let response = self
            .client
            .get(&url)
            .query(&[("s", ticker.as_str()), ("f", FIELDS), ("h", ""), ("e", "csv")])
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DataError::Network(format!("HTTP {}", status.as_u16())));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        Ok(parse_csv(symbol, &body))
    }
}

/// Parses a Stooq quote CSV (header line plus one data row).
///
/// Columns are read by position. Returns `None` when the data row is
/// missing, is the `N/D` placeholder, or has no usable close price.
#[must_use]
pub fn parse_csv(symbol: &Symbol, body: &str) -> Option<Quote> {
    let row = body.lines().map(str::trim).filter(|l| !l.is_empty()).nth(1)?;
    let fields: Vec<&str> = row.split(',').map(str::trim).collect();
    if fields.len() < 8 {
        debug!(symbol = %symbol, row, "Short Stooq row");
        return None;
    }

    let (date, time) = (fields[1], fields[2]);
    if date == NO_DATA {
        debug!(symbol = %symbol, "Stooq has no data for symbol");
        return None;
    }

    let close = number(fields[6])?;
    let open = number(fields[3]).unwrap_or(0.0);
    let volume = fields[7]
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .map_or(0, |v| v as u64);

    let change = close - open;
    let change_percent = if open == 0.0 { 0.0 } else { change / open * 100.0 };

    let last_updated = if time == NO_DATA || time.is_empty() {
        date.to_string()
    } else {
        format!("{date} {time}")
    };

    Some(Quote {
        symbol: symbol.clone(),
        price: close,
        change,
        change_percent,
        volume,
        last_updated,
    })
}

fn number(field: &str) -> Option<f64> {
    field.parse::<f64>().ok().filter(|v| v.is_finite())
}
