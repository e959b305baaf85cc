#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/marketdata-rs/marketdata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! NBP exchange-rate source.
//!
//! # Example
//!
//! ```no_run
//! use marketdata_nbp::NbpProvider;
//! use marketdata_core::ExchangeRateProvider;
//!
//! # async fn example() -> marketdata_core::Result<()> {
//! let provider = NbpProvider::new();
//! if let Some(rate) = provider.mid_rate("EUR").await? {
//!     println!("1 EUR = {rate} PLN");
//! }
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use async_trait::async_trait;
use marketdata_core::{
    DEFAULT_REQUEST_TIMEOUT, DataError, DataProvider, ExchangeRateProvider, Result,
};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

/// NBP public API base URL.
const NBP_BASE_URL: &str = "https://api.nbp.pl/api";

/// National Bank of Poland exchange-rate provider.
#[derive(Debug, Clone)]
pub struct NbpProvider {
    client: reqwest::Client,
    base_url: String,
}

impl NbpProvider {
    /// Create a new NBP provider with the default request timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a new NBP provider with a custom request timeout.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self::with_client(client)
    }

    /// Create a new NBP provider with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: NBP_BASE_URL.to_string(),
        }
    }

    /// Point the provider at another host (for testing with wiremock).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for NbpProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl DataProvider for NbpProvider {
    fn name(&self) -> &str {
        "NBP"
    }

    fn description(&self) -> &str {
        "National Bank of Poland table A mid-market exchange rates"
    }
}

#[async_trait]
impl ExchangeRateProvider for NbpProvider {
    async fn mid_rate(&self, currency: &str) -> Result<Option<f64>> {
        let code = currency.trim().to_lowercase();
        if code.is_empty() || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(DataError::InvalidParameter(format!(
                "invalid currency code: {currency:?}"
            )));
        }

        let url = format!("{}/exchangerates/rates/a/{code}/", self.base_url);
        debug!(currency = %code, "NBP request");

        let response = self
            .client
            .get(&url)
            .query(&[("format", "json")])
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        // 404 = NBP does not publish this currency in table A
        if response.status() == StatusCode::NOT_FOUND {
            debug!(currency = %code, "NBP has no rate for currency");
            return Ok(None);
        }

        if !response.status().is_success() {
            return Err(DataError::Network(format!(
                "HTTP {}",
                response.status().as_u16()
            )));
        }

        let table = response
            .json::<NbpRateTable>()
            .await
            .map_err(|e| DataError::Parse(e.to_string()))?;

        Ok(table
            .rates
            .first()
            .map(|rate| rate.mid)
            .filter(|mid| mid.is_finite()))
    }
}

// ============================================================================
// NBP Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
struct NbpRateTable {
    #[serde(default)]
    rates: Vec<NbpRate>,
}

#[derive(Debug, Deserialize)]
struct NbpRate {
    mid: f64,
}
