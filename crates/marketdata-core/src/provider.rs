//! Source traits for fetching market data.
//!
//! This module defines the seams between the domain accessors and the
//! network:
//!
//! - [`DataProvider`] - Base trait for all sources
//! - [`Gateway`] - Proxy that forwards a named upstream query and returns raw JSON
//! - [`QuoteProvider`] - Source that answers quotes directly
//! - [`ExchangeRateProvider`] - Source of central-bank mid-market rates

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::time::Duration;

use crate::{
    error::Result,
    types::{Quote, Symbol},
};

/// Timeout applied to outbound HTTP requests unless a source is built with its own.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Base trait for all data sources.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this source (e.g., "Alpha Vantage").
    fn name(&self) -> &str;

    /// Returns a description of this source.
    fn description(&self) -> &str;
}

/// A gateway request parameter value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParamValue {
    /// Textual parameter.
    Text(String),
    /// Numeric parameter.
    Number(i64),
}

impl fmt::Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&Symbol> for ParamValue {
    fn from(symbol: &Symbol) -> Self {
        Self::Text(symbol.as_str().to_string())
    }
}

impl From<i64> for ParamValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<u32> for ParamValue {
    fn from(n: u32) -> Self {
        Self::Number(i64::from(n))
    }
}

/// A logical upstream query: a function name plus its parameters.
///
/// Serializes to the flat parameter object the proxy forwards upstream,
/// with the function name under `function`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GatewayRequest {
    function: String,
    #[serde(flatten)]
    params: BTreeMap<String, ParamValue>,
}

impl GatewayRequest {
    /// Creates a request for the given upstream function.
    #[must_use]
    pub fn new(function: impl Into<String>) -> Self {
        Self {
            function: function.into(),
            params: BTreeMap::new(),
        }
    }

    /// Adds a parameter, replacing any previous value under the same name.
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// Returns the upstream function name.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Returns a parameter by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.get(name)
    }

    /// Returns all parameters in name order.
    #[must_use]
    pub const fn params(&self) -> &BTreeMap<String, ParamValue> {
        &self.params
    }
}

/// Proxy that forwards a named query to the upstream provider.
///
/// The gateway attaches the upstream credential itself; implementations of
/// this trait never hold it. A call performs exactly one outbound request and
/// never retries.
#[async_trait]
pub trait Gateway: DataProvider {
    /// Invokes the upstream function and returns its JSON payload verbatim.
    ///
    /// Returns [`DataError::RateLimited`](crate::DataError::RateLimited) for
    /// call-limit notices and [`DataError::Upstream`](crate::DataError::Upstream)
    /// for explicit upstream error messages.
    async fn invoke(&self, request: &GatewayRequest) -> Result<Value>;
}

/// Source that answers quotes directly, without the gateway.
#[async_trait]
pub trait QuoteProvider: DataProvider {
    /// Fetches the latest quote for a symbol.
    ///
    /// Returns `Ok(None)` if the source does not know the symbol.
    async fn quote(&self, symbol: &Symbol) -> Result<Option<Quote>>;
}

/// Source of mid-market exchange rates against the local currency.
#[async_trait]
pub trait ExchangeRateProvider: DataProvider {
    /// Fetches the current mid-market rate for one ISO currency code.
    ///
    /// Returns `Ok(None)` if the source publishes no rate for the currency.
    async fn mid_rate(&self, currency: &str) -> Result<Option<f64>>;
}
