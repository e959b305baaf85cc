//! Service configuration.

use marketdata_core::{DEFAULT_REQUEST_TIMEOUT, TtlClass};
use std::time::Duration;
use tracing::warn;

/// Default freshness window for quotes, company data, exchange rates and news.
pub const DEFAULT_LIVE_TTL: Duration = Duration::from_secs(5 * 60);

/// Default freshness window for series, indicators, statements and rankings.
pub const DEFAULT_SERIES_TTL: Duration = Duration::from_secs(10 * 60);

/// Default suffix marking Warsaw Stock Exchange symbols.
pub const DEFAULT_POLISH_SUFFIX: &str = ".WA";

/// Default exchange-rate basket.
pub const DEFAULT_CURRENCIES: &[&str] = &["USD", "EUR", "GBP", "CHF"];

/// Cache freshness and size policy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CachePolicy {
    /// TTL of [`TtlClass::Live`] entries.
    pub live_ttl: Duration,
    /// TTL of [`TtlClass::Series`] entries.
    pub series_ttl: Duration,
    /// Optional bound on the number of stored entries. Unbounded if `None`.
    pub max_entries: Option<usize>,
}

impl CachePolicy {
    /// Returns the TTL for a freshness class.
    #[must_use]
    pub const fn ttl_for(&self, class: TtlClass) -> Duration {
        match class {
            TtlClass::Live => self.live_ttl,
            TtlClass::Series => self.series_ttl,
        }
    }

    /// Returns the longest configured TTL, suitable for sweeping the cache.
    #[must_use]
    pub fn longest_ttl(&self) -> Duration {
        self.live_ttl.max(self.series_ttl)
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            live_ttl: DEFAULT_LIVE_TTL,
            series_ttl: DEFAULT_SERIES_TTL,
            max_entries: None,
        }
    }
}

/// Configuration of a [`MarketDataService`](crate::MarketDataService).
///
/// # Example
///
/// ```
/// use marketdata::ServiceConfig;
/// use std::time::Duration;
///
/// let config = ServiceConfig::new("https://project.example/functions/v1/market-data")
///     .with_live_ttl(Duration::from_secs(60))
///     .with_max_entries(1_000);
///
/// assert_eq!(config.cache.max_entries, Some(1_000));
/// assert_eq!(config.statement_periods, 5);
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// URL of the proxy function that forwards Alpha Vantage queries.
    pub gateway_url: String,
    /// Bearer token of the proxy itself (not the upstream API key).
    pub gateway_token: Option<String>,
    /// Timeout applied to every outbound HTTP request.
    pub request_timeout: Duration,
    /// Cache freshness and size policy.
    pub cache: CachePolicy,
    /// Symbol suffix routed to the Warsaw quote source. Empty disables it.
    pub polish_suffix: String,
    /// Currencies fetched by the exchange-rate accessor.
    pub currencies: Vec<String>,
    /// Number of annual reports kept for income statements and balance sheets.
    pub statement_periods: usize,
    /// Number of quarterly earnings reports kept.
    pub earnings_quarters: usize,
}

impl std::fmt::Debug for ServiceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceConfig")
            .field("gateway_url", &self.gateway_url)
            .field(
                "gateway_token",
                &self.gateway_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("request_timeout", &self.request_timeout)
            .field("cache", &self.cache)
            .field("polish_suffix", &self.polish_suffix)
            .field("currencies", &self.currencies)
            .field("statement_periods", &self.statement_periods)
            .field("earnings_quarters", &self.earnings_quarters)
            .finish()
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            gateway_url: String::new(),
            gateway_token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            cache: CachePolicy::default(),
            polish_suffix: DEFAULT_POLISH_SUFFIX.to_string(),
            currencies: DEFAULT_CURRENCIES.iter().map(|c| (*c).to_string()).collect(),
            statement_periods: marketdata_alphavantage::normalize::ANNUAL_PERIODS,
            earnings_quarters: marketdata_alphavantage::normalize::EARNINGS_QUARTERS,
        }
    }
}

impl ServiceConfig {
    /// Environment variable holding the proxy URL.
    pub const GATEWAY_URL_VAR: &'static str = "MARKETDATA_GATEWAY_URL";
    /// Environment variable holding the proxy bearer token.
    pub const GATEWAY_TOKEN_VAR: &'static str = "MARKETDATA_GATEWAY_TOKEN";
    /// Environment variable overriding the live TTL, in seconds.
    pub const LIVE_TTL_VAR: &'static str = "MARKETDATA_LIVE_TTL_SECS";
    /// Environment variable overriding the series TTL, in seconds.
    pub const SERIES_TTL_VAR: &'static str = "MARKETDATA_SERIES_TTL_SECS";
    /// Environment variable bounding the cache size.
    pub const MAX_ENTRIES_VAR: &'static str = "MARKETDATA_CACHE_MAX_ENTRIES";
    /// Environment variable overriding the request timeout, in seconds.
    pub const REQUEST_TIMEOUT_VAR: &'static str = "MARKETDATA_REQUEST_TIMEOUT_SECS";

    /// Create a configuration with defaults for the given proxy URL.
    #[must_use]
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            ..Self::default()
        }
    }

    /// Build a configuration from `MARKETDATA_*` environment variables.
    ///
    /// Unset variables keep their defaults; unparseable values are logged and
    /// ignored.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(url) = lookup(Self::GATEWAY_URL_VAR) {
            config.gateway_url = url.trim().to_string();
        }
        config.gateway_token = lookup(Self::GATEWAY_TOKEN_VAR)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty());

        if let Some(secs) = parse_var::<u64>(&lookup, Self::LIVE_TTL_VAR) {
            config.cache.live_ttl = Duration::from_secs(secs);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, Self::SERIES_TTL_VAR) {
            config.cache.series_ttl = Duration::from_secs(secs);
        }
        if let Some(max) = parse_var::<usize>(&lookup, Self::MAX_ENTRIES_VAR) {
            config.cache.max_entries = (max > 0).then_some(max);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, Self::REQUEST_TIMEOUT_VAR) {
            if secs > 0 {
                config.request_timeout = Duration::from_secs(secs);
            }
        }

        config
    }

    /// Set the proxy bearer token.
    #[must_use]
    pub fn with_gateway_token(mut self, token: impl Into<String>) -> Self {
        self.gateway_token = Some(token.into());
        self
    }

    /// Set the HTTP request timeout.
    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the TTL of live entries.
    #[must_use]
    pub const fn with_live_ttl(mut self, ttl: Duration) -> Self {
        self.cache.live_ttl = ttl;
        self
    }

    /// Set the TTL of series entries.
    #[must_use]
    pub const fn with_series_ttl(mut self, ttl: Duration) -> Self {
        self.cache.series_ttl = ttl;
        self
    }

    /// Bound the number of cached entries.
    #[must_use]
    pub const fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.cache.max_entries = Some(max_entries);
        self
    }

    /// Set the symbol suffix routed to the Warsaw quote source.
    #[must_use]
    pub fn with_polish_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.polish_suffix = suffix.into();
        self
    }

    /// Set the exchange-rate basket.
    #[must_use]
    pub fn with_currencies<I, S>(mut self, currencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.currencies = currencies.into_iter().map(Into::into).collect();
        self
    }

    /// Set how many annual reports statements keep.
    #[must_use]
    pub const fn with_statement_periods(mut self, periods: usize) -> Self {
        self.statement_periods = periods;
        self
    }

    /// Set how many quarterly earnings reports are kept.
    #[must_use]
    pub const fn with_earnings_quarters(mut self, quarters: usize) -> Self {
        self.earnings_quarters = quarters;
        self
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
) -> Option<T> {
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(variable = name, value = %raw, "Ignoring unparseable configuration value");
            None
        }
    }
}
