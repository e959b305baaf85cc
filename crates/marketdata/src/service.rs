//! Cached domain accessors over the gateway and the direct sources.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use marketdata_alphavantage::{ProxyGateway, normalize};
use marketdata_cache::InMemoryCache;
use marketdata_core::{
    BalanceSheet, CacheKey, CompanyInfo, DataCache, DataError, DataKind, EarningsReport,
    ExchangeRateProvider, ExchangeRateSet, Fetched, Gateway, GatewayRequest, HistoricalBar,
    IncomeStatement, IndicatorPoint, Interval, MacdPoint, MarketMovers, NewsItem, OutputSize,
    Quote, QuoteProvider, Result, SectorChange, Symbol, SymbolMatch,
};
use marketdata_nbp::NbpProvider;
use marketdata_stooq::StooqProvider;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::ServiceConfig;

/// Default RSI look-back period.
pub const DEFAULT_RSI_PERIOD: u32 = 14;

/// Default SMA look-back period.
pub const DEFAULT_SMA_PERIOD: u32 = 20;

/// Default number of news items requested.
pub const DEFAULT_NEWS_LIMIT: u32 = 10;

/// Index proxies reported by [`MarketDataService::market_indices`], keyed by index name.
pub const MARKET_INDICES: &[(&str, &str)] =
    &[("SPY", "S&P 500"), ("QQQ", "NASDAQ"), ("DIA", "Dow Jones")];

/// Symbol whose quote [`MarketDataService::ping`] requests.
const PING_SYMBOL: &str = "AAPL";

/// Market-data access layer.
///
/// Every accessor follows the same template: build a [`CacheKey`], serve a
/// fresh cache entry if there is one, otherwise call the source, normalize,
/// store and return. Accessors never return errors; they log a failure and
/// report it as [`Fetched::Failed`].
///
/// # Example
///
/// ```rust,ignore
/// use marketdata::{MarketDataService, ServiceConfig, Symbol};
///
/// #[tokio::main]
/// async fn main() -> marketdata::Result<()> {
///     let service = MarketDataService::from_config(ServiceConfig::from_env())?;
///
///     if let Some(quote) = service.quote(&Symbol::new("PKN.WA")).await.into_option() {
///         println!("{} {}", quote.symbol, quote.price);
///     }
///
///     let news = service.financial_news(5).await.unwrap_or_default();
///     println!("{} headlines", news.len());
///
///     Ok(())
/// }
/// ```
pub struct MarketDataService {
    gateway: Arc<dyn Gateway>,
    polish_quotes: Arc<dyn QuoteProvider>,
    rate_source: Arc<dyn ExchangeRateProvider>,
    cache: Arc<dyn DataCache>,
    config: ServiceConfig,
}

impl std::fmt::Debug for MarketDataService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataService")
            .field("gateway", &self.gateway.name())
            .field("polish_quotes", &self.polish_quotes.name())
            .field("rate_source", &self.rate_source.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl MarketDataService {
    /// Start building a service with injected sources or cache.
    #[must_use]
    pub fn builder() -> MarketDataServiceBuilder {
        MarketDataServiceBuilder::default()
    }

    /// Wire the HTTP sources and an in-memory cache from a configuration.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidParameter`] if no gateway URL is configured.
    pub fn from_config(config: ServiceConfig) -> Result<Self> {
        Self::builder().config(config).build()
    }

    /// Returns the configuration the service was built with.
    #[must_use]
    pub const fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Returns the shared cache.
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn DataCache> {
        &self.cache
    }

    /// Removes entries older than the longest configured TTL.
    ///
    /// # Errors
    ///
    /// Returns the cache's error if the sweep fails.
    pub async fn sweep_cache(&self) -> Result<usize> {
        self.cache
            .invalidate_stale(self.config.cache.longest_ttl())
            .await
    }

    /// Drops every cached entry.
    ///
    /// # Errors
    ///
    /// Returns the cache's error if clearing fails.
    pub async fn clear_cache(&self) -> Result<()> {
        self.cache.clear().await
    }

    // ------------------------------------------------------------------
    // Quotes
    // ------------------------------------------------------------------

    /// Latest quote for a US-listed symbol.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn us_quote(&self, symbol: &Symbol) -> Fetched<Quote> {
        let key = CacheKey::new(DataKind::UsQuote).with(symbol);
        let request = GatewayRequest::new("GLOBAL_QUOTE").param("symbol", symbol);
        self.cached(key, self.query(request, |raw| normalize::quote(symbol, raw)))
            .await
    }

    /// Latest quote for a Warsaw Stock Exchange symbol (e.g. `PKN.WA`).
    ///
    /// Change is measured from the session open.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn polish_quote(&self, symbol: &Symbol) -> Fetched<Quote> {
        let key = CacheKey::new(DataKind::PolishQuote).with(symbol);
        self.cached(key, self.polish_quotes.quote(symbol)).await
    }

    /// Latest quote, routed by exchange suffix.
    ///
    /// Symbols ending in the configured Polish suffix go to the Warsaw source,
    /// everything else to the gateway. An empty suffix disables Warsaw routing.
    pub async fn quote(&self, symbol: &Symbol) -> Fetched<Quote> {
        if symbol.has_suffix(&self.config.polish_suffix) {
            self.polish_quote(symbol).await
        } else {
            self.us_quote(symbol).await
        }
    }

    /// Latest USD price of a cryptocurrency (e.g. `BTC`).
    ///
    /// The upstream endpoint reports no change or volume, so those are zero.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn crypto_quote(&self, symbol: &Symbol) -> Fetched<Quote> {
        let key = CacheKey::new(DataKind::CryptoQuote).with(symbol);
        let request = GatewayRequest::new("CURRENCY_EXCHANGE_RATE")
            .param("from_currency", symbol)
            .param("to_currency", "USD");
        self.cached(
            key,
            self.query(request, |raw| normalize::crypto_quote(symbol, raw)),
        )
        .await
    }

    /// Quotes for many symbols, fetched concurrently.
    ///
    /// Symbols that fail or have no data are dropped, so the result may be
    /// shorter than the input. Never fails.
    pub async fn quotes(&self, symbols: &[Symbol]) -> Vec<Quote> {
        let outcomes = join_all(symbols.iter().map(|symbol| self.quote(symbol))).await;
        let quotes: Vec<Quote> = outcomes
            .into_iter()
            .filter_map(Fetched::into_option)
            .collect();
        debug!(
            requested = symbols.len(),
            returned = quotes.len(),
            "Batch quotes"
        );
        quotes
    }

    /// Quotes of the major US index proxies, keyed by index name.
    ///
    /// Indices without a quote are left out.
    pub async fn market_indices(&self) -> BTreeMap<String, Quote> {
        let mut indices = BTreeMap::new();
        for (ticker, name) in MARKET_INDICES {
            if let Some(quote) = self.us_quote(&Symbol::new(*ticker)).await.into_option() {
                indices.insert((*name).to_string(), quote);
            }
        }
        indices
    }

    /// Returns true if a quote can be obtained through the gateway.
    pub async fn ping(&self) -> bool {
        self.us_quote(&Symbol::new(PING_SYMBOL)).await.is_data()
    }

    // ------------------------------------------------------------------
    // Company and prices
    // ------------------------------------------------------------------

    /// Company overview.
    ///
    /// An overview without a symbol is reported as [`Fetched::Empty`].
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn company_info(&self, symbol: &Symbol) -> Fetched<CompanyInfo> {
        let key = CacheKey::new(DataKind::Company).with(symbol);
        let request = GatewayRequest::new("OVERVIEW").param("symbol", symbol);
        self.cached(key, self.query(request, normalize::company))
            .await
    }

    /// Daily bars, most recent first.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn daily_prices(
        &self,
        symbol: &Symbol,
        output_size: OutputSize,
    ) -> Fetched<Vec<HistoricalBar>> {
        let key = CacheKey::new(DataKind::DailySeries)
            .with(symbol)
            .with(output_size);
        let request = GatewayRequest::new("TIME_SERIES_DAILY")
            .param("symbol", symbol)
            .param("outputsize", output_size.as_str());
        self.cached(key, self.query(request, normalize::daily_series))
            .await
    }

    /// Weekly bars, most recent first.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn weekly_prices(&self, symbol: &Symbol) -> Fetched<Vec<HistoricalBar>> {
        let key = CacheKey::new(DataKind::WeeklySeries).with(symbol);
        let request = GatewayRequest::new("TIME_SERIES_WEEKLY").param("symbol", symbol);
        self.cached(key, self.query(request, normalize::weekly_series))
            .await
    }

    // ------------------------------------------------------------------
    // Technical indicators
    // ------------------------------------------------------------------

    /// Relative strength index over closing prices, with a signal per point.
    ///
    /// The conventional call is `rsi(symbol, Interval::Daily, DEFAULT_RSI_PERIOD)`.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn rsi(
        &self,
        symbol: &Symbol,
        interval: Interval,
        period: u32,
    ) -> Fetched<Vec<IndicatorPoint>> {
        if let Err(e) = check_period(period) {
            warn!(error = %e, "Rejected indicator request");
            return Fetched::Failed(e);
        }
        let key = CacheKey::new(DataKind::Rsi)
            .with(symbol)
            .with(interval)
            .with(period);
        let request = indicator_request("RSI", symbol, interval).param("time_period", period);
        self.cached(key, self.query(request, normalize::rsi)).await
    }

    /// MACD over closing prices.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn macd(&self, symbol: &Symbol, interval: Interval) -> Fetched<Vec<MacdPoint>> {
        let key = CacheKey::new(DataKind::Macd).with(symbol).with(interval);
        let request = indicator_request("MACD", symbol, interval);
        self.cached(key, self.query(request, normalize::macd)).await
    }

    /// Simple moving average over closing prices.
    ///
    /// The conventional call is `sma(symbol, Interval::Daily, DEFAULT_SMA_PERIOD)`.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn sma(
        &self,
        symbol: &Symbol,
        interval: Interval,
        period: u32,
    ) -> Fetched<Vec<IndicatorPoint>> {
        if let Err(e) = check_period(period) {
            warn!(error = %e, "Rejected indicator request");
            return Fetched::Failed(e);
        }
        let key = CacheKey::new(DataKind::Sma)
            .with(symbol)
            .with(interval)
            .with(period);
        let request = indicator_request("SMA", symbol, interval).param("time_period", period);
        self.cached(key, self.query(request, normalize::sma)).await
    }

    // ------------------------------------------------------------------
    // Fundamentals
    // ------------------------------------------------------------------

    /// Most recent annual income statements.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn income_statement(&self, symbol: &Symbol) -> Fetched<Vec<IncomeStatement>> {
        let limit = self.config.statement_periods;
        let key = CacheKey::new(DataKind::IncomeStatement).with(symbol);
        let request = GatewayRequest::new("INCOME_STATEMENT").param("symbol", symbol);
        self.cached(
            key,
            self.query(request, |raw| normalize::income_statements(raw, limit)),
        )
        .await
    }

    /// Most recent annual balance sheets.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn balance_sheet(&self, symbol: &Symbol) -> Fetched<Vec<BalanceSheet>> {
        let limit = self.config.statement_periods;
        let key = CacheKey::new(DataKind::BalanceSheet).with(symbol);
        let request = GatewayRequest::new("BALANCE_SHEET").param("symbol", symbol);
        self.cached(
            key,
            self.query(request, |raw| normalize::balance_sheets(raw, limit)),
        )
        .await
    }

    /// Most recent quarterly earnings.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn earnings(&self, symbol: &Symbol) -> Fetched<Vec<EarningsReport>> {
        let limit = self.config.earnings_quarters;
        let key = CacheKey::new(DataKind::Earnings).with(symbol);
        let request = GatewayRequest::new("EARNINGS").param("symbol", symbol);
        self.cached(
            key,
            self.query(request, |raw| normalize::earnings(raw, limit)),
        )
        .await
    }

    // ------------------------------------------------------------------
    // Market-wide data
    // ------------------------------------------------------------------

    /// Sector performance over every timeframe the provider ranks.
    #[instrument(skip(self))]
    pub async fn sector_performance(&self) -> Fetched<Vec<SectorChange>> {
        let key = CacheKey::new(DataKind::SectorPerformance);
        let request = GatewayRequest::new("SECTOR");
        self.cached(key, self.query(request, normalize::sector_performance))
            .await
    }

    /// Symbols matching free-text keywords. Never cached.
    #[instrument(skip(self))]
    pub async fn search_symbols(&self, keywords: &str) -> Fetched<Vec<SymbolMatch>> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Fetched::Empty;
        }
        let request = GatewayRequest::new("SYMBOL_SEARCH").param("keywords", keywords);
        match self.query(request, normalize::symbol_matches).await {
            Ok(matches) => Fetched::from_option(matches),
            Err(e) => {
                warn!(error = %e, "Symbol search failed");
                Fetched::Failed(e)
            }
        }
    }

    /// Top gainers, losers and most actively traded US tickers.
    #[instrument(skip(self))]
    pub async fn top_gainers_losers(&self) -> Fetched<MarketMovers> {
        let key = CacheKey::new(DataKind::MarketMovers);
        let request = GatewayRequest::new("TOP_GAINERS_LOSERS");
        self.cached(key, self.query(request, normalize::market_movers))
            .await
    }

    /// Financial-markets news with sentiment.
    #[instrument(skip(self))]
    pub async fn financial_news(&self, limit: u32) -> Fetched<Vec<NewsItem>> {
        let key = CacheKey::new(DataKind::News).with(limit);
        let request = GatewayRequest::new("NEWS_SENTIMENT")
            .param("topics", "financial_markets")
            .param("limit", limit);
        self.cached(key, self.query(request, normalize::news)).await
    }

    /// Central-bank mid rates in PLN for the configured currency basket.
    ///
    /// Currencies are fetched one after another and cached as a unit. A
    /// currency without a published rate is skipped; a transport failure
    /// fails the whole set.
    #[instrument(skip(self))]
    pub async fn exchange_rates(&self) -> Fetched<ExchangeRateSet> {
        let mut basket: Vec<String> = self
            .config
            .currencies
            .iter()
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty())
            .collect();
        basket.sort();
        basket.dedup();

        let key = CacheKey::new(DataKind::ExchangeRates).with(basket.join(","));
        self.cached(key, async {
            let mut rates = ExchangeRateSet::new();
            for currency in &basket {
                match self.rate_source.mid_rate(currency).await? {
                    Some(rate) => rates.insert(currency.as_str(), rate),
                    None => debug!(currency = %currency, "No rate published"),
                }
            }
            Ok::<_, DataError>((!rates.is_empty()).then_some(rates))
        })
        .await
    }

    // ------------------------------------------------------------------
    // Plumbing
    // ------------------------------------------------------------------

    /// Invokes the gateway and normalizes the payload.
    async fn query<T>(
        &self,
        request: GatewayRequest,
        shape: impl FnOnce(&Value) -> Option<T>,
    ) -> Result<Option<T>> {
        debug!(
            function = request.function(),
            gateway = self.gateway.name(),
            "Cache miss, invoking gateway"
        );
        let raw = self.gateway.invoke(&request).await?;
        Ok(shape(&raw))
    }

    /// Serves `key` from the cache, or runs `fetch` and stores its data.
    ///
    /// `fetch` is only polled on a miss. Empty answers and failures are not
    /// cached.
    async fn cached<T, F>(&self, key: CacheKey, fetch: F) -> Fetched<T>
    where
        T: Serialize + DeserializeOwned,
        F: Future<Output = Result<Option<T>>>,
    {
        let ttl = self.config.cache.ttl_for(key.kind().ttl_class());

        match self.cache.get(&key, ttl).await {
            Ok(Some(value)) => match serde_json::from_value::<T>(value) {
                Ok(data) => {
                    debug!(key = %key, "Serving from cache");
                    return Fetched::Data(data);
                }
                Err(e) => warn!(key = %key, error = %e, "Discarding undecodable cache entry"),
            },
            Ok(None) => {}
            Err(e) => warn!(key = %key, error = %e, "Cache read failed, fetching"),
        }

        match fetch.await {
            Ok(Some(data)) => {
                match serde_json::to_value(&data) {
                    Ok(value) => {
                        if let Err(e) = self.cache.put(&key, value).await {
                            warn!(key = %key, error = %e, "Failed to cache payload");
                        }
                    }
                    Err(e) => warn!(key = %key, error = %e, "Failed to encode payload for cache"),
                }
                Fetched::Data(data)
            }
            Ok(None) => {
                debug!(key = %key, "Source returned no data");
                Fetched::Empty
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Fetch failed");
                Fetched::Failed(e)
            }
        }
    }
}

fn indicator_request(function: &str, symbol: &Symbol, interval: Interval) -> GatewayRequest {
    GatewayRequest::new(function)
        .param("symbol", symbol)
        .param("interval", interval.as_str())
        .param("series_type", "close")
}

fn check_period(period: u32) -> Result<()> {
    if period == 0 {
        return Err(DataError::InvalidParameter(
            "indicator period must be positive".to_string(),
        ));
    }
    Ok(())
}

/// Builder for [`MarketDataService`].
///
/// Sources and cache not supplied explicitly are created from the
/// configuration: a [`ProxyGateway`] for the gateway URL, Stooq for Warsaw
/// quotes, NBP for exchange rates and an [`InMemoryCache`] bounded by
/// `cache.max_entries`.
#[derive(Default)]
pub struct MarketDataServiceBuilder {
    config: ServiceConfig,
    gateway: Option<Arc<dyn Gateway>>,
    polish_quotes: Option<Arc<dyn QuoteProvider>>,
    rate_source: Option<Arc<dyn ExchangeRateProvider>>,
    cache: Option<Arc<dyn DataCache>>,
}

impl std::fmt::Debug for MarketDataServiceBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarketDataServiceBuilder")
            .field("config", &self.config)
            .field("gateway", &self.gateway.as_ref().map(|g| g.name()))
            .field("polish_quotes", &self.polish_quotes.as_ref().map(|p| p.name()))
            .field("rate_source", &self.rate_source.as_ref().map(|p| p.name()))
            .field("cache", &self.cache.as_ref().map(|_| "configured"))
            .finish()
    }
}

impl MarketDataServiceBuilder {
    /// Set the configuration.
    #[must_use]
    pub fn config(mut self, config: ServiceConfig) -> Self {
        self.config = config;
        self
    }

    /// Use the given gateway instead of a [`ProxyGateway`].
    #[must_use]
    pub fn gateway(mut self, gateway: Arc<dyn Gateway>) -> Self {
        debug!(provider = gateway.name(), "Registering gateway");
        self.gateway = Some(gateway);
        self
    }

    /// Use the given source for Warsaw quotes.
    #[must_use]
    pub fn polish_quotes(mut self, provider: Arc<dyn QuoteProvider>) -> Self {
        debug!(provider = provider.name(), "Registering Polish quote source");
        self.polish_quotes = Some(provider);
        self
    }

    /// Use the given exchange-rate source.
    #[must_use]
    pub fn exchange_rates(mut self, provider: Arc<dyn ExchangeRateProvider>) -> Self {
        debug!(provider = provider.name(), "Registering exchange-rate source");
        self.rate_source = Some(provider);
        self
    }

    /// Use the given cache.
    #[must_use]
    pub fn cache(mut self, cache: Arc<dyn DataCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the service.
    ///
    /// # Errors
    ///
    /// Returns [`DataError::InvalidParameter`] if no gateway was supplied and
    /// the configuration has no gateway URL.
    pub fn build(self) -> Result<MarketDataService> {
        let config = self.config;
        let timeout = config.request_timeout;

        let gateway: Arc<dyn Gateway> = match self.gateway {
            Some(gateway) => gateway,
            None if config.gateway_url.trim().is_empty() => {
                return Err(DataError::InvalidParameter(format!(
                    "gateway URL is not configured (set {})",
                    ServiceConfig::GATEWAY_URL_VAR
                )));
            }
            None => {
                let mut gateway = ProxyGateway::with_timeout(config.gateway_url.trim(), timeout);
                if let Some(token) = &config.gateway_token {
                    gateway = gateway.with_token(token.as_str());
                }
                Arc::new(gateway)
            }
        };

        let polish_quotes: Arc<dyn QuoteProvider> = match self.polish_quotes {
            Some(provider) => provider,
            None => Arc::new(StooqProvider::with_timeout(timeout)),
        };
        let rate_source: Arc<dyn ExchangeRateProvider> = match self.rate_source {
            Some(provider) => provider,
            None => Arc::new(NbpProvider::with_timeout(timeout)),
        };
        let cache: Arc<dyn DataCache> = match (self.cache, config.cache.max_entries) {
            (Some(cache), _) => cache,
            (None, Some(max)) => Arc::new(InMemoryCache::with_capacity(max)),
            (None, None) => Arc::new(InMemoryCache::new()),
        };

        Ok(MarketDataService {
            gateway,
            polish_quotes,
            rate_source,
            cache,
            config,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CachePolicy;

    #[test]
    fn test_build_requires_gateway_url() {
        let err = MarketDataService::from_config(ServiceConfig::default()).unwrap_err();
        assert!(matches!(err, DataError::InvalidParameter(_)));
    }

    #[test]
    fn test_from_config_wires_http_sources() {
        let config = ServiceConfig::new("https://proxy.example/market-data")
            .with_gateway_token("anon")
            .with_max_entries(10);
        let service = MarketDataService::from_config(config).unwrap();

        let debug = format!("{service:?}");
        assert!(debug.contains("Alpha Vantage"));
        assert!(debug.contains("Stooq"));
        assert!(debug.contains("NBP"));
        assert!(!debug.contains("anon"));
        assert_eq!(
            service.config().cache,
            CachePolicy {
                max_entries: Some(10),
                ..CachePolicy::default()
            }
        );
    }

    #[test]
    fn test_indicator_request() {
        let request = indicator_request("MACD", &Symbol::new("ibm"), Interval::Weekly);
        assert_eq!(request.function(), "MACD");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "function": "MACD",
                "symbol": "IBM",
                "interval": "weekly",
                "series_type": "close"
            })
        );
    }
}
