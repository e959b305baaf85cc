//! Accessor behavior against in-process sources.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use marketdata::{
    CacheKey, DataCache, DataError, DataKind, DataProvider, ExchangeRateProvider, Fetched,
    Gateway, GatewayRequest, Interval, MarketDataService, NoopCache, OutputSize, Quote,
    QuoteProvider, Result, ServiceConfig, Signal, Symbol,
};
use serde_json::{Value, json};

type Responder = Box<dyn Fn(&GatewayRequest) -> Result<Value> + Send + Sync>;

/// Gateway that answers from a closure and records every request.
struct MockGateway {
    calls: AtomicUsize,
    requests: Mutex<Vec<GatewayRequest>>,
    respond: Responder,
}

impl std::fmt::Debug for MockGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGateway")
            .field("calls", &self.calls)
            .finish_non_exhaustive()
    }
}

impl MockGateway {
    fn new(respond: impl Fn(&GatewayRequest) -> Result<Value> + Send + Sync + 'static) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl DataProvider for MockGateway {
    fn name(&self) -> &str {
        "mock-gateway"
    }

    fn description(&self) -> &str {
        "In-process gateway"
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn invoke(&self, request: &GatewayRequest) -> Result<Value> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        (self.respond)(request)
    }
}

/// Warsaw quote source serving fixed prices.
#[derive(Debug, Default)]
struct MockQuotes {
    calls: AtomicUsize,
    prices: HashMap<String, f64>,
}

impl DataProvider for MockQuotes {
    fn name(&self) -> &str {
        "mock-quotes"
    }

    fn description(&self) -> &str {
        "In-process quote source"
    }
}

#[async_trait]
impl QuoteProvider for MockQuotes {
    async fn quote(&self, symbol: &Symbol) -> Result<Option<Quote>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.prices.get(symbol.as_str()).map(|price| Quote {
            symbol: symbol.clone(),
            price: *price,
            change: 0.5,
            change_percent: 1.0,
            volume: 100,
            last_updated: "2024-05-10 17:00:00".to_string(),
        }))
    }
}

/// Exchange-rate source serving fixed rates.
#[derive(Debug, Default)]
struct MockRates {
    calls: AtomicUsize,
    rates: HashMap<String, f64>,
    fail: bool,
}

impl DataProvider for MockRates {
    fn name(&self) -> &str {
        "mock-rates"
    }

    fn description(&self) -> &str {
        "In-process exchange-rate source"
    }
}

#[async_trait]
impl ExchangeRateProvider for MockRates {
    async fn mid_rate(&self, currency: &str) -> Result<Option<f64>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DataError::Network("connection reset".to_string()));
        }
        Ok(self.rates.get(currency).copied())
    }
}

/// Cache whose every operation fails.
#[derive(Debug)]
struct BrokenCache;

#[async_trait]
impl DataCache for BrokenCache {
    async fn get(&self, _key: &CacheKey, _ttl: Duration) -> Result<Option<Value>> {
        Err(DataError::Cache("store unavailable".to_string()))
    }

    async fn put(&self, _key: &CacheKey, _value: Value) -> Result<()> {
        Err(DataError::Cache("store unavailable".to_string()))
    }

    async fn invalidate_stale(&self, _ttl: Duration) -> Result<usize> {
        Err(DataError::Cache("store unavailable".to_string()))
    }

    async fn clear(&self) -> Result<()> {
        Err(DataError::Cache("store unavailable".to_string()))
    }

    async fn len(&self) -> usize {
        0
    }
}

fn symbol_param(request: &GatewayRequest) -> String {
    request
        .get("symbol")
        .map(ToString::to_string)
        .unwrap_or_default()
}

fn global_quote(price: &str) -> Value {
    json!({
        "Global Quote": {
            "05. price": price,
            "06. volume": "1000",
            "07. latest trading day": "2024-05-10",
            "09. change": "1.00",
            "10. change percent": "0.5%"
        }
    })
}

/// Gateway answering every function with a realistic payload.
fn upstream(request: &GatewayRequest) -> Result<Value> {
    let symbol = symbol_param(request);
    match request.function() {
        "GLOBAL_QUOTE" if symbol.starts_with("FAIL") => {
            Err(DataError::Network("connection refused".to_string()))
        }
        "GLOBAL_QUOTE" if symbol == "NONE" => Ok(json!({"Global Quote": {}})),
        "GLOBAL_QUOTE" => Ok(global_quote("100.00")),
        "OVERVIEW" if symbol == "GHOST" => Ok(json!({})),
        "OVERVIEW" => Ok(json!({
            "Symbol": symbol,
            "Name": "Example Corp",
            "Sector": "TECHNOLOGY",
            "MarketCapitalization": "1000000",
            "PERatio": "None"
        })),
        "INCOME_STATEMENT" => {
            let reports: Vec<Value> = (0..8)
                .map(|i| json!({"fiscalDateEnding": format!("{}-12-31", 2023 - i), "totalRevenue": "1000"}))
                .collect();
            Ok(json!({"symbol": symbol, "annualReports": reports}))
        }
        "BALANCE_SHEET" => {
            let reports: Vec<Value> = (0..8)
                .map(|i| {
                    json!({
                        "fiscalDateEnding": format!("{}-12-31", 2023 - i),
                        "totalAssets": "5000",
                        "totalLiabilities": "3000",
                        "totalShareholderEquity": "2000"
                    })
                })
                .collect();
            Ok(json!({"symbol": symbol, "annualReports": reports}))
        }
        "EARNINGS" => {
            let quarters: Vec<Value> = (0..12)
                .map(|i| json!({"fiscalDateEnding": format!("q{i}"), "reportedEPS": "1.0"}))
                .collect();
            Ok(json!({"symbol": symbol, "quarterlyEarnings": quarters}))
        }
        "TIME_SERIES_DAILY" => Ok(json!({
            "Time Series (Daily)": {
                "2024-05-10": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.5", "5. volume": "10"},
                "2024-05-09": {"1. open": "1", "2. high": "2", "3. low": "0.5", "4. close": "1.2", "5. volume": "10"}
            }
        })),
        "TIME_SERIES_WEEKLY" => Ok(json!({
            "Weekly Time Series": {
                "2024-05-10": {"1. open": "180", "2. high": "185", "3. low": "178", "4. close": "183", "5. volume": "250000"},
                "2024-05-03": {"1. open": "170", "2. high": "181", "3. low": "169", "4. close": "180", "5. volume": "300000"}
            }
        })),
        "MACD" => Ok(json!({
            "Technical Analysis: MACD": {
                "2024-05-10": {"MACD": "1.25", "MACD_Signal": "0.90", "MACD_Hist": "0.35"}
            }
        })),
        "SMA" => Ok(json!({
            "Technical Analysis: SMA": {
                "2024-05-10": {"SMA": "165.42"},
                "2024-05-09": {"SMA": "164.10"}
            }
        })),
        "CURRENCY_EXCHANGE_RATE" => Ok(json!({
            "Realtime Currency Exchange Rate": {
                "1. From_Currency Code": "BTC",
                "3. To_Currency Code": "USD",
                "5. Exchange Rate": "61234.55",
                "6. Last Refreshed": "2024-05-10 12:00:01"
            }
        })),
        "TOP_GAINERS_LOSERS" => Ok(json!({
            "last_updated": "2024-05-10 16:15:59 US/Eastern",
            "top_gainers": [{"ticker": "ABCD", "price": "2.5", "change_amount": "1.25", "change_percentage": "100.0%", "volume": "123456"}],
            "top_losers": [{"ticker": "WXYZ", "price": "1.0", "change_amount": "-1.0", "change_percentage": "-50.0%", "volume": "654321"}],
            "most_actively_traded": []
        })),
        "SECTOR" => Ok(json!({
            "Meta Data": {"Information": "US Sector Performance (realtime & historical)"},
            "Rank A: Real-Time Performance": {"Energy": "1.25%", "Utilities": "-0.40%"}
        })),
        "RSI" => Ok(json!({
            "Technical Analysis: RSI": {
                "2024-05-10": {"RSI": "71.0"},
                "2024-05-09": {"RSI": "29.0"}
            }
        })),
        "SYMBOL_SEARCH" => Ok(json!({
            "bestMatches": [{"1. symbol": "TSCO.LON", "2. name": "Tesco PLC", "9. matchScore": "0.8"}]
        })),
        other => Err(DataError::Upstream(format!("unexpected function {other}"))),
    }
}

fn config() -> ServiceConfig {
    ServiceConfig::new("http://gateway.invalid")
}

fn service(gateway: &Arc<MockGateway>) -> MarketDataService {
    MarketDataService::builder()
        .config(config())
        .gateway(gateway.clone())
        .polish_quotes(Arc::new(MockQuotes::default()))
        .exchange_rates(Arc::new(MockRates::default()))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_cache_hit_avoids_network_call() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);
    let symbol = Symbol::new("AAPL");

    let first = service.us_quote(&symbol).await.into_option().unwrap();
    let second = service.us_quote(&symbol).await.into_option().unwrap();

    assert_eq!(first, second);
    assert_eq!(first.price, 100.0);
    assert_eq!(gateway.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_expiry_forces_exactly_one_refetch() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);
    let symbol = Symbol::new("AAPL");

    assert!(service.us_quote(&symbol).await.is_data());
    assert!(service.daily_prices(&symbol, OutputSize::Compact).await.is_data());
    assert_eq!(gateway.calls(), 2);

    // Past the live TTL, still inside the series TTL.
    tokio::time::advance(Duration::from_secs(5 * 60 + 1)).await;

    assert!(service.us_quote(&symbol).await.is_data());
    assert!(service.us_quote(&symbol).await.is_data());
    assert!(service.daily_prices(&symbol, OutputSize::Compact).await.is_data());
    assert_eq!(gateway.calls(), 3);

    tokio::time::advance(Duration::from_secs(5 * 60)).await;

    assert!(service.daily_prices(&symbol, OutputSize::Compact).await.is_data());
    assert_eq!(gateway.calls(), 4);
}

#[tokio::test]
async fn test_daily_prices_to_frame() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);

    let bars = service
        .daily_prices(&Symbol::new("AAPL"), OutputSize::Compact)
        .await
        .unwrap_or_default();
    assert_eq!(bars[0].date.to_string(), "2024-05-10");

    let frame = marketdata::bars_to_frame(&bars).unwrap();
    assert_eq!(frame.height(), 2);
    assert_eq!(frame.width(), 6);
    assert!(frame.column("close").is_ok());
}

#[tokio::test]
async fn test_distinct_parameters_use_distinct_entries() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);
    let symbol = Symbol::new("AAPL");

    let _ = service.rsi(&symbol, Interval::Daily, 14).await;
    let _ = service.rsi(&symbol, Interval::Daily, 20).await;
    let _ = service.rsi(&symbol, Interval::Weekly, 14).await;
    let _ = service.daily_prices(&symbol, OutputSize::Full).await;
    let _ = service.daily_prices(&symbol, OutputSize::Compact).await;
    assert_eq!(gateway.calls(), 5);

    let _ = service.rsi(&symbol, Interval::Daily, 14).await;
    assert_eq!(gateway.calls(), 5);
}

#[tokio::test]
async fn test_rsi_signals_through_service() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);

    let points = service
        .rsi(&Symbol::new("AAPL"), Interval::Daily, marketdata::DEFAULT_RSI_PERIOD)
        .await
        .unwrap_or_default();

    let signals: Vec<Option<Signal>> = points.iter().map(|p| p.signal).collect();
    assert_eq!(signals, vec![Some(Signal::Sell), Some(Signal::Buy)]);
}

#[tokio::test]
async fn test_zero_period_is_rejected_without_network() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);

    let outcome = service.sma(&Symbol::new("AAPL"), Interval::Daily, 0).await;
    assert!(matches!(outcome.error(), Some(DataError::InvalidParameter(_))));
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn test_batch_drops_failures() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);

    let symbols: Vec<Symbol> = ["AAPL", "FAIL1", "MSFT", "FAIL2", "GOOG"]
        .into_iter()
        .map(Symbol::new)
        .collect();

    let quotes = service.quotes(&symbols).await;
    assert_eq!(quotes.len(), 3);
    assert!(quotes.iter().all(|q| !q.symbol.as_str().starts_with("FAIL")));
}

#[tokio::test]
async fn test_quote_routes_by_suffix() {
    let gateway = MockGateway::new(upstream);
    let polish = Arc::new(MockQuotes {
        prices: HashMap::from([("PKN.WA".to_string(), 61.2)]),
        ..MockQuotes::default()
    });
    let service = MarketDataService::builder()
        .config(config())
        .gateway(gateway.clone())
        .polish_quotes(polish.clone())
        .exchange_rates(Arc::new(MockRates::default()))
        .build()
        .unwrap();

    let quotes = service
        .quotes(&[Symbol::new("pkn.wa"), Symbol::new("AAPL"), Symbol::new("XYZ.WA")])
        .await;

    assert_eq!(quotes.len(), 2);
    assert_eq!(polish.calls.load(Ordering::SeqCst), 2);
    assert_eq!(gateway.calls(), 1);

    let pkn = service.quote(&Symbol::new("PKN.WA")).await.into_option().unwrap();
    assert_eq!(pkn.price, 61.2);
    assert_eq!(polish.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_statement_truncation() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);
    let symbol = Symbol::new("AAPL");

    let income = service.income_statement(&symbol).await.unwrap_or_default();
    assert_eq!(income.len(), 5);
    assert_eq!(income[0].fiscal_date_ending, "2023-12-31");

    let earnings = service.earnings(&symbol).await.unwrap_or_default();
    assert_eq!(earnings.len(), 8);
    assert_eq!(earnings[7].fiscal_date_ending, "q7");
}

#[tokio::test]
async fn test_configured_statement_periods() {
    let gateway = MockGateway::new(upstream);
    let service = MarketDataService::builder()
        .config(config().with_statement_periods(3).with_earnings_quarters(4))
        .gateway(gateway.clone())
        .build()
        .unwrap();

    let symbol = Symbol::new("AAPL");
    assert_eq!(service.income_statement(&symbol).await.unwrap_or_default().len(), 3);
    assert_eq!(service.earnings(&symbol).await.unwrap_or_default().len(), 4);
}

#[tokio::test]
async fn test_company_without_symbol_is_empty_and_not_cached() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);
    let ghost = Symbol::new("GHOST");

    assert!(service.company_info(&ghost).await.is_empty());
    assert!(service.company_info(&ghost).await.is_empty());
    assert_eq!(gateway.calls(), 2);

    let info = service.company_info(&Symbol::new("IBM")).await.into_option().unwrap();
    assert_eq!(info.name, "Example Corp");
    assert_eq!(info.industry, "N/A");
    assert_eq!(info.pe, 0.0);
}

#[tokio::test]
async fn test_failure_is_reported_and_flattens_to_empty() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);
    let symbol = Symbol::new("FAIL");

    let outcome = service.us_quote(&symbol).await;
    assert!(outcome.is_failed());
    assert!(matches!(outcome.error(), Some(DataError::Network(_))));
    assert!(outcome.into_option().is_none());

    // Failures are not cached.
    assert!(service.us_quote(&symbol).await.is_failed());
    assert_eq!(gateway.calls(), 2);

    // Unknown function: lenient flattening gives an empty list.
    let news = service.financial_news(10).await;
    assert!(news.is_failed());
    assert!(news.unwrap_or_default().is_empty());
}

#[tokio::test]
async fn test_rate_limit_is_distinguishable() {
    let gateway = MockGateway::new(|_| {
        Err(DataError::RateLimited {
            provider: "Alpha Vantage".to_string(),
            retry_after: None,
        })
    });
    let service = service(&gateway);

    let outcome = service.financial_news(10).await;
    assert!(outcome.error().is_some_and(DataError::is_rate_limited));

    let strict = service.weekly_prices(&Symbol::new("AAPL")).await.into_result();
    assert!(strict.is_err_and(|e| e.is_rate_limited()));
}

#[tokio::test]
async fn test_empty_quote_is_empty() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);

    assert!(service.us_quote(&Symbol::new("NONE")).await.is_empty());
    assert!(service.us_quote(&Symbol::new("NONE")).await.is_empty());
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test]
async fn test_market_indices_and_ping() {
    let gateway = MockGateway::new(|request| {
        if symbol_param(request) == "QQQ" {
            Err(DataError::Network("timeout".to_string()))
        } else {
            Ok(global_quote("500.00"))
        }
    });
    let service = service(&gateway);

    let indices = service.market_indices().await;
    assert_eq!(indices.len(), 2);
    assert!(indices.contains_key("S&P 500"));
    assert!(indices.contains_key("Dow Jones"));
    assert!(!indices.contains_key("NASDAQ"));

    assert!(service.ping().await);

    let down = MockGateway::new(|_| Err(DataError::Network("down".to_string())));
    assert!(!self::service(&down).ping().await);
}

#[tokio::test]
async fn test_search_is_not_cached() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);

    let matches = service.search_symbols("tesco").await.unwrap_or_default();
    assert_eq!(matches[0].symbol.as_str(), "TSCO.LON");
    let _ = service.search_symbols("tesco").await;
    assert_eq!(gateway.calls(), 2);

    assert!(service.search_symbols("   ").await.is_empty());
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test]
async fn test_exchange_rates_cached_as_unit() {
    let gateway = MockGateway::new(upstream);
    let rates = Arc::new(MockRates {
        rates: HashMap::from([("USD".to_string(), 3.98), ("EUR".to_string(), 4.31)]),
        ..MockRates::default()
    });
    let service = MarketDataService::builder()
        .config(config())
        .gateway(gateway.clone())
        .exchange_rates(rates.clone())
        .build()
        .unwrap();

    let set = service.exchange_rates().await.into_option().unwrap();
    assert_eq!(set.len(), 2);
    assert_eq!(set.get("usd"), Some(3.98));
    assert_eq!(set.get("CHF"), None);
    assert_eq!(rates.calls.load(Ordering::SeqCst), 4);

    let _ = service.exchange_rates().await;
    assert_eq!(rates.calls.load(Ordering::SeqCst), 4);
    assert_eq!(gateway.calls(), 0);
}

#[tokio::test]
async fn test_exchange_rate_failure_fails_the_set() {
    let gateway = MockGateway::new(upstream);
    let rates = Arc::new(MockRates {
        fail: true,
        ..MockRates::default()
    });
    let service = MarketDataService::builder()
        .config(config().with_currencies(["usd", "EUR", "USD"]))
        .gateway(gateway.clone())
        .exchange_rates(rates.clone())
        .build()
        .unwrap();

    assert!(service.exchange_rates().await.is_failed());
    // Sequential fetch stops at the first failure.
    assert_eq!(rates.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_noop_cache_always_fetches() {
    let gateway = MockGateway::new(upstream);
    let service = MarketDataService::builder()
        .config(config())
        .gateway(gateway.clone())
        .cache(Arc::new(NoopCache::new()))
        .build()
        .unwrap();

    let symbol = Symbol::new("AAPL");
    let _ = service.us_quote(&symbol).await;
    let _ = service.us_quote(&symbol).await;
    assert_eq!(gateway.calls(), 2);
}

#[tokio::test]
async fn test_cache_errors_degrade_to_misses() {
    let gateway = MockGateway::new(upstream);
    let service = MarketDataService::builder()
        .config(config())
        .gateway(gateway.clone())
        .cache(Arc::new(BrokenCache))
        .build()
        .unwrap();

    let outcome = service.us_quote(&Symbol::new("AAPL")).await;
    assert!(outcome.is_data());
    assert!(service.sweep_cache().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_sweep_and_clear() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);
    let symbol = Symbol::new("AAPL");

    let _ = service.us_quote(&symbol).await;
    let _ = service.income_statement(&symbol).await;
    assert_eq!(service.cache().len().await, 2);

    tokio::time::advance(Duration::from_secs(11 * 60)).await;
    let _ = service.us_quote(&symbol).await;
    assert_eq!(service.sweep_cache().await.unwrap(), 1);
    assert_eq!(service.cache().len().await, 1);

    service.clear_cache().await.unwrap();
    assert!(service.cache().is_empty().await);
    assert!(
        service
            .cache()
            .get(&CacheKey::new(DataKind::UsQuote).with("AAPL"), Duration::from_secs(60))
            .await
            .unwrap()
            .is_none()
    );
}

async fn is_cached(service: &MarketDataService, key: CacheKey) -> bool {
    service
        .cache()
        .get(&key, Duration::from_secs(60))
        .await
        .unwrap()
        .is_some()
}

#[tokio::test]
async fn test_balance_sheet_truncated_and_cached() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);
    let symbol = Symbol::new("aapl");

    let sheets = service.balance_sheet(&symbol).await.into_option().unwrap();
    assert_eq!(sheets.len(), 5);
    assert_eq!(sheets[0].fiscal_date_ending, "2023-12-31");
    assert_eq!(sheets[4].fiscal_date_ending, "2019-12-31");
    assert_eq!(sheets[0].total_shareholder_equity, 2000.0);

    let again = service.balance_sheet(&symbol).await.into_option().unwrap();
    assert_eq!(again, sheets);
    assert_eq!(
        gateway.requests(),
        vec![GatewayRequest::new("BALANCE_SHEET").param("symbol", "AAPL")]
    );
    assert!(is_cached(&service, CacheKey::new(DataKind::BalanceSheet).with("AAPL")).await);
}

#[tokio::test]
async fn test_weekly_prices_request_and_cache() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);
    let symbol = Symbol::new("MSFT");

    let bars = service.weekly_prices(&symbol).await.into_option().unwrap();
    assert_eq!(bars.len(), 2);
    assert_eq!(bars[0].date.to_string(), "2024-05-10");
    assert_eq!(bars[0].close, 183.0);
    assert_eq!(bars[1].volume, 300_000);

    let _ = service.weekly_prices(&symbol).await;
    assert_eq!(
        gateway.requests(),
        vec![GatewayRequest::new("TIME_SERIES_WEEKLY").param("symbol", "MSFT")]
    );
    assert!(is_cached(&service, CacheKey::new(DataKind::WeeklySeries).with("MSFT")).await);
}

#[tokio::test]
async fn test_macd_and_sma_requests() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);
    let symbol = Symbol::new("AAPL");

    let macd = service
        .macd(&symbol, Interval::Weekly)
        .await
        .into_option()
        .unwrap();
    assert_eq!(macd.len(), 1);
    assert_eq!(macd[0].macd, 1.25);
    assert_eq!(macd[0].signal, 0.9);
    assert_eq!(macd[0].histogram, 0.35);

    let sma = service
        .sma(&symbol, Interval::Daily, marketdata::DEFAULT_SMA_PERIOD)
        .await
        .into_option()
        .unwrap();
    assert_eq!(sma.len(), 2);
    assert_eq!(sma[0].value, 165.42);
    assert!(sma.iter().all(|p| p.signal.is_none()));

    let _ = service.macd(&symbol, Interval::Weekly).await;
    let _ = service.sma(&symbol, Interval::Daily, marketdata::DEFAULT_SMA_PERIOD).await;

    assert_eq!(
        gateway.requests(),
        vec![
            GatewayRequest::new("MACD")
                .param("symbol", "AAPL")
                .param("interval", "weekly")
                .param("series_type", "close"),
            GatewayRequest::new("SMA")
                .param("symbol", "AAPL")
                .param("interval", "daily")
                .param("series_type", "close")
                .param("time_period", marketdata::DEFAULT_SMA_PERIOD),
        ]
    );
    assert!(
        is_cached(
            &service,
            CacheKey::new(DataKind::Macd).with(&symbol).with(Interval::Weekly)
        )
        .await
    );
    assert!(
        is_cached(
            &service,
            CacheKey::new(DataKind::Sma)
                .with(&symbol)
                .with(Interval::Daily)
                .with(marketdata::DEFAULT_SMA_PERIOD)
        )
        .await
    );
}

#[tokio::test]
async fn test_crypto_quote_request_and_cache() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);
    let symbol = Symbol::new("btc");

    let quote = service.crypto_quote(&symbol).await.into_option().unwrap();
    assert_eq!(quote.symbol.as_str(), "BTC");
    assert_eq!(quote.price, 61234.55);
    assert_eq!(quote.change, 0.0);
    assert_eq!(quote.volume, 0);

    let _ = service.crypto_quote(&symbol).await;
    assert_eq!(
        gateway.requests(),
        vec![
            GatewayRequest::new("CURRENCY_EXCHANGE_RATE")
                .param("from_currency", "BTC")
                .param("to_currency", "USD")
        ]
    );
    assert!(is_cached(&service, CacheKey::new(DataKind::CryptoQuote).with("BTC")).await);
}

#[tokio::test]
async fn test_market_movers_and_sectors() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);

    let movers = service.top_gainers_losers().await.into_option().unwrap();
    assert_eq!(movers.last_updated, "2024-05-10 16:15:59 US/Eastern");
    assert_eq!(movers.top_gainers[0].ticker.as_str(), "ABCD");
    assert_eq!(movers.top_losers[0].change_percent, -50.0);
    assert!(movers.most_actively_traded.is_empty());

    let sectors = service.sector_performance().await.into_option().unwrap();
    assert_eq!(sectors.len(), 2);
    assert_eq!(sectors[0].timeframe, "Real-Time Performance");
    assert_eq!(sectors[1].sector, "Utilities");
    assert_eq!(sectors[1].change_percent, -0.4);

    let _ = service.top_gainers_losers().await;
    let _ = service.sector_performance().await;
    assert_eq!(
        gateway.requests(),
        vec![
            GatewayRequest::new("TOP_GAINERS_LOSERS"),
            GatewayRequest::new("SECTOR")
        ]
    );
    assert!(is_cached(&service, CacheKey::new(DataKind::MarketMovers)).await);
    assert!(is_cached(&service, CacheKey::new(DataKind::SectorPerformance)).await);
}

#[tokio::test(start_paused = true)]
async fn test_ttl_class_per_accessor() {
    let gateway = MockGateway::new(upstream);
    let service = service(&gateway);
    let symbol = Symbol::new("AAPL");
    let crypto = Symbol::new("BTC");

    async fn fetch_series(service: &MarketDataService, symbol: &Symbol) {
        assert!(service.balance_sheet(symbol).await.is_data());
        assert!(service.weekly_prices(symbol).await.is_data());
        assert!(service.macd(symbol, Interval::Daily).await.is_data());
        assert!(service.sma(symbol, Interval::Daily, 50).await.is_data());
        assert!(service.top_gainers_losers().await.is_data());
        assert!(service.sector_performance().await.is_data());
    }

    fetch_series(&service, &symbol).await;
    assert!(service.crypto_quote(&crypto).await.is_data());
    assert_eq!(gateway.calls(), 7);

    // Past the live TTL, still inside the series TTL.
    tokio::time::advance(Duration::from_secs(5 * 60 + 1)).await;
    fetch_series(&service, &symbol).await;
    assert_eq!(gateway.calls(), 7);
    assert!(service.crypto_quote(&crypto).await.is_data());
    assert_eq!(gateway.calls(), 8);

    tokio::time::advance(Duration::from_secs(5 * 60)).await;
    fetch_series(&service, &symbol).await;
    assert_eq!(gateway.calls(), 14);
}

#[tokio::test]
async fn test_empty_suffix_disables_polish_routing() {
    let gateway = MockGateway::new(upstream);
    let polish = Arc::new(MockQuotes {
        prices: HashMap::from([("PKN.WA".to_string(), 61.2)]),
        ..MockQuotes::default()
    });
    let service = MarketDataService::builder()
        .config(config().with_polish_suffix(""))
        .gateway(gateway.clone())
        .polish_quotes(polish.clone())
        .build()
        .unwrap();

    let quote = service.quote(&Symbol::new("AAPL")).await.into_option().unwrap();
    assert_eq!(quote.price, 100.0);
    let _ = service.quote(&Symbol::new("PKN.WA")).await;

    assert_eq!(polish.calls.load(Ordering::SeqCst), 0);
    assert_eq!(gateway.calls(), 2);
}

#[test]
fn test_fetched_from_result() {
    let failed: Fetched<Vec<Quote>> = Err(DataError::Other("boom".to_string())).into();
    assert!(failed.is_failed());
    assert!(failed.unwrap_or_default().is_empty());
}
