//! HTTP client of the market-data proxy function.

use async_trait::async_trait;
use marketdata_core::{
    DEFAULT_REQUEST_TIMEOUT, DataError, DataProvider, Gateway, GatewayRequest, Result,
};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use tracing::debug;

/// Provider name reported in rate-limit errors.
const PROVIDER: &str = "Alpha Vantage";

/// Phrases that mark an upstream message as a call-limit notice.
const LIMIT_PHRASES: &[&str] = &["limit reached", "rate limit", "call frequency", "api limit"];

/// Body posted to the proxy function.
#[derive(Serialize)]
struct ProxyBody<'a> {
    endpoint: &'static str,
    params: &'a GatewayRequest,
}

/// Client of the proxy function that forwards Alpha Vantage queries.
///
/// The proxy attaches the upstream API key server-side, so this client never
/// holds it. The optional token is the proxy's own public bearer token.
#[derive(Clone)]
pub struct ProxyGateway {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl fmt::Debug for ProxyGateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyGateway")
            .field("endpoint", &self.endpoint)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

impl ProxyGateway {
    /// Create a gateway client for the given proxy URL with the default timeout.
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_timeout(endpoint, DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a gateway client with a custom request timeout.
    #[must_use]
    pub fn with_timeout(endpoint: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self::with_client(client, endpoint)
    }

    /// Create a gateway client with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            token: None,
        }
    }

    /// Attach the proxy's bearer token to every request.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Returns the proxy URL.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl DataProvider for ProxyGateway {
    fn name(&self) -> &str {
        PROVIDER
    }

    fn description(&self) -> &str {
        "Alpha Vantage market data through a credential-injecting proxy"
    }
}

#[async_trait]
impl Gateway for ProxyGateway {
    async fn invoke(&self, request: &GatewayRequest) -> Result<Value> {
        debug!(function = request.function(), "Gateway request");

        let mut builder = self.client.post(&self.endpoint).json(&ProxyBody {
            endpoint: "query",
            params: request,
        });
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(rate_limited());
        }

        let text = response
            .text()
            .await
            .map_err(|e| DataError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| body.get("error").and_then(Value::as_str).map(str::to_string));
            return Err(match message {
                Some(message) if is_limit_notice(&message) => rate_limited(),
                Some(message) => DataError::Upstream(message),
                None => DataError::Network(format!("HTTP {}", status.as_u16())),
            });
        }

        let payload: Value =
            serde_json::from_str(&text).map_err(|e| DataError::Parse(e.to_string()))?;
        check_payload(&payload)?;
        Ok(payload)
    }
}

/// Rejects payloads that carry an upstream notice instead of data.
fn check_payload(payload: &Value) -> Result<()> {
    if payload.get("Note").is_some() {
        return Err(rate_limited());
    }
    if let Some(info) = payload.get("Information").and_then(Value::as_str) {
        if is_limit_notice(info) {
            return Err(rate_limited());
        }
    }
    let message = payload
        .get("Error Message")
        .or_else(|| payload.get("error"))
        .map(|m| m.as_str().map_or_else(|| m.to_string(), str::to_string));
    match message {
        Some(message) if is_limit_notice(&message) => Err(rate_limited()),
        Some(message) => Err(DataError::Upstream(message)),
        None => Ok(()),
    }
}

fn is_limit_notice(message: &str) -> bool {
    let message = message.to_lowercase();
    LIMIT_PHRASES.iter().any(|phrase| message.contains(phrase))
}

fn rate_limited() -> DataError {
    DataError::RateLimited {
        provider: PROVIDER.to_string(),
        retry_after: None,
    }
}
