#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/marketdata-rs/marketdata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Alpha Vantage source for the market-data access layer.
//!
//! Queries never reach Alpha Vantage directly. They are posted to a proxy
//! function that injects the API key server-side, so the client can run in
//! untrusted environments.
//!
//! # Usage
//!
//! ```rust,ignore
//! use marketdata_alphavantage::{ProxyGateway, normalize};
//! use marketdata_core::{Gateway, GatewayRequest, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let gateway = ProxyGateway::new("https://project.example/functions/v1/market-data");
//!
//!     let symbol = Symbol::new("IBM");
//!     let raw = gateway
//!         .invoke(&GatewayRequest::new("GLOBAL_QUOTE").param("symbol", &symbol))
//!         .await?;
//!
//!     if let Some(quote) = normalize::quote(&symbol, &raw) {
//!         println!("{} {}", quote.symbol, quote.price);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod gateway;
mod lenient;
/// Pure translation of Alpha Vantage payloads into normalized records.
pub mod normalize;

pub use gateway::ProxyGateway;
