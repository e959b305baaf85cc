#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/marketdata-rs/marketdata/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Two stores back [`DataCache`]:
//!
//! - [`InMemoryCache`] keeps JSON payloads in a map and expires them lazily.
//! - [`NoopCache`] misses on every lookup, for callers that want fresh data.

/// Map-backed store.
pub mod memory;
/// Store that retains nothing.
pub mod noop;

pub use marketdata_core::DataCache;
pub use memory::InMemoryCache;
pub use noop::NoopCache;
