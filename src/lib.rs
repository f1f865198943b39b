//! # stock-scanner
//!
//! A Rust library for screening stocks with technical indicators and
//! composable filters.
//!
//! Given a universe of symbols and a set of filter conditions, the scanner
//! fetches OHLCV candles from an upstream market-data service, computes
//! indicators on demand, evaluates every filter against every symbol, and
//! returns the matches with per-filter diagnostics.
//!
//! ## Quick Start
//!
//! ```no_run
//! use stock_scanner::{Scanner, ScanRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scanner = Scanner::from_env().await?;
//!
//!     let request: ScanRequest = serde_json::from_value(serde_json::json!({
//!         "symbols": ["AAPL", "MSFT", "NVDA"],
//!         "filters": [
//!             {"type": "indicator", "field": "RSI", "time_period": 14,
//!              "operator": "lt", "value": 30},
//!             {"type": "volume", "operator": "gt_avg",
//!              "avg_period": 20, "multiplier": 1.5}
//!         ],
//!         "filter_logic": "AND"
//!     }))?;
//!
//!     let result = scanner.scan_stocks(request).await?;
//!     for stock in &result.matched_stocks {
//!         println!("{} closed at {}", stock.symbol, stock.close);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Offline Development
//!
//! Without the upstream service the provider substitutes deterministic,
//! symbol-seeded mock candles, so scans and indicator calls keep working:
//!
//! ```no_run
//! use std::sync::Arc;
//! use stock_scanner::{Config, Scanner, provider::MockProvider};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let scanner = Scanner::with_provider(Config::default(), Arc::new(MockProvider)).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

/// Redis-backed TTL cache with typed key derivation
pub mod cache;
/// HTTP client for the upstream market-data service
pub mod client;
/// Environment-driven configuration
pub mod config;
/// Intervals, output sizes, and cache TTLs
pub mod constants;
/// Error types and result definitions
pub mod error;
/// Filter and expression evaluation
pub mod eval;
/// Technical analysis indicators
pub mod indicators;
/// Deterministic mock candle generation
pub mod mock;
/// Data model: candles, frames, filters, scan results
pub mod models;
/// Natural-language query heuristics
pub mod nlq;
/// Prebuilt preset scans
pub mod presets;
/// Candle provider seam (live and mock)
pub mod provider;
/// Indicator resolver for compound field names
pub mod resolve;
/// Scan orchestrator
pub mod scan;
/// Tool surface: the typed operations a dispatch layer exposes
pub mod tools;

// Re-export main types
pub use cache::Cache;
pub use client::MarketDataClient;
pub use config::Config;
pub use constants::{Interval, OutputSize};
pub use error::{Result, ScannerError};
pub use models::{Filter, FilterLogic, Frame, ScanResult};
pub use scan::{ScanContext, ScanRequest, run_scan};
pub use tools::Scanner;
