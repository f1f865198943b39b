//! Scan result envelope and per-symbol records.

use super::filter::{Filter, FilterLogic};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A symbol that satisfied the combined filter logic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchedStock {
    /// Ticker symbol
    pub symbol: String,
    /// Latest daily close
    pub close: f64,
    /// Latest daily volume
    pub volume: i64,
    /// Date of the latest daily candle
    pub date: String,
    /// Number of filters that passed
    pub matched_filters: usize,
    /// Number of filters evaluated
    pub total_filters: usize,
    /// Per-filter diagnostics in filter-submission order
    pub filter_details: Vec<Value>,
}

/// A symbol whose pipeline failed before filters could be aggregated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedStock {
    /// Ticker symbol
    pub symbol: String,
    /// Why the symbol was classified as failed
    pub error: String,
}

/// Result envelope of a scan.
///
/// A scan always returns this envelope; per-symbol problems land in
/// `failed_stocks` instead of failing the scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    /// Symbols that satisfied the combined logic
    pub matched_stocks: Vec<MatchedStock>,
    /// Symbols whose pipeline failed
    pub failed_stocks: Vec<FailedStock>,
    /// Number of symbols submitted
    pub total_scanned: usize,
    /// Number of symbols matched
    pub total_matched: usize,
    /// Logic the filters were combined under
    pub filter_logic: FilterLogic,
    /// The resolved filters the scan ran with, for auditability
    pub filters_applied: Vec<Filter>,
    /// When the scan completed (RFC 3339)
    pub scan_time: String,
}
