//! Scan orchestrator.
//!
//! Runs the per-symbol pipeline across a bounded worker pool: resolve the
//! required timeframes, fetch candle frames cache-through, enrich the daily
//! frame with fundamentals when filters reference non-price fields, evaluate
//! every filter independently, and aggregate under the declared logic. Any
//! per-symbol problem classifies that symbol as failed without aborting the
//! scan.

use crate::cache::{Cache, keys};
use crate::client::MarketDataClient;
use crate::constants::{DEFAULT_UNIVERSE_SIZE, Interval, OutputSize, ttl};
use crate::error::Result;
use crate::eval::{FilterContext, evaluate_filter};
use crate::eval::filter::lookup_fundamental;
use crate::models::{FailedStock, Filter, FilterLogic, Frame, MatchedStock, ScanResult};
use crate::provider::CandleProvider;
use crate::resolve::is_indicator_field;
use chrono::Utc;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, warn};

/// Symbols evaluated concurrently per scan
const SCAN_CONCURRENCY: usize = 8;

/// A scan request: symbols, filters, and combining logic
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanRequest {
    /// Symbols to scan; empty pulls the full universe
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Filters to evaluate per symbol
    pub filters: Vec<Filter>,
    /// How per-filter results combine
    #[serde(default)]
    pub filter_logic: FilterLogic,
}

/// Shared handles the scan pipeline runs against
#[derive(Clone)]
pub struct ScanContext {
    /// Upstream service client (universe, fundamentals)
    pub client: Arc<MarketDataClient>,
    /// Cache for scan-result memoization
    pub cache: Arc<Cache>,
    /// Candle source
    pub provider: Arc<dyn CandleProvider>,
}

enum SymbolOutcome {
    Matched(MatchedStock),
    Dropped,
    Failed(FailedStock),
}

/// Timeframes a filter set needs, always including daily
fn required_timeframes(filters: &[Filter]) -> Result<Vec<Interval>> {
    let mut set = HashSet::from([Interval::Daily]);
    for filter in filters {
        for tf in filter.referenced_timeframes() {
            set.insert(tf.parse::<Interval>()?);
        }
    }
    let mut timeframes: Vec<Interval> = set.into_iter().collect();
    // Daily first so its failure short-circuits before other fetches
    timeframes.sort_by_key(|tf| (*tf != Interval::Daily, tf.as_str()));
    Ok(timeframes)
}

/// Fields referenced by filters that are neither frame columns nor
/// indicators: candidates for fundamental enrichment.
fn enrichment_fields(filters: &[Filter], daily: &Frame) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut fields = Vec::new();
    for filter in filters {
        for field in filter.referenced_fields() {
            if daily.has_field(&field) || is_indicator_field(&field) {
                continue;
            }
            if seen.insert(field.to_lowercase()) {
                fields.push(field);
            }
        }
    }
    fields
}

/// Run a scan and return the full result envelope.
///
/// Only a malformed request (an unparseable timeframe, a failed universe
/// fetch) errors; every per-symbol problem is folded into `failed_stocks`.
pub async fn run_scan(ctx: &ScanContext, request: &ScanRequest) -> Result<ScanResult> {
    let timeframes = required_timeframes(&request.filters)?;

    let symbols = if request.symbols.is_empty() {
        ctx.client.symbols(DEFAULT_UNIVERSE_SIZE).await?
    } else {
        request.symbols.clone()
    };

    let scan_key = keys::scan(&symbols, &request.filters, request.filter_logic);
    if let Some(cached) = ctx.cache.get::<ScanResult>(&scan_key).await {
        return Ok(cached);
    }

    let outcomes: Vec<SymbolOutcome> = futures::stream::iter(symbols.iter())
        .map(|symbol| scan_symbol(ctx, symbol, &request.filters, &timeframes, request.filter_logic))
        .buffered(SCAN_CONCURRENCY)
        .collect()
        .await;

    let mut matched_stocks = Vec::new();
    let mut failed_stocks = Vec::new();
    for outcome in outcomes {
        match outcome {
            SymbolOutcome::Matched(record) => matched_stocks.push(record),
            SymbolOutcome::Dropped => {}
            SymbolOutcome::Failed(record) => failed_stocks.push(record),
        }
    }

    let result = ScanResult {
        total_scanned: symbols.len(),
        total_matched: matched_stocks.len(),
        matched_stocks,
        failed_stocks,
        filter_logic: request.filter_logic,
        filters_applied: request.filters.clone(),
        scan_time: Utc::now().to_rfc3339(),
    };

    ctx.cache.set(&scan_key, &result, ttl::SCANS).await;
    Ok(result)
}

async fn scan_symbol(
    ctx: &ScanContext,
    symbol: &str,
    filters: &[Filter],
    timeframes: &[Interval],
    logic: FilterLogic,
) -> SymbolOutcome {
    let failed = |error: String| {
        SymbolOutcome::Failed(FailedStock {
            symbol: symbol.to_string(),
            error,
        })
    };

    // Data acquisition: the daily frame is mandatory, other timeframes are
    // best-effort.
    let mut frames: HashMap<Interval, Frame> = HashMap::new();
    for &tf in timeframes {
        match ctx.provider.candles(symbol, tf, OutputSize::Compact).await {
            Ok(frame) if frame.is_empty() && tf == Interval::Daily => {
                return failed("no daily data".to_string());
            }
            Ok(frame) => {
                frames.insert(tf, frame);
            }
            Err(e) if tf == Interval::Daily => {
                return failed(e.to_string());
            }
            Err(e) => {
                warn!(symbol, timeframe = tf.as_str(), error = %e, "Timeframe fetch failed");
            }
        }
    }

    // Enrichment: one fundamentals fetch when filters reference fields the
    // frame cannot answer, broadcast onto the daily frame.
    let needed = {
        let daily = frames
            .get(&Interval::Daily)
            .expect("daily frame fetched above");
        enrichment_fields(filters, daily)
    };

    let fundamentals = if needed.is_empty() {
        None
    } else {
        match ctx.client.fundamentals(symbol).await {
            Ok(metric) => {
                let daily = frames
                    .get_mut(&Interval::Daily)
                    .expect("daily frame fetched above");
                for field in &needed {
                    if let Some((_, value)) = lookup_fundamental(&metric, field)
                        && let Some(number) = value.as_f64()
                    {
                        daily.set_scalar_column(field, number);
                    }
                }
                Some(metric)
            }
            Err(e) => {
                warn!(symbol, error = %e, "Fundamentals fetch failed");
                None
            }
        }
    };

    // Independent filter evaluation in submission order
    let filter_ctx = FilterContext {
        symbol,
        frames: &frames,
        fundamentals: fundamentals.as_ref(),
        provider: ctx.provider.as_ref(),
    };

    let mut details = Vec::with_capacity(filters.len());
    let mut passed_count = 0usize;
    for filter in filters {
        let (passed, detail) = evaluate_filter(&filter_ctx, filter).await;
        if passed {
            passed_count += 1;
        }
        details.push(detail);
    }

    let matched = match logic {
        FilterLogic::And => passed_count == filters.len(),
        FilterLogic::Or => passed_count > 0,
    };

    if !matched {
        debug!(symbol, passed = passed_count, total = filters.len(), "Symbol dropped");
        return SymbolOutcome::Dropped;
    }

    let daily = frames
        .get(&Interval::Daily)
        .expect("daily frame fetched above");
    let Some(latest) = daily.latest() else {
        return failed("no daily data".to_string());
    };

    SymbolOutcome::Matched(MatchedStock {
        symbol: symbol.to_string(),
        close: latest.close,
        volume: latest.volume,
        date: latest.date.clone(),
        matched_filters: passed_count,
        total_filters: filters.len(),
        filter_details: details,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::provider::MockProvider;
    use serde_json::json;

    async fn offline_context() -> ScanContext {
        let config = Config::builder().api_url("http://127.0.0.1:9").build();
        ScanContext {
            client: Arc::new(MarketDataClient::new(&config).unwrap()),
            cache: Arc::new(Cache::new(None).await),
            provider: Arc::new(MockProvider),
        }
    }

    fn filters_from(value: serde_json::Value) -> Vec<Filter> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_required_timeframes_always_include_daily() {
        let filters = filters_from(json!([
            {"type": "price", "field": "close", "operator": "gt", "value": 1.0, "timeframe": "15min"}
        ]));
        let timeframes = required_timeframes(&filters).unwrap();
        assert_eq!(timeframes[0], Interval::Daily);
        assert!(timeframes.contains(&Interval::FifteenMinutes));
    }

    #[test]
    fn test_required_timeframes_rejects_unknown() {
        let filters = filters_from(json!([
            {"type": "price", "field": "close", "operator": "gt", "value": 1.0, "timeframe": "2min"}
        ]));
        assert!(required_timeframes(&filters).is_err());
    }

    #[test]
    fn test_enrichment_fields_skip_columns_and_indicators() {
        let filters = filters_from(json!([
            {"type": "price", "field": "close", "operator": "gt", "value": 1.0},
            {"type": "price", "field": "SMA_50", "operator": "gt", "value": 1.0},
            {"type": "financial", "field": "pe_ratio", "operator": "lt", "value": 30.0}
        ]));
        let daily = crate::mock::random_walk_frame("TEST", Interval::Daily, 10);
        assert_eq!(enrichment_fields(&filters, &daily), vec!["pe_ratio".to_string()]);
    }

    #[tokio::test]
    async fn test_scan_accounting_invariant() {
        let ctx = offline_context().await;
        let request = ScanRequest {
            symbols: vec!["AAPL".into(), "MSFT".into(), "GOOG".into()],
            filters: filters_from(json!([
                {"type": "price", "field": "close", "operator": "gt", "value": 0.0}
            ])),
            filter_logic: FilterLogic::And,
        };

        let result = run_scan(&ctx, &request).await.unwrap();
        assert_eq!(result.total_scanned, 3);
        // Every mock close is positive: everything matches, nothing fails
        assert_eq!(result.total_matched, 3);
        assert!(result.failed_stocks.is_empty());
        assert_eq!(result.matched_stocks.len() + result.failed_stocks.len(), 3);
    }

    #[tokio::test]
    async fn test_and_logic_requires_all_filters() {
        let ctx = offline_context().await;
        let request = ScanRequest {
            symbols: vec!["AAPL".into(), "MSFT".into()],
            filters: filters_from(json!([
                {"type": "price", "field": "close", "operator": "gt", "value": 0.0},
                {"type": "price", "field": "close", "operator": "lt", "value": 0.0}
            ])),
            filter_logic: FilterLogic::And,
        };

        let result = run_scan(&ctx, &request).await.unwrap();
        assert_eq!(result.total_matched, 0);

        // Under OR the always-true filter carries every symbol
        let request = ScanRequest {
            filter_logic: FilterLogic::Or,
            ..request
        };
        let result = run_scan(&ctx, &request).await.unwrap();
        assert_eq!(result.total_matched, 2);
        for stock in &result.matched_stocks {
            assert_eq!(stock.matched_filters, 1);
            assert_eq!(stock.total_filters, 2);
        }
    }

    #[tokio::test]
    async fn test_matched_record_carries_diagnostics_in_order() {
        let ctx = offline_context().await;
        let request = ScanRequest {
            symbols: vec!["AAPL".into()],
            filters: filters_from(json!([
                {"type": "price", "field": "close", "operator": "gt", "value": 0.0},
                {"type": "volume", "operator": "gt", "value": 0.0}
            ])),
            filter_logic: FilterLogic::And,
        };

        let result = run_scan(&ctx, &request).await.unwrap();
        let record = &result.matched_stocks[0];
        assert_eq!(record.matched_filters, 2);
        assert_eq!(record.filter_details[0]["type"], "price");
        assert_eq!(record.filter_details[1]["type"], "volume");
        assert_eq!(result.filters_applied.len(), 2);
    }

    #[tokio::test]
    async fn test_invalid_symbol_is_isolated() {
        let ctx = offline_context().await;
        let request = ScanRequest {
            symbols: vec!["AAPL".into(), "   ".into()],
            filters: filters_from(json!([
                {"type": "price", "field": "close", "operator": "gt", "value": 0.0}
            ])),
            filter_logic: FilterLogic::And,
        };

        let result = run_scan(&ctx, &request).await.unwrap();
        assert_eq!(result.total_scanned, 2);
        assert_eq!(result.total_matched, 1);
        assert_eq!(result.failed_stocks.len(), 1);
        assert_eq!(result.failed_stocks[0].symbol, "   ");
    }
}
