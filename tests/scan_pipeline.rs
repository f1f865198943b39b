//! End-to-end scan tests against a mocked upstream service.
//!
//! These drive the full pipeline: HTTP candle fetch, frame assembly,
//! indicator resolution, filter evaluation, enrichment, and aggregation.

use serde_json::json;
use std::sync::Arc;
use stock_scanner::cache::Cache;
use stock_scanner::provider::LiveProvider;
use stock_scanner::tools::PresetScanParams;
use stock_scanner::{Config, MarketDataClient, ScanContext, ScanRequest, Scanner, run_scan};

/// Candle payload with strictly rising closes, enough for RSI warm-up
fn rising_candles(n: usize) -> serde_json::Value {
    let t: Vec<i64> = (0..n).map(|i| 1_700_000_000 + 86_400 * i as i64).collect();
    let c: Vec<f64> = (0..n).map(|i| 100.0 + i as f64).collect();
    let o: Vec<f64> = c.iter().map(|v| v - 0.5).collect();
    let h: Vec<f64> = c.iter().map(|v| v + 1.0).collect();
    let l: Vec<f64> = c.iter().map(|v| v - 1.5).collect();
    let v: Vec<f64> = (0..n).map(|i| 1_000.0 + 10.0 * i as f64).collect();
    json!({"s": "ok", "o": o, "h": h, "l": l, "c": c, "v": v, "t": t})
}

async fn scanner_against(server: &mockito::ServerGuard) -> Scanner {
    let config = Config::builder().api_url(server.url()).build();
    let client = Arc::new(MarketDataClient::new(&config).unwrap());
    let cache = Arc::new(Cache::new(None).await);
    let provider = Arc::new(LiveProvider::new(client, cache));
    Scanner::with_provider(config, provider).await.unwrap()
}

#[tokio::test]
async fn rsi_overbought_preset_matches_rising_symbols() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/market-data/candles")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(rising_candles(60).to_string())
        .create_async()
        .await;

    let scanner = scanner_against(&server).await;
    let response = scanner
        .run_preset_scan(PresetScanParams {
            preset_name: "rsi_overbought".to_string(),
            symbols: vec!["AAPL".into(), "MSFT".into()],
            custom_params: None,
        })
        .await
        .unwrap();

    assert_eq!(response.result.total_scanned, 2);
    assert_eq!(response.result.total_matched, 2);

    for stock in &response.result.matched_stocks {
        let details = &stock.filter_details[0];
        assert_eq!(details["type"], "indicator");
        let rsi = details["current_value"].as_f64().unwrap();
        assert!(rsi > 70.0, "rising closes should be overbought, got {rsi}");
    }
}

#[tokio::test]
async fn enrichment_resolves_financial_alias() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/market-data/candles")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(rising_candles(30).to_string())
        .create_async()
        .await;
    let metric_mock = server
        .mock("GET", "/api/market-data/metric")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"metric": {"peBasicExclExtraTTM": 18.0}}"#)
        .create_async()
        .await;

    let scanner = scanner_against(&server).await;
    let request: ScanRequest = serde_json::from_value(json!({
        "symbols": ["AAPL"],
        "filters": [
            {"type": "financial", "field": "pe_ratio", "operator": "lt", "value": 30.0}
        ],
        "filter_logic": "AND"
    }))
    .unwrap();

    let result = scanner.scan_stocks(request).await.unwrap();

    metric_mock.assert_async().await;
    assert_eq!(result.total_matched, 1);
    let details = &result.matched_stocks[0].filter_details[0];
    assert_eq!(details["resolved_field"], "peBasicExclExtraTTM");
    assert_eq!(details["current_value"].as_f64(), Some(18.0));
}

#[tokio::test]
async fn scan_accounting_holds_with_failures() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/market-data/candles")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(rising_candles(30).to_string())
        .create_async()
        .await;

    let scanner = scanner_against(&server).await;
    // The blank symbol fails validation inside its own pipeline
    let request: ScanRequest = serde_json::from_value(json!({
        "symbols": ["AAPL", " ", "MSFT"],
        "filters": [
            {"type": "price", "field": "close", "operator": "gt", "value": 0.0}
        ],
        "filter_logic": "AND"
    }))
    .unwrap();

    let result = scanner.scan_stocks(request).await.unwrap();

    assert_eq!(result.total_scanned, 3);
    assert_eq!(result.failed_stocks.len(), 1);
    assert_eq!(result.total_matched, 2);
    // matched + dropped + failed accounts for every submitted symbol
    assert_eq!(
        result.matched_stocks.len() + result.failed_stocks.len(),
        result.total_scanned
    );

    // AND logic: every matched record passed every filter
    for stock in &result.matched_stocks {
        assert_eq!(stock.matched_filters, stock.total_filters);
    }
}

#[tokio::test]
async fn empty_candle_payload_falls_back_to_mock_data() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/api/market-data/candles")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(r#"{"s": "no_data"}"#)
        .create_async()
        .await;

    let scanner = scanner_against(&server).await;
    let request: ScanRequest = serde_json::from_value(json!({
        "symbols": ["AAPL"],
        "filters": [
            {"type": "price", "field": "close", "operator": "gt", "value": 0.0}
        ],
        "filter_logic": "AND"
    }))
    .unwrap();

    // The mock walk substitutes, so the symbol still scans and matches
    let result = scanner.scan_stocks(request).await.unwrap();
    assert_eq!(result.total_matched, 1);
    assert!(result.failed_stocks.is_empty());
}

#[tokio::test]
async fn multi_timeframe_filters_fetch_each_frame() {
    let mut server = mockito::Server::new_async().await;
    let candle_mock = server
        .mock("GET", "/api/market-data/candles")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(rising_candles(30).to_string())
        .expect_at_least(2)
        .create_async()
        .await;

    let scanner = scanner_against(&server).await;
    let request: ScanRequest = serde_json::from_value(json!({
        "symbols": ["AAPL"],
        "filters": [
            {"type": "price", "field": "close", "operator": "gt", "value": 0.0,
             "timeframe": "15min"}
        ],
        "filter_logic": "AND"
    }))
    .unwrap();

    let result = scanner.scan_stocks(request).await.unwrap();

    // Daily plus 15min were both fetched
    candle_mock.assert_async().await;
    assert_eq!(result.total_matched, 1);
}

#[tokio::test]
async fn malformed_timeframe_fails_the_request() {
    let server = mockito::Server::new_async().await;
    let scanner = scanner_against(&server).await;

    let request: ScanRequest = serde_json::from_value(json!({
        "symbols": ["AAPL"],
        "filters": [
            {"type": "price", "field": "close", "operator": "gt", "value": 0.0,
             "timeframe": "2min"}
        ],
        "filter_logic": "AND"
    }))
    .unwrap();

    let ctx: ScanContext = scanner.scan_context();
    let err = run_scan(&ctx, &request).await.unwrap_err();
    assert!(err.to_string().contains("2min"));
}
