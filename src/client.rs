//! HTTP client for the upstream market-data service.
//!
//! All data flows through one base URL: candle history, fundamental
//! metrics, the symbol universe, and the delegated watchlist / saved-scan
//! CRUD endpoints. The client maps logical intervals to the service's
//! resolution codes and assembles wire payloads into [`Frame`]s; it does not
//! decide fallback behavior, which belongs to the provider layer.

use crate::config::Config;
use crate::constants::{Interval, OutputSize};
use crate::error::{Result, ScannerError};
use crate::models::{Candle, Frame};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;
use url::Url;

/// Helper to validate a symbol is non-empty
pub(crate) fn validate_symbol(symbol: &str) -> Result<()> {
    if symbol.trim().is_empty() {
        return Err(ScannerError::InvalidParameter {
            param: "symbol".to_string(),
            reason: "Empty symbol provided".to_string(),
        });
    }
    Ok(())
}

/// Wire shape of the candle endpoint: parallel arrays plus a status string
#[derive(Debug, Deserialize)]
struct CandlePayload {
    s: String,
    #[serde(default)]
    o: Vec<f64>,
    #[serde(default)]
    h: Vec<f64>,
    #[serde(default)]
    l: Vec<f64>,
    #[serde(default)]
    c: Vec<f64>,
    #[serde(default)]
    v: Vec<f64>,
    #[serde(default)]
    t: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct MetricPayload {
    #[serde(default)]
    metric: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct SymbolEntry {
    ticker: String,
}

#[derive(Debug, Deserialize)]
struct SymbolsPayload {
    #[serde(default)]
    symbols: Vec<SymbolEntry>,
}

/// Client for the upstream market-data service
#[derive(Debug, Clone)]
pub struct MarketDataClient {
    http: reqwest::Client,
    base_url: Url,
    use_local_candles: bool,
}

impl MarketDataClient {
    /// Build a client from configuration
    pub fn new(config: &Config) -> Result<Self> {
        let base_url = Url::parse(&config.api_url).map_err(|e| ScannerError::InvalidParameter {
            param: "api_url".to_string(),
            reason: e.to_string(),
        })?;

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            http,
            base_url,
            use_local_candles: config.use_local_candles,
        })
    }

    /// The configured base URL
    pub fn base_url(&self) -> &str {
        self.base_url.as_str()
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| ScannerError::InvalidParameter {
                param: "path".to_string(),
                reason: e.to_string(),
            })
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
    ) -> Result<T> {
        let response = self.http.get(url.clone()).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScannerError::Upstream {
                context: format!("{} returned HTTP {}", url.path(), status.as_u16()),
            });
        }

        Ok(response.json::<T>().await?)
    }

    /// Fetch candle history for a symbol.
    ///
    /// A non-ok payload status produces an empty frame rather than an error;
    /// callers observe zero data points and decide whether to fall back.
    pub async fn candles(
        &self,
        symbol: &str,
        interval: Interval,
        size: OutputSize,
    ) -> Result<Frame> {
        validate_symbol(symbol)?;

        let path = if self.use_local_candles {
            "/api/market-data/candles/local"
        } else {
            "/api/market-data/candles"
        };

        let to = Utc::now().timestamp();
        let from = to - interval.window_seconds(size);

        info!(
            "Fetching candles for {} ({}, {})",
            symbol,
            interval.as_str(),
            size.as_str()
        );

        let payload: CandlePayload = self
            .get_json(
                self.endpoint(path)?,
                &[
                    ("symbol", symbol.to_uppercase()),
                    ("resolution", interval.resolution().to_string()),
                    ("from", from.to_string()),
                    ("to", to.to_string()),
                ],
            )
            .await?;

        Ok(assemble_frame(payload, interval))
    }

    /// Fetch the fundamentals record for a symbol
    pub async fn fundamentals(&self, symbol: &str) -> Result<Map<String, Value>> {
        validate_symbol(symbol)?;

        info!("Fetching fundamentals for {}", symbol);

        let payload: MetricPayload = self
            .get_json(
                self.endpoint("/api/market-data/metric")?,
                &[("symbol", symbol.to_uppercase())],
            )
            .await?;

        Ok(payload.metric)
    }

    /// Fetch the symbol universe
    pub async fn symbols(&self, take: usize) -> Result<Vec<String>> {
        let payload: SymbolsPayload = self
            .get_json(self.endpoint("/api/symbols")?, &[("take", take.to_string())])
            .await?;

        Ok(payload.symbols.into_iter().map(|s| s.ticker).collect())
    }

    /// Cheap reachability probe for health checks
    pub async fn ping(&self) -> bool {
        match self.endpoint("/api/symbols") {
            Ok(url) => self
                .get_json::<Value>(url, &[("take", "1".to_string())])
                .await
                .is_ok(),
            Err(_) => false,
        }
    }

    // ------------------------------------------------------------------
    // Delegated CRUD: watchlists and saved scans live in the upstream
    // REST API; the scanner holds no state of its own.
    // ------------------------------------------------------------------

    /// List watchlists
    pub async fn list_watchlists(&self) -> Result<Value> {
        self.get_json(self.endpoint("/api/watchlists")?, &[]).await
    }

    /// Fetch a watchlist by id
    pub async fn get_watchlist(&self, id: &str) -> Result<Value> {
        self.get_json(self.endpoint(&format!("/api/watchlists/{id}"))?, &[])
            .await
    }

    /// Create a watchlist
    pub async fn create_watchlist(&self, body: &Value) -> Result<Value> {
        self.send_json(reqwest::Method::POST, "/api/watchlists", Some(body))
            .await
    }

    /// Update a watchlist by id
    pub async fn update_watchlist(&self, id: &str, body: &Value) -> Result<Value> {
        self.send_json(
            reqwest::Method::PATCH,
            &format!("/api/watchlists/{id}"),
            Some(body),
        )
        .await
    }

    /// Delete a watchlist by id
    pub async fn delete_watchlist(&self, id: &str) -> Result<Value> {
        self.send_json(
            reqwest::Method::DELETE,
            &format!("/api/watchlists/{id}"),
            None,
        )
        .await
    }

    /// List saved scans
    pub async fn list_saved_scans(&self) -> Result<Value> {
        self.get_json(self.endpoint("/api/saved-scans")?, &[]).await
    }

    /// Fetch a saved scan by id
    pub async fn get_saved_scan(&self, id: &str) -> Result<Value> {
        self.get_json(self.endpoint(&format!("/api/saved-scans/{id}"))?, &[])
            .await
    }

    /// Create a saved scan
    pub async fn create_saved_scan(&self, body: &Value) -> Result<Value> {
        self.send_json(reqwest::Method::POST, "/api/saved-scans", Some(body))
            .await
    }

    /// Update a saved scan by id
    pub async fn update_saved_scan(&self, id: &str, body: &Value) -> Result<Value> {
        self.send_json(
            reqwest::Method::PATCH,
            &format!("/api/saved-scans/{id}"),
            Some(body),
        )
        .await
    }

    /// Delete a saved scan by id
    pub async fn delete_saved_scan(&self, id: &str) -> Result<Value> {
        self.send_json(
            reqwest::Method::DELETE,
            &format!("/api/saved-scans/{id}"),
            None,
        )
        .await
    }

    async fn send_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value> {
        let url = self.endpoint(path)?;
        let mut request = self.http.request(method, url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScannerError::Upstream {
                context: format!("{} returned HTTP {}", url.path(), status.as_u16()),
            });
        }

        // DELETE may return an empty body
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// Zip the parallel payload arrays into an ordered frame.
///
/// The candle endpoint emits ascending timestamps; rows are zipped up to the
/// shortest array and open/high/low/close coerce to float, volume to integer.
fn assemble_frame(payload: CandlePayload, interval: Interval) -> Frame {
    if payload.s != "ok" {
        return Frame::new(Vec::new());
    }

    let len = payload
        .t
        .len()
        .min(payload.o.len())
        .min(payload.h.len())
        .min(payload.l.len())
        .min(payload.c.len())
        .min(payload.v.len());

    let mut candles = Vec::with_capacity(len);
    for i in 0..len {
        candles.push(Candle {
            timestamp: payload.t[i],
            date: format_date(payload.t[i], interval),
            open: payload.o[i],
            high: payload.h[i],
            low: payload.l[i],
            close: payload.c[i],
            volume: payload.v[i] as i64,
        });
    }

    Frame::new(candles)
}

/// Format a Unix timestamp per the interval's date convention
pub(crate) fn format_date(timestamp: i64, interval: Interval) -> String {
    let datetime = DateTime::<Utc>::from_timestamp(timestamp, 0).unwrap_or_default();
    if interval.is_intraday() {
        datetime.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        datetime.format("%Y-%m-%d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client_for(url: &str) -> MarketDataClient {
        let config = Config::builder().api_url(url).build();
        MarketDataClient::new(&config).unwrap()
    }

    #[test]
    fn test_format_date_conventions() {
        // 2024-01-02 15:30:00 UTC
        let ts = 1704209400;
        assert_eq!(format_date(ts, Interval::Daily), "2024-01-02");
        assert_eq!(
            format_date(ts, Interval::FiveMinutes),
            "2024-01-02 15:30:00"
        );
    }

    #[test]
    fn test_assemble_frame_not_ok_is_empty() {
        let payload = CandlePayload {
            s: "no_data".to_string(),
            o: vec![],
            h: vec![],
            l: vec![],
            c: vec![],
            v: vec![],
            t: vec![],
        };
        assert!(assemble_frame(payload, Interval::Daily).is_empty());
    }

    #[test]
    fn test_assemble_frame_zips_to_shortest() {
        let payload = CandlePayload {
            s: "ok".to_string(),
            o: vec![1.0, 2.0, 3.0],
            h: vec![1.5, 2.5],
            l: vec![0.5, 1.5],
            c: vec![1.2, 2.2],
            v: vec![100.0, 200.0],
            t: vec![1704153600, 1704240000],
        };
        let frame = assemble_frame(payload, Interval::Daily);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.value("close", -1), Some(2.2));
        assert_eq!(frame.value("volume", -1), Some(200.0));
        assert_eq!(frame.candle(-1).unwrap().date, "2024-01-03");
    }

    #[tokio::test]
    async fn test_candles_fetch_and_parse() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/market-data/candles")
            .match_query(mockito::Matcher::UrlEncoded(
                "symbol".into(),
                "AAPL".into(),
            ))
            .with_status(200)
            .with_body(
                serde_json::json!({
                    "s": "ok",
                    "o": [100.0, 101.0],
                    "h": [105.0, 106.0],
                    "l": [99.0, 100.0],
                    "c": [103.0, 104.0],
                    "v": [1000.0, 1100.0],
                    "t": [1704153600, 1704240000]
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let frame = client
            .candles("AAPL", Interval::Daily, OutputSize::Compact)
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.value("close", -1), Some(104.0));
    }

    #[tokio::test]
    async fn test_candles_upstream_error_is_retriable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/market-data/candles")
            .with_status(502)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let err = client
            .candles("AAPL", Interval::Daily, OutputSize::Compact)
            .await
            .unwrap_err();

        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn test_fundamentals_unwraps_metric() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/market-data/metric")
            .match_query(mockito::Matcher::UrlEncoded(
                "symbol".into(),
                "AAPL".into(),
            ))
            .with_status(200)
            .with_body(r#"{"metric": {"peBasicExclExtraTTM": 18.0}}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let metric = client.fundamentals("AAPL").await.unwrap();
        assert_eq!(metric.get("peBasicExclExtraTTM").unwrap().as_f64(), Some(18.0));
    }

    #[tokio::test]
    async fn test_symbols_extracts_tickers() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/symbols")
            .match_query(mockito::Matcher::UrlEncoded("take".into(), "10".into()))
            .with_status(200)
            .with_body(r#"{"symbols": [{"ticker": "AAPL"}, {"ticker": "MSFT"}]}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let symbols = client.symbols(10).await.unwrap();
        assert_eq!(symbols, vec!["AAPL".to_string(), "MSFT".to_string()]);
    }

    #[tokio::test]
    async fn test_empty_symbol_rejected() {
        let client = client_for("http://localhost:1");
        let err = client
            .candles("  ", Interval::Daily, OutputSize::Compact)
            .await
            .unwrap_err();
        assert!(matches!(err, ScannerError::InvalidParameter { .. }));
    }
}
