//! Tool surface.
//!
//! [`Scanner`] bundles the client, cache, and provider behind the typed
//! operations an MCP or HTTP dispatch layer would expose: data fetch,
//! indicator lookup, ad-hoc and preset scans, health check, and the
//! natural-language query helper. Each operation takes a named-parameter
//! record and returns a serializable response record.

use crate::cache::{Cache, keys};
use crate::client::MarketDataClient;
use crate::config::Config;
use crate::constants::{Interval, OutputSize, ttl};
use crate::error::{Result, ScannerError};
use crate::indicators;
use crate::models::{Candle, ScanResult};
use crate::nlq::{ParsedQuery, parse_query};
use crate::presets::preset;
use crate::provider::{CandleProvider, LiveProvider};
use crate::scan::{ScanContext, ScanRequest, run_scan};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::sync::Arc;

fn default_interval() -> Interval {
    Interval::Daily
}

fn default_time_period() -> usize {
    14
}

/// Parameters of `fetch_stock_data`
#[derive(Debug, Clone, Deserialize)]
pub struct FetchStockDataParams {
    /// Ticker symbol
    pub symbol: String,
    /// Candle interval (default daily)
    #[serde(default = "default_interval")]
    pub interval: Interval,
    /// History window (default compact)
    #[serde(default)]
    pub outputsize: OutputSize,
}

/// Response of `fetch_stock_data`
#[derive(Debug, Clone, Serialize)]
pub struct StockDataResponse {
    /// Ticker symbol
    pub symbol: String,
    /// Candle interval
    pub interval: Interval,
    /// History window
    pub outputsize: OutputSize,
    /// Number of candles returned
    pub data_points: usize,
    /// Latest close, when any data exists
    pub latest_price: Option<f64>,
    /// Date of the latest candle
    pub last_updated: Option<String>,
    /// The candles, ascending
    pub data: Vec<Candle>,
}

/// Indicators exposed by `get_technical_indicator`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ToolIndicator {
    /// Relative Strength Index
    Rsi,
    /// Simple Moving Average
    Sma,
    /// Exponential Moving Average
    Ema,
    /// MACD with signal and histogram
    Macd,
    /// Bollinger Bands
    Bbands,
}

impl ToolIndicator {
    fn as_str(&self) -> &'static str {
        match self {
            ToolIndicator::Rsi => "RSI",
            ToolIndicator::Sma => "SMA",
            ToolIndicator::Ema => "EMA",
            ToolIndicator::Macd => "MACD",
            ToolIndicator::Bbands => "BBANDS",
        }
    }
}

/// Price series an indicator is computed on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeriesType {
    /// Open prices
    Open,
    /// High prices
    High,
    /// Low prices
    Low,
    /// Close prices
    #[default]
    Close,
}

impl SeriesType {
    fn as_str(&self) -> &'static str {
        match self {
            SeriesType::Open => "open",
            SeriesType::High => "high",
            SeriesType::Low => "low",
            SeriesType::Close => "close",
        }
    }
}

/// Parameters of `get_technical_indicator`
#[derive(Debug, Clone, Deserialize)]
pub struct TechnicalIndicatorParams {
    /// Ticker symbol
    pub symbol: String,
    /// Which indicator to compute
    pub indicator: ToolIndicator,
    /// Candle interval (default daily)
    #[serde(default = "default_interval")]
    pub interval: Interval,
    /// Indicator period (default 14)
    #[serde(default = "default_time_period")]
    pub time_period: usize,
    /// Input series (default close)
    #[serde(default)]
    pub series_type: SeriesType,
}

/// Parameters of `run_preset_scan`
#[derive(Debug, Clone, Deserialize)]
pub struct PresetScanParams {
    /// Which preset to run
    pub preset_name: String,
    /// Symbols to scan; empty pulls the full universe
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Numeric overrides for the preset's knobs
    #[serde(default)]
    pub custom_params: Option<Map<String, Value>>,
}

/// Response of `run_preset_scan`
#[derive(Debug, Clone, Serialize)]
pub struct PresetScanResponse {
    /// The preset that ran
    pub preset_name: String,
    /// Its human-readable description
    pub preset_description: String,
    /// The scan outcome
    #[serde(flatten)]
    pub result: ScanResult,
}

/// Component statuses reported by `health_check`
#[derive(Debug, Clone, Serialize)]
pub struct HealthComponents {
    /// Cache backend status
    pub cache: String,
    /// Upstream market-data service status
    pub upstream: String,
}

/// Response of `health_check`
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    /// Overall status: `healthy` or `degraded`
    pub status: String,
    /// Per-component statuses
    pub components: HealthComponents,
    /// Crate version
    pub version: String,
    /// Report time (RFC 3339)
    pub timestamp: String,
}

/// The scanner facade: shared handles plus the tool operations
#[derive(Clone)]
pub struct Scanner {
    client: Arc<MarketDataClient>,
    cache: Arc<Cache>,
    provider: Arc<dyn CandleProvider>,
}

impl Scanner {
    /// Build a scanner from configuration, wiring the live cache-through
    /// provider.
    pub async fn new(config: Config) -> Result<Self> {
        let client = Arc::new(MarketDataClient::new(&config)?);
        let cache = Arc::new(Cache::new(config.redis_url.as_deref()).await);
        let provider = Arc::new(LiveProvider::new(client.clone(), cache.clone()));
        Ok(Self {
            client,
            cache,
            provider,
        })
    }

    /// Build a scanner from environment variables
    pub async fn from_env() -> Result<Self> {
        Self::new(Config::from_env()).await
    }

    /// Build a scanner with a custom candle provider (offline development,
    /// tests).
    pub async fn with_provider(config: Config, provider: Arc<dyn CandleProvider>) -> Result<Self> {
        let client = Arc::new(MarketDataClient::new(&config)?);
        let cache = Arc::new(Cache::new(config.redis_url.as_deref()).await);
        Ok(Self {
            client,
            cache,
            provider,
        })
    }

    /// The scan context shared handles
    pub fn scan_context(&self) -> ScanContext {
        ScanContext {
            client: self.client.clone(),
            cache: self.cache.clone(),
            provider: self.provider.clone(),
        }
    }

    /// The underlying market-data client, for delegated CRUD passthrough
    pub fn client(&self) -> &MarketDataClient {
        &self.client
    }

    /// Fetch candle history plus summary metadata
    pub async fn fetch_stock_data(&self, params: FetchStockDataParams) -> Result<StockDataResponse> {
        let frame = self
            .provider
            .candles(&params.symbol, params.interval, params.outputsize)
            .await?;

        let latest = frame.latest();
        Ok(StockDataResponse {
            symbol: params.symbol.to_uppercase(),
            interval: params.interval,
            outputsize: params.outputsize,
            data_points: frame.len(),
            latest_price: latest.map(|c| c.close),
            last_updated: latest.map(|c| c.date.clone()),
            data: frame.candles().to_vec(),
        })
    }

    /// Compute one of the exposed indicators over a symbol's history.
    ///
    /// Single-series indicators return `{date, value}` rows; MACD and
    /// Bollinger Bands return one row per candle with their branch values,
    /// and `latest_value` mirrors the last defined row.
    pub async fn get_technical_indicator(
        &self,
        params: TechnicalIndicatorParams,
    ) -> Result<Value> {
        let cache_key = keys::indicator(
            &params.symbol,
            params.indicator.as_str(),
            params.interval,
            params.time_period,
            params.series_type.as_str(),
        );
        if let Some(cached) = self.cache.get::<Value>(&cache_key).await {
            return Ok(cached);
        }

        let frame = self
            .provider
            .candles(&params.symbol, params.interval, OutputSize::Compact)
            .await?;
        if frame.is_empty() {
            return Err(ScannerError::Upstream {
                context: format!("no data for {}", params.symbol),
            });
        }

        let series: Vec<f64> = match params.series_type {
            SeriesType::Open => frame.opens(),
            SeriesType::High => frame.highs(),
            SeriesType::Low => frame.lows(),
            SeriesType::Close => frame.closes(),
        };
        let dates: Vec<&str> = frame.candles().iter().map(|c| c.date.as_str()).collect();

        let (values, latest_value): (Vec<Value>, Value) = match params.indicator {
            ToolIndicator::Rsi => {
                let result = indicators::rsi(&series, params.time_period)?;
                series_rows(&dates, &result)
            }
            ToolIndicator::Sma => {
                let result = indicators::sma(&series, params.time_period);
                series_rows(&dates, &result)
            }
            ToolIndicator::Ema => {
                let result = indicators::ema(&series, params.time_period);
                series_rows(&dates, &result)
            }
            ToolIndicator::Macd => {
                let result = indicators::macd(&series, 12, 26, 9)?;
                let rows: Vec<Value> = (0..dates.len())
                    .filter(|&i| result.macd_line[i].is_some())
                    .map(|i| {
                        json!({
                            "date": dates[i],
                            "macd": result.macd_line[i],
                            "signal": result.signal_line[i],
                            "histogram": result.histogram[i],
                        })
                    })
                    .collect();
                let latest = latest_row(&rows);
                (rows, latest)
            }
            ToolIndicator::Bbands => {
                let result = indicators::bollinger_bands(&series, params.time_period.max(2), 2.0)?;
                let rows: Vec<Value> = (0..dates.len())
                    .filter(|&i| result.middle[i].is_some())
                    .map(|i| {
                        json!({
                            "date": dates[i],
                            "upper": result.upper[i],
                            "middle": result.middle[i],
                            "lower": result.lower[i],
                        })
                    })
                    .collect();
                let latest = latest_row(&rows);
                (rows, latest)
            }
        };

        let response = json!({
            "symbol": params.symbol.to_uppercase(),
            "indicator": params.indicator.as_str(),
            "interval": params.interval,
            "values": values,
            "latest_value": latest_value,
            "parameters": {
                "time_period": params.time_period,
                "series_type": params.series_type.as_str(),
            },
        });

        self.cache.set(&cache_key, &response, ttl::INDICATORS).await;
        Ok(response)
    }

    /// Run an ad-hoc scan
    pub async fn scan_stocks(&self, request: ScanRequest) -> Result<ScanResult> {
        run_scan(&self.scan_context(), &request).await
    }

    /// Resolve and run a preset scan
    pub async fn run_preset_scan(&self, params: PresetScanParams) -> Result<PresetScanResponse> {
        let resolved = preset(&params.preset_name, params.custom_params.as_ref())?;

        let request = ScanRequest {
            symbols: params.symbols,
            filters: resolved.filters,
            filter_logic: crate::models::FilterLogic::And,
        };
        let result = run_scan(&self.scan_context(), &request).await?;

        Ok(PresetScanResponse {
            preset_name: resolved.name,
            preset_description: resolved.description,
            result,
        })
    }

    /// Report component health
    pub async fn health_check(&self) -> HealthReport {
        let upstream_ok = self.client.ping().await;
        let cache_status = if self.cache.is_enabled() {
            "connected"
        } else {
            "disabled"
        };

        HealthReport {
            status: if upstream_ok { "healthy" } else { "degraded" }.to_string(),
            components: HealthComponents {
                cache: cache_status.to_string(),
                upstream: if upstream_ok { "ok" } else { "unreachable" }.to_string(),
            },
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: Utc::now().to_rfc3339(),
        }
    }

    /// Interpret a natural-language query as filters
    pub fn parse_natural_language_query(&self, query: &str) -> ParsedQuery {
        parse_query(query)
    }
}

/// Last multi-branch row with its date stripped, for `latest_value`
fn latest_row(rows: &[Value]) -> Value {
    match rows.last() {
        Some(row) => {
            let mut row = row.clone();
            if let Some(obj) = row.as_object_mut() {
                obj.remove("date");
            }
            row
        }
        None => Value::Null,
    }
}

fn series_rows(dates: &[&str], series: &[Option<f64>]) -> (Vec<Value>, Value) {
    let rows: Vec<Value> = dates
        .iter()
        .zip(series.iter())
        .filter_map(|(date, value)| value.map(|v| json!({"date": date, "value": v})))
        .collect();
    let latest = rows
        .last()
        .and_then(|row| row.get("value").cloned())
        .unwrap_or(Value::Null);
    (rows, latest)
}
