//! An indexed OHLCV table for one symbol at one timeframe.
//!
//! Candles are held in ascending timestamp order. Index `-1` addresses the
//! most recent candle and negative indices count backward; non-negative
//! indices address from the start. Beyond the base OHLCV columns a frame can
//! carry derived series (precomputed indicators) and broadcast scalars
//! (fundamental enrichment), both accessed uniformly through
//! [`Frame::value`].

use super::candle::Candle;
use std::collections::HashMap;

/// A derived column attached to a frame
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    /// Per-candle values aligned to the frame length
    Series(Vec<Option<f64>>),
    /// A single value logically broadcast to every index
    Scalar(f64),
}

/// An ordered OHLCV frame plus derived columns
#[derive(Debug, Clone, Default)]
pub struct Frame {
    candles: Vec<Candle>,
    columns: HashMap<String, Column>,
}

impl Frame {
    /// Build a frame from candles already sorted ascending by timestamp
    pub fn new(candles: Vec<Candle>) -> Self {
        Self {
            candles,
            columns: HashMap::new(),
        }
    }

    /// Number of candles
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// Whether the frame holds no candles
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// All candles in ascending order
    pub fn candles(&self) -> &[Candle] {
        &self.candles
    }

    /// Resolve a possibly-negative index to a position, if in bounds
    pub fn resolve_idx(&self, idx: i64) -> Option<usize> {
        let len = self.candles.len() as i64;
        let pos = if idx < 0 { len + idx } else { idx };
        if pos >= 0 && pos < len {
            Some(pos as usize)
        } else {
            None
        }
    }

    /// Candle at a possibly-negative index
    pub fn candle(&self, idx: i64) -> Option<&Candle> {
        self.resolve_idx(idx).map(|i| &self.candles[i])
    }

    /// The most recent candle
    pub fn latest(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Look up `field` at `idx`.
    ///
    /// Base OHLCV fields match case-insensitively; derived columns match by
    /// their canonical upper-case name. Scalar columns answer for any valid
    /// index.
    pub fn value(&self, field: &str, idx: i64) -> Option<f64> {
        let pos = self.resolve_idx(idx)?;
        match field.to_lowercase().as_str() {
            "open" => return Some(self.candles[pos].open),
            "high" => return Some(self.candles[pos].high),
            "low" => return Some(self.candles[pos].low),
            "close" => return Some(self.candles[pos].close),
            "volume" => return Some(self.candles[pos].volume as f64),
            _ => {}
        }
        match self.columns.get(&field.to_uppercase())? {
            Column::Series(series) => *series.get(pos)?,
            Column::Scalar(v) => Some(*v),
        }
    }

    /// Whether `field` names a base column or an attached derived column
    pub fn has_field(&self, field: &str) -> bool {
        matches!(
            field.to_lowercase().as_str(),
            "open" | "high" | "low" | "close" | "volume"
        ) || self.columns.contains_key(&field.to_uppercase())
    }

    /// Attach a broadcast scalar column (fundamental enrichment)
    pub fn set_scalar_column(&mut self, name: &str, value: f64) {
        self.columns
            .insert(name.to_uppercase(), Column::Scalar(value));
    }

    /// Attach a per-candle series column; the series must match the frame length
    pub fn set_series_column(&mut self, name: &str, series: Vec<Option<f64>>) {
        debug_assert_eq!(series.len(), self.candles.len());
        self.columns
            .insert(name.to_uppercase(), Column::Series(series));
    }

    /// Open prices in ascending order
    pub fn opens(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.open).collect()
    }

    /// High prices in ascending order
    pub fn highs(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.high).collect()
    }

    /// Low prices in ascending order
    pub fn lows(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.low).collect()
    }

    /// Close prices in ascending order
    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// Volumes in ascending order
    pub fn volumes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.volume as f64).collect()
    }

    /// Percent change of `field` between `idx` and `lookback` candles earlier
    pub fn pct_change(&self, field: &str, idx: i64, lookback: i64) -> Option<f64> {
        let current = self.value(field, idx)?;
        let previous = self.value(field, idx - lookback)?;
        if previous == 0.0 {
            return Some(0.0);
        }
        Some((current - previous) / previous * 100.0)
    }
}
