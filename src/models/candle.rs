/// Candle module
///
/// Contains the OHLCV candle/bar structure.
use serde::{Deserialize, Serialize};

/// A single OHLCV candle/bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// Timestamp (Unix seconds)
    pub timestamp: i64,
    /// Formatted date: `YYYY-MM-DD` for daily and coarser intervals,
    /// `YYYY-MM-DD HH:MM:SS` for intraday
    pub date: String,
    /// Open price
    pub open: f64,
    /// High price
    pub high: f64,
    /// Low price
    pub low: f64,
    /// Close price
    pub close: f64,
    /// Volume
    pub volume: i64,
}

impl Candle {
    /// Absolute distance between open and close
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Upper wick: high above the body top
    pub fn upper_wick(&self) -> f64 {
        self.high - self.open.max(self.close)
    }

    /// Lower wick: body bottom above the low
    pub fn lower_wick(&self) -> f64 {
        self.open.min(self.close) - self.low
    }

    /// Full high-to-low range
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Whether the candle closed above its open
    pub fn is_green(&self) -> bool {
        self.close > self.open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open: f64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp: 0,
            date: "2024-01-02".to_string(),
            open,
            high,
            low,
            close,
            volume: 1_000,
        }
    }

    #[test]
    fn test_candle_components() {
        let c = candle(100.0, 101.2, 95.0, 101.0);
        assert!((c.body() - 1.0).abs() < 1e-9);
        assert!((c.upper_wick() - 0.2).abs() < 1e-9);
        assert!((c.lower_wick() - 5.0).abs() < 1e-9);
        assert!((c.range() - 6.2).abs() < 1e-9);
        assert!(c.is_green());
    }

    #[test]
    fn test_doji_is_not_green() {
        let c = candle(100.0, 101.0, 99.0, 100.0);
        assert!(!c.is_green());
    }
}
