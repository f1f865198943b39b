//! Moving Average Convergence Divergence (MACD) indicator.

use super::{IndicatorError, Result, ema::ema};
use serde::{Deserialize, Serialize};

/// MACD calculation result containing the MACD line, signal line, and histogram.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacdResult {
    /// MACD line (fast EMA - slow EMA)
    pub macd_line: Vec<Option<f64>>,

    /// Signal line (EMA of MACD line)
    pub signal_line: Vec<Option<f64>>,

    /// Histogram (MACD line - signal line)
    pub histogram: Vec<Option<f64>>,
}

/// Calculate Moving Average Convergence Divergence (MACD).
///
/// MACD shows the relationship between two moving averages and helps identify
/// trend changes. Standard parameters are (12, 26, 9).
///
/// # Formula
///
/// - MACD Line = fast EMA - slow EMA
/// - Signal Line = EMA of the MACD line
/// - Histogram = MACD Line - Signal Line
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::macd;
///
/// let prices: Vec<f64> = (1..=50).map(|x| x as f64).collect();
/// let result = macd(&prices, 12, 26, 9).unwrap();
///
/// assert_eq!(result.macd_line.len(), prices.len());
/// assert_eq!(result.signal_line.len(), prices.len());
/// assert_eq!(result.histogram.len(), prices.len());
/// ```
pub fn macd(
    data: &[f64],
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
) -> Result<MacdResult> {
    if fast_period == 0 || slow_period == 0 || signal_period == 0 {
        return Err(IndicatorError::InvalidPeriod(
            "All periods must be greater than 0".to_string(),
        ));
    }

    if fast_period >= slow_period {
        return Err(IndicatorError::InvalidPeriod(
            "Fast period must be less than slow period".to_string(),
        ));
    }

    if data.is_empty() {
        return Err(IndicatorError::InsufficientData { need: 1, got: 0 });
    }

    let fast_ema = ema(data, fast_period);
    let slow_ema = ema(data, slow_period);

    let mut macd_line = Vec::with_capacity(data.len());
    for i in 0..data.len() {
        match (fast_ema[i], slow_ema[i]) {
            (Some(fast), Some(slow)) => macd_line.push(Some(fast - slow)),
            _ => macd_line.push(None),
        }
    }

    let macd_values: Vec<f64> = macd_line.iter().filter_map(|&v| v).collect();
    let signal_ema = ema(&macd_values, signal_period);

    let mut signal_line = vec![None; data.len()];
    let mut signal_idx = 0;
    for i in 0..data.len() {
        if macd_line[i].is_some() {
            signal_line[i] = signal_ema.get(signal_idx).copied().flatten();
            signal_idx += 1;
        }
    }

    let mut histogram = Vec::with_capacity(data.len());
    for i in 0..data.len() {
        match (macd_line[i], signal_line[i]) {
            (Some(m), Some(s)) => histogram.push(Some(m - s)),
            _ => histogram.push(None),
        }
    }

    Ok(MacdResult {
        macd_line,
        signal_line,
        histogram,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_macd_lengths_align() {
        let prices: Vec<f64> = (1..=60).map(|x| x as f64).collect();
        let result = macd(&prices, 12, 26, 9).unwrap();

        assert_eq!(result.macd_line.len(), 60);
        assert_eq!(result.signal_line.len(), 60);
        assert_eq!(result.histogram.len(), 60);
    }

    #[test]
    fn test_macd_histogram_is_difference() {
        let prices: Vec<f64> = (1..=60).map(|x| (x as f64).sin() * 10.0 + 100.0).collect();
        let result = macd(&prices, 12, 26, 9).unwrap();

        for i in 0..prices.len() {
            if let (Some(m), Some(s), Some(h)) =
                (result.macd_line[i], result.signal_line[i], result.histogram[i])
            {
                assert!((h - (m - s)).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn test_macd_constant_series_is_zero() {
        let prices = vec![100.0; 60];
        let result = macd(&prices, 12, 26, 9).unwrap();

        let last_macd = result.macd_line.last().unwrap().unwrap();
        let last_signal = result.signal_line.last().unwrap().unwrap();
        assert!(last_macd.abs() < 1e-9);
        assert!(last_signal.abs() < 1e-9);
    }

    #[test]
    fn test_macd_invalid_periods() {
        let prices: Vec<f64> = (1..=60).map(|x| x as f64).collect();
        assert!(macd(&prices, 26, 12, 9).is_err());
        assert!(macd(&prices, 0, 26, 9).is_err());
    }
}
