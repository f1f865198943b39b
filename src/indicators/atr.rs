//! Average True Range (ATR) indicator.

use super::{IndicatorError, Result, wilder_smooth};

/// Calculate Average True Range (ATR).
///
/// ATR measures market volatility as the Wilder-smoothed average of true
/// ranges. True range is the greatest of:
/// - Current high - current low
/// - |Current high - previous close|
/// - |Current low - previous close|
///
/// # Arguments
///
/// * `highs` - High prices
/// * `lows` - Low prices
/// * `closes` - Close prices
/// * `period` - Number of periods (typically 14)
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::atr;
///
/// let highs = vec![50.0, 51.0, 52.0, 51.5, 53.0, 54.0, 53.5, 55.0];
/// let lows = vec![48.0, 49.0, 50.0, 49.5, 51.0, 52.0, 51.5, 53.0];
/// let closes = vec![49.0, 50.5, 51.0, 50.0, 52.0, 53.0, 52.5, 54.0];
///
/// let result = atr(&highs, &lows, &closes, 3).unwrap();
/// assert_eq!(result.len(), 8);
/// assert!(result[2].is_some());
/// ```
pub fn atr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(
            "Period must be greater than 0".to_string(),
        ));
    }

    if highs.len() != lows.len() || highs.len() != closes.len() {
        return Err(IndicatorError::InvalidPeriod(
            "All arrays must have the same length".to_string(),
        ));
    }

    if highs.len() < period {
        return Err(IndicatorError::InsufficientData {
            need: period,
            got: highs.len(),
        });
    }

    let mut true_ranges = Vec::with_capacity(highs.len());
    true_ranges.push(highs[0] - lows[0]);

    for i in 1..highs.len() {
        let h_l = highs[i] - lows[i];
        let h_pc = (highs[i] - closes[i - 1]).abs();
        let l_pc = (lows[i] - closes[i - 1]).abs();
        true_ranges.push(h_l.max(h_pc).max(l_pc));
    }

    Ok(wilder_smooth(&true_ranges, period))
}
