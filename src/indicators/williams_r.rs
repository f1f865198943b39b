//! Williams %R indicator.

use super::{IndicatorError, Result};

/// Calculate Williams %R.
///
/// Locates the close within the rolling high/low range on an inverted scale:
/// `-100 · (highest_high - close) / (highest_high - lowest_low)`.
/// Values range from -100 (close at the low) to 0 (close at the high).
///
/// Positions where the rolling range is zero are `None`.
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
/// use stock_scanner::indicators::williams_r;
///
/// let highs: Vec<f64> = (0..20).map(|x| 12.0 + x as f64).collect();
/// let lows: Vec<f64> = (0..20).map(|x| 8.0 + x as f64).collect();
/// let closes: Vec<f64> = (0..20).map(|x| 11.0 + x as f64).collect();
/// let result = williams_r(&highs, &lows, &closes, 14).unwrap();
/// assert_eq!(result.len(), 20);
/// ```
pub fn williams_r(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
) -> Result<Vec<Option<f64>>> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(
            "Period must be greater than 0".to_string(),
        ));
    }

    let len = highs.len();
    if lows.len() != len || closes.len() != len {
        return Err(IndicatorError::InvalidPeriod(
            "Data lengths must match".to_string(),
        ));
    }
    if len < period {
        return Err(IndicatorError::InsufficientData {
            need: period,
            got: len,
        });
    }

    let mut result = vec![None; len];

    for i in (period - 1)..len {
        let start = i + 1 - period;
        let highest = highs[start..=i].iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let lowest = lows[start..=i].iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let range = highest - lowest;

        if range != 0.0 {
            result[i] = Some(-100.0 * (highest - closes[i]) / range);
        }
    }

    Ok(result)
}
