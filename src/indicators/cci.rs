//! Commodity Channel Index (CCI) indicator.

use super::{IndicatorError, Result};

/// Calculate Commodity Channel Index (CCI).
///
/// Measures the deviation of the typical price from its rolling average,
/// scaled by the mean absolute deviation:
/// `(tp - SMA(tp)) / (0.015 · MAD(tp))`.
///
/// Positions where the mean absolute deviation is zero are `None`.
///
/// # Arguments
///
/// * `highs` - High prices
/// * `lows` - Low prices
/// * `closes` - Close prices
/// * `period` - Number of periods (typically 20)
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::cci;
///
/// let highs: Vec<f64> = (0..30).map(|x| 12.0 + x as f64).collect();
/// let lows: Vec<f64> = (0..30).map(|x| 8.0 + x as f64).collect();
/// let closes: Vec<f64> = (0..30).map(|x| 10.0 + x as f64).collect();
/// let result = cci(&highs, &lows, &closes, 20).unwrap();
/// assert_eq!(result.len(), 30);
/// ```
pub fn cci(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
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

    let typical: Vec<f64> = (0..len)
        .map(|i| (highs[i] + lows[i] + closes[i]) / 3.0)
        .collect();

    let mut result = vec![None; len];

    for i in (period - 1)..len {
        let window = &typical[i + 1 - period..=i];
        let mean: f64 = window.iter().sum::<f64>() / period as f64;
        let mad: f64 = window.iter().map(|&x| (x - mean).abs()).sum::<f64>() / period as f64;

        if mad != 0.0 {
            result[i] = Some((typical[i] - mean) / (0.015 * mad));
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cci_uptrend_positive() {
        let highs: Vec<f64> = (0..40).map(|x| 12.0 + x as f64).collect();
        let lows: Vec<f64> = (0..40).map(|x| 8.0 + x as f64).collect();
        let closes: Vec<f64> = (0..40).map(|x| 10.0 + x as f64).collect();

        let result = cci(&highs, &lows, &closes, 20).unwrap();

        // Latest typical price sits above the window mean in a steady uptrend
        let last = result.last().unwrap().unwrap();
        assert!(last > 0.0);
    }

    #[test]
    fn test_cci_flat_series_undefined() {
        let highs = vec![10.0; 30];
        let lows = vec![8.0; 30];
        let closes = vec![9.0; 30];

        let result = cci(&highs, &lows, &closes, 20).unwrap();
        assert!(result.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_cci_insufficient_data() {
        let data = vec![1.0; 5];
        assert!(cci(&data, &data, &data, 20).is_err());
    }
}
