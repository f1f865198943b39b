//! Stochastic Oscillator %K indicator.

use super::{IndicatorError, Result, sma::sma};

/// Calculate the smoothed Stochastic Oscillator %K.
///
/// Raw %K locates the close within the rolling high/low range:
/// `100 · (close - lowest_low) / (highest_high - lowest_low)`,
/// then an SMA over `smooth` periods is applied (slow stochastic).
///
/// Positions where the rolling range is zero are `None`.
///
/// # Arguments
///
/// * `highs` - High prices
/// * `lows` - Low prices
/// * `closes` - Close prices
/// * `period` - %K lookback (typically 14)
/// * `smooth` - SMA smoothing of raw %K (typically 3)
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::stochastic_k;
///
/// let highs: Vec<f64> = (0..30).map(|x| 12.0 + x as f64).collect();
/// let lows: Vec<f64> = (0..30).map(|x| 8.0 + x as f64).collect();
/// let closes: Vec<f64> = (0..30).map(|x| 11.0 + x as f64).collect();
/// let result = stochastic_k(&highs, &lows, &closes, 14, 3).unwrap();
/// assert_eq!(result.len(), 30);
/// ```
pub fn stochastic_k(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    period: usize,
    smooth: usize,
) -> Result<Vec<Option<f64>>> {
    if period == 0 || smooth == 0 {
        return Err(IndicatorError::InvalidPeriod(
            "Periods must be greater than 0".to_string(),
        ));
    }

    let len = highs.len();
    if lows.len() != len || closes.len() != len {
        return Err(IndicatorError::InvalidPeriod(
            "Data lengths must match".to_string(),
        ));
    }

    if len < period + smooth - 1 {
        return Err(IndicatorError::InsufficientData {
            need: period + smooth - 1,
            got: len,
        });
    }

    let mut raw_k = vec![f64::NAN; len];
    for i in (period - 1)..len {
        let start = i + 1 - period;
        let highest = highs[start..=i].iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let lowest = lows[start..=i].iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let range = highest - lowest;
        if range != 0.0 {
            raw_k[i] = 100.0 * (closes[i] - lowest) / range;
        }
    }

    // Smooth only the defined region; NaNs mark zero-range or warm-up bars
    let defined: Vec<f64> = raw_k[(period - 1)..].to_vec();
    let has_nan = defined.iter().any(|v| v.is_nan());

    let mut result = vec![None; len];
    if !has_nan {
        let smoothed = sma(&defined, smooth);
        for (j, val) in smoothed.iter().enumerate() {
            result[period - 1 + j] = *val;
        }
    } else {
        // Fall back to windowed smoothing that skips undefined bars
        for i in (period + smooth - 2)..len {
            let window = &raw_k[i + 1 - smooth..=i];
            if window.iter().all(|v| !v.is_nan()) {
                result[i] = Some(window.iter().sum::<f64>() / smooth as f64);
            }
        }
    }

    Ok(result)
}
