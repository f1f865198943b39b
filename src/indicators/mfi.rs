//! Money Flow Index (MFI) indicator.

use super::{IndicatorError, Result};

/// Calculate Money Flow Index (MFI).
///
/// A volume-weighted RSI analogue computed on signed money flow
/// (`typical_price × volume`). Flow is positive when the typical price rises
/// and negative when it falls; the ratio of positive to negative flow over
/// the window maps into the 0-100 oscillator scale.
///
/// # Arguments
///
/// * `highs` - High prices
/// * `lows` - Low prices
/// * `closes` - Close prices
/// * `volumes` - Volumes
/// * `period` - Number of periods (typically 14)
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::mfi;
///
/// let highs: Vec<f64> = (0..30).map(|x| 12.0 + x as f64).collect();
/// let lows: Vec<f64> = (0..30).map(|x| 8.0 + x as f64).collect();
/// let closes: Vec<f64> = (0..30).map(|x| 10.0 + x as f64).collect();
/// let volumes = vec![1000.0; 30];
/// let result = mfi(&highs, &lows, &closes, &volumes, 14).unwrap();
/// assert_eq!(result.len(), 30);
/// ```
pub fn mfi(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    volumes: &[f64],
    period: usize,
) -> Result<Vec<Option<f64>>> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(
            "Period must be greater than 0".to_string(),
        ));
    }

    let len = highs.len();
    if lows.len() != len || closes.len() != len || volumes.len() != len {
        return Err(IndicatorError::InvalidPeriod(
            "Data lengths must match".to_string(),
        ));
    }
    if len <= period {
        return Err(IndicatorError::InsufficientData {
            need: period + 1,
            got: len,
        });
    }

    let typical: Vec<f64> = (0..len)
        .map(|i| (highs[i] + lows[i] + closes[i]) / 3.0)
        .collect();

    // Signed raw money flow per candle, defined from index 1
    let mut positive_flow = vec![0.0; len];
    let mut negative_flow = vec![0.0; len];
    for i in 1..len {
        let flow = typical[i] * volumes[i];
        if typical[i] > typical[i - 1] {
            positive_flow[i] = flow;
        } else if typical[i] < typical[i - 1] {
            negative_flow[i] = flow;
        }
    }

    let mut result = vec![None; len];
    for i in period..len {
        let pos: f64 = positive_flow[i + 1 - period..=i].iter().sum();
        let neg: f64 = negative_flow[i + 1 - period..=i].iter().sum();

        let value = if neg == 0.0 {
            100.0
        } else {
            let ratio = pos / neg;
            100.0 - (100.0 / (1.0 + ratio))
        };
        result[i] = Some(value);
    }

    Ok(result)
}
