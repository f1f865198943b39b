//! Average Directional Index (ADX) indicator.

use super::{IndicatorError, Result, wilder_smooth};
use serde::{Deserialize, Serialize};

/// Result of ADX calculation with the directional indicator lines
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdxResult {
    /// Average Directional Index (trend strength)
    pub adx: Vec<Option<f64>>,
    /// Positive Directional Indicator (+DI)
    pub plus_di: Vec<Option<f64>>,
    /// Negative Directional Indicator (-DI)
    pub minus_di: Vec<Option<f64>>,
}

/// Calculate Average Directional Index (ADX).
///
/// Measures trend strength regardless of direction. Directional movements
/// and true ranges are Wilder-smoothed into +DI/-DI; DX is the normalized
/// spread between them and ADX is the Wilder-smoothed DX.
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
/// use stock_scanner::indicators::adx;
///
/// let highs: Vec<f64> = (0..40).map(|x| 50.0 + x as f64).collect();
/// let lows: Vec<f64> = (0..40).map(|x| 48.0 + x as f64).collect();
/// let closes: Vec<f64> = (0..40).map(|x| 49.0 + x as f64).collect();
/// let result = adx(&highs, &lows, &closes, 14).unwrap();
/// assert_eq!(result.adx.len(), 40);
/// ```
pub fn adx(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> Result<AdxResult> {
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

    // Need one diff candle plus two Wilder windows (DI seed, then ADX seed)
    if len < 2 * period + 1 {
        return Err(IndicatorError::InsufficientData {
            need: 2 * period + 1,
            got: len,
        });
    }

    let mut plus_dm = Vec::with_capacity(len - 1);
    let mut minus_dm = Vec::with_capacity(len - 1);
    let mut true_ranges = Vec::with_capacity(len - 1);

    for i in 1..len {
        let up_move = highs[i] - highs[i - 1];
        let down_move = lows[i - 1] - lows[i];

        plus_dm.push(if up_move > down_move && up_move > 0.0 {
            up_move
        } else {
            0.0
        });
        minus_dm.push(if down_move > up_move && down_move > 0.0 {
            down_move
        } else {
            0.0
        });

        let h_l = highs[i] - lows[i];
        let h_pc = (highs[i] - closes[i - 1]).abs();
        let l_pc = (lows[i] - closes[i - 1]).abs();
        true_ranges.push(h_l.max(h_pc).max(l_pc));
    }

    let smooth_plus = wilder_smooth(&plus_dm, period);
    let smooth_minus = wilder_smooth(&minus_dm, period);
    let smooth_tr = wilder_smooth(&true_ranges, period);

    let mut plus_di = vec![None; len];
    let mut minus_di = vec![None; len];
    // One DX entry per smoothed diff index, so the ADX mapping below stays
    // aligned even through zero-range stretches.
    let mut dx_series = Vec::with_capacity(len - 1);

    for i in (period - 1)..plus_dm.len() {
        let mut dx = 0.0;
        if let (Some(p), Some(m), Some(tr)) = (smooth_plus[i], smooth_minus[i], smooth_tr[i])
            && tr != 0.0
        {
            let pdi = 100.0 * p / tr;
            let mdi = 100.0 * m / tr;
            plus_di[i + 1] = Some(pdi);
            minus_di[i + 1] = Some(mdi);

            let sum = pdi + mdi;
            if sum != 0.0 {
                dx = 100.0 * (pdi - mdi).abs() / sum;
            }
        }
        dx_series.push(dx);
    }

    // DX starts at diff index period-1; ADX is the Wilder smooth over DX
    let smooth_dx = wilder_smooth(&dx_series, period);
    let mut adx_out = vec![None; len];
    for (j, val) in smooth_dx.iter().enumerate() {
        if let Some(v) = val {
            // diff index of this DX value is (period - 1) + j, price index +1
            adx_out[period + j] = Some(*v);
        }
    }

    Ok(AdxResult {
        adx: adx_out,
        plus_di,
        minus_di,
    })
}
