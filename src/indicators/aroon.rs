//! Aroon indicator.

use super::{IndicatorError, Result};
use serde::{Deserialize, Serialize};

/// Result of Aroon calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AroonResult {
    /// Aroon Up line
    pub up: Vec<Option<f64>>,
    /// Aroon Down line
    pub down: Vec<Option<f64>>,
    /// Aroon Oscillator (up - down)
    pub oscillator: Vec<Option<f64>>,
}

/// Calculate the Aroon indicator.
///
/// Aroon Up = ((period - bars since highest high) / period) * 100
/// Aroon Down = ((period - bars since lowest low) / period) * 100
/// Oscillator = Aroon Up - Aroon Down
///
/// # Arguments
///
/// * `highs` - High prices
/// * `lows` - Low prices
/// * `period` - Number of periods (typically 25)
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::aroon;
///
/// let highs = vec![10.0, 11.0, 12.0, 11.0, 10.0];
/// let lows = vec![8.0, 9.0, 10.0, 9.0, 8.0];
/// let result = aroon(&highs, &lows, 3).unwrap();
/// assert_eq!(result.up.len(), 5);
/// ```
pub fn aroon(highs: &[f64], lows: &[f64], period: usize) -> Result<AroonResult> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(
            "Period must be greater than 0".to_string(),
        ));
    }
    let len = highs.len();
    if lows.len() != len {
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

    let mut up = vec![None; len];
    let mut down = vec![None; len];
    let mut oscillator = vec![None; len];

    for i in (period - 1)..len {
        let start = i + 1 - period;

        let mut highest_idx = 0;
        let mut highest_val = f64::NEG_INFINITY;
        for (j, &val) in highs[start..=i].iter().enumerate() {
            if val >= highest_val {
                highest_val = val;
                highest_idx = j;
            }
        }

        let mut lowest_idx = 0;
        let mut lowest_val = f64::INFINITY;
        for (j, &val) in lows[start..=i].iter().enumerate() {
            if val <= lowest_val {
                lowest_val = val;
                lowest_idx = j;
            }
        }

        let bars_since_high = (period - 1) - highest_idx;
        let bars_since_low = (period - 1) - lowest_idx;

        let up_val = ((period - bars_since_high) as f64 / period as f64) * 100.0;
        let down_val = ((period - bars_since_low) as f64 / period as f64) * 100.0;

        up[i] = Some(up_val);
        down[i] = Some(down_val);
        oscillator[i] = Some(up_val - down_val);
    }

    Ok(AroonResult {
        up,
        down,
        oscillator,
    })
}
