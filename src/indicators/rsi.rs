//! Relative Strength Index (RSI) indicator.

use super::{IndicatorError, Result, wilder_smooth};

/// Calculate Relative Strength Index (RSI).
///
/// RSI measures the magnitude of recent price changes to evaluate overbought
/// or oversold conditions. Values range from 0 to 100, with readings above 70
/// indicating overbought and below 30 indicating oversold.
///
/// # Arguments
///
/// * `data` - Price data (typically close prices)
/// * `period` - Number of periods (typically 14)
///
/// # Formula
///
/// 1. Split price changes into gains and losses (absolute value)
/// 2. Smooth both with Wilder's method (`alpha = 1/period`)
/// 3. RS = Average Gain / Average Loss
/// 4. RSI = 100 - (100 / (1 + RS))
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::rsi;
///
/// let prices: Vec<f64> = (0..30).map(|x| x as f64).collect();
/// let result = rsi(&prices, 14).unwrap();
///
/// // Strictly rising prices pin RSI at 100
/// assert_eq!(result[13], None);
/// assert_eq!(result[14], Some(100.0));
/// ```
pub fn rsi(data: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(
            "Period must be greater than 0".to_string(),
        ));
    }

    if data.len() <= period {
        return Err(IndicatorError::InsufficientData {
            need: period + 1,
            got: data.len(),
        });
    }

    let mut gains = Vec::with_capacity(data.len() - 1);
    let mut losses = Vec::with_capacity(data.len() - 1);

    for i in 1..data.len() {
        let change = data[i] - data[i - 1];
        if change > 0.0 {
            gains.push(change);
            losses.push(0.0);
        } else {
            gains.push(0.0);
            losses.push(-change);
        }
    }

    let avg_gains = wilder_smooth(&gains, period);
    let avg_losses = wilder_smooth(&losses, period);

    // Change series is one shorter than the input, shift results right by one
    let mut result = vec![None; data.len()];
    for i in 0..avg_gains.len() {
        if let (Some(avg_gain), Some(avg_loss)) = (avg_gains[i], avg_losses[i]) {
            let rsi_value = if avg_loss == 0.0 {
                100.0
            } else {
                let rs = avg_gain / avg_loss;
                100.0 - (100.0 / (1.0 + rs))
            };
            result[i + 1] = Some(rsi_value);
        }
    }

    Ok(result)
}
