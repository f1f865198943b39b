//! Parabolic SAR (Stop and Reverse) indicator.

use super::{IndicatorError, Result};

/// Calculate Parabolic SAR.
///
/// Standard Wilder recursion: the SAR accelerates toward the extreme point
/// while the trend holds, and reverses to the prior extreme when price
/// crosses it. The SAR is additionally capped so it never enters the range
/// of the prior two candles.
///
/// # Arguments
///
/// * `highs` - High prices
/// * `lows` - Low prices
/// * `closes` - Close prices
/// * `step` - Acceleration factor increment (typically 0.02)
/// * `max_step` - Maximum acceleration factor (typically 0.2)
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::parabolic_sar;
///
/// let highs = vec![10.0, 11.0, 12.0, 13.0, 14.0];
/// let lows = vec![8.0, 9.0, 10.0, 11.0, 12.0];
/// let closes = vec![9.0, 10.0, 11.0, 12.0, 13.0];
/// let result = parabolic_sar(&highs, &lows, &closes, 0.02, 0.2).unwrap();
/// assert_eq!(result.len(), 5);
/// ```
pub fn parabolic_sar(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    step: f64,
    max_step: f64,
) -> Result<Vec<Option<f64>>> {
    let len = highs.len();
    if lows.len() != len || closes.len() != len {
        return Err(IndicatorError::InvalidPeriod(
            "Data lengths must match".to_string(),
        ));
    }
    if len < 2 {
        return Err(IndicatorError::InsufficientData { need: 2, got: len });
    }
    if step <= 0.0 || max_step < step {
        return Err(IndicatorError::InvalidPeriod(
            "Step must be positive and not exceed the maximum".to_string(),
        ));
    }

    let mut result = vec![None; len];

    let mut bullish = closes[1] > closes[0];
    let mut sar = if bullish { lows[0] } else { highs[0] };
    let mut ep = if bullish { highs[1] } else { lows[1] };
    let mut af = step;

    for i in 2..len {
        sar += af * (ep - sar);

        // SAR may not sit inside the prior two candles' range
        if bullish {
            sar = sar.min(lows[i - 1]).min(lows[i - 2]);
        } else {
            sar = sar.max(highs[i - 1]).max(highs[i - 2]);
        }

        let reversed = if bullish { lows[i] < sar } else { highs[i] > sar };

        if reversed {
            bullish = !bullish;
            sar = ep;
            ep = if bullish { highs[i] } else { lows[i] };
            af = step;
        } else if bullish && highs[i] > ep {
            ep = highs[i];
            af = (af + step).min(max_step);
        } else if !bullish && lows[i] < ep {
            ep = lows[i];
            af = (af + step).min(max_step);
        }

        result[i] = Some(sar);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parabolic_sar_uptrend_below_price() {
        let highs: Vec<f64> = (0..20).map(|x| 11.0 + x as f64).collect();
        let lows: Vec<f64> = (0..20).map(|x| 9.0 + x as f64).collect();
        let closes: Vec<f64> = (0..20).map(|x| 10.0 + x as f64).collect();

        let result = parabolic_sar(&highs, &lows, &closes, 0.02, 0.2).unwrap();

        assert!(result[0].is_none());
        assert!(result[1].is_none());
        for (i, val) in result.iter().enumerate().skip(2) {
            let sar = val.unwrap();
            assert!(sar < lows[i], "SAR {} not below price at {}", sar, i);
        }
    }

    #[test]
    fn test_parabolic_sar_reversal() {
        let mut highs: Vec<f64> = (0..20).map(|x| 11.0 + x as f64).collect();
        let mut lows: Vec<f64> = (0..20).map(|x| 9.0 + x as f64).collect();
        let mut closes: Vec<f64> = (0..20).map(|x| 10.0 + x as f64).collect();

        for i in 12..20 {
            highs[i] = 6.0;
            lows[i] = 4.0;
            closes[i] = 5.0;
        }

        let result = parabolic_sar(&highs, &lows, &closes, 0.02, 0.2).unwrap();
        // After the collapse the SAR sits above price (downtrend)
        let last = result.last().unwrap().unwrap();
        assert!(last > *highs.last().unwrap());
    }

    #[test]
    fn test_parabolic_sar_invalid_step() {
        let data = vec![1.0, 2.0, 3.0];
        assert!(parabolic_sar(&data, &data, &data, 0.0, 0.2).is_err());
        assert!(parabolic_sar(&data, &data, &data, 0.3, 0.2).is_err());
    }
}
