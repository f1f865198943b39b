//! Weighted Moving Average (WMA) indicator.

use super::{IndicatorError, Result};

/// Calculate Weighted Moving Average (WMA).
///
/// Applies linear weights `1..period` across the window, newest value
/// weighted heaviest, normalized by the weight sum.
///
/// # Arguments
///
/// * `data` - Price data (typically close prices)
/// * `period` - Number of periods for the moving average
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::wma;
///
/// let prices = vec![10.0, 11.0, 12.0, 13.0];
/// let result = wma(&prices, 3).unwrap();
///
/// // (10*1 + 11*2 + 12*3) / 6 = 11.333...
/// assert!((result[2].unwrap() - 11.3333).abs() < 0.001);
/// ```
pub fn wma(data: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
    if period == 0 {
        return Err(IndicatorError::InvalidPeriod(
            "Period must be greater than 0".to_string(),
        ));
    }

    if data.len() < period {
        return Err(IndicatorError::InsufficientData {
            need: period,
            got: data.len(),
        });
    }

    let mut result = vec![None; period - 1];
    let weight_sum: f64 = (1..=period).map(|i| i as f64).sum();

    for i in (period - 1)..data.len() {
        let window = &data[(i + 1 - period)..=i];
        let weighted_sum: f64 = window
            .iter()
            .enumerate()
            .map(|(j, &price)| price * (j + 1) as f64)
            .sum();

        result.push(Some(weighted_sum / weight_sum));
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wma_basic() {
        let prices = vec![10.0, 11.0, 12.0, 13.0, 14.0];
        let result = wma(&prices, 3).unwrap();

        assert_eq!(result.len(), 5);
        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        // (10*1 + 11*2 + 12*3) / 6
        assert!((result[2].unwrap() - 68.0 / 6.0).abs() < 1e-9);
        assert!((result[3].unwrap() - 74.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_wma_constant_series() {
        let prices = vec![7.0; 6];
        let result = wma(&prices, 4).unwrap();
        for v in result.iter().flatten() {
            assert!((v - 7.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_wma_insufficient_data() {
        assert!(wma(&[1.0, 2.0], 5).is_err());
    }
}
