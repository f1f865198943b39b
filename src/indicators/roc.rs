//! Rate of Change (ROC) indicator.

use super::{IndicatorError, Result};

/// Calculate Rate of Change (ROC).
///
/// Percent change against the value `period` candles earlier:
/// `(close / close[-period] - 1) · 100`.
///
/// Positions whose reference value is zero are `None`.
///
/// # Arguments
///
/// * `data` - Price data (typically close prices)
/// * `period` - Lookback distance (typically 12)
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::roc;
///
/// let prices = vec![100.0, 102.0, 105.0, 110.0];
/// let result = roc(&prices, 2).unwrap();
///
/// // (105 / 100 - 1) * 100 = 5.0
/// assert_eq!(result[2], Some(5.0));
/// ```
pub fn roc(data: &[f64], period: usize) -> Result<Vec<Option<f64>>> {
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

    let mut result = vec![None; data.len()];
    for i in period..data.len() {
        let reference = data[i - period];
        if reference != 0.0 {
            result[i] = Some((data[i] / reference - 1.0) * 100.0);
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roc_basic() {
        let prices = vec![100.0, 102.0, 105.0, 110.0, 99.0];
        let result = roc(&prices, 2).unwrap();

        assert_eq!(result[0], None);
        assert_eq!(result[1], None);
        assert_eq!(result[2], Some(5.0));
        assert!((result[3].unwrap() - (110.0 / 102.0 - 1.0) * 100.0).abs() < 1e-9);
        assert!(result[4].unwrap() < 0.0);
    }

    #[test]
    fn test_roc_flat_series_is_zero() {
        let prices = vec![50.0; 20];
        let result = roc(&prices, 12).unwrap();
        for val in result.iter().flatten() {
            assert_eq!(*val, 0.0);
        }
    }

    #[test]
    fn test_roc_zero_reference_undefined() {
        let prices = vec![0.0, 1.0, 2.0, 3.0];
        let result = roc(&prices, 2).unwrap();
        assert_eq!(result[2], None);
        assert_eq!(result[3], Some(200.0));
    }

    #[test]
    fn test_roc_insufficient_data() {
        assert!(roc(&[1.0, 2.0], 12).is_err());
    }
}
