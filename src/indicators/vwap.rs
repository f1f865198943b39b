//! Volume Weighted Average Price (VWAP) indicator.

use super::{IndicatorError, Result};

/// Calculate Volume Weighted Average Price (VWAP).
///
/// Anchored over the full series: cumulative `typical_price × volume`
/// divided by cumulative volume, where `typical_price = (high + low + close) / 3`.
/// There is no intraday reset.
///
/// Positions where cumulative volume is still zero are `None`.
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::vwap;
///
/// let highs = vec![11.0, 12.0];
/// let lows = vec![9.0, 10.0];
/// let closes = vec![10.0, 11.0];
/// let volumes = vec![100.0, 300.0];
/// let result = vwap(&highs, &lows, &closes, &volumes).unwrap();
///
/// // (10*100 + 11*300) / 400 = 10.75
/// assert!((result[1].unwrap() - 10.75).abs() < 1e-9);
/// ```
pub fn vwap(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    volumes: &[f64],
) -> Result<Vec<Option<f64>>> {
    let len = highs.len();
    if lows.len() != len || closes.len() != len || volumes.len() != len {
        return Err(IndicatorError::InvalidPeriod(
            "Data lengths must match".to_string(),
        ));
    }

    let mut result = Vec::with_capacity(len);
    let mut cum_pv = 0.0;
    let mut cum_vol = 0.0;

    for i in 0..len {
        let typical = (highs[i] + lows[i] + closes[i]) / 3.0;
        cum_pv += typical * volumes[i];
        cum_vol += volumes[i];

        if cum_vol == 0.0 {
            result.push(None);
        } else {
            result.push(Some(cum_pv / cum_vol));
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vwap_cumulative() {
        let highs = vec![11.0, 12.0, 13.0];
        let lows = vec![9.0, 10.0, 11.0];
        let closes = vec![10.0, 11.0, 12.0];
        let volumes = vec![100.0, 100.0, 200.0];

        let result = vwap(&highs, &lows, &closes, &volumes).unwrap();

        assert_eq!(result.len(), 3);
        assert_eq!(result[0], Some(10.0));
        assert_eq!(result[1], Some(10.5));
        // (10*100 + 11*100 + 12*200) / 400 = 11.25
        assert!((result[2].unwrap() - 11.25).abs() < 1e-9);
    }

    #[test]
    fn test_vwap_zero_volume_prefix() {
        let highs = vec![11.0, 12.0];
        let lows = vec![9.0, 10.0];
        let closes = vec![10.0, 11.0];
        let volumes = vec![0.0, 100.0];

        let result = vwap(&highs, &lows, &closes, &volumes).unwrap();
        assert_eq!(result[0], None);
        assert_eq!(result[1], Some(11.0));
    }

    #[test]
    fn test_vwap_mismatched_lengths() {
        assert!(vwap(&[1.0], &[1.0, 2.0], &[1.0], &[1.0]).is_err());
    }
}
