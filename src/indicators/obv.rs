//! On-Balance Volume (OBV) indicator.

/// Calculate On-Balance Volume (OBV).
///
/// Cumulative `sign(close change) × volume`, starting at zero. Volume is
/// added on up-closes, subtracted on down-closes, and unchanged on flat
/// closes.
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::obv;
///
/// let closes = vec![10.0, 11.0, 10.5, 10.5];
/// let volumes = vec![100.0, 200.0, 150.0, 80.0];
/// let result = obv(&closes, &volumes);
///
/// assert_eq!(result, vec![Some(0.0), Some(200.0), Some(50.0), Some(50.0)]);
/// ```
pub fn obv(closes: &[f64], volumes: &[f64]) -> Vec<Option<f64>> {
    if closes.is_empty() || closes.len() != volumes.len() {
        return vec![None; closes.len()];
    }

    let mut result = Vec::with_capacity(closes.len());
    let mut running = 0.0;
    result.push(Some(running));

    for i in 1..closes.len() {
        if closes[i] > closes[i - 1] {
            running += volumes[i];
        } else if closes[i] < closes[i - 1] {
            running -= volumes[i];
        }
        result.push(Some(running));
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_obv_accumulates_up_moves() {
        let closes = vec![10.0, 11.0, 12.0, 13.0];
        let volumes = vec![100.0, 200.0, 300.0, 400.0];
        let result = obv(&closes, &volumes);

        assert_eq!(result, vec![Some(0.0), Some(200.0), Some(500.0), Some(900.0)]);
    }

    #[test]
    fn test_obv_flat_close_unchanged() {
        let closes = vec![10.0, 10.0, 10.0];
        let volumes = vec![100.0, 200.0, 300.0];
        let result = obv(&closes, &volumes);

        assert_eq!(result, vec![Some(0.0), Some(0.0), Some(0.0)]);
    }

    #[test]
    fn test_obv_mismatched_lengths() {
        assert_eq!(obv(&[1.0, 2.0], &[100.0]), vec![None, None]);
    }
}
