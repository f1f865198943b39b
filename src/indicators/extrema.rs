//! Rolling window extremes.

/// Rolling maximum over a window of `period` values.
///
/// Typically applied to highs. The first `period - 1` positions are `None`.
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::rolling_max;
///
/// let highs = vec![3.0, 1.0, 4.0, 1.0, 5.0];
/// let result = rolling_max(&highs, 3);
/// assert_eq!(result[2], Some(4.0));
/// assert_eq!(result[4], Some(5.0));
/// ```
pub fn rolling_max(data: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_extreme(data, period, |window| {
        window.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
    })
}

/// Rolling minimum over a window of `period` values.
///
/// Typically applied to lows. The first `period - 1` positions are `None`.
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::rolling_min;
///
/// let lows = vec![3.0, 1.0, 4.0, 1.0, 5.0];
/// let result = rolling_min(&lows, 3);
/// assert_eq!(result[2], Some(1.0));
/// assert_eq!(result[4], Some(1.0));
/// ```
pub fn rolling_min(data: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_extreme(data, period, |window| {
        window.iter().fold(f64::INFINITY, |a, &b| a.min(b))
    })
}

fn rolling_extreme(data: &[f64], period: usize, pick: impl Fn(&[f64]) -> f64) -> Vec<Option<f64>> {
    if period == 0 || data.is_empty() {
        return vec![None; data.len()];
    }

    let mut result = Vec::with_capacity(data.len());
    for i in 0..data.len() {
        if i + 1 < period {
            result.push(None);
        } else {
            result.push(Some(pick(&data[i + 1 - period..=i])));
        }
    }
    result
}
