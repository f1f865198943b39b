//! Ichimoku Cloud indicator.

use super::{IndicatorError, Result};
use serde::{Deserialize, Serialize};

/// Result of Ichimoku Cloud calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IchimokuResult {
    /// Conversion Line (Tenkan-sen)
    pub tenkan: Vec<Option<f64>>,
    /// Base Line (Kijun-sen)
    pub kijun: Vec<Option<f64>>,
    /// Leading Span A (Senkou Span A), shifted forward by the base period
    pub senkou_a: Vec<Option<f64>>,
    /// Leading Span B (Senkou Span B), shifted forward by the base period
    pub senkou_b: Vec<Option<f64>>,
    /// Lagging Span (Chikou Span), shifted backward by the base period
    pub chikou: Vec<Option<f64>>,
}

/// Calculate Ichimoku Cloud.
///
/// Tenkan and kijun are midpoints of the highest-high/lowest-low windows over
/// the conversion and base periods. Senkou A averages them and is displaced
/// forward by the base period; senkou B is the span-B window midpoint, also
/// displaced forward; chikou is the close displaced backward.
///
/// # Arguments
///
/// * `highs` - High prices
/// * `lows` - Low prices
/// * `closes` - Close prices
/// * `conversion` - Tenkan-sen period (typically 9)
/// * `base` - Kijun-sen period and displacement (typically 26)
/// * `span_b` - Senkou Span B period (typically 52)
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::ichimoku;
///
/// let highs = vec![10.0; 100];
/// let lows = vec![8.0; 100];
/// let closes = vec![9.0; 100];
/// let result = ichimoku(&highs, &lows, &closes, 9, 26, 52).unwrap();
/// assert_eq!(result.tenkan.len(), 100);
/// ```
pub fn ichimoku(
    highs: &[f64],
    lows: &[f64],
    closes: &[f64],
    conversion: usize,
    base: usize,
    span_b: usize,
) -> Result<IchimokuResult> {
    if conversion == 0 || base == 0 || span_b == 0 {
        return Err(IndicatorError::InvalidPeriod(
            "All periods must be greater than 0".to_string(),
        ));
    }

    let len = highs.len();
    if lows.len() != len || closes.len() != len {
        return Err(IndicatorError::InvalidPeriod(
            "Data lengths must match".to_string(),
        ));
    }
    if len < span_b {
        return Err(IndicatorError::InsufficientData {
            need: span_b,
            got: len,
        });
    }

    let mut tenkan = vec![None; len];
    let mut kijun = vec![None; len];
    let mut senkou_a = vec![None; len];
    let mut senkou_b = vec![None; len];
    let mut chikou = vec![None; len];

    let midpoint = |h: &[f64], l: &[f64]| -> f64 {
        let highest = h.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));
        let lowest = l.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        (highest + lowest) / 2.0
    };

    for i in 0..len {
        if i + 1 >= conversion {
            let start = i + 1 - conversion;
            tenkan[i] = Some(midpoint(&highs[start..=i], &lows[start..=i]));
        }

        if i + 1 >= base {
            let start = i + 1 - base;
            kijun[i] = Some(midpoint(&highs[start..=i], &lows[start..=i]));
        }

        if let (Some(conv), Some(b)) = (tenkan[i], kijun[i])
            && i + base < len
        {
            senkou_a[i + base] = Some((conv + b) / 2.0);
        }

        if i + 1 >= span_b {
            let start = i + 1 - span_b;
            let val = midpoint(&highs[start..=i], &lows[start..=i]);
            if i + base < len {
                senkou_b[i + base] = Some(val);
            }
        }

        if i >= base {
            chikou[i - base] = Some(closes[i]);
        }
    }

    Ok(IchimokuResult {
        tenkan,
        kijun,
        senkou_a,
        senkou_b,
        chikou,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ichimoku_warmup_and_shifts() {
        let highs = vec![10.0; 100];
        let lows = vec![8.0; 100];
        let closes = vec![9.0; 100];
        let result = ichimoku(&highs, &lows, &closes, 9, 26, 52).unwrap();

        assert_eq!(result.tenkan.len(), 100);
        assert!(result.tenkan[7].is_none());
        assert!(result.tenkan[8].is_some());
        assert!(result.kijun[24].is_none());
        assert!(result.kijun[25].is_some());
        // Senkou A first defined at kijun warm-up + displacement
        assert!(result.senkou_a[50].is_none());
        assert!(result.senkou_a[51].is_some());
        // Senkou B at span-B warm-up + displacement
        assert!(result.senkou_b[76].is_none());
        assert!(result.senkou_b[77].is_some());
        // Chikou is close shifted backward
        assert_eq!(result.chikou[0], Some(9.0));
        assert!(result.chikou[99].is_none());
    }

    #[test]
    fn test_ichimoku_flat_series_midpoints() {
        let highs = vec![10.0; 60];
        let lows = vec![8.0; 60];
        let closes = vec![9.0; 60];
        let result = ichimoku(&highs, &lows, &closes, 9, 26, 52).unwrap();

        assert_eq!(result.tenkan[10], Some(9.0));
        assert_eq!(result.kijun[30], Some(9.0));
    }

    #[test]
    fn test_ichimoku_insufficient_data() {
        let data = vec![1.0; 30];
        assert!(ichimoku(&data, &data, &data, 9, 26, 52).is_err());
    }
}
