//! Bollinger Bands indicator.

use super::{IndicatorError, Result, sma::sma};
use serde::{Deserialize, Serialize};

/// Bollinger Bands result with derived %B and band width series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BollingerBands {
    /// Upper band (SMA + std_dev * multiplier)
    pub upper: Vec<Option<f64>>,

    /// Middle band (SMA)
    pub middle: Vec<Option<f64>>,

    /// Lower band (SMA - std_dev * multiplier)
    pub lower: Vec<Option<f64>>,

    /// %B: position of the close within the bands, `(close - lower) / (upper - lower)`
    pub percent_b: Vec<Option<f64>>,

    /// Band width relative to the middle band, `(upper - lower) / middle`
    pub width: Vec<Option<f64>>,
}

/// Calculate Bollinger Bands.
///
/// Bollinger Bands consist of a middle band (SMA) and upper/lower bands that
/// are standard deviations away from the middle band. %B and width are
/// derived from the three bands; both are `None` where the band spread or the
/// middle band is zero.
///
/// # Arguments
///
/// * `data` - Price data (typically close prices)
/// * `period` - Number of periods for the SMA (typically 20)
/// * `std_dev_multiplier` - Number of standard deviations (typically 2.0)
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::bollinger_bands;
///
/// let prices: Vec<f64> = (1..=30).map(|x| x as f64 + (x % 3) as f64).collect();
/// let result = bollinger_bands(&prices, 20, 2.0).unwrap();
///
/// assert_eq!(result.upper.len(), prices.len());
/// assert_eq!(result.percent_b.len(), prices.len());
/// ```
pub fn bollinger_bands(
    data: &[f64],
    period: usize,
    std_dev_multiplier: f64,
) -> Result<BollingerBands> {
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

    let middle = sma(data, period);

    let mut upper = Vec::with_capacity(data.len());
    let mut lower = Vec::with_capacity(data.len());
    let mut percent_b = Vec::with_capacity(data.len());
    let mut width = Vec::with_capacity(data.len());

    for i in 0..data.len() {
        if i + 1 < period {
            upper.push(None);
            lower.push(None);
            percent_b.push(None);
            width.push(None);
            continue;
        }

        let window = &data[i + 1 - period..=i];
        let mean = middle[i].unwrap(); // defined for i >= period - 1
        let variance: f64 =
            window.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        let std_dev = variance.sqrt();

        let up = mean + std_dev_multiplier * std_dev;
        let lo = mean - std_dev_multiplier * std_dev;

        let spread = up - lo;
        percent_b.push(if spread == 0.0 {
            None
        } else {
            Some((data[i] - lo) / spread)
        });
        width.push(if mean == 0.0 { None } else { Some(spread / mean) });

        upper.push(Some(up));
        lower.push(Some(lo));
    }

    Ok(BollingerBands {
        upper,
        middle,
        lower,
        percent_b,
        width,
    })
}
