//! Technical analysis indicators over OHLCV series.
//!
//! All indicators return series aligned 1:1 with their input: position `i`
//! of the output describes candle `i` of the input, and warm-up positions
//! where the indicator is undefined hold `None`.
//!
//! # Available Indicators
//!
//! ## Moving Averages
//! - [`sma`] - Simple Moving Average
//! - [`ema`] - Exponential Moving Average
//! - [`wma`] - Weighted Moving Average
//! - [`vwap`] - Volume Weighted Average Price (anchored)
//!
//! ## Momentum Oscillators
//! - [`rsi`] - Relative Strength Index (Wilder smoothing)
//! - [`stochastic_k`] - Stochastic Oscillator %K
//! - [`williams_r`] - Williams %R
//! - [`cci`] - Commodity Channel Index
//! - [`mfi`] - Money Flow Index
//! - [`roc`] - Rate of Change
//!
//! ## Trend Systems
//! - [`macd`] - Moving Average Convergence Divergence
//! - [`adx`] - Average Directional Index
//! - [`supertrend`] - SuperTrend
//! - [`parabolic_sar`] - Parabolic SAR
//! - [`ichimoku`] - Ichimoku Cloud
//! - [`aroon`] - Aroon
//!
//! ## Volatility & Volume
//! - [`bollinger_bands`] - Bollinger Bands
//! - [`atr`] - Average True Range
//! - [`obv`] - On-Balance Volume
//! - [`rolling_max`] / [`rolling_min`] - windowed extremes

mod adx;
mod aroon;
mod atr;
mod bollinger;
mod cci;
mod ema;
mod extrema;
mod ichimoku;
mod macd;
mod mfi;
mod obv;
mod parabolic_sar;
mod roc;
mod rsi;
mod sma;
mod stochastic;
mod supertrend;
mod vwap;
mod williams_r;
mod wma;

pub use adx::{AdxResult, adx};
pub use aroon::{AroonResult, aroon};
pub use atr::atr;
pub use bollinger::{BollingerBands, bollinger_bands};
pub use cci::cci;
pub use ema::ema;
pub use extrema::{rolling_max, rolling_min};
pub use ichimoku::{IchimokuResult, ichimoku};
pub use macd::{MacdResult, macd};
pub use mfi::mfi;
pub use obv::obv;
pub use parabolic_sar::parabolic_sar;
pub use roc::roc;
pub use rsi::rsi;
pub use sma::sma;
pub use stochastic::stochastic_k;
pub use supertrend::{SuperTrendResult, supertrend};
pub use vwap::vwap;
pub use williams_r::williams_r;
pub use wma::wma;

/// Error type for indicator calculations
#[derive(Debug, thiserror::Error)]
pub enum IndicatorError {
    /// Not enough data points to calculate the indicator
    #[error("Insufficient data: need at least {need} data points, got {got}")]
    InsufficientData {
        /// Minimum number of data points required
        need: usize,
        /// Actual number of data points provided
        got: usize,
    },

    /// Invalid period parameter provided
    #[error("Invalid period: {0}")]
    InvalidPeriod(String),
}

/// Result type for indicator calculations
pub type Result<T> = std::result::Result<T, IndicatorError>;

/// Wilder smoothing: an EMA with `alpha = 1/period`, seeded with the simple
/// average of the first `period` values.
///
/// Used by RSI, ATR, ADX, and MFI. Output position `i` is `None` until the
/// seed window is complete at `period - 1`.
pub(crate) fn wilder_smooth(data: &[f64], period: usize) -> Vec<Option<f64>> {
    if period == 0 || data.len() < period {
        return vec![None; data.len()];
    }

    let mut result = vec![None; data.len()];
    let seed: f64 = data[..period].iter().sum::<f64>() / period as f64;
    result[period - 1] = Some(seed);

    let mut prev = seed;
    for i in period..data.len() {
        let smoothed = (prev * (period - 1) as f64 + data[i]) / period as f64;
        result[i] = Some(smoothed);
        prev = smoothed;
    }

    result
}

/// Helper function to extract the last non-None value from a series.
///
/// # Example
///
/// ```
/// use stock_scanner::indicators::last_value;
///
/// let values = vec![None, None, Some(10.0), Some(20.0)];
/// assert_eq!(last_value(&values), Some(20.0));
/// ```
pub fn last_value(values: &[Option<f64>]) -> Option<f64> {
    values.iter().rev().find_map(|&v| v)
}
