//! Indicator resolver.
//!
//! Maps a `(field, time_period, params)` triple onto an indicator value at a
//! frame index. Field names may be compound: `RSI_9` overrides the period of
//! a single-parameter indicator, while selector names like `MACD_SIGNAL` or
//! `BBANDS_UPPER` pick one branch of a multi-output indicator.
//!
//! A column already attached to the frame under the requested name (a
//! precomputed series or an enrichment scalar) always wins over
//! recomputation.

use crate::indicators;
use crate::models::Frame;
use serde_json::{Map, Value};

/// Indicator names whose `NAME_N` suffix overrides the time period
const SINGLE_PARAM: &[&str] = &[
    "SMA",
    "EMA",
    "WMA",
    "RSI",
    "ATR",
    "ADX",
    "CCI",
    "ROC",
    "MFI",
    "STOCH",
    "AROON",
    "WILLR",
    "WILLIAMS_R",
    "SUPERTREND",
    "MAX",
    "MIN",
    "BBANDS",
];

/// Split a compound field name into its canonical indicator name and an
/// optional period override.
///
/// `rsi_9` → `("RSI", Some(9))`; `MACD_SIGNAL` → `("MACD_SIGNAL", None)`.
pub(crate) fn decode_field(field: &str, time_period: Option<usize>) -> (String, Option<usize>) {
    let canonical = field.trim().to_uppercase();

    if let Some((prefix, suffix)) = canonical.rsplit_once('_')
        && let Ok(period) = suffix.parse::<usize>()
        && SINGLE_PARAM.contains(&prefix)
    {
        return (prefix.to_string(), Some(period));
    }

    (canonical, time_period)
}

/// Whether a field name resolves through the indicator library (as opposed
/// to a frame column or a fundamental metric).
pub(crate) fn is_indicator_field(field: &str) -> bool {
    const KNOWN: &[&str] = &[
        "SMA",
        "EMA",
        "WMA",
        "VWAP",
        "RSI",
        "ATR",
        "ADX",
        "CCI",
        "ROC",
        "MFI",
        "OBV",
        "WILLR",
        "WILLIAMS_R",
        "STOCH",
        "STOCH_K",
        "SUPERTREND",
        "PSAR",
        "SAR",
        "PARABOLIC_SAR",
        "MAX",
        "MIN",
        "MACD",
        "MACD_SIGNAL",
        "MACD_HIST",
        "BBANDS",
        "BBANDS_MIDDLE",
        "BBANDS_UPPER",
        "BBANDS_LOWER",
        "BBANDS_PCT_B",
        "BB_WIDTH",
        "ICHIMOKU_TENKAN",
        "ICHIMOKU_KIJUN",
        "ICHIMOKU_SENKOU_A",
        "ICHIMOKU_SENKOU_B",
        "ICHIMOKU_CHIKOU",
        "AROON",
        "AROON_OSC",
        "AROON_UP",
        "AROON_DOWN",
    ];
    let (name, _) = decode_field(field, None);
    KNOWN.contains(&name.as_str())
}

fn param_usize(params: Option<&Map<String, Value>>, key: &str, default: usize) -> usize {
    params
        .and_then(|p| p.get(key))
        .and_then(Value::as_u64)
        .map(|v| v as usize)
        .unwrap_or(default)
}

fn param_f64(params: Option<&Map<String, Value>>, key: &str, default: f64) -> f64 {
    params
        .and_then(|p| p.get(key))
        .and_then(Value::as_f64)
        .unwrap_or(default)
}

/// Resolve an indicator field to its value at `idx` (negative, `-1` latest).
///
/// Returns `None` when the indicator is unknown, still warming up at `idx`,
/// or cannot be computed on the frame; comparisons against `None` fail the
/// enclosing filter rather than erroring.
pub fn resolve_value(
    frame: &Frame,
    field: &str,
    time_period: Option<usize>,
    idx: i64,
    params: Option<&Map<String, Value>>,
) -> Option<f64> {
    // Precomputed or enriched columns take precedence
    let exact = field.trim().to_uppercase();
    if !matches!(exact.as_str(), "OPEN" | "HIGH" | "LOW" | "CLOSE" | "VOLUME")
        && frame.has_field(&exact)
    {
        return frame.value(&exact, idx);
    }

    let (name, period) = decode_field(field, time_period);
    let series = compute_series(frame, &name, period, params)?;
    let pos = frame.resolve_idx(idx)?;
    series.get(pos).copied().flatten()
}

/// Compute the full series for a decoded indicator name.
pub(crate) fn compute_series(
    frame: &Frame,
    name: &str,
    period: Option<usize>,
    params: Option<&Map<String, Value>>,
) -> Option<Vec<Option<f64>>> {
    let closes = frame.closes();
    let highs = frame.highs();
    let lows = frame.lows();
    let volumes = frame.volumes();

    let series = match name {
        "SMA" => indicators::sma(&closes, period.unwrap_or(20)),
        "EMA" => indicators::ema(&closes, period.unwrap_or(12)),
        "WMA" => indicators::wma(&closes, period.unwrap_or(20)).ok()?,
        "VWAP" => indicators::vwap(&highs, &lows, &closes, &volumes).ok()?,
        "RSI" => indicators::rsi(&closes, period.unwrap_or(14)).ok()?,
        "ATR" => indicators::atr(&highs, &lows, &closes, period.unwrap_or(14)).ok()?,
        "ADX" => indicators::adx(&highs, &lows, &closes, period.unwrap_or(14)).ok()?.adx,
        "CCI" => indicators::cci(&highs, &lows, &closes, period.unwrap_or(20)).ok()?,
        "ROC" => indicators::roc(&closes, period.unwrap_or(12)).ok()?,
        "MFI" => {
            indicators::mfi(&highs, &lows, &closes, &volumes, period.unwrap_or(14)).ok()?
        }
        "OBV" => indicators::obv(&closes, &volumes),
        "WILLR" | "WILLIAMS_R" => {
            indicators::williams_r(&highs, &lows, &closes, period.unwrap_or(14)).ok()?
        }
        "STOCH" | "STOCH_K" => {
            let smooth = param_usize(params, "smooth", 3);
            indicators::stochastic_k(&highs, &lows, &closes, period.unwrap_or(14), smooth).ok()?
        }
        "SUPERTREND" => {
            let multiplier = param_f64(params, "multiplier", 3.0);
            indicators::supertrend(&highs, &lows, &closes, period.unwrap_or(10), multiplier)
                .ok()?
                .value
        }
        "PSAR" | "SAR" | "PARABOLIC_SAR" => {
            let step = param_f64(params, "step", 0.02);
            let max_step = param_f64(params, "max", 0.2);
            indicators::parabolic_sar(&highs, &lows, &closes, step, max_step).ok()?
        }
        "MAX" => indicators::rolling_max(&highs, period.unwrap_or(20)),
        "MIN" => indicators::rolling_min(&lows, period.unwrap_or(20)),

        "MACD" | "MACD_SIGNAL" | "MACD_HIST" => {
            let fast = param_usize(params, "fast_period", 12);
            let slow = param_usize(params, "slow_period", 26);
            let signal = param_usize(params, "signal_period", 9);
            let result = indicators::macd(&closes, fast, slow, signal).ok()?;
            match name {
                "MACD" => result.macd_line,
                "MACD_SIGNAL" => result.signal_line,
                _ => result.histogram,
            }
        }

        "BBANDS" | "BBANDS_MIDDLE" | "BBANDS_UPPER" | "BBANDS_LOWER" | "BBANDS_PCT_B"
        | "BB_WIDTH" => {
            let std_dev = param_f64(params, "std_dev", 2.0);
            let result =
                indicators::bollinger_bands(&closes, period.unwrap_or(20), std_dev).ok()?;
            match name {
                "BBANDS_UPPER" => result.upper,
                "BBANDS_LOWER" => result.lower,
                "BBANDS_PCT_B" => result.percent_b,
                "BB_WIDTH" => result.width,
                _ => result.middle,
            }
        }

        "ICHIMOKU_TENKAN" | "ICHIMOKU_KIJUN" | "ICHIMOKU_SENKOU_A" | "ICHIMOKU_SENKOU_B"
        | "ICHIMOKU_CHIKOU" => {
            let conversion = param_usize(params, "conversion", 9);
            let base = param_usize(params, "base", 26);
            let span_b = param_usize(params, "span_b", 52);
            let result =
                indicators::ichimoku(&highs, &lows, &closes, conversion, base, span_b).ok()?;
            match name {
                "ICHIMOKU_TENKAN" => result.tenkan,
                "ICHIMOKU_KIJUN" => result.kijun,
                "ICHIMOKU_SENKOU_A" => result.senkou_a,
                "ICHIMOKU_SENKOU_B" => result.senkou_b,
                _ => result.chikou,
            }
        }

        "AROON" | "AROON_OSC" | "AROON_UP" | "AROON_DOWN" => {
            let result = indicators::aroon(&highs, &lows, period.unwrap_or(25)).ok()?;
            match name {
                "AROON_UP" => result.up,
                "AROON_DOWN" => result.down,
                _ => result.oscillator,
            }
        }

        _ => return None,
    };

    Some(series)
}
