//! Prebuilt preset scans.
//!
//! Each preset is a named, described filter set exposed as a single tool
//! call. `custom_params` lets callers nudge the numeric knobs (thresholds,
//! periods, multipliers) without writing filters by hand.

use crate::error::{Result, ScannerError};
use crate::models::Filter;
use serde_json::{Map, Value, json};

/// A resolved preset: name, human description, and the filters it expands to
#[derive(Debug, Clone)]
pub struct PresetScan {
    /// Canonical preset name
    pub name: String,
    /// Human-readable description
    pub description: String,
    /// The filters this preset expands to
    pub filters: Vec<Filter>,
}

/// Names of all available presets
pub const PRESET_NAMES: &[&str] = &[
    "rsi_oversold",
    "rsi_overbought",
    "high_volume",
    "breakout_52week",
    "strong_momentum",
    "breakout_candidate",
    "bullish_crossover",
    "bearish_crossover",
];

fn param_f64(params: Option<&Map<String, Value>>, key: &str, default: f64) -> f64 {
    params
        .and_then(|p| p.get(key))
        .and_then(Value::as_f64)
        .unwrap_or(default)
}

fn param_u64(params: Option<&Map<String, Value>>, key: &str, default: u64) -> u64 {
    params
        .and_then(|p| p.get(key))
        .and_then(Value::as_u64)
        .unwrap_or(default)
}

fn filters(value: Value) -> Vec<Filter> {
    serde_json::from_value(value).expect("preset filters are well-formed")
}

/// Resolve a preset by name, applying any custom parameter overrides.
///
/// Unknown names fail with [`ScannerError::UnknownPreset`].
pub fn preset(name: &str, custom: Option<&Map<String, Value>>) -> Result<PresetScan> {
    let (description, filter_list) = match name {
        "rsi_oversold" => {
            let threshold = param_f64(custom, "threshold", 30.0);
            let period = param_u64(custom, "time_period", 14);
            (
                format!("Stocks with RSI({period}) below {threshold} (oversold)"),
                filters(json!([
                    {"type": "indicator", "field": "RSI", "time_period": period,
                     "operator": "lt", "value": threshold}
                ])),
            )
        }

        "rsi_overbought" => {
            let threshold = param_f64(custom, "threshold", 70.0);
            let period = param_u64(custom, "time_period", 14);
            (
                format!("Stocks with RSI({period}) above {threshold} (overbought)"),
                filters(json!([
                    {"type": "indicator", "field": "RSI", "time_period": period,
                     "operator": "gt", "value": threshold}
                ])),
            )
        }

        "high_volume" => {
            let multiplier = param_f64(custom, "multiplier", 2.0);
            let avg_period = param_u64(custom, "avg_period", 20);
            (
                format!("Stocks trading above {multiplier}x their {avg_period}-day average volume"),
                filters(json!([
                    {"type": "volume", "operator": "gt_avg",
                     "avg_period": avg_period, "multiplier": multiplier}
                ])),
            )
        }

        "breakout_52week" => {
            let distance = param_f64(custom, "distance_pct", 2.0);
            (
                format!("Stocks within {distance}% of their 52-week high"),
                filters(json!([
                    {"type": "price_52week", "field": "close",
                     "metric": "distance_from_high_pct",
                     "operator": "lte", "value": distance}
                ])),
            )
        }

        "strong_momentum" => {
            let rsi_floor = param_f64(custom, "rsi_threshold", 60.0);
            let change = param_f64(custom, "change_pct", 5.0);
            let lookback = param_u64(custom, "lookback", 20);
            (
                format!(
                    "Stocks with RSI above {rsi_floor} and at least {change}% gain over {lookback} days"
                ),
                filters(json!([
                    {"type": "indicator", "field": "RSI", "time_period": 14,
                     "operator": "gt", "value": rsi_floor},
                    {"type": "price_change", "field": "close", "lookback": lookback,
                     "operator": "gt", "value": change}
                ])),
            )
        }

        "breakout_candidate" => {
            let distance = param_f64(custom, "distance_pct", 5.0);
            let multiplier = param_f64(custom, "multiplier", 1.5);
            (
                format!(
                    "Stocks within {distance}% of their 52-week high on {multiplier}x average volume"
                ),
                filters(json!([
                    {"type": "price_52week", "field": "close",
                     "metric": "distance_from_high_pct",
                     "operator": "lte", "value": distance},
                    {"type": "volume", "operator": "gt_avg",
                     "avg_period": 20, "multiplier": multiplier}
                ])),
            )
        }

        "bullish_crossover" => {
            let period = param_u64(custom, "time_period", 50);
            (
                format!("Stocks whose close crossed above the {period}-day SMA"),
                filters(json!([
                    {"type": "price", "field": "close", "operator": "crossed_above",
                     "value": {"type": "indicator", "field": "SMA", "time_period": period}}
                ])),
            )
        }

        "bearish_crossover" => {
            let period = param_u64(custom, "time_period", 50);
            (
                format!("Stocks whose close crossed below the {period}-day SMA"),
                filters(json!([
                    {"type": "price", "field": "close", "operator": "crossed_below",
                     "value": {"type": "indicator", "field": "SMA", "time_period": period}}
                ])),
            )
        }

        other => {
            return Err(ScannerError::UnknownPreset {
                name: other.to_string(),
            });
        }
    };

    Ok(PresetScan {
        name: name.to_string(),
        description,
        filters: filter_list,
    })
}
