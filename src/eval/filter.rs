//! Filter evaluator.
//!
//! Dispatches a typed [`Filter`] against a symbol's frames, resolves both
//! sides of the comparison, and produces `(passed, details)`. Evaluation
//! problems (missing fields, absent indicator values, malformed
//! expressions) fail the filter with a diagnostic record; they never raise
//! into the scan loop.

use crate::constants::{Interval, OutputSize};
use crate::error::ScannerError;
use crate::eval::expr::eval_expr;
use crate::indicators::sma;
use crate::models::{
    ArithmeticOp, Filter, FilterValue, Frame, FunctionKind, Measure, MeasureKind, Metric52Week,
    OffsetSpec, Operator, PatternKind,
};
use crate::provider::CandleProvider;
use crate::resolve::resolve_value;
use once_cell::sync::Lazy;
use serde_json::{Map, Value, json};
use std::collections::HashMap;

/// Absolute tolerance for `eq`/`neq`, absorbing float noise in indicator outputs
const EQ_TOLERANCE: f64 = 1e-2;

/// Default rolling window for `volume gt_avg`
const DEFAULT_AVG_PERIOD: usize = 20;

/// Default multiplier for `volume gt_avg`
const DEFAULT_AVG_MULTIPLIER: f64 = 1.5;

/// Default trading-day window for 52-week filters
const DEFAULT_LOOKBACK_DAYS: usize = 252;

/// Default window for `function` filters
const DEFAULT_FUNCTION_PERIOD: usize = 20;

/// Well-known fundamental field aliases, in lookup order after the literal name
pub static FINANCIAL_ALIASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("pe_ratio", "peBasicExclExtraTTM"),
        ("pb_ratio", "pbQuarterly"),
        ("eps", "epsExclExtraTTM"),
        ("roe", "roeTTM"),
        ("debt_to_equity", "totalDebtToEquityQuarterly"),
        ("net_sales", "revenueTTM"),
        ("net_profit", "netIncomeTTM"),
        ("dividend_yield", "dividendYieldIndicatedAnnual"),
        ("operating_cash_flow", "operatingCashFlowTTM"),
        ("book_value", "bookValuePerShareAnnual"),
        ("market_cap", "marketCapitalization"),
    ])
});

/// Everything a filter evaluation can reach for one symbol
pub struct FilterContext<'a> {
    /// Ticker symbol under evaluation
    pub symbol: &'a str,
    /// Frames keyed by timeframe; `daily` is always present
    pub frames: &'a HashMap<Interval, Frame>,
    /// Fundamentals record, fetched once per symbol when needed
    pub fundamentals: Option<&'a Map<String, Value>>,
    /// Candle source for 52-week full-history refetches
    pub provider: &'a dyn CandleProvider,
}

impl<'a> FilterContext<'a> {
    fn frame(&self, timeframe: Option<&String>) -> Result<(&'a Frame, Interval), ScannerError> {
        let tf = match timeframe {
            Some(s) => s.parse::<Interval>()?,
            None => Interval::Daily,
        };
        let frame = self
            .frames
            .get(&tf)
            .ok_or_else(|| ScannerError::MissingTimeframe {
                timeframe: tf.as_str().to_string(),
            })?;
        Ok((frame, tf))
    }
}

fn fail(filter_type: &str, error: impl std::fmt::Display) -> (bool, Value) {
    (false, json!({ "type": filter_type, "passed": false, "error": error.to_string() }))
}

fn compare_numbers(op: Operator, current: f64, target: f64) -> Result<bool, String> {
    if current.is_nan() || target.is_nan() {
        return Ok(false);
    }
    match op {
        Operator::Gt => Ok(current > target),
        Operator::Gte => Ok(current >= target),
        Operator::Lt => Ok(current < target),
        Operator::Lte => Ok(current <= target),
        Operator::Eq => Ok((current - target).abs() <= EQ_TOLERANCE),
        Operator::Neq => Ok((current - target).abs() > EQ_TOLERANCE),
        other => Err(format!(
            "operator '{}' is not a scalar comparison",
            other.as_str()
        )),
    }
}

fn compare_strings(op: Operator, current: &str, target: &str) -> Result<bool, String> {
    let (cur, tgt) = (current.to_lowercase(), target.to_lowercase());
    match op {
        Operator::Eq => Ok(cur == tgt),
        Operator::Neq => Ok(cur != tgt),
        Operator::Contains => Ok(cur.contains(&tgt)),
        other => Err(format!(
            "operator '{}' is not valid for string fields",
            other.as_str()
        )),
    }
}

/// Crossover comparison with the static-data guard: when neither side moved
/// between the two candles, fall back to a strict `gt`/`lt` and annotate.
fn crossover_with_guard(
    op: Operator,
    cur_l: f64,
    prev_l: f64,
    cur_r: f64,
    prev_r: f64,
) -> (bool, Option<&'static str>) {
    if [cur_l, prev_l, cur_r, prev_r].iter().any(|v| v.is_nan()) {
        return (false, None);
    }

    if cur_l == prev_l && cur_r == prev_r {
        let passed = match op {
            Operator::CrossedAbove => cur_l > cur_r,
            _ => cur_l < cur_r,
        };
        return (passed, Some("Static data detected"));
    }

    let passed = match op {
        Operator::CrossedAbove => prev_l <= prev_r && cur_l > cur_r,
        _ => prev_l >= prev_r && cur_l < cur_r,
    };
    (passed, None)
}

/// Resolve a nested measure on its own frame, offset, and timeframe
fn resolve_measure(
    ctx: &FilterContext<'_>,
    measure: &Measure,
    default_tf: Interval,
    default_idx: i64,
) -> Result<Option<f64>, ScannerError> {
    let tf = match &measure.timeframe {
        Some(s) => s.parse::<Interval>()?,
        None => default_tf,
    };
    let frame = ctx
        .frames
        .get(&tf)
        .ok_or_else(|| ScannerError::MissingTimeframe {
            timeframe: tf.as_str().to_string(),
        })?;

    let idx = match &measure.offset {
        Some(offset) => offset.index()?,
        None => default_idx,
    };

    Ok(match measure.kind {
        MeasureKind::Attribute => frame
            .value(&measure.field, idx)
            .or_else(|| resolve_value(frame, &measure.field, None, idx, None)),
        MeasureKind::Indicator => resolve_value(
            frame,
            &measure.field,
            measure.time_period,
            idx,
            measure.params.as_ref(),
        ),
    })
}

/// Evaluate one filter for one symbol.
///
/// Returns the pass/fail verdict and a diagnostics record suitable for UI
/// display and test assertions.
pub async fn evaluate_filter(ctx: &FilterContext<'_>, filter: &Filter) -> (bool, Value) {
    let filter_type = filter.type_name();

    match filter {
        Filter::Price {
            field,
            operator,
            value,
            offset,
            arithmetic_operator,
            arithmetic_value,
            timeframe,
            compare_to_timeframe,
        } => evaluate_comparison(
            ctx,
            filter_type,
            LhsSpec::Column(field),
            None,
            *operator,
            value,
            offset.as_ref(),
            arithmetic_operator.as_ref().zip(*arithmetic_value),
            timeframe.as_ref(),
            compare_to_timeframe.as_ref(),
            None,
        ),

        Filter::Indicator {
            field,
            time_period,
            operator,
            value,
            offset,
            timeframe,
            compare_to_timeframe,
            params,
        } => evaluate_comparison(
            ctx,
            filter_type,
            LhsSpec::Indicator(field),
            *time_period,
            *operator,
            value,
            offset.as_ref(),
            None,
            timeframe.as_ref(),
            compare_to_timeframe.as_ref(),
            params.as_ref(),
        ),

        Filter::Volume {
            operator,
            value,
            avg_period,
            multiplier,
        } => evaluate_volume(ctx, *operator, *value, *avg_period, *multiplier),

        Filter::PriceChange {
            field,
            lookback,
            operator,
            value,
        } => evaluate_change(
            ctx,
            filter_type,
            field.as_deref().unwrap_or("close"),
            *lookback,
            *operator,
            *value,
        ),

        Filter::VolumeChange {
            lookback,
            operator,
            value,
        } => evaluate_change(ctx, filter_type, "volume", *lookback, *operator, *value),

        Filter::Price52Week {
            field,
            lookback_days,
            metric,
            operator,
            value,
        } => {
            evaluate_52week(
                ctx,
                field.as_deref().unwrap_or("close"),
                lookback_days.unwrap_or(DEFAULT_LOOKBACK_DAYS),
                *metric,
                *operator,
                *value,
            )
            .await
        }

        Filter::Gap {
            operator,
            value,
            offset,
        } => evaluate_gap(ctx, *operator, *value, offset.as_ref()),

        Filter::Pattern { pattern } => evaluate_pattern(ctx, *pattern),

        Filter::Financial {
            field,
            operator,
            value,
        } => evaluate_financial(ctx, field, *operator, value),

        Filter::Function {
            field,
            operator,
            value,
            period,
        } => evaluate_function(
            ctx,
            *field,
            *operator,
            *value,
            period.unwrap_or(DEFAULT_FUNCTION_PERIOD),
        ),

        Filter::Expression { expression } => {
            match eval_expr(expression, ctx.frames, Interval::Daily, -1) {
                Ok(result) => {
                    let passed = result != 0.0 && !result.is_nan();
                    (
                        passed,
                        json!({ "type": filter_type, "passed": passed, "result": result }),
                    )
                }
                Err(e) => fail(filter_type, e),
            }
        }
    }
}

#[derive(Clone, Copy)]
enum LhsSpec<'a> {
    /// Frame column first, resolver fallback
    Column(&'a str),
    /// Resolver only
    Indicator(&'a str),
}

#[allow(clippy::too_many_arguments)]
fn evaluate_comparison(
    ctx: &FilterContext<'_>,
    filter_type: &str,
    lhs: LhsSpec<'_>,
    time_period: Option<usize>,
    operator: Operator,
    value: &FilterValue,
    offset: Option<&OffsetSpec>,
    arithmetic: Option<(&ArithmeticOp, f64)>,
    timeframe: Option<&String>,
    compare_to_timeframe: Option<&String>,
    params: Option<&Map<String, Value>>,
) -> (bool, Value) {
    let idx = match offset.cloned().unwrap_or_default().index() {
        Ok(idx) => idx,
        Err(e) => return fail(filter_type, e),
    };

    let (frame, lhs_tf) = match ctx.frame(timeframe) {
        Ok(pair) => pair,
        Err(e) => return fail(filter_type, e),
    };

    let (field_name, lhs_value) = match lhs {
        LhsSpec::Column(field) => (
            field,
            frame
                .value(field, idx)
                .or_else(|| resolve_value(frame, field, time_period, idx, params)),
        ),
        LhsSpec::Indicator(field) => (
            field,
            resolve_value(frame, field, time_period, idx, params),
        ),
    };

    let Some(current) = lhs_value else {
        return fail(
            filter_type,
            ScannerError::MissingField {
                field: field_name.to_string(),
            },
        );
    };

    // The measure's default timeframe is compareToTimeframe when given,
    // otherwise the left-hand side's.
    let rhs_default_tf = match compare_to_timeframe {
        Some(s) => match s.parse::<Interval>() {
            Ok(tf) => tf,
            Err(e) => return fail(filter_type, e),
        },
        None => lhs_tf,
    };

    let adjust = |raw: f64| match arithmetic {
        Some((op, operand)) => op.apply(raw, operand),
        None => raw,
    };

    // `between` short-circuits: the range is inclusive and never a measure
    if operator == Operator::Between {
        let Some((low, high)) = value.as_range() else {
            return fail(filter_type, "between requires a [low, high] value");
        };
        let passed = current >= low && current <= high;
        return (
            passed,
            json!({
                "type": filter_type,
                "field": field_name,
                "operator": operator.as_str(),
                "current_value": current,
                "range": [low, high],
                "passed": passed,
            }),
        );
    }

    let target = match value {
        FilterValue::Number(n) => Some(adjust(*n)),
        FilterValue::Measure(m) => match resolve_measure(ctx, m, rhs_default_tf, idx) {
            Ok(v) => v.map(adjust),
            Err(e) => return fail(filter_type, e),
        },
        FilterValue::Text(_) | FilterValue::Range(_) => {
            return fail(filter_type, "unsupported value shape for this filter");
        }
    };

    let Some(target) = target else {
        return fail(filter_type, "comparison value unavailable");
    };

    if operator.is_crossover() {
        let prev_current = match lhs {
            LhsSpec::Column(field) => frame
                .value(field, idx - 1)
                .or_else(|| resolve_value(frame, field, time_period, idx - 1, params)),
            LhsSpec::Indicator(field) => {
                resolve_value(frame, field, time_period, idx - 1, params)
            }
        };
        let prev_target = match value {
            FilterValue::Number(n) => Some(adjust(*n)),
            FilterValue::Measure(m) => {
                let prev_idx = match &m.offset {
                    Some(offset) => match offset.index() {
                        Ok(i) => i - 1,
                        Err(e) => return fail(filter_type, e),
                    },
                    None => idx - 1,
                };
                let shifted = Measure {
                    offset: Some(OffsetSpec::Periods(-(prev_idx + 1))),
                    ..m.clone()
                };
                match resolve_measure(ctx, &shifted, rhs_default_tf, prev_idx) {
                    Ok(v) => v.map(adjust),
                    Err(e) => return fail(filter_type, e),
                }
            }
            _ => None,
        };

        let (Some(prev_current), Some(prev_target)) = (prev_current, prev_target) else {
            return fail(filter_type, "insufficient history for crossover");
        };

        let (passed, note) =
            crossover_with_guard(operator, current, prev_current, target, prev_target);

        let mut details = json!({
            "type": filter_type,
            "field": field_name,
            "operator": operator.as_str(),
            "current_value": current,
            "previous_value": prev_current,
            "compare_value": target,
            "previous_compare_value": prev_target,
            "passed": passed,
        });
        if let Some(note) = note {
            details["note"] = json!(note);
        }
        return (passed, details);
    }

    match compare_numbers(operator, current, target) {
        Ok(passed) => (
            passed,
            json!({
                "type": filter_type,
                "field": field_name,
                "operator": operator.as_str(),
                "current_value": current,
                "compare_value": target,
                "passed": passed,
            }),
        ),
        Err(e) => fail(filter_type, e),
    }
}

fn evaluate_volume(
    ctx: &FilterContext<'_>,
    operator: Operator,
    value: Option<f64>,
    avg_period: Option<usize>,
    multiplier: Option<f64>,
) -> (bool, Value) {
    let (frame, _) = match ctx.frame(None) {
        Ok(pair) => pair,
        Err(e) => return fail("volume", e),
    };

    let Some(current) = frame.value("volume", -1) else {
        return fail("volume", "no volume data");
    };

    // The rolling-average form: either the dedicated operator or the
    // presence of an averaging window engages it.
    if operator == Operator::GtAvg || avg_period.is_some() {
        let period = avg_period.unwrap_or(DEFAULT_AVG_PERIOD);
        let mult = multiplier.unwrap_or(DEFAULT_AVG_MULTIPLIER);

        let volumes = frame.volumes();
        let Some(avg) = sma(&volumes, period).last().copied().flatten() else {
            return fail("volume", "insufficient history for volume average");
        };

        let threshold = avg * mult;
        let passed = current > threshold;
        return (
            passed,
            json!({
                "type": "volume",
                "operator": "gt_avg",
                "current_value": current,
                "avg_volume": avg,
                "multiplier": mult,
                "threshold": threshold,
                "passed": passed,
            }),
        );
    }

    let Some(target) = value else {
        return fail("volume", "volume filter requires a value or avg_period");
    };

    match compare_numbers(operator, current, target) {
        Ok(passed) => (
            passed,
            json!({
                "type": "volume",
                "operator": operator.as_str(),
                "current_value": current,
                "compare_value": target,
                "passed": passed,
            }),
        ),
        Err(e) => fail("volume", e),
    }
}

fn evaluate_change(
    ctx: &FilterContext<'_>,
    filter_type: &str,
    field: &str,
    lookback: i64,
    operator: Operator,
    value: f64,
) -> (bool, Value) {
    let (frame, _) = match ctx.frame(None) {
        Ok(pair) => pair,
        Err(e) => return fail(filter_type, e),
    };

    if lookback <= 0 {
        return fail(filter_type, "lookback must be positive");
    }

    let Some(change) = frame.pct_change(field, -1, lookback) else {
        return fail(filter_type, "insufficient history for change lookback");
    };

    match compare_numbers(operator, change, value) {
        Ok(passed) => (
            passed,
            json!({
                "type": filter_type,
                "field": field,
                "operator": operator.as_str(),
                "lookback": lookback,
                "current_value": change,
                "compare_value": value,
                "passed": passed,
            }),
        ),
        Err(e) => fail(filter_type, e),
    }
}

async fn evaluate_52week(
    ctx: &FilterContext<'_>,
    field: &str,
    lookback_days: usize,
    metric: Metric52Week,
    operator: Operator,
    value: f64,
) -> (bool, Value) {
    let full = match ctx
        .provider
        .candles(ctx.symbol, Interval::Daily, OutputSize::Full)
        .await
    {
        Ok(frame) => frame,
        Err(e) => return fail("price_52week", e),
    };

    if full.is_empty() {
        return fail("price_52week", "no historical data");
    }

    let start = full.len().saturating_sub(lookback_days);
    let window = &full.candles()[start..];

    let high_52w = window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    let low_52w = window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);

    let Some(current) = full.value(field, -1) else {
        return fail(
            "price_52week",
            ScannerError::MissingField {
                field: field.to_string(),
            },
        );
    };

    // Zero references collapse to 0.0 instead of dividing by zero
    let distance = match metric {
        Metric52Week::DistanceFromHighPct => {
            if high_52w == 0.0 {
                0.0
            } else {
                (high_52w - current) / high_52w * 100.0
            }
        }
        Metric52Week::DistanceFromLowPct => {
            if low_52w == 0.0 {
                0.0
            } else {
                (current - low_52w) / low_52w * 100.0
            }
        }
    };

    match compare_numbers(operator, distance, value) {
        Ok(passed) => (
            passed,
            json!({
                "type": "price_52week",
                "field": field,
                "metric": metric,
                "operator": operator.as_str(),
                "current_value": distance,
                "compare_value": value,
                "high_52w": high_52w,
                "low_52w": low_52w,
                "close": current,
                "lookback_days": lookback_days,
                "passed": passed,
            }),
        ),
        Err(e) => fail("price_52week", e),
    }
}

fn evaluate_gap(
    ctx: &FilterContext<'_>,
    operator: Operator,
    value: f64,
    offset: Option<&OffsetSpec>,
) -> (bool, Value) {
    let (frame, _) = match ctx.frame(None) {
        Ok(pair) => pair,
        Err(e) => return fail("gap", e),
    };

    let idx = match offset.cloned().unwrap_or_default().index() {
        Ok(idx) => idx,
        Err(e) => return fail("gap", e),
    };

    let (Some(open), Some(prev_close)) = (frame.value("open", idx), frame.value("close", idx - 1))
    else {
        return fail("gap", "insufficient history for gap");
    };

    let gap_pct = if prev_close == 0.0 {
        0.0
    } else {
        (open - prev_close) / prev_close * 100.0
    };

    match compare_numbers(operator, gap_pct, value) {
        Ok(passed) => (
            passed,
            json!({
                "type": "gap",
                "operator": operator.as_str(),
                "current_value": gap_pct,
                "current_open": open,
                "previous_close": prev_close,
                "compare_value": value,
                "passed": passed,
            }),
        ),
        Err(e) => fail("gap", e),
    }
}

fn evaluate_pattern(ctx: &FilterContext<'_>, pattern: PatternKind) -> (bool, Value) {
    let (frame, _) = match ctx.frame(None) {
        Ok(pair) => pair,
        Err(e) => return fail("pattern", e),
    };

    let Some(candle) = frame.latest() else {
        return fail("pattern", "no candles");
    };

    let range = candle.range();
    if range <= 0.0 {
        return (
            false,
            json!({
                "type": "pattern",
                "pattern": pattern.as_str(),
                "passed": false,
                "note": "zero range candle",
            }),
        );
    }

    let body_ratio = candle.body() / range;
    let upper_ratio = candle.upper_wick() / range;
    let lower_ratio = candle.lower_wick() / range;

    let passed = match pattern {
        PatternKind::Hammer => body_ratio <= 0.4 && lower_ratio >= 0.6 && upper_ratio <= 0.2,
        PatternKind::ShootingStar => {
            body_ratio <= 0.4 && upper_ratio >= 0.6 && lower_ratio <= 0.2
        }
        PatternKind::LongBody => body_ratio >= 0.6,
        PatternKind::SmallBody => body_ratio <= 0.2,
    };

    (
        passed,
        json!({
            "type": "pattern",
            "pattern": pattern.as_str(),
            "body_ratio": body_ratio,
            "upper_ratio": upper_ratio,
            "lower_ratio": lower_ratio,
            "passed": passed,
        }),
    )
}

fn evaluate_financial(
    ctx: &FilterContext<'_>,
    field: &str,
    operator: Operator,
    value: &FilterValue,
) -> (bool, Value) {
    let Some(fundamentals) = ctx.fundamentals else {
        return fail("financial", "fundamentals unavailable");
    };

    let Some((resolved_field, raw)) = lookup_fundamental(fundamentals, field) else {
        return fail(
            "financial",
            ScannerError::MissingField {
                field: field.to_string(),
            },
        );
    };

    // Fundamentals may be numeric or string-valued
    if let Some(current) = raw.as_f64() {
        let target = match value {
            FilterValue::Number(n) => *n,
            _ => return fail("financial", "financial comparison requires a numeric value"),
        };
        return match compare_numbers(operator, current, target) {
            Ok(passed) => (
                passed,
                json!({
                    "type": "financial",
                    "field": field,
                    "resolved_field": resolved_field,
                    "operator": operator.as_str(),
                    "current_value": current,
                    "compare_value": target,
                    "passed": passed,
                }),
            ),
            Err(e) => fail("financial", e),
        };
    }

    if let Some(current) = raw.as_str() {
        let target = match value {
            FilterValue::Text(s) => s.as_str(),
            _ => return fail("financial", "string field requires a string value"),
        };
        return match compare_strings(operator, current, target) {
            Ok(passed) => (
                passed,
                json!({
                    "type": "financial",
                    "field": field,
                    "resolved_field": resolved_field,
                    "operator": operator.as_str(),
                    "current_value": current,
                    "compare_value": target,
                    "passed": passed,
                }),
            ),
            Err(e) => fail("financial", e),
        };
    }

    fail("financial", format!("field '{field}' has no comparable value"))
}

/// Find a fundamental: literal name, then the alias map, then a case- and
/// underscore-insensitive scan.
pub(crate) fn lookup_fundamental<'a>(
    fundamentals: &'a Map<String, Value>,
    field: &str,
) -> Option<(String, &'a Value)> {
    if let Some(v) = fundamentals.get(field) {
        return Some((field.to_string(), v));
    }

    if let Some(alias) = FINANCIAL_ALIASES.get(field.to_lowercase().as_str())
        && let Some(v) = fundamentals.get(*alias)
    {
        return Some((alias.to_string(), v));
    }

    let normalize = |s: &str| s.to_lowercase().replace('_', "");
    let wanted = normalize(field);
    fundamentals
        .iter()
        .find(|(k, _)| normalize(k) == wanted)
        .map(|(k, v)| (k.clone(), v))
}

fn evaluate_function(
    ctx: &FilterContext<'_>,
    function: FunctionKind,
    operator: Operator,
    value: f64,
    period: usize,
) -> (bool, Value) {
    let (frame, _) = match ctx.frame(None) {
        Ok(pair) => pair,
        Err(e) => return fail("function", e),
    };

    if frame.is_empty() || period == 0 {
        return fail("function", "no candles in function window");
    }

    let start = frame.len().saturating_sub(period);
    let window = &frame.candles()[start..];

    let current = match function {
        FunctionKind::Max => window.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max),
        FunctionKind::Min => window.iter().map(|c| c.low).fold(f64::INFINITY, f64::min),
        FunctionKind::Abs => match frame.pct_change("close", -1, 1) {
            Some(change) => change.abs(),
            None => return fail("function", "insufficient history for abs change"),
        },
        FunctionKind::Count => window.iter().filter(|c| c.is_green()).count() as f64,
    };

    match compare_numbers(operator, current, value) {
        Ok(passed) => (
            passed,
            json!({
                "type": "function",
                "function": function,
                "operator": operator.as_str(),
                "period": period,
                "current_value": current,
                "compare_value": value,
                "passed": passed,
            }),
        ),
        Err(e) => fail("function", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candle;
    use crate::provider::MockProvider;
    use serde_json::json;

    fn linspace_frame(start: f64, end: f64, n: usize) -> Frame {
        let step = (end - start) / (n as f64 - 1.0);
        let candles = (0..n)
            .map(|i| {
                let close = start + step * i as f64;
                Candle {
                    timestamp: 86400 * i as i64,
                    date: format!("2023-{:02}-{:02}", i / 28 + 1, i % 28 + 1),
                    open: close,
                    high: close + 5.0,
                    low: close - 5.0,
                    close,
                    volume: 2_000,
                }
            })
            .collect();
        Frame::new(candles)
    }

    fn daily_frames(frame: Frame) -> HashMap<Interval, Frame> {
        HashMap::from([(Interval::Daily, frame)])
    }

    fn parse_filter(value: serde_json::Value) -> Filter {
        serde_json::from_value(value).unwrap()
    }

    async fn run(frames: &HashMap<Interval, Frame>, filter: serde_json::Value) -> (bool, Value) {
        let provider = MockProvider;
        let ctx = FilterContext {
            symbol: "TEST",
            frames,
            fundamentals: None,
            provider: &provider,
        };
        evaluate_filter(&ctx, &parse_filter(filter)).await
    }

    #[tokio::test]
    async fn test_price_gt_latest_and_offset() {
        // close = 100..200 over 100 points
        let frames = daily_frames(linspace_frame(100.0, 200.0, 100));

        let (passed, details) = run(
            &frames,
            json!({"type": "price", "field": "close", "operator": "gt", "value": 150.0}),
        )
        .await;
        assert!(passed, "latest close 200 should exceed 150: {details}");
        assert_eq!(details["passed"], true);

        // 95 candles back the close is ~104, below 150
        let (passed, _) = run(
            &frames,
            json!({"type": "price", "field": "close", "operator": "gt", "value": 150.0, "offset": 95}),
        )
        .await;
        assert!(!passed);
    }

    #[tokio::test]
    async fn test_price_vs_sma_measure() {
        let frames = daily_frames(linspace_frame(100.0, 200.0, 100));

        // In a rising trend the close is above its own SMA(20)
        let (passed, details) = run(
            &frames,
            json!({
                "type": "price", "field": "close", "operator": "gt",
                "value": {"type": "indicator", "field": "SMA", "time_period": 20}
            }),
        )
        .await;
        assert!(passed, "{details}");
        let compare = details["compare_value"].as_f64().unwrap();
        assert!(compare > 180.0 && compare < 200.0);
    }

    #[tokio::test]
    async fn test_crossover_needs_actual_cross() {
        let frames = daily_frames(linspace_frame(100.0, 200.0, 100));

        // Close has been above the SMA the whole time: no recent cross
        let (passed, _) = run(
            &frames,
            json!({
                "type": "price", "field": "close", "operator": "crossed_above",
                "value": {"type": "indicator", "field": "SMA", "time_period": 20}
            }),
        )
        .await;
        assert!(!passed);
    }

    #[tokio::test]
    async fn test_crossover_static_data_guard() {
        // Flat closes keep RSI constant; the guard falls back to gt
        let frames = daily_frames(linspace_frame(100.0, 100.0, 60));

        let (passed, details) = run(
            &frames,
            json!({
                "type": "indicator", "field": "RSI", "time_period": 14,
                "operator": "crossed_above", "value": 50.0
            }),
        )
        .await;
        assert_eq!(details["note"], "Static data detected");
        // Flat series has zero losses, pinning RSI at 100 > 50
        assert!(passed, "{details}");
    }

    #[tokio::test]
    async fn test_indicator_between() {
        let frames = daily_frames(linspace_frame(100.0, 100.0, 60));
        let (passed, _) = run(
            &frames,
            json!({
                "type": "indicator", "field": "RSI", "time_period": 14,
                "operator": "between", "value": [90.0, 100.0]
            }),
        )
        .await;
        assert!(passed);
    }

    #[tokio::test]
    async fn test_arithmetic_adjustment() {
        let frames = daily_frames(linspace_frame(100.0, 200.0, 100));

        // close > close * 1.05 is impossible against itself
        let (passed, details) = run(
            &frames,
            json!({
                "type": "price", "field": "close", "operator": "gt",
                "value": {"type": "attribute", "field": "close"},
                "arithmeticOperator": "*", "arithmeticValue": 1.05
            }),
        )
        .await;
        assert!(!passed);
        assert!((details["compare_value"].as_f64().unwrap() - 210.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_volume_gt_avg() {
        let mut candles: Vec<Candle> = (0..30)
            .map(|i| Candle {
                timestamp: 86400 * i as i64,
                date: format!("2023-01-{:02}", i % 28 + 1),
                open: 100.0,
                high: 105.0,
                low: 95.0,
                close: 100.0,
                volume: 1_000,
            })
            .collect();
        // Last candle spikes to 5x typical volume
        candles.last_mut().unwrap().volume = 5_000;
        let frames = daily_frames(Frame::new(candles));

        let (passed, details) = run(
            &frames,
            json!({"type": "volume", "operator": "gt_avg", "avg_period": 20, "multiplier": 2.0}),
        )
        .await;
        assert!(passed, "{details}");
        assert!(details["threshold"].as_f64().unwrap() > 2_000.0);
    }

    #[tokio::test]
    async fn test_price_change_flat_series_is_zero() {
        let frames = daily_frames(linspace_frame(50.0, 50.0, 30));
        let (passed, details) = run(
            &frames,
            json!({"type": "price_change", "field": "close", "lookback": 5, "operator": "eq", "value": 0.0}),
        )
        .await;
        assert!(passed);
        assert_eq!(details["current_value"].as_f64().unwrap(), 0.0);
    }

    #[tokio::test]
    async fn test_gap_detection() {
        let mut candles: Vec<Candle> = (0..10)
            .map(|i| Candle {
                timestamp: 86400 * i as i64,
                date: format!("2023-01-{:02}", i + 1),
                open: 100.0,
                high: 105.0,
                low: 95.0,
                close: 100.0,
                volume: 1_000,
            })
            .collect();
        // Latest candle opens 4% above the prior close
        candles.last_mut().unwrap().open = 104.0;
        let frames = daily_frames(Frame::new(candles));

        let (passed, details) = run(
            &frames,
            json!({"type": "gap", "operator": "gt", "value": 2.0}),
        )
        .await;
        assert!(passed, "{details}");
        assert_eq!(details["current_open"].as_f64().unwrap(), 104.0);
        assert_eq!(details["previous_close"].as_f64().unwrap(), 100.0);
    }

    #[tokio::test]
    async fn test_hammer_pattern() {
        // o=100, c=101, h=101.2, l=95: body 1, lower 5, upper 0.2, range 6.2
        let candles = vec![Candle {
            timestamp: 0,
            date: "2023-01-01".to_string(),
            open: 100.0,
            high: 101.2,
            low: 95.0,
            close: 101.0,
            volume: 1_000,
        }];
        let frames = daily_frames(Frame::new(candles));

        let (passed, details) = run(
            &frames,
            json!({"type": "pattern", "pattern": "hammer"}),
        )
        .await;
        assert!(passed, "{details}");

        let (passed, _) = run(
            &frames,
            json!({"type": "pattern", "pattern": "shooting_star"}),
        )
        .await;
        assert!(!passed);
    }

    #[tokio::test]
    async fn test_zero_range_candle_matches_nothing() {
        let candles = vec![Candle {
            timestamp: 0,
            date: "2023-01-01".to_string(),
            open: 100.0,
            high: 100.0,
            low: 100.0,
            close: 100.0,
            volume: 1_000,
        }];
        let frames = daily_frames(Frame::new(candles));

        for pattern in ["hammer", "shooting_star", "long_body", "small_body"] {
            let (passed, _) = run(
                &frames,
                json!({"type": "pattern", "pattern": pattern}),
            )
            .await;
            assert!(!passed, "zero-range candle matched {pattern}");
        }
    }

    #[tokio::test]
    async fn test_financial_alias_resolution() {
        let frames = daily_frames(linspace_frame(100.0, 200.0, 30));
        let fundamentals: Map<String, Value> =
            serde_json::from_value(json!({"peBasicExclExtraTTM": 18.0})).unwrap();
        let provider = MockProvider;
        let ctx = FilterContext {
            symbol: "TEST",
            frames: &frames,
            fundamentals: Some(&fundamentals),
            provider: &provider,
        };

        let filter = parse_filter(
            json!({"type": "financial", "field": "pe_ratio", "operator": "lt", "value": 30.0}),
        );
        let (passed, details) = evaluate_filter(&ctx, &filter).await;
        assert!(passed, "{details}");
        assert_eq!(details["resolved_field"], "peBasicExclExtraTTM");
    }

    #[tokio::test]
    async fn test_financial_missing_field_fails_gracefully() {
        let frames = daily_frames(linspace_frame(100.0, 200.0, 30));
        let fundamentals: Map<String, Value> = Map::new();
        let provider = MockProvider;
        let ctx = FilterContext {
            symbol: "TEST",
            frames: &frames,
            fundamentals: Some(&fundamentals),
            provider: &provider,
        };

        let filter = parse_filter(
            json!({"type": "financial", "field": "pe_ratio", "operator": "lt", "value": 30.0}),
        );
        let (passed, details) = evaluate_filter(&ctx, &filter).await;
        assert!(!passed);
        assert!(details["error"].as_str().unwrap().contains("pe_ratio"));
    }

    #[tokio::test]
    async fn test_financial_case_insensitive_scan() {
        let frames = daily_frames(linspace_frame(100.0, 200.0, 30));
        let fundamentals: Map<String, Value> =
            serde_json::from_value(json!({"Market_Capitalization": 2.5e12})).unwrap();
        let provider = MockProvider;
        let ctx = FilterContext {
            symbol: "TEST",
            frames: &frames,
            fundamentals: Some(&fundamentals),
            provider: &provider,
        };

        let filter = parse_filter(json!({
            "type": "financial", "field": "marketcapitalization",
            "operator": "gt", "value": 1.0e12
        }));
        let (passed, _) = evaluate_filter(&ctx, &filter).await;
        assert!(passed);
    }

    #[tokio::test]
    async fn test_function_count_green() {
        // Alternating green/red candles: 15 green out of 30
        let candles: Vec<Candle> = (0..30)
            .map(|i| {
                let green = i % 2 == 0;
                Candle {
                    timestamp: 86400 * i as i64,
                    date: format!("2023-01-{:02}", i % 28 + 1),
                    open: 100.0,
                    high: 103.0,
                    low: 97.0,
                    close: if green { 102.0 } else { 98.0 },
                    volume: 1_000,
                }
            })
            .collect();
        let frames = daily_frames(Frame::new(candles));

        let (passed, details) = run(
            &frames,
            json!({"type": "function", "field": "count", "operator": "eq", "value": 10.0, "period": 20}),
        )
        .await;
        assert!(passed, "{details}");
    }

    #[tokio::test]
    async fn test_function_max_high() {
        let frames = daily_frames(linspace_frame(100.0, 200.0, 100));
        // Highs are close + 5, so the 20-candle max is 205
        let (passed, details) = run(
            &frames,
            json!({"type": "function", "field": "max", "operator": "eq", "value": 205.0}),
        )
        .await;
        assert!(passed, "{details}");
    }

    #[tokio::test]
    async fn test_expression_filter_truthiness() {
        let frames = daily_frames(linspace_frame(100.0, 200.0, 100));
        let (passed, details) = run(
            &frames,
            json!({
                "type": "expression",
                "expression": {
                    "type": "binary", "operator": ">",
                    "left": {"type": "attribute", "field": "close"},
                    "right": {"type": "constant", "value": 100.0}
                }
            }),
        )
        .await;
        assert!(passed);
        assert_eq!(details["result"], 1.0);
    }

    #[tokio::test]
    async fn test_missing_timeframe_fails_filter() {
        let frames = daily_frames(linspace_frame(100.0, 200.0, 30));
        let (passed, details) = run(
            &frames,
            json!({
                "type": "price", "field": "close", "operator": "gt",
                "value": 10.0, "timeframe": "15min"
            }),
        )
        .await;
        assert!(!passed);
        assert!(details["error"].as_str().unwrap().contains("15min"));
    }
}
