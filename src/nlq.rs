//! Natural-language query heuristics.
//!
//! Best-effort mapping from free text ("oversold stocks above the 50-day
//! moving average") to a filter list. This is keyword and regex matching,
//! not parsing; anything unrecognized is reported back so callers can see
//! what the interpretation ignored.

use crate::models::Filter;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Result of interpreting a natural-language query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedQuery {
    /// Filters derived from the query text
    pub filters: Vec<Filter>,
    /// One human-readable line per derived filter
    pub interpretations: Vec<String>,
    /// Whether any recognizable condition was found
    pub recognized: bool,
}

static RSI_ABOVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"rsi\s*(?:is\s*)?(?:above|over|>|greater than)\s*(\d+(?:\.\d+)?)").unwrap()
});
static RSI_BELOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"rsi\s*(?:is\s*)?(?:below|under|<|less than)\s*(\d+(?:\.\d+)?)").unwrap()
});
static PRICE_ABOVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:price|close|trading)\s*(?:is\s*)?(?:above|over|>)\s*\$?(\d+(?:\.\d+)?)")
        .unwrap()
});
static PRICE_BELOW: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:price|close|trading)\s*(?:is\s*)?(?:below|under|<)\s*\$?(\d+(?:\.\d+)?)")
        .unwrap()
});
static ABOVE_MA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"above\s+(?:its\s+|the\s+)?(\d+)[\s-]?day\s+(sma|ema|moving average)").unwrap()
});
static BELOW_MA: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"below\s+(?:its\s+|the\s+)?(\d+)[\s-]?day\s+(sma|ema|moving average)").unwrap()
});
static UP_PCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"up\s+(?:more than\s+|at least\s+)?(\d+(?:\.\d+)?)\s*%").unwrap()
});
static DOWN_PCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"down\s+(?:more than\s+|at least\s+)?(\d+(?:\.\d+)?)\s*%").unwrap()
});

fn push(
    filters: &mut Vec<Filter>,
    notes: &mut Vec<String>,
    filter: serde_json::Value,
    note: impl Into<String>,
) {
    filters.push(serde_json::from_value(filter).expect("heuristic filters are well-formed"));
    notes.push(note.into());
}

/// Interpret a free-text query as a list of filters.
pub fn parse_query(query: &str) -> ParsedQuery {
    let text = query.to_lowercase();
    let mut filters = Vec::new();
    let mut notes = Vec::new();

    if let Some(caps) = RSI_ABOVE.captures(&text) {
        let threshold: f64 = caps[1].parse().unwrap_or(70.0);
        push(
            &mut filters,
            &mut notes,
            json!({"type": "indicator", "field": "RSI", "time_period": 14,
                   "operator": "gt", "value": threshold}),
            format!("RSI(14) above {threshold}"),
        );
    } else if let Some(caps) = RSI_BELOW.captures(&text) {
        let threshold: f64 = caps[1].parse().unwrap_or(30.0);
        push(
            &mut filters,
            &mut notes,
            json!({"type": "indicator", "field": "RSI", "time_period": 14,
                   "operator": "lt", "value": threshold}),
            format!("RSI(14) below {threshold}"),
        );
    } else if text.contains("oversold") {
        push(
            &mut filters,
            &mut notes,
            json!({"type": "indicator", "field": "RSI", "time_period": 14,
                   "operator": "lt", "value": 30.0}),
            "RSI(14) below 30 (oversold)",
        );
    } else if text.contains("overbought") {
        push(
            &mut filters,
            &mut notes,
            json!({"type": "indicator", "field": "RSI", "time_period": 14,
                   "operator": "gt", "value": 70.0}),
            "RSI(14) above 70 (overbought)",
        );
    }

    if let Some(caps) = ABOVE_MA.captures(&text) {
        let period: u64 = caps[1].parse().unwrap_or(50);
        let field = if &caps[2] == "ema" { "EMA" } else { "SMA" };
        push(
            &mut filters,
            &mut notes,
            json!({"type": "price", "field": "close", "operator": "gt",
                   "value": {"type": "indicator", "field": field, "time_period": period}}),
            format!("close above the {period}-day {field}"),
        );
    } else if let Some(caps) = BELOW_MA.captures(&text) {
        let period: u64 = caps[1].parse().unwrap_or(50);
        let field = if &caps[2] == "ema" { "EMA" } else { "SMA" };
        push(
            &mut filters,
            &mut notes,
            json!({"type": "price", "field": "close", "operator": "lt",
                   "value": {"type": "indicator", "field": field, "time_period": period}}),
            format!("close below the {period}-day {field}"),
        );
    }

    if let Some(caps) = PRICE_ABOVE.captures(&text) {
        let threshold: f64 = caps[1].parse().unwrap_or(0.0);
        push(
            &mut filters,
            &mut notes,
            json!({"type": "price", "field": "close", "operator": "gt", "value": threshold}),
            format!("close above {threshold}"),
        );
    } else if let Some(caps) = PRICE_BELOW.captures(&text) {
        let threshold: f64 = caps[1].parse().unwrap_or(0.0);
        push(
            &mut filters,
            &mut notes,
            json!({"type": "price", "field": "close", "operator": "lt", "value": threshold}),
            format!("close below {threshold}"),
        );
    }

    if text.contains("high volume")
        || text.contains("volume spike")
        || text.contains("unusual volume")
        || text.contains("heavy volume")
    {
        push(
            &mut filters,
            &mut notes,
            json!({"type": "volume", "operator": "gt_avg", "avg_period": 20, "multiplier": 2.0}),
            "volume above 2x its 20-day average",
        );
    }

    if let Some(caps) = UP_PCT.captures(&text) {
        let pct: f64 = caps[1].parse().unwrap_or(5.0);
        push(
            &mut filters,
            &mut notes,
            json!({"type": "price_change", "field": "close", "lookback": 5,
                   "operator": "gt", "value": pct}),
            format!("up more than {pct}% over 5 days"),
        );
    } else if let Some(caps) = DOWN_PCT.captures(&text) {
        let pct: f64 = caps[1].parse().unwrap_or(5.0);
        push(
            &mut filters,
            &mut notes,
            json!({"type": "price_change", "field": "close", "lookback": 5,
                   "operator": "lt", "value": -pct}),
            format!("down more than {pct}% over 5 days"),
        );
    }

    if text.contains("52-week high") || text.contains("52 week high") {
        push(
            &mut filters,
            &mut notes,
            json!({"type": "price_52week", "field": "close",
                   "metric": "distance_from_high_pct", "operator": "lte", "value": 5.0}),
            "within 5% of the 52-week high",
        );
    } else if text.contains("52-week low") || text.contains("52 week low") {
        push(
            &mut filters,
            &mut notes,
            json!({"type": "price_52week", "field": "close",
                   "metric": "distance_from_low_pct", "operator": "lte", "value": 5.0}),
            "within 5% of the 52-week low",
        );
    }

    if text.contains("gap up") || text.contains("gapped up") {
        push(
            &mut filters,
            &mut notes,
            json!({"type": "gap", "operator": "gt", "value": 2.0}),
            "gapped up more than 2%",
        );
    } else if text.contains("gap down") || text.contains("gapped down") {
        push(
            &mut filters,
            &mut notes,
            json!({"type": "gap", "operator": "lt", "value": -2.0}),
            "gapped down more than 2%",
        );
    }

    if text.contains("hammer") {
        push(
            &mut filters,
            &mut notes,
            json!({"type": "pattern", "pattern": "hammer"}),
            "hammer candle",
        );
    } else if text.contains("shooting star") {
        push(
            &mut filters,
            &mut notes,
            json!({"type": "pattern", "pattern": "shooting_star"}),
            "shooting-star candle",
        );
    }

    let recognized = !filters.is_empty();
    ParsedQuery {
        filters,
        interpretations: notes,
        recognized,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FilterValue, Operator};

    #[test]
    fn test_rsi_threshold_parsing() {
        let parsed = parse_query("show me stocks with RSI above 65");
        assert!(parsed.recognized);
        match &parsed.filters[0] {
            Filter::Indicator {
                field,
                operator,
                value,
                ..
            } => {
                assert_eq!(field, "RSI");
                assert_eq!(*operator, Operator::Gt);
                assert_eq!(value.as_number(), Some(65.0));
            }
            other => panic!("unexpected filter {other:?}"),
        }
    }

    #[test]
    fn test_oversold_keyword() {
        let parsed = parse_query("find oversold stocks");
        assert_eq!(parsed.filters.len(), 1);
        assert!(parsed.interpretations[0].contains("oversold"));
    }

    #[test]
    fn test_moving_average_relation() {
        let parsed = parse_query("stocks above the 50-day moving average");
        match &parsed.filters[0] {
            Filter::Price { value, .. } => match value {
                FilterValue::Measure(m) => {
                    assert_eq!(m.field, "SMA");
                    assert_eq!(m.time_period, Some(50));
                }
                other => panic!("unexpected value {other:?}"),
            },
            other => panic!("unexpected filter {other:?}"),
        }
    }

    #[test]
    fn test_compound_query_yields_multiple_filters() {
        let parsed = parse_query("oversold stocks with high volume near the 52-week low");
        assert_eq!(parsed.filters.len(), 3);
        assert_eq!(parsed.interpretations.len(), 3);
    }

    #[test]
    fn test_unrecognized_query() {
        let parsed = parse_query("tell me a joke about the market");
        assert!(!parsed.recognized);
        assert!(parsed.filters.is_empty());
    }

    #[test]
    fn test_price_threshold_with_dollar_sign() {
        let parsed = parse_query("price above $150");
        match &parsed.filters[0] {
            Filter::Price { value, .. } => assert_eq!(value.as_number(), Some(150.0)),
            other => panic!("unexpected filter {other:?}"),
        }
    }
}
