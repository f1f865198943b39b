//! Typed filter model.
//!
//! Filters arrive as JSON records tagged by `type`. The wire form is
//! deliberately tolerant: `offset` may be an integer, `"latest"`, or
//! `"Nd_ago"`; `value` may be a scalar, a two-element range, a string, or a
//! nested measure record; the arithmetic and timeframe fields accept both
//! snake_case and camelCase spellings.

use crate::error::{Result, ScannerError};
use crate::eval::expr::ExprNode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Comparison operator applied between the resolved sides of a filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Strictly greater
    Gt,
    /// Greater or equal
    Gte,
    /// Strictly less
    Lt,
    /// Less or equal
    Lte,
    /// Equal within absolute tolerance 1e-2
    Eq,
    /// Not equal (same tolerance)
    Neq,
    /// Left crossed above right between the prior and current candle
    CrossedAbove,
    /// Left crossed below right between the prior and current candle
    CrossedBelow,
    /// Inclusive two-sided range
    Between,
    /// Case-insensitive substring (string fields only)
    Contains,
    /// Above the rolling volume average (volume filters only)
    GtAvg,
}

impl Operator {
    /// Wire name of the operator
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Gt => "gt",
            Operator::Gte => "gte",
            Operator::Lt => "lt",
            Operator::Lte => "lte",
            Operator::Eq => "eq",
            Operator::Neq => "neq",
            Operator::CrossedAbove => "crossed_above",
            Operator::CrossedBelow => "crossed_below",
            Operator::Between => "between",
            Operator::Contains => "contains",
            Operator::GtAvg => "gt_avg",
        }
    }

    /// Whether this operator compares candle-over-candle movement
    pub fn is_crossover(&self) -> bool {
        matches!(self, Operator::CrossedAbove | Operator::CrossedBelow)
    }
}

/// Offset back from the latest candle: `0` is latest.
///
/// Accepts an integer, `"latest"`, or `"Nd_ago"` on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OffsetSpec {
    /// Plain number of candles back
    Periods(i64),
    /// `"latest"` or `"Nd_ago"`
    Named(String),
}

impl Default for OffsetSpec {
    fn default() -> Self {
        OffsetSpec::Periods(0)
    }
}

impl OffsetSpec {
    /// Number of candles back from latest
    pub fn periods(&self) -> Result<i64> {
        match self {
            OffsetSpec::Periods(n) if *n >= 0 => Ok(*n),
            OffsetSpec::Periods(n) => Err(ScannerError::InvalidParameter {
                param: "offset".to_string(),
                reason: format!("must be non-negative, got {n}"),
            }),
            OffsetSpec::Named(s) => {
                if s.eq_ignore_ascii_case("latest") {
                    return Ok(0);
                }
                if let Some(days) = s.strip_suffix("d_ago")
                    && let Ok(n) = days.parse::<i64>()
                {
                    return Ok(n);
                }
                Err(ScannerError::InvalidParameter {
                    param: "offset".to_string(),
                    reason: format!("unrecognized offset '{s}'"),
                })
            }
        }
    }

    /// Negative frame index addressed by this offset: offset 0 → `-1`
    pub fn index(&self) -> Result<i64> {
        Ok(-(self.periods()? + 1))
    }
}

/// What a nested measure resolves through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    /// A frame column (price field or enriched scalar)
    Attribute,
    /// A computed indicator
    Indicator,
}

/// A dynamic right-hand side: another attribute or indicator, possibly on a
/// different timeframe or at a different offset than the left-hand side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    /// Attribute or indicator
    #[serde(rename = "type")]
    pub kind: MeasureKind,
    /// Field or indicator name
    pub field: String,
    /// Indicator period override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_period: Option<usize>,
    /// Timeframe override; defaults to the left-hand side's timeframe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    /// Offset override; defaults to the left-hand side's offset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<OffsetSpec>,
    /// Extra indicator parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
}

/// Comparison target of a filter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Plain numeric threshold
    Number(f64),
    /// String target (financial string fields)
    Text(String),
    /// Inclusive `[low, high]` range for `between`
    Range(Vec<f64>),
    /// Nested attribute/indicator measure
    Measure(Measure),
}

impl FilterValue {
    /// The scalar value, if this is a plain number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FilterValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The inclusive bounds, if this is a two-element range
    pub fn as_range(&self) -> Option<(f64, f64)> {
        match self {
            FilterValue::Range(v) if v.len() == 2 => Some((v[0], v[1])),
            _ => None,
        }
    }
}

/// Arithmetic post-adjustment applied to a resolved right-hand side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithmeticOp {
    /// Addition
    #[serde(rename = "+")]
    Add,
    /// Subtraction
    #[serde(rename = "-")]
    Sub,
    /// Multiplication
    #[serde(rename = "*")]
    Mul,
    /// Division
    #[serde(rename = "/")]
    Div,
}

impl ArithmeticOp {
    /// Apply the adjustment: `lhs op rhs`
    pub fn apply(&self, lhs: f64, rhs: f64) -> f64 {
        match self {
            ArithmeticOp::Add => lhs + rhs,
            ArithmeticOp::Sub => lhs - rhs,
            ArithmeticOp::Mul => lhs * rhs,
            ArithmeticOp::Div => {
                if rhs == 0.0 {
                    0.0
                } else {
                    lhs / rhs
                }
            }
        }
    }
}

/// Candlestick shape matched by a pattern filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// Small body, long lower wick
    Hammer,
    /// Small body, long upper wick
    ShootingStar,
    /// Body dominates the range
    LongBody,
    /// Body is a small fraction of the range
    SmallBody,
}

impl PatternKind {
    /// Wire name of the pattern
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Hammer => "hammer",
            PatternKind::ShootingStar => "shooting_star",
            PatternKind::LongBody => "long_body",
            PatternKind::SmallBody => "small_body",
        }
    }
}

/// Distance metric for 52-week filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric52Week {
    /// `(high_52w − close) / high_52w · 100`
    DistanceFromHighPct,
    /// `(close − low_52w) / low_52w · 100`
    DistanceFromLowPct,
}

/// Windowed function applied by a `function` filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FunctionKind {
    /// Highest high over the window
    Max,
    /// Lowest low over the window
    Min,
    /// Absolute latest close percent change
    Abs,
    /// Count of green candles in the window
    Count,
}

/// How per-filter booleans combine into a symbol match
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FilterLogic {
    /// Every filter must pass
    #[default]
    And,
    /// Any filter passing matches the symbol
    Or,
}

// Unknown logic strings default to AND so a malformed request still scans.
impl From<String> for FilterLogic {
    fn from(s: String) -> Self {
        if s.eq_ignore_ascii_case("or") {
            FilterLogic::Or
        } else {
            FilterLogic::And
        }
    }
}

impl From<FilterLogic> for String {
    fn from(logic: FilterLogic) -> String {
        match logic {
            FilterLogic::And => "AND".to_string(),
            FilterLogic::Or => "OR".to_string(),
        }
    }
}

/// A single screening condition, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Filter {
    /// Compare a price column against a value or measure
    Price {
        /// Frame column to compare
        field: String,
        /// Comparison operator
        operator: Operator,
        /// Comparison target
        value: FilterValue,
        /// Candles back from latest
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<OffsetSpec>,
        /// Optional arithmetic adjustment of the resolved target
        #[serde(
            default,
            alias = "arithmeticOperator",
            skip_serializing_if = "Option::is_none"
        )]
        arithmetic_operator: Option<ArithmeticOp>,
        /// Operand for the arithmetic adjustment
        #[serde(
            default,
            alias = "arithmeticValue",
            skip_serializing_if = "Option::is_none"
        )]
        arithmetic_value: Option<f64>,
        /// Timeframe the left-hand side reads from
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeframe: Option<String>,
        /// Default timeframe for the right-hand measure
        #[serde(
            default,
            alias = "compareToTimeframe",
            skip_serializing_if = "Option::is_none"
        )]
        compare_to_timeframe: Option<String>,
    },

    /// Compare a computed indicator against a value or measure
    Indicator {
        /// Indicator name, optionally compound (`rsi_9`, `MACD_HIST`)
        field: String,
        /// Indicator period
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_period: Option<usize>,
        /// Comparison operator
        operator: Operator,
        /// Comparison target
        value: FilterValue,
        /// Candles back from latest
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<OffsetSpec>,
        /// Timeframe the indicator is computed on
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeframe: Option<String>,
        /// Default timeframe for the right-hand measure
        #[serde(
            default,
            alias = "compareToTimeframe",
            skip_serializing_if = "Option::is_none"
        )]
        compare_to_timeframe: Option<String>,
        /// Extra indicator parameters (`fast_period`, `std_dev`, ...)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Map<String, Value>>,
    },

    /// Compare volume against a threshold or a rolling-average multiple
    Volume {
        /// Comparison operator; `gt_avg` engages the rolling average
        operator: Operator,
        /// Absolute volume threshold
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
        /// Rolling average window for `gt_avg` (default 20)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        avg_period: Option<usize>,
        /// Multiplier on the rolling average (default 1.5)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        multiplier: Option<f64>,
    },

    /// Percent change of a price column over a lookback window
    PriceChange {
        /// Frame column (default `close`)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        /// Candles back the change is measured over
        lookback: i64,
        /// Comparison operator
        operator: Operator,
        /// Percent threshold
        value: f64,
    },

    /// Percent change of volume over a lookback window
    VolumeChange {
        /// Candles back the change is measured over
        lookback: i64,
        /// Comparison operator
        operator: Operator,
        /// Percent threshold
        value: f64,
    },

    /// Distance from the 52-week high or low
    #[serde(rename = "price_52week")]
    Price52Week {
        /// Frame column (default `close`)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        field: Option<String>,
        /// Trading days of history considered (default 252)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lookback_days: Option<usize>,
        /// Which distance is compared
        metric: Metric52Week,
        /// Comparison operator
        operator: Operator,
        /// Percent threshold
        value: f64,
    },

    /// Overnight gap: percent change from prior close to current open
    Gap {
        /// Comparison operator
        operator: Operator,
        /// Percent threshold
        value: f64,
        /// Candles back from latest
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<OffsetSpec>,
    },

    /// Candlestick shape on the latest candle
    Pattern {
        /// Shape to match
        pattern: PatternKind,
    },

    /// Compare a fundamental metric against a value
    Financial {
        /// Metric name or well-known alias (`pe_ratio`, `market_cap`, ...)
        field: String,
        /// Comparison operator
        operator: Operator,
        /// Comparison target
        value: FilterValue,
    },

    /// Windowed function over recent candles
    Function {
        /// Which function to apply
        field: FunctionKind,
        /// Comparison operator
        operator: Operator,
        /// Threshold
        value: f64,
        /// Window length (default 20)
        #[serde(default, skip_serializing_if = "Option::is_none")]
        period: Option<usize>,
    },

    /// Escape hatch: evaluate an arbitrary expression tree
    Expression {
        /// Root of the expression AST
        expression: ExprNode,
    },
}

impl Filter {
    /// Wire name of the filter type, for diagnostics
    pub fn type_name(&self) -> &'static str {
        match self {
            Filter::Price { .. } => "price",
            Filter::Indicator { .. } => "indicator",
            Filter::Volume { .. } => "volume",
            Filter::PriceChange { .. } => "price_change",
            Filter::VolumeChange { .. } => "volume_change",
            Filter::Price52Week { .. } => "price_52week",
            Filter::Gap { .. } => "gap",
            Filter::Pattern { .. } => "pattern",
            Filter::Financial { .. } => "financial",
            Filter::Function { .. } => "function",
            Filter::Expression { .. } => "expression",
        }
    }

    /// Every timeframe string this filter references, including nested
    /// measures and expression nodes.
    pub fn referenced_timeframes(&self) -> Vec<String> {
        let mut out = Vec::new();
        match self {
            Filter::Price {
                value,
                timeframe,
                compare_to_timeframe,
                ..
            }
            | Filter::Indicator {
                value,
                timeframe,
                compare_to_timeframe,
                ..
            } => {
                out.extend(timeframe.iter().cloned());
                out.extend(compare_to_timeframe.iter().cloned());
                if let FilterValue::Measure(m) = value {
                    out.extend(m.timeframe.iter().cloned());
                }
            }
            Filter::Expression { expression } => expression.collect_timeframes(&mut out),
            _ => {}
        }
        out
    }

    /// Fields this filter reads that may require fundamental enrichment:
    /// anything that is neither a base OHLCV column nor an indicator.
    pub fn referenced_fields(&self) -> Vec<String> {
        let mut out = Vec::new();
        match self {
            Filter::Price { field, value, .. } => {
                out.push(field.clone());
                if let FilterValue::Measure(m) = value
                    && m.kind == MeasureKind::Attribute
                {
                    out.push(m.field.clone());
                }
            }
            Filter::Financial { field, .. } => out.push(field.clone()),
            Filter::Expression { expression } => expression.collect_attribute_fields(&mut out),
            _ => {}
        }
        out
    }

    /// Whether evaluating this filter needs full (multi-year) history
    pub fn requires_full_history(&self) -> bool {
        matches!(self, Filter::Price52Week { .. })
    }
}
