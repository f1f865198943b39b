//! Expression AST and recursive interpreter.
//!
//! Expressions are JSON trees tagged by `type`. Every node evaluates to a
//! number; boolean results are encoded as `1.0` (true) / `0.0` (false) so
//! logic and arithmetic compose freely.
//!
//! Absent data (warm-up regions, unknown columns) evaluates to NaN, which
//! makes any comparison involving it false rather than an error. Crossover
//! operators evaluate both operands at the current and the prior index of
//! each operand's own frame; frames of different timeframes are addressed by
//! index independently, not aligned by timestamp.

use crate::constants::Interval;
use crate::error::{Result, ScannerError};
use crate::models::Frame;
use crate::resolve::resolve_value;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

/// The field of an attribute node: a plain column name or a nested expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeField {
    /// Column or enriched field name
    Name(String),
    /// Nested expression evaluated in the attribute's frame context
    Node(Box<ExprNode>),
}

/// A node of the expression tree, tagged by `type` on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExprNode {
    /// Literal number
    Constant {
        /// The literal value
        value: f64,
    },
    /// Frame column lookup
    Attribute {
        /// Column name or nested node
        field: AttributeField,
        /// Candles back from the evaluation index
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<i64>,
        /// Timeframe override
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeframe: Option<String>,
    },
    /// Computed indicator lookup
    Indicator {
        /// Indicator name, possibly compound
        field: String,
        /// Indicator period
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_period: Option<usize>,
        /// Candles back from the evaluation index
        #[serde(default, skip_serializing_if = "Option::is_none")]
        offset: Option<i64>,
        /// Timeframe override
        #[serde(default, skip_serializing_if = "Option::is_none")]
        timeframe: Option<String>,
        /// Extra indicator parameters
        #[serde(default, skip_serializing_if = "Option::is_none")]
        params: Option<Map<String, Value>>,
    },
    /// Two-operand operation: arithmetic, comparison, logical, or crossover
    Binary {
        /// `+ - * /`, `> >= < <= == !=`, `AND OR`, `crossed_above`, `crossed_below`
        operator: String,
        /// Left operand
        left: Box<ExprNode>,
        /// Right operand
        right: Box<ExprNode>,
    },
    /// One-operand operation
    Unary {
        /// `NOT` or `-`
        operator: String,
        /// The operand
        operand: Box<ExprNode>,
    },
    /// Named function application
    Function {
        /// `Abs`, `Min`, or `Max`
        name: String,
        /// Function arguments
        args: Vec<ExprNode>,
    },
}

impl ExprNode {
    /// Collect every timeframe string mentioned anywhere in the tree
    pub fn collect_timeframes(&self, out: &mut Vec<String>) {
        match self {
            ExprNode::Constant { .. } => {}
            ExprNode::Attribute {
                field, timeframe, ..
            } => {
                out.extend(timeframe.iter().cloned());
                if let AttributeField::Node(node) = field {
                    node.collect_timeframes(out);
                }
            }
            ExprNode::Indicator { timeframe, .. } => {
                out.extend(timeframe.iter().cloned());
            }
            ExprNode::Binary { left, right, .. } => {
                left.collect_timeframes(out);
                right.collect_timeframes(out);
            }
            ExprNode::Unary { operand, .. } => operand.collect_timeframes(out),
            ExprNode::Function { args, .. } => {
                for arg in args {
                    arg.collect_timeframes(out);
                }
            }
        }
    }

    /// Collect every plain attribute field name in the tree
    pub fn collect_attribute_fields(&self, out: &mut Vec<String>) {
        match self {
            ExprNode::Constant { .. } | ExprNode::Indicator { .. } => {}
            ExprNode::Attribute { field, .. } => match field {
                AttributeField::Name(name) => out.push(name.clone()),
                AttributeField::Node(node) => node.collect_attribute_fields(out),
            },
            ExprNode::Binary { left, right, .. } => {
                left.collect_attribute_fields(out);
                right.collect_attribute_fields(out);
            }
            ExprNode::Unary { operand, .. } => operand.collect_attribute_fields(out),
            ExprNode::Function { args, .. } => {
                for arg in args {
                    arg.collect_attribute_fields(out);
                }
            }
        }
    }
}

fn truthy(v: f64) -> bool {
    v != 0.0 && !v.is_nan()
}

fn bool_num(b: bool) -> f64 {
    if b { 1.0 } else { 0.0 }
}

fn frame_for<'a>(
    frames: &'a HashMap<Interval, Frame>,
    timeframe: Option<&String>,
    default_tf: Interval,
) -> Result<(&'a Frame, Interval)> {
    let tf = match timeframe {
        Some(s) => s.parse::<Interval>()?,
        None => default_tf,
    };
    let frame = frames.get(&tf).ok_or_else(|| ScannerError::MissingTimeframe {
        timeframe: tf.as_str().to_string(),
    })?;
    Ok((frame, tf))
}

/// Evaluate an expression node at `idx` (negative, `-1` latest).
///
/// `default_tf` is the timeframe used by nodes that carry none of their own.
/// Absent data yields NaN; comparisons treat NaN operands as false.
pub fn eval_expr(
    node: &ExprNode,
    frames: &HashMap<Interval, Frame>,
    default_tf: Interval,
    idx: i64,
) -> Result<f64> {
    match node {
        ExprNode::Constant { value } => Ok(*value),

        ExprNode::Attribute {
            field,
            offset,
            timeframe,
        } => {
            let (frame, tf) = frame_for(frames, timeframe.as_ref(), default_tf)?;
            let effective = idx - offset.unwrap_or(0);
            match field {
                AttributeField::Name(name) => Ok(frame
                    .value(name, effective)
                    .or_else(|| resolve_value(frame, name, None, effective, None))
                    .unwrap_or(f64::NAN)),
                AttributeField::Node(inner) => eval_expr(inner, frames, tf, effective),
            }
        }

        ExprNode::Indicator {
            field,
            time_period,
            offset,
            timeframe,
            params,
        } => {
            let (frame, _) = frame_for(frames, timeframe.as_ref(), default_tf)?;
            let effective = idx - offset.unwrap_or(0);
            Ok(
                resolve_value(frame, field, *time_period, effective, params.as_ref())
                    .unwrap_or(f64::NAN),
            )
        }

        ExprNode::Binary {
            operator,
            left,
            right,
        } => {
            if matches!(operator.as_str(), "crossed_above" | "crossed_below") {
                let cur_l = eval_expr(left, frames, default_tf, idx)?;
                let cur_r = eval_expr(right, frames, default_tf, idx)?;
                let prev_l = eval_expr(left, frames, default_tf, idx - 1)?;
                let prev_r = eval_expr(right, frames, default_tf, idx - 1)?;

                if cur_l.is_nan() || cur_r.is_nan() || prev_l.is_nan() || prev_r.is_nan() {
                    return Ok(0.0);
                }
                return Ok(match operator.as_str() {
                    "crossed_above" => bool_num(prev_l <= prev_r && cur_l > cur_r),
                    _ => bool_num(prev_l >= prev_r && cur_l < cur_r),
                });
            }

            let l = eval_expr(left, frames, default_tf, idx)?;
            let r = eval_expr(right, frames, default_tf, idx)?;

            match operator.as_str() {
                "+" => Ok(l + r),
                "-" => Ok(l - r),
                "*" => Ok(l * r),
                // Scans stay total: division by zero collapses to zero
                "/" => Ok(if r == 0.0 { 0.0 } else { l / r }),
                ">" | ">=" | "<" | "<=" | "==" | "!=" => {
                    if l.is_nan() || r.is_nan() {
                        return Ok(0.0);
                    }
                    Ok(bool_num(match operator.as_str() {
                        ">" => l > r,
                        ">=" => l >= r,
                        "<" => l < r,
                        "<=" => l <= r,
                        "==" => l == r,
                        _ => l != r,
                    }))
                }
                op if op.eq_ignore_ascii_case("and") => Ok(bool_num(truthy(l) && truthy(r))),
                op if op.eq_ignore_ascii_case("or") => Ok(bool_num(truthy(l) || truthy(r))),
                other => Err(ScannerError::Eval(format!(
                    "unknown binary operator '{other}'"
                ))),
            }
        }

        ExprNode::Unary { operator, operand } => {
            let v = eval_expr(operand, frames, default_tf, idx)?;
            match operator.as_str() {
                "-" => Ok(-v),
                op if op.eq_ignore_ascii_case("not") => Ok(bool_num(!truthy(v))),
                other => Err(ScannerError::Eval(format!(
                    "unknown unary operator '{other}'"
                ))),
            }
        }

        ExprNode::Function { name, args } => {
            if args.is_empty() {
                return Err(ScannerError::Eval(format!(
                    "function '{name}' requires at least one argument"
                )));
            }
            let values: Vec<f64> = args
                .iter()
                .map(|a| eval_expr(a, frames, default_tf, idx))
                .collect::<Result<_>>()?;

            match name.to_lowercase().as_str() {
                "abs" => Ok(values[0].abs()),
                "min" => Ok(values.iter().copied().fold(f64::INFINITY, f64::min)),
                "max" => Ok(values.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
                other => Err(ScannerError::Eval(format!("unknown function '{other}'"))),
            }
        }
    }
}
