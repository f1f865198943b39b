//! Data model: candles, frames, filters, and scan results.

/// OHLCV candle/bar structure
pub mod candle;
/// Indexed OHLCV frame with broadcast columns
pub mod frame;
/// Typed filter model and wire-tolerant parsing
pub mod filter;
/// Scan result envelope and per-symbol records
pub mod scan;

pub use candle::Candle;
pub use filter::{
    ArithmeticOp, Filter, FilterLogic, FilterValue, FunctionKind, Measure, MeasureKind,
    Metric52Week, OffsetSpec, Operator, PatternKind,
};
pub use frame::{Column, Frame};
pub use scan::{FailedStock, MatchedStock, ScanResult};
