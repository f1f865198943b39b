//! Intervals, output sizes, and cache TTLs shared across the crate.

use crate::error::ScannerError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Default base URL of the upstream market-data service
pub const DEFAULT_API_URL: &str = "http://localhost:4001";

/// Default number of symbols pulled when no universe is supplied
pub const DEFAULT_UNIVERSE_SIZE: usize = 5000;

/// Cache TTLs in seconds, keyed by data role
pub mod ttl {
    /// Candle frames: 1 hour
    pub const CANDLES: u64 = 3600;

    /// Computed indicator series: 30 minutes
    pub const INDICATORS: u64 = 1800;

    /// Scan results: 5 minutes
    pub const SCANS: u64 = 300;
}

/// Candle granularity understood by the scanner.
///
/// Logical interval names (`daily`, `5min`, ...) map to the single-character
/// resolutions of the upstream candle endpoint via [`Interval::resolution`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Interval {
    /// Daily candles
    Daily,
    /// Weekly candles
    Weekly,
    /// Monthly candles
    Monthly,
    /// 1-minute candles
    OneMinute,
    /// 5-minute candles
    FiveMinutes,
    /// 15-minute candles
    FifteenMinutes,
    /// 30-minute candles
    ThirtyMinutes,
    /// 60-minute candles
    SixtyMinutes,
}

impl Interval {
    /// Logical interval name as used in filters and tool parameters
    pub fn as_str(&self) -> &'static str {
        match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
            Interval::OneMinute => "1min",
            Interval::FiveMinutes => "5min",
            Interval::FifteenMinutes => "15min",
            Interval::ThirtyMinutes => "30min",
            Interval::SixtyMinutes => "60min",
        }
    }

    /// Resolution code of the upstream candle endpoint
    pub fn resolution(&self) -> &'static str {
        match self {
            Interval::Daily => "D",
            Interval::Weekly => "W",
            Interval::Monthly => "M",
            Interval::OneMinute => "1",
            Interval::FiveMinutes => "5",
            Interval::FifteenMinutes => "15",
            Interval::ThirtyMinutes => "30",
            Interval::SixtyMinutes => "60",
        }
    }

    /// Whether this interval produces intraday candles (timestamped dates)
    pub fn is_intraday(&self) -> bool {
        !matches!(
            self,
            Interval::Daily | Interval::Weekly | Interval::Monthly
        )
    }

    /// Approximate seconds spanned by one candle of this interval
    pub fn period_seconds(&self) -> i64 {
        const DAY: i64 = 86400;
        match self {
            Interval::Daily => DAY,
            Interval::Weekly => 7 * DAY,
            Interval::Monthly => 30 * DAY,
            Interval::OneMinute => 60,
            Interval::FiveMinutes => 5 * 60,
            Interval::FifteenMinutes => 15 * 60,
            Interval::ThirtyMinutes => 30 * 60,
            Interval::SixtyMinutes => 60 * 60,
        }
    }

    /// Seconds to reach back from `now` for a fetch window.
    ///
    /// `Compact` covers roughly 100 candles of this interval; `Full` covers
    /// twenty years of daily-equivalent range regardless of interval.
    pub fn window_seconds(&self, size: OutputSize) -> i64 {
        const DAY: i64 = 86400;
        match size {
            OutputSize::Compact => 100 * self.period_seconds(),
            OutputSize::Full => 20 * 365 * DAY,
        }
    }
}

impl FromStr for Interval {
    type Err = ScannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Interval::Daily),
            "weekly" => Ok(Interval::Weekly),
            "monthly" => Ok(Interval::Monthly),
            "1min" => Ok(Interval::OneMinute),
            "5min" => Ok(Interval::FiveMinutes),
            "15min" => Ok(Interval::FifteenMinutes),
            "30min" => Ok(Interval::ThirtyMinutes),
            "60min" => Ok(Interval::SixtyMinutes),
            other => Err(ScannerError::InvalidInterval {
                interval: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Interval {
    type Error = ScannerError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Interval> for String {
    fn from(i: Interval) -> String {
        i.as_str().to_string()
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How much history a candle fetch should cover
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputSize {
    /// Roughly 100 candles back from now
    #[default]
    Compact,
    /// Roughly twenty years back from now
    Full,
}

impl OutputSize {
    /// Canonical name as used in tool parameters and cache keys
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

impl FromStr for OutputSize {
    type Err = ScannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "compact" => Ok(OutputSize::Compact),
            "full" => Ok(OutputSize::Full),
            other => Err(ScannerError::InvalidParameter {
                param: "outputsize".to_string(),
                reason: format!("must be 'compact' or 'full', got '{other}'"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_resolution_mapping() {
        assert_eq!(Interval::Daily.resolution(), "D");
        assert_eq!(Interval::Weekly.resolution(), "W");
        assert_eq!(Interval::Monthly.resolution(), "M");
        assert_eq!(Interval::OneMinute.resolution(), "1");
        assert_eq!(Interval::FiveMinutes.resolution(), "5");
        assert_eq!(Interval::FifteenMinutes.resolution(), "15");
        assert_eq!(Interval::ThirtyMinutes.resolution(), "30");
        assert_eq!(Interval::SixtyMinutes.resolution(), "60");
    }

    #[test]
    fn test_interval_from_str() {
        assert_eq!("daily".parse::<Interval>().unwrap(), Interval::Daily);
        assert_eq!("15min".parse::<Interval>().unwrap(), Interval::FifteenMinutes);
        assert!(matches!(
            "hourly".parse::<Interval>(),
            Err(ScannerError::InvalidInterval { .. })
        ));
    }

    #[test]
    fn test_interval_intraday() {
        assert!(!Interval::Daily.is_intraday());
        assert!(!Interval::Monthly.is_intraday());
        assert!(Interval::FiveMinutes.is_intraday());
        assert!(Interval::SixtyMinutes.is_intraday());
    }

    #[test]
    fn test_window_seconds() {
        // Compact daily window covers ~100 days
        assert_eq!(
            Interval::Daily.window_seconds(OutputSize::Compact),
            100 * 86400
        );
        // Full windows are interval-independent
        assert_eq!(
            Interval::Daily.window_seconds(OutputSize::Full),
            Interval::FiveMinutes.window_seconds(OutputSize::Full)
        );
    }

    #[test]
    fn test_output_size_parse() {
        assert_eq!("compact".parse::<OutputSize>().unwrap(), OutputSize::Compact);
        assert_eq!("full".parse::<OutputSize>().unwrap(), OutputSize::Full);
        assert!("medium".parse::<OutputSize>().is_err());
    }

    #[test]
    fn test_interval_serde_round_trip() {
        let json = serde_json::to_string(&Interval::FifteenMinutes).unwrap();
        assert_eq!(json, "\"15min\"");
        let back: Interval = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Interval::FifteenMinutes);
    }
}
