//! Deterministic mock candle generation.
//!
//! Keeps developer workflows and tests offline-capable: when the live
//! candle service is empty or unreachable, the provider substitutes a
//! random walk seeded by the symbol, so the same symbol always produces the
//! same series.

use crate::client::format_date;
use crate::constants::Interval;
use crate::models::{Candle, Frame};
use chrono::Utc;
use rand::{Rng, SeedableRng, rngs::StdRng};

/// Number of candles a mock frame carries
pub const MOCK_PERIODS: usize = 150;

/// Stable seed derived from the canonical symbol spelling
pub(crate) fn symbol_seed(symbol: &str) -> u64 {
    symbol
        .trim()
        .to_uppercase()
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| {
            (acc ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
        })
}

/// Generate a seeded random-walk frame ending at the current time.
///
/// Candle spacing follows the interval; prices drift mildly upward with
/// bounded per-candle noise, and wicks extend a little beyond the body.
pub fn random_walk_frame(symbol: &str, interval: Interval, periods: usize) -> Frame {
    let mut rng = StdRng::seed_from_u64(symbol_seed(symbol));

    let start_price = 20.0 + (symbol_seed(symbol) % 480) as f64;
    let now = Utc::now().timestamp();
    let step = interval.period_seconds();

    let mut candles = Vec::with_capacity(periods);
    let mut prev_close = start_price;

    for i in 0..periods {
        let timestamp = now - step * (periods - 1 - i) as i64;

        let open = prev_close * (1.0 + rng.random_range(-0.005..0.005));
        let close = prev_close * (1.0 + rng.random_range(-0.02..0.02) + 0.0005);
        let high = open.max(close) * (1.0 + rng.random_range(0.0..0.01));
        let low = open.min(close) * (1.0 - rng.random_range(0.0..0.01));
        let volume = rng.random_range(1_000_000..10_000_000);

        candles.push(Candle {
            timestamp,
            date: format_date(timestamp, interval),
            open,
            high,
            low,
            close,
            volume,
        });

        prev_close = close;
    }

    Frame::new(candles)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_walk_is_deterministic_per_symbol() {
        let a = random_walk_frame("AAPL", Interval::Daily, MOCK_PERIODS);
        let b = random_walk_frame("aapl", Interval::Daily, MOCK_PERIODS);
        assert_eq!(a.closes(), b.closes());

        let c = random_walk_frame("MSFT", Interval::Daily, MOCK_PERIODS);
        assert_ne!(a.closes(), c.closes());
    }

    #[test]
    fn test_walk_shape() {
        let frame = random_walk_frame("TSLA", Interval::Daily, MOCK_PERIODS);
        assert_eq!(frame.len(), MOCK_PERIODS);

        for candle in frame.candles() {
            assert!(candle.high >= candle.open.max(candle.close));
            assert!(candle.low <= candle.open.min(candle.close));
            assert!(candle.volume >= 1_000_000);
        }

        // Ascending timestamps
        let ts: Vec<i64> = frame.candles().iter().map(|c| c.timestamp).collect();
        assert!(ts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_walk_intraday_dates_carry_time() {
        let frame = random_walk_frame("NVDA", Interval::FiveMinutes, 10);
        assert!(frame.latest().unwrap().date.contains(':'));
    }
}
