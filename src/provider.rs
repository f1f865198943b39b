//! Candle provider seam.
//!
//! The scan pipeline reads candles through [`CandleProvider`] so the live
//! cache-through client and the offline mock generator are interchangeable.

use crate::cache::{Cache, keys};
use crate::client::MarketDataClient;
use crate::constants::{Interval, OutputSize, ttl};
use crate::error::Result;
use crate::mock::{MOCK_PERIODS, random_walk_frame};
use crate::models::{Candle, Frame};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Source of candle frames for the scan pipeline
#[async_trait]
pub trait CandleProvider: Send + Sync {
    /// Fetch a frame for one symbol at one timeframe
    async fn candles(&self, symbol: &str, interval: Interval, size: OutputSize) -> Result<Frame>;
}

/// Live provider: cache-through access to the market-data service with a
/// silent mock substitution when the service is empty or unreachable.
#[derive(Clone)]
pub struct LiveProvider {
    client: Arc<MarketDataClient>,
    cache: Arc<Cache>,
}

impl LiveProvider {
    /// Build a live provider over a client and cache handle
    pub fn new(client: Arc<MarketDataClient>, cache: Arc<Cache>) -> Self {
        Self { client, cache }
    }
}

#[async_trait]
impl CandleProvider for LiveProvider {
    async fn candles(&self, symbol: &str, interval: Interval, size: OutputSize) -> Result<Frame> {
        let key = keys::stock(symbol, interval, size);

        if let Some(candles) = self.cache.get::<Vec<Candle>>(&key).await {
            return Ok(Frame::new(candles));
        }

        match self.client.candles(symbol, interval, size).await {
            Ok(frame) if !frame.is_empty() => {
                self.cache.set(&key, &frame.candles(), ttl::CANDLES).await;
                Ok(frame)
            }
            Ok(_) => {
                warn!(symbol, interval = interval.as_str(), "Empty candle response, using mock data");
                Ok(random_walk_frame(symbol, interval, MOCK_PERIODS))
            }
            Err(e) if e.is_retriable() => {
                warn!(symbol, interval = interval.as_str(), error = %e, "Candle fetch failed, using mock data");
                Ok(random_walk_frame(symbol, interval, MOCK_PERIODS))
            }
            Err(e) => Err(e),
        }
    }
}

/// Offline provider producing seeded random walks; used by tests and
/// development environments without the upstream service.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockProvider;

#[async_trait]
impl CandleProvider for MockProvider {
    async fn candles(&self, symbol: &str, interval: Interval, _size: OutputSize) -> Result<Frame> {
        crate::client::validate_symbol(symbol)?;
        Ok(random_walk_frame(symbol, interval, MOCK_PERIODS))
    }
}
