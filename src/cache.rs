//! Redis-backed TTL cache.
//!
//! Values are serialized as JSON. Every operation degrades silently: a
//! missing backend, an unreachable server, or a serialization problem makes
//! `get` return `None` and `set` a no-op, never an error into the evaluator.

use serde::{Serialize, de::DeserializeOwned};

#[cfg(feature = "redis-cache")]
use redis::aio::ConnectionManager;
#[cfg(feature = "redis-cache")]
use std::sync::Arc;

/// Cache key derivation.
///
/// Keys are pure functions of the request: symbols and indicator names are
/// canonicalized to upper case, periods are integers, and scan keys hash the
/// canonical JSON of the request so floats never appear in key text.
pub mod keys {
    use crate::constants::{Interval, OutputSize};
    use crate::models::{Filter, FilterLogic};
    use std::hash::{DefaultHasher, Hash, Hasher};

    /// Key for a cached candle frame
    pub fn stock(symbol: &str, interval: Interval, size: OutputSize) -> String {
        format!(
            "stock:{}:{}:{}",
            symbol.to_uppercase(),
            interval.as_str(),
            size.as_str()
        )
    }

    /// Key for a cached indicator series
    pub fn indicator(
        symbol: &str,
        name: &str,
        interval: Interval,
        period: usize,
        series: &str,
    ) -> String {
        format!(
            "indicator:{}:{}:{}:{}:{}",
            symbol.to_uppercase(),
            name.to_uppercase(),
            interval.as_str(),
            period,
            series
        )
    }

    /// Key for a cached scan result
    pub fn scan(symbols: &[String], filters: &[Filter], logic: FilterLogic) -> String {
        let canonical = serde_json::json!({
            "symbols": symbols.iter().map(|s| s.to_uppercase()).collect::<Vec<_>>(),
            "filters": filters,
            "logic": logic,
        });
        let mut hasher = DefaultHasher::new();
        canonical.to_string().hash(&mut hasher);
        format!("scan:{:016x}", hasher.finish())
    }
}

/// Cache client wrapper
#[derive(Clone)]
pub struct Cache {
    #[cfg(feature = "redis-cache")]
    conn: Option<Arc<ConnectionManager>>,
}

impl Cache {
    /// Connect to Redis, or construct a disabled cache when `redis_url` is
    /// `None` or the connection fails.
    #[cfg(feature = "redis-cache")]
    pub async fn new(redis_url: Option<&str>) -> Self {
        let conn = if let Some(url) = redis_url {
            match redis::Client::open(url) {
                Ok(client) => match ConnectionManager::new(client).await {
                    Ok(manager) => {
                        tracing::info!("Redis cache connected: {}", url);
                        Some(Arc::new(manager))
                    }
                    Err(e) => {
                        tracing::warn!("Failed to connect to Redis: {}. Caching disabled.", e);
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!("Invalid Redis URL: {}. Caching disabled.", e);
                    None
                }
            }
        } else {
            tracing::info!("No REDIS_URL configured. Caching disabled.");
            None
        };

        Self { conn }
    }

    /// Construct a disabled cache (the `redis-cache` feature is off)
    #[cfg(not(feature = "redis-cache"))]
    pub async fn new(_redis_url: Option<&str>) -> Self {
        tracing::info!("Redis cache feature not enabled. Caching disabled.");
        Self {}
    }

    /// Whether a backend is connected
    #[cfg(feature = "redis-cache")]
    pub fn is_enabled(&self) -> bool {
        self.conn.is_some()
    }

    /// Whether a backend is connected
    #[cfg(not(feature = "redis-cache"))]
    pub fn is_enabled(&self) -> bool {
        false
    }

    /// Get a value from cache
    #[cfg(feature = "redis-cache")]
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let conn = self.conn.as_ref()?;
        let mut conn = conn.as_ref().clone();

        match redis::cmd("GET")
            .arg(key)
            .query_async::<Option<String>>(&mut conn)
            .await
        {
            Ok(Some(data)) => match serde_json::from_str(&data) {
                Ok(value) => {
                    tracing::info!(key = %key, "Cache HIT");
                    Some(value)
                }
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Cache deserialize error");
                    None
                }
            },
            Ok(None) => {
                tracing::info!(key = %key, "Cache MISS");
                None
            }
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache GET error");
                None
            }
        }
    }

    /// Get a value from cache (no-op without the `redis-cache` feature)
    #[cfg(not(feature = "redis-cache"))]
    pub async fn get<T: DeserializeOwned>(&self, _key: &str) -> Option<T> {
        None
    }

    /// Set a value in cache with a TTL in seconds
    #[cfg(feature = "redis-cache")]
    pub async fn set<T: Serialize>(&self, key: &str, value: &T, ttl_seconds: u64) {
        let Some(conn) = self.conn.as_ref() else {
            return;
        };

        let mut conn = conn.as_ref().clone();

        let data = match serde_json::to_string(value) {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Cache serialize error");
                return;
            }
        };

        if let Err(e) = redis::cmd("SETEX")
            .arg(key)
            .arg(ttl_seconds)
            .arg(&data)
            .query_async::<()>(&mut conn)
            .await
        {
            tracing::warn!(key = %key, error = %e, "Cache SET error");
        } else {
            tracing::info!(key = %key, ttl = ttl_seconds, "Cache SET");
        }
    }

    /// Set a value in cache (no-op without the `redis-cache` feature)
    #[cfg(not(feature = "redis-cache"))]
    pub async fn set<T: Serialize>(&self, _key: &str, _value: &T, _ttl_seconds: u64) {}
}
