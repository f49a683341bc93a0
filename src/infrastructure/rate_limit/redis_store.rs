//! Redis-backed fixed-window counters shared by every instance.

use super::service::{
    RateLimitStore, RateLimitStoreError, RateLimitStoreResult, WindowState, from_millis,
    window_millis, window_start_ms,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::info;

/// Shared counter store.
///
/// Each window is its own key, `rl:{category}:{identity}:{window_start}`,
/// incremented and given an expiry in one `MULTI` block. Errors are returned
/// to the caller, which decides how to degrade.
pub struct RedisRateLimitStore {
    client: ConnectionManager,
    key_prefix: String,
}

impl RedisRateLimitStore {
    /// Connects to Redis and validates the connection with a PING.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitStoreError::ConnectionError`] if the URL is invalid,
    /// the connection cannot be established, or the PING fails.
    pub async fn connect(redis_url: &str) -> RateLimitStoreResult<Self> {
        info!("Connecting to Redis rate limit store");

        let client = Client::open(redis_url).map_err(|e| {
            RateLimitStoreError::ConnectionError(format!("Failed to create Redis client: {e}"))
        })?;

        let manager = ConnectionManager::new(client).await.map_err(|e| {
            RateLimitStoreError::ConnectionError(format!("Failed to connect to Redis: {e}"))
        })?;

        let mut test_conn = manager.clone();
        test_conn
            .ping::<()>()
            .await
            .map_err(|e| RateLimitStoreError::ConnectionError(format!("Redis PING failed: {e}")))?;

        info!("✓ Connected to Redis");

        Ok(Self {
            client: manager,
            key_prefix: "rl:".to_string(),
        })
    }

    fn build_key(&self, category: &str, identity: &str, window_start: i64) -> String {
        format!("{}{category}:{identity}:{window_start}", self.key_prefix)
    }
}

#[async_trait]
impl RateLimitStore for RedisRateLimitStore {
    async fn increment(
        &self,
        category: &str,
        identity: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> RateLimitStoreResult<WindowState> {
        let start = window_start_ms(now, window);
        let window_ms = window_millis(window);
        let key = self.build_key(category, identity, start);
        let mut conn = self.client.clone();

        let (count,): (u64,) = redis::pipe()
            .atomic()
            .incr(&key, 1u64)
            .pexpire(&key, window_ms)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(|e| RateLimitStoreError::OperationError(e.to_string()))?;

        Ok(WindowState {
            count,
            reset_at: from_millis(start.saturating_add(window_ms)),
        })
    }

    fn name(&self) -> &'static str {
        "redis"
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }
}
