//! Rate-limit store trait and error types.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::time::Duration;

/// Errors that can occur while talking to a counter store.
#[derive(Debug, thiserror::Error)]
pub enum RateLimitStoreError {
    #[error("Rate limit store connection error: {0}")]
    ConnectionError(String),

    #[error("Rate limit store operation error: {0}")]
    OperationError(String),
}

/// Result type for counter store operations.
pub type RateLimitStoreResult<T> = Result<T, RateLimitStoreError>;

/// Counter state after an increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowState {
    /// Requests counted in the current window, including this one.
    pub count: u64,
    /// When the current window ends.
    pub reset_at: DateTime<Utc>,
}

/// Fixed-window counter store.
///
/// Windows are aligned to multiples of their length since the Unix epoch, so
/// every instance sharing a store agrees on window boundaries.
///
/// # Implementations
///
/// - [`crate::infrastructure::rate_limit::RedisRateLimitStore`] - shared across instances
/// - [`crate::infrastructure::rate_limit::MemoryRateLimitStore`] - in-process fallback
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Atomically counts one request for `(category, identity)` in the window
    /// containing `now`.
    ///
    /// # Errors
    ///
    /// Returns [`RateLimitStoreError`] if the backend cannot be reached.
    async fn increment(
        &self,
        category: &str,
        identity: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> RateLimitStoreResult<WindowState>;

    /// Backend name for logs and health output.
    fn name(&self) -> &'static str;

    /// Checks if the backend is reachable.
    async fn health_check(&self) -> bool;
}

/// Start of the window containing `now`, in epoch milliseconds.
pub fn window_start_ms(now: DateTime<Utc>, window: Duration) -> i64 {
    let window_ms = window_millis(window);
    now.timestamp_millis().div_euclid(window_ms) * window_ms
}

/// Window length in milliseconds, never zero.
pub fn window_millis(window: Duration) -> i64 {
    i64::try_from(window.as_millis()).unwrap_or(i64::MAX).max(1)
}

/// Converts epoch milliseconds back into a timestamp.
pub fn from_millis(ms: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(ms).single().unwrap_or_default()
}
