//! Counter stores behind the admission controller.
//!
//! Provides a [`RateLimitStore`] trait with two implementations:
//! - [`RedisRateLimitStore`] - shared counters across instances
//! - [`MemoryRateLimitStore`] - in-process fallback with an explicit lifecycle

mod memory_store;
mod redis_store;
mod service;

pub use memory_store::MemoryRateLimitStore;
pub use redis_store::RedisRateLimitStore;
pub use service::{
    RateLimitStore, RateLimitStoreError, RateLimitStoreResult, WindowState, window_start_ms,
};
