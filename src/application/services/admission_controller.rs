//! Per-client admission control for the creation and resolution routes.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::counter;
use tracing::warn;

use crate::infrastructure::rate_limit::{MemoryRateLimitStore, RateLimitStore, WindowState};

/// A limit of `limit` requests per `window` for one route category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub category: &'static str,
    pub limit: u64,
    pub window: Duration,
}

impl RateLimitPolicy {
    pub fn new(category: &'static str, limit: u64, window: Duration) -> Self {
        Self {
            category,
            limit,
            window,
        }
    }
}

/// Result of counting one request against a policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u64,
    pub limit: u64,
    pub reset: DateTime<Utc>,
}

impl RateLimitDecision {
    fn from_window(state: WindowState, limit: u64) -> Self {
        Self {
            allowed: state.count <= limit,
            remaining: limit.saturating_sub(state.count),
            limit,
            reset: state.reset_at,
        }
    }

    /// Whole seconds until the window resets, at least 1.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000).max(1)
    }
}

/// Fixed-window rate limiter with a shared primary store and an in-process
/// fallback.
///
/// When the primary store errors the request is counted in the fallback
/// instead. Cross-instance accuracy is lost for the duration of the outage;
/// traffic is never blocked because the shared store is down.
pub struct AdmissionController {
    primary: Option<Arc<dyn RateLimitStore>>,
    fallback: Arc<MemoryRateLimitStore>,
}

impl AdmissionController {
    /// Creates a controller. With no `primary` every request is counted in
    /// `fallback`.
    pub fn new(
        primary: Option<Arc<dyn RateLimitStore>>,
        fallback: Arc<MemoryRateLimitStore>,
    ) -> Self {
        Self { primary, fallback }
    }

    /// In-process controller with a fresh fallback store.
    pub fn in_memory() -> Self {
        Self::new(None, Arc::new(MemoryRateLimitStore::new()))
    }

    pub fn fallback(&self) -> &Arc<MemoryRateLimitStore> {
        &self.fallback
    }

    /// Name of the store currently used for counting.
    pub fn backend_name(&self) -> &'static str {
        self.primary
            .as_ref()
            .map_or(self.fallback.name(), |store| store.name())
    }

    /// True when the primary store is reachable, or none is configured.
    pub async fn primary_healthy(&self) -> bool {
        match &self.primary {
            Some(store) => store.health_check().await,
            None => true,
        }
    }

    /// Counts one request from `identity` against `policy`.
    pub async fn check_rate_limit(&self, identity: &str, policy: &RateLimitPolicy) -> RateLimitDecision {
        self.check_rate_limit_at(identity, policy, Utc::now()).await
    }

    /// [`Self::check_rate_limit`] evaluated at a fixed instant.
    pub async fn check_rate_limit_at(
        &self,
        identity: &str,
        policy: &RateLimitPolicy,
        now: DateTime<Utc>,
    ) -> RateLimitDecision {
        let state = match &self.primary {
            Some(store) => {
                match store
                    .increment(policy.category, identity, policy.window, now)
                    .await
                {
                    Ok(state) => state,
                    Err(e) => {
                        warn!(
                            store = store.name(),
                            error = %e,
                            "Rate limit store unavailable, using in-process counters"
                        );
                        counter!("rate_limit_fallback_total").increment(1);
                        self.fallback
                            .hit(policy.category, identity, policy.window, now)
                    }
                }
            }
            None => self
                .fallback
                .hit(policy.category, identity, policy.window, now),
        };

        let decision = RateLimitDecision::from_window(state, policy.limit);

        if !decision.allowed {
            counter!("rate_limited_total", "category" => policy.category).increment(1);
        }

        decision
    }
}
