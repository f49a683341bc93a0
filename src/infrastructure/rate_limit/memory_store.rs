//! In-process fixed-window counters.

use super::service::{
    RateLimitStore, RateLimitStoreResult, WindowState, from_millis, window_millis,
    window_start_ms,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;

#[derive(Debug, Clone, Copy)]
struct Window {
    start_ms: i64,
    reset_ms: i64,
    count: u64,
}

/// Counter store held in process memory.
///
/// Increments for one key are serialized by the map's entry lock, so
/// parallel requests from one client are never undercounted. Counters are
/// lost on restart. The store is an ordinary value: create one per
/// application (or per test) and inject it.
#[derive(Debug, Default)]
pub struct MemoryRateLimitStore {
    windows: DashMap<String, Window>,
}

impl MemoryRateLimitStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts one request and returns the resulting window state.
    pub fn hit(
        &self,
        category: &str,
        identity: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> WindowState {
        let start_ms = window_start_ms(now, window);
        let reset_ms = start_ms.saturating_add(window_millis(window));

        let mut entry = self
            .windows
            .entry(format!("{category}:{identity}"))
            .or_insert(Window {
                start_ms,
                reset_ms,
                count: 0,
            });

        if entry.start_ms != start_ms {
            *entry = Window {
                start_ms,
                reset_ms,
                count: 0,
            };
        }
        entry.count += 1;

        WindowState {
            count: entry.count,
            reset_at: from_millis(entry.reset_ms),
        }
    }

    /// Drops every counter.
    pub fn reset(&self) {
        self.windows.clear();
    }

    /// Drops counters whose window has ended at `now`. Returns how many were
    /// removed.
    pub fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let now_ms = now.timestamp_millis();
        let before = self.windows.len();
        self.windows.retain(|_, window| window.reset_ms > now_ms);
        before.saturating_sub(self.windows.len())
    }

    /// Number of tracked keys.
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    /// Spawns a task that purges expired counters every `interval`.
    ///
    /// Abort the returned handle to stop it.
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = self.purge_expired(Utc::now());
                if removed > 0 {
                    debug!(removed, "Purged expired rate limit windows");
                }
            }
        })
    }
}

#[async_trait]
impl RateLimitStore for MemoryRateLimitStore {
    async fn increment(
        &self,
        category: &str,
        identity: &str,
        window: Duration,
        now: DateTime<Utc>,
    ) -> RateLimitStoreResult<WindowState> {
        Ok(self.hit(category, identity, window, now))
    }

    fn name(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINUTE: Duration = Duration::from_secs(60);

    fn at(ms: i64) -> DateTime<Utc> {
        from_millis(ms)
    }

    #[test]
    fn test_counts_within_window() {
        let store = MemoryRateLimitStore::new();

        assert_eq!(store.hit("shorten", "1.2.3.4", MINUTE, at(1_000)).count, 1);
        assert_eq!(store.hit("shorten", "1.2.3.4", MINUTE, at(2_000)).count, 2);
        let state = store.hit("shorten", "1.2.3.4", MINUTE, at(59_999));
        assert_eq!(state.count, 3);
        assert_eq!(state.reset_at, at(60_000));
    }

    #[test]
    fn test_new_window_resets_count() {
        let store = MemoryRateLimitStore::new();
        store.hit("shorten", "a", MINUTE, at(1_000));
        store.hit("shorten", "a", MINUTE, at(2_000));

        let state = store.hit("shorten", "a", MINUTE, at(60_000));
        assert_eq!(state.count, 1);
        assert_eq!(state.reset_at, at(120_000));
    }

    #[test]
    fn test_keys_are_independent() {
        let store = MemoryRateLimitStore::new();
        store.hit("shorten", "a", MINUTE, at(0));

        assert_eq!(store.hit("shorten", "b", MINUTE, at(0)).count, 1);
        assert_eq!(store.hit("redirect", "a", MINUTE, at(0)).count, 1);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_reset_and_purge() {
        let store = MemoryRateLimitStore::new();
        store.hit("shorten", "a", MINUTE, at(0));
        store.hit("shorten", "b", Duration::from_secs(600), at(0));

        assert_eq!(store.purge_expired(at(60_000)), 1);
        assert_eq!(store.len(), 1);

        store.reset();
        assert!(store.is_empty());
    }

    #[test]
    fn test_parallel_increments_are_not_lost() {
        let store = Arc::new(MemoryRateLimitStore::new());
        let now = at(5_000);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || {
                    for _ in 0..250 {
                        store.hit("redirect", "same", MINUTE, now);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.hit("redirect", "same", MINUTE, now).count, 2_001);
    }

    #[tokio::test]
    async fn test_trait_increment() {
        let store = MemoryRateLimitStore::new();
        let state = store.increment("shorten", "a", MINUTE, at(0)).await.unwrap();

        assert_eq!(state.count, 1);
        assert_eq!(store.name(), "memory");
        assert!(store.health_check().await);
    }
}
