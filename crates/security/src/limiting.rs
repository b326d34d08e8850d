//! Fixed-window rate limiting per identity and route class

use dashmap::DashMap;
use gatehouse_config::RateLimitPolicy;
use gatehouse_core::{GateError, RateStatus, RouteClass};
use std::time::Duration;
use tracing::debug;

/// Counter for one key in one window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateWindow {
    /// Window boundary (Unix milliseconds), a multiple of `window_ms`
    pub window_start: u64,
    /// Requests admitted in this window, never above `limit`
    pub count: u32,
    pub limit: u32,
    pub window_ms: u64,
}

impl RateWindow {
    #[must_use]
    pub const fn window_end(&self) -> u64 {
        self.window_start.saturating_add(self.window_ms)
    }

    fn status(&self, now_ms: u64) -> RateStatus {
        RateStatus {
            limit: self.limit,
            remaining: self.limit.saturating_sub(self.count),
            reset_after: Duration::from_millis(self.window_end().saturating_sub(now_ms)),
        }
    }
}

/// Rate limiter keyed by `(partition key, route class)`
///
/// Windows live in a sharded map, so unrelated keys never contend on one lock
/// and every update to the same key happens under that key's shard lock.
#[derive(Debug, Default)]
pub struct RateLimiter {
    windows: DashMap<(String, RouteClass), RateWindow>,
}

impl RateLimiter {
    /// Create a new rate limiter
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request and decide whether it is admitted
    ///
    /// A stored window older than the current boundary is replaced with a
    /// fresh one. A boundary earlier than the stored window (a clock that
    /// stepped backwards) keeps the stored window.
    pub fn check(
        &self,
        key: &str,
        class: RouteClass,
        policy: RateLimitPolicy,
        now_ms: u64,
    ) -> Result<RateStatus, GateError> {
        let window_ms = policy.window_ms.max(1);
        let boundary = now_ms - now_ms % window_ms;

        let fresh = RateWindow {
            window_start: boundary,
            count: 0,
            limit: policy.limit,
            window_ms,
        };

        let mut window = self
            .windows
            .entry((key.to_string(), class))
            .or_insert(fresh);

        if boundary > window.window_start {
            *window = fresh;
        }
        window.limit = policy.limit;

        if window.count >= window.limit {
            let status = window.status(now_ms);
            drop(window);
            debug!(key, %class, reset_ms = status.reset_after.as_millis() as u64, "rate limit exceeded");
            return Err(GateError::RateLimitExceeded {
                route_class: class,
                status,
            });
        }

        window.count += 1;
        Ok(window.status(now_ms))
    }

    /// Current window for a key, if one is stored
    #[must_use]
    pub fn window(&self, key: &str, class: RouteClass) -> Option<RateWindow> {
        self.windows
            .get(&(key.to_string(), class))
            .map(|window| *window)
    }

    /// Forget the window for one key
    pub fn reset(&self, key: &str, class: RouteClass) -> bool {
        self.windows.remove(&(key.to_string(), class)).is_some()
    }

    /// Drop windows that closed at or before `now_ms`, returning how many went
    pub fn sweep_expired(&self, now_ms: u64) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| window.window_end() > now_ms);
        before.saturating_sub(self.windows.len())
    }

    /// Clear all rate limit states
    pub fn clear(&self) {
        self.windows.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.windows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;

    const WINDOW: u64 = 15 * 60 * 1000;

    fn api() -> RateLimitPolicy {
        RateLimitPolicy::new(100, WINDOW)
    }

    #[test]
    fn test_exact_limit_then_reject() {
        let limiter = RateLimiter::new();
        let policy = RateLimitPolicy::new(5, WINDOW);

        for expected_remaining in (0..5).rev() {
            let status = limiter
                .check("source:10.0.0.1", RouteClass::Login, policy, 1_000)
                .unwrap();
            assert_eq!(status.remaining, expected_remaining);
            assert_eq!(status.limit, 5);
        }

        let err = limiter
            .check("source:10.0.0.1", RouteClass::Login, policy, 1_000)
            .unwrap_err();
        let status = err.rate_status().unwrap();
        assert_eq!(status.remaining, 0);
        assert_eq!(status.reset_after, Duration::from_millis(WINDOW - 1_000));
    }

    #[test]
    fn test_burst_of_105_yields_100_allows() {
        let limiter = RateLimiter::new();
        let results: Vec<_> = (0..105)
            .map(|i| limiter.check("user:1", RouteClass::Api, api(), i))
            .collect();

        let allowed = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(allowed, 100);
        for denied in results.iter().filter_map(|r| r.as_ref().err()) {
            assert_eq!(denied.rate_status().unwrap().remaining, 0);
        }
    }

    #[test]
    fn test_next_window_starts_fresh() {
        let limiter = RateLimiter::new();
        let policy = RateLimitPolicy::new(2, 1_000);
        let t0 = 5_000;

        limiter.check("k", RouteClass::Api, policy, t0).unwrap();
        limiter.check("k", RouteClass::Api, policy, t0).unwrap();
        assert!(limiter.check("k", RouteClass::Api, policy, t0).is_err());

        let status = limiter
            .check("k", RouteClass::Api, policy, t0 + 1_000 + 1)
            .unwrap();
        assert_eq!(status.remaining, 1);
        assert_eq!(limiter.window("k", RouteClass::Api).unwrap().count, 1);
    }

    #[test]
    fn test_keys_and_classes_are_independent() {
        let limiter = RateLimiter::new();
        let policy = RateLimitPolicy::new(1, WINDOW);

        limiter.check("user:1", RouteClass::Login, policy, 0).unwrap();
        assert!(limiter.check("user:1", RouteClass::Login, policy, 0).is_err());
        assert!(limiter.check("user:1", RouteClass::Api, policy, 0).is_ok());
        assert!(limiter.check("user:2", RouteClass::Login, policy, 0).is_ok());
    }

    #[test]
    fn test_clock_stepping_back_keeps_window() {
        let limiter = RateLimiter::new();
        let policy = RateLimitPolicy::new(1, 1_000);

        limiter.check("k", RouteClass::Api, policy, 10_500).unwrap();
        assert!(limiter.check("k", RouteClass::Api, policy, 9_500).is_err());
        assert_eq!(
            limiter.window("k", RouteClass::Api).unwrap().window_start,
            10_000
        );
    }

    #[test]
    fn test_sweep_removes_closed_windows() {
        let limiter = RateLimiter::new();
        let policy = RateLimitPolicy::new(10, 1_000);
        limiter.check("a", RouteClass::Api, policy, 100).unwrap();
        limiter.check("b", RouteClass::Api, policy, 1_100).unwrap();

        assert_eq!(limiter.sweep_expired(1_000), 1);
        assert!(limiter.window("a", RouteClass::Api).is_none());
        assert!(limiter.window("b", RouteClass::Api).is_some());
        assert!(limiter.reset("b", RouteClass::Api));
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_concurrent_same_key_never_overshoots() {
        let limiter = Arc::new(RateLimiter::new());
        let policy = RateLimitPolicy::new(50, WINDOW);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                std::thread::spawn(move || {
                    (0..20)
                        .filter(|_| limiter.check("shared", RouteClass::Api, policy, 0).is_ok())
                        .count()
                })
            })
            .collect();

        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 50);
    }

    proptest! {
        #[test]
        fn prop_never_more_than_limit_per_window(
            limit in 1u32..20,
            window_ms in 1u64..5_000,
            mut offsets in proptest::collection::vec(0u64..20_000, 1..200),
        ) {
            offsets.sort_unstable();
            let limiter = RateLimiter::new();
            let policy = RateLimitPolicy::new(limit, window_ms);
            let mut allowed_per_window = std::collections::BTreeMap::<u64, u32>::new();

            for now in offsets {
                if limiter.check("k", RouteClass::Api, policy, now).is_ok() {
                    *allowed_per_window.entry(now / window_ms).or_default() += 1;
                }
            }

            for count in allowed_per_window.values() {
                prop_assert!(*count <= limit);
            }
        }

        #[test]
        fn prop_window_start_never_rewinds(
            times in proptest::collection::vec(0u64..50_000, 1..100),
        ) {
            let limiter = RateLimiter::new();
            let policy = RateLimitPolicy::new(3, 1_000);
            let mut last_start = 0;

            for now in times {
                let _ = limiter.check("k", RouteClass::Api, policy, now);
                let start = limiter.window("k", RouteClass::Api).unwrap().window_start;
                prop_assert!(start >= last_start);
                last_start = start;
            }
        }
    }
}
