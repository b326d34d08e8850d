//! Cached responses and cache statistics

use crate::keys::CacheKey;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// A handler result as it is stored and replayed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedResponse {
    pub status: u16,
    pub body: serde_json::Value,
}

impl CachedResponse {
    #[must_use]
    pub fn ok(body: serde_json::Value) -> Self {
        Self { status: 200, body }
    }

    /// Only successful responses are ever stored
    #[must_use]
    pub const fn is_cacheable(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Stored entry; immutable once written, replaced wholesale on rewrite
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub key: CacheKey,
    /// Collection whose writes invalidate this entry
    pub collection: String,
    pub response: Arc<CachedResponse>,
    /// Creation timestamp (Unix milliseconds)
    pub created_at_ms: u64,
    pub ttl: Duration,
    /// Insertion order, used to pick eviction victims
    pub(crate) sequence: u64,
}

impl CacheEntry {
    #[must_use]
    pub fn expires_at_ms(&self) -> u64 {
        let ttl_ms = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);
        self.created_at_ms.saturating_add(ttl_ms)
    }

    /// Served strictly before `created_at + ttl`
    #[must_use]
    pub fn is_live_at(&self, now_ms: u64) -> bool {
        now_ms < self.expires_at_ms()
    }

    #[must_use]
    pub fn remaining_ttl(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.expires_at_ms().saturating_sub(now_ms))
    }
}

/// Point-in-time view of the store
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub expired: usize,
    pub active: usize,
    pub utilization_percent: f64,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub invalidations: u64,
}

impl CacheStats {
    /// Share of lookups answered from the store, 0 before any lookup
    #[must_use]
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
