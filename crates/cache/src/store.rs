//! The response cache store

use crate::entry::{CacheEntry, CacheStats, CachedResponse};
use crate::keys::CacheKey;
use dashmap::DashMap;
use gatehouse_config::CacheSettings;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Keyed store of handler results for cacheable read routes
///
/// Entries are sharded by key. Expired entries are dropped when their key is
/// next looked up, or by [`ResponseCache::sweep_expired`].
///
/// Each collection carries a generation bumped on every invalidation. A
/// result computed against an older generation is never stored, so a read
/// that overlaps a write cannot repopulate the cache with pre-write data.
#[derive(Debug)]
pub struct ResponseCache {
    entries: DashMap<CacheKey, CacheEntry>,
    generations: DashMap<String, u64>,
    settings: CacheSettings,
    sequence: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
    invalidations: AtomicU64,
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(CacheSettings::default())
    }
}

impl ResponseCache {
    pub fn new(settings: CacheSettings) -> Self {
        Self {
            entries: DashMap::new(),
            generations: DashMap::new(),
            settings,
            sequence: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            invalidations: AtomicU64::new(0),
        }
    }

    /// TTL for a path: an explicit route TTL wins over the prefix table
    #[must_use]
    pub fn ttl_for(&self, path: &str, route_ttl: Option<Duration>) -> Duration {
        route_ttl.unwrap_or_else(|| self.settings.ttl_for(path))
    }

    /// Fetch a live entry, dropping it if it has expired
    pub fn lookup(&self, key: &CacheKey, now_ms: u64) -> Option<CacheEntry> {
        let live = self
            .entries
            .get(key)
            .map(|entry| (entry.is_live_at(now_ms), entry.clone()));

        match live {
            Some((true, entry)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            Some((false, _)) => {
                self.entries
                    .remove_if(key, |_, entry| !entry.is_live_at(now_ms));
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Current invalidation generation of a collection
    ///
    /// Read it before running a handler and pass it to
    /// [`ResponseCache::insert_at_generation`].
    #[must_use]
    pub fn generation(&self, collection: &str) -> u64 {
        self.generations.get(collection).map_or(0, |generation| *generation)
    }

    /// Store a handler result against the collection's current generation
    ///
    /// Non-2xx responses are refused and handed back unchanged.
    pub fn insert(
        &self,
        key: CacheKey,
        collection: impl Into<String>,
        response: CachedResponse,
        ttl: Duration,
        now_ms: u64,
    ) -> Result<CacheEntry, CachedResponse> {
        let collection = collection.into();
        let generation = self.generation(&collection);
        self.insert_at_generation(key, collection, response, ttl, now_ms, generation)
    }

    /// Store a handler result computed while `collection` was at `generation`
    ///
    /// Refused, and handed back, when the response is not 2xx or when the
    /// collection has been invalidated since `generation` was read.
    pub fn insert_at_generation(
        &self,
        key: CacheKey,
        collection: impl Into<String>,
        response: CachedResponse,
        ttl: Duration,
        now_ms: u64,
        generation: u64,
    ) -> Result<CacheEntry, CachedResponse> {
        if !response.is_cacheable() {
            debug!(key = %key, status = response.status, "not caching unsuccessful response");
            return Err(response);
        }

        let collection = collection.into();
        let entry = {
            // held across the store so an invalidation cannot slip in between
            let current = self.generations.entry(collection.clone()).or_insert(0);
            if *current != generation {
                debug!(
                    key = %key,
                    observed = generation,
                    current = *current,
                    "not caching result computed before an invalidation"
                );
                return Err(response);
            }

            let entry = CacheEntry {
                key: key.clone(),
                collection,
                response: Arc::new(response),
                created_at_ms: now_ms,
                ttl,
                sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
            };
            self.entries.insert(key, entry.clone());
            entry
        };

        self.enforce_capacity(now_ms);
        Ok(entry)
    }

    /// Drop expired entries first, then the oldest, until within capacity
    ///
    /// Finding the oldest is a linear scan per eviction.
    fn enforce_capacity(&self, now_ms: u64) {
        let max = self.settings.max_entries.max(1);
        if self.entries.len() <= max {
            return;
        }

        self.sweep_expired(now_ms);
        while self.entries.len() > max {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.sequence)
                .map(|entry| entry.key().clone());
            let Some(oldest) = oldest else { break };

            if self.entries.remove(&oldest).is_some() {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = %oldest, "evicted oldest cache entry");
            }
        }
    }

    /// Remove every entry derived from a collection and bump its generation
    pub fn invalidate_collection(&self, collection: &str) -> usize {
        let mut generation = self.generations.entry(collection.to_string()).or_insert(0);
        *generation += 1;

        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.collection != collection);
        let removed = before.saturating_sub(self.entries.len());
        drop(generation);

        if removed > 0 {
            self.invalidations
                .fetch_add(removed as u64, Ordering::Relaxed);
        }
        debug!(collection, removed, "invalidated collection");
        removed
    }

    /// Remove one entry
    pub fn remove(&self, key: &CacheKey) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn clear_all(&self) -> usize {
        let removed = self.entries.len();
        self.entries.clear();
        removed
    }

    /// Drop entries past their TTL, returning how many went
    pub fn sweep_expired(&self, now_ms: u64) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.is_live_at(now_ms));
        before.saturating_sub(self.entries.len())
    }

    #[must_use]
    pub fn stats(&self, now_ms: u64) -> CacheStats {
        let size = self.entries.len();
        let expired = self
            .entries
            .iter()
            .filter(|entry| !entry.is_live_at(now_ms))
            .count();
        let max_size = self.settings.max_entries;
        let utilization_percent = if max_size == 0 {
            0.0
        } else {
            (size as f64 / max_size as f64 * 10_000.0).round() / 100.0
        };

        CacheStats {
            size,
            max_size,
            expired,
            active: size.saturating_sub(expired),
            utilization_percent,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn settings(&self) -> &CacheSettings {
        &self.settings
    }
}
