//! Bounded, TTL-aware memo of accepted validation outcomes.
//!
//! Keyed by the exact raw token string and backed by an [`LruCache`] behind
//! a mutex, since a hit has to update recency.
//!
//! Entries are never served past their own `expires_at`; a stale entry
//! found on lookup is removed and reported as stale.

use crate::outcome::ValidationOutcome;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Default number of cached outcomes.
pub const DEFAULT_TOKEN_CACHE_SIZE: usize = 1000;

/// A cached outcome with its lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub outcome: Arc<ValidationOutcome>,
    /// Unix epoch seconds at insertion.
    pub inserted_at: i64,
    /// Last instant (inclusive, Unix epoch seconds) the entry may be served.
    pub expires_at: i64,
}

/// Result of a cache lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLookup {
    Hit(CacheEntry),
    Miss,
    /// Entry existed but had expired; it has been removed.
    Stale,
    /// Caching is disabled (capacity 0).
    Disabled,
}

impl CacheLookup {
    /// Label used for metrics.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheLookup::Hit(_) => "hit",
            CacheLookup::Miss => "miss",
            CacheLookup::Stale => "stale",
            CacheLookup::Disabled => "disabled",
        }
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub stale_evictions: u64,
    pub capacity_evictions: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    stale_evictions: AtomicU64,
    capacity_evictions: AtomicU64,
}

/// Concurrent validation cache.
#[derive(Debug)]
pub struct ValidationCache {
    capacity: usize,
    /// `None` when caching is disabled.
    entries: Option<Mutex<LruCache<String, CacheEntry>>>,
    counters: Counters,
}

impl ValidationCache {
    /// Create a cache holding at most `capacity` entries; 0 disables it.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: NonZeroUsize::new(capacity).map(|bound| Mutex::new(LruCache::new(bound))),
            counters: Counters::default(),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    // Every LruCache operation leaves it consistent, so poisoning is ignored.
    fn lock(&self) -> Option<MutexGuard<'_, LruCache<String, CacheEntry>>> {
        self.entries
            .as_ref()
            .map(|entries| entries.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Look up `raw_token` at time `now`, refreshing its recency on a hit.
    pub fn lookup(&self, raw_token: &str, now: i64) -> CacheLookup {
        let Some(mut entries) = self.lock() else {
            return CacheLookup::Disabled;
        };

        let Some(entry) = entries.get(raw_token) else {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            return CacheLookup::Miss;
        };

        if now > entry.expires_at {
            let expires_at = entry.expires_at;
            entries.pop(raw_token);
            self.counters.stale_evictions.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(target: "bearer.auth.cache", expires_at, now, "Removed stale cache entry");
            return CacheLookup::Stale;
        }

        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        CacheLookup::Hit(entry.clone())
    }

    /// Store an accepted outcome until `expires_at`.
    ///
    /// Rejected outcomes and entries that are already expired are not
    /// stored. Returns whether the entry was stored.
    pub fn store(
        &self,
        raw_token: &str,
        outcome: Arc<ValidationOutcome>,
        now: i64,
        expires_at: i64,
    ) -> bool {
        if !outcome.accepted || expires_at < now {
            return false;
        }
        let Some(mut entries) = self.lock() else {
            return false;
        };

        let entry = CacheEntry {
            outcome,
            inserted_at: now,
            expires_at,
        };
        // `push` hands back the previous value for a re-stored key, or the
        // least recently used entry when it had to make room.
        if let Some((displaced, _)) = entries.push(raw_token.to_string(), entry) {
            if displaced != raw_token {
                self.counters.capacity_evictions.fetch_add(1, Ordering::Relaxed);
                tracing::debug!(target: "bearer.auth.cache", capacity = self.capacity, "Evicted least recently used entry");
            }
        }
        true
    }

    /// Whether `raw_token` is currently present (stale or not), without
    /// touching recency.
    #[must_use]
    pub fn contains(&self, raw_token: &str) -> bool {
        self.lock().is_some_and(|entries| entries.contains(raw_token))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().map_or(0, |entries| entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry. Counters are kept.
    pub fn clear(&self) {
        if let Some(mut entries) = self.lock() {
            entries.clear();
        }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            stale_evictions: self.counters.stale_evictions.load(Ordering::Relaxed),
            capacity_evictions: self.counters.capacity_evictions.load(Ordering::Relaxed),
        }
    }
}
