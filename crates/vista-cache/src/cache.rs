//! Verification result cache
//!
//! Memoizes "is this canonical locator retrievable" with a TTL and a hard
//! entry bound. Entries are kept in insertion order (an overwrite moves the
//! entry to the back), so the front of the map is always the entry with the
//! oldest `tested_at` and eviction is O(1) to find.

use crate::stats::{CacheDebugInfo, CacheStats};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use vista_config::ConfigService;
use vista_locator::{canonicalize, CanonicalKey};

/// Shortest sweep period accepted by [`ResourceCache::spawn_cleanup`]
pub const MIN_CLEANUP_INTERVAL: Duration = Duration::from_millis(1);

/// One memoized verification result
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    /// Canonical key
    pub key: CanonicalKey,
    /// Whether the probe succeeded
    pub verified: bool,
    /// Wall-clock time of the probe
    pub tested_at: DateTime<Utc>,
    /// How long the probe took
    pub probe_duration_ms: u64,
    /// Monotonic insertion time used for TTL checks
    #[serde(skip)]
    inserted: Instant,
}

impl CacheEntry {
    #[inline]
    fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        now.saturating_duration_since(self.inserted) > ttl
    }

    /// Age of the entry
    #[inline]
    #[must_use]
    pub fn age(&self) -> Duration {
        self.inserted.elapsed()
    }
}

/// Bounded, TTL-based verification cache
///
/// Capacity and TTL are read from the [`ConfigService`] on every call, so a
/// config update applies to the next operation.
#[derive(Debug)]
pub struct ResourceCache {
    config: Arc<ConfigService>,
    entries: Mutex<IndexMap<CanonicalKey, CacheEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResourceCache {
    /// Create empty cache sized by `config`
    #[must_use]
    pub fn new(config: Arc<ConfigService>) -> Self {
        Self {
            config,
            entries: Mutex::new(IndexMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up a locator
    ///
    /// Returns `None` on miss or expiry (expired entries are removed),
    /// `Some(verified)` on hit.
    pub fn get(&self, locator: &str) -> Option<bool> {
        let key = canonicalize(locator);
        let ttl = self.config.cache_settings().ttl;
        let now = Instant::now();

        let mut entries = self.entries.lock();
        let verified = match entries.get(&key) {
            Some(entry) if !entry.is_expired(ttl, now) => Some(entry.verified),
            Some(_) => {
                entries.shift_remove(&key);
                tracing::trace!(%key, "cache entry expired");
                None
            }
            None => None,
        };
        drop(entries);

        if let Some(verified) = verified {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(%key, verified, "cache hit");
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(%key, "cache miss");
        }
        verified
    }

    /// Insert or overwrite the result for a locator
    ///
    /// At capacity, the single oldest entry is evicted first.
    pub fn set(&self, locator: &str, verified: bool, probe_duration_ms: u64) {
        let key = canonicalize(locator);
        let max_entries = self.config.cache_settings().max_entries.max(1);

        let mut entries = self.entries.lock();
        entries.shift_remove(&key);
        while entries.len() >= max_entries {
            if let Some((evicted, _)) = entries.shift_remove_index(0) {
                tracing::debug!(key = %evicted, "evicted oldest cache entry");
            }
        }

        entries.insert(
            key.clone(),
            CacheEntry {
                key,
                verified,
                tested_at: Utc::now(),
                probe_duration_ms,
                inserted: Instant::now(),
            },
        );
    }

    /// Remove every entry past its TTL
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        let ttl = self.config.cache_settings().ttl;
        let now = Instant::now();

        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired(ttl, now));
        let removed = before - entries.len();
        drop(entries);

        if removed > 0 {
            tracing::debug!(removed, "cleaned up expired cache entries");
        }
        removed
    }

    /// Drop all entries and reset hit/miss counters
    pub fn clear(&self) {
        self.entries.lock().clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        tracing::debug!("cache cleared");
    }

    /// Number of stored entries (including not yet swept expired ones)
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Check if cache is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        let entries = self.entries.lock();
        let working_count = entries.values().filter(|e| e.verified).count();
        let size = entries.len();
        drop(entries);

        CacheStats::new(
            size,
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            working_count,
        )
    }

    /// Snapshot of all entries, oldest first
    #[must_use]
    pub fn entries(&self) -> Vec<CacheEntry> {
        self.entries.lock().values().cloned().collect()
    }

    /// Statistics plus the limits currently in force
    #[must_use]
    pub fn debug_info(&self) -> CacheDebugInfo {
        let settings = self.config.cache_settings();
        CacheDebugInfo {
            stats: self.stats(),
            max_entries: settings.max_entries,
            ttl_ms: u64::try_from(settings.ttl.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Sweep expired entries every `interval` on the current tokio runtime
    ///
    /// The task holds a weak reference and exits once the cache is dropped.
    /// Intervals below [`MIN_CLEANUP_INTERVAL`] are raised to it.
    #[must_use]
    pub fn spawn_cleanup(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let cache: Weak<Self> = Arc::downgrade(self);
        let period = interval.max(MIN_CLEANUP_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(strong) = cache.upgrade() else {
                    break;
                };
                strong.cleanup_expired();
            }
        })
    }
}
