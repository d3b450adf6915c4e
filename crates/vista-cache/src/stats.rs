//! Cache statistics

use serde::Serialize;

/// Statistics for cache performance monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    /// Number of entries in cache
    pub size: usize,
    /// Lookups answered from cache
    pub hits: u64,
    /// Lookups that missed or found an expired entry
    pub misses: u64,
    /// `hits / (hits + misses) * 100`, zero before any lookup
    pub hit_rate_percent: f64,
    /// Entries recording a retrievable locator
    pub working_count: usize,
    /// Entries recording a failed locator
    pub failed_count: usize,
}

impl CacheStats {
    pub(crate) fn new(size: usize, hits: u64, misses: u64, working_count: usize) -> Self {
        let total = hits + misses;
        #[allow(clippy::cast_precision_loss)]
        let hit_rate_percent = if total > 0 {
            hits as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        Self {
            size,
            hits,
            misses,
            hit_rate_percent,
            working_count,
            failed_count: size - working_count,
        }
    }
}

/// Statistics plus current limits, for debug displays
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheDebugInfo {
    /// Current statistics
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Eviction threshold in force
    pub max_entries: usize,
    /// TTL in force
    pub ttl_ms: u64,
}
