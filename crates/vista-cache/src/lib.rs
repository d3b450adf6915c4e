//! Vista Resource Cache
//!
//! In-memory memo of image verification results keyed by canonical locator.
//!
//! - Bounded: never more than `max_cache_entries`; the oldest entry is
//!   evicted on overflow
//! - TTL: entries older than `cache_ttl_ms` read as misses and are removed
//! - Observable: hit/miss counters and working/failed tallies
//!
//! Failures are cached as well as successes, so a dead locator is not
//! re-probed inside the TTL window.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod stats;

pub use cache::{CacheEntry, ResourceCache, MIN_CLEANUP_INTERVAL};
pub use stats::{CacheDebugInfo, CacheStats};
