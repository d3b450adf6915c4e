//! Verifier
//!
//! Runs one bounded-time probe and records the outcome in the resource cache.
//! Whatever happens (success, failure or timeout) the cache entry for the
//! probed locator is written before the outcome is returned.

use crate::error::ProbeFailure;
use crate::prober::{millis, Dimensions, Prober};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use vista_cache::ResourceCache;

/// Extra time granted to a prober past its own deadline before the local
/// timer forces a timeout
pub const PROBE_GRACE: Duration = Duration::from_millis(50);

/// Result of one probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationOutcome {
    /// Probed locator
    pub locator: String,
    /// Fetched in time with non-zero dimensions
    pub success: bool,
    /// Wall time spent on the probe
    pub elapsed_ms: u64,
    /// Dimensions on success
    pub dimensions: Option<Dimensions>,
    /// Failure reason otherwise
    pub failure: Option<ProbeFailure>,
}

impl VerificationOutcome {
    /// Check if the failure is worth a re-probe
    #[inline]
    #[must_use]
    pub fn is_transient_failure(&self) -> bool {
        self.failure.as_ref().is_some_and(ProbeFailure::is_transient)
    }
}

/// Probes locators and memoizes every outcome
#[derive(Debug, Clone)]
pub struct Verifier {
    prober: Arc<dyn Prober>,
    cache: Arc<ResourceCache>,
}

impl Verifier {
    /// Create verifier
    #[inline]
    #[must_use]
    pub fn new(prober: Arc<dyn Prober>, cache: Arc<ResourceCache>) -> Self {
        Self { prober, cache }
    }

    /// Cache written by this verifier
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &Arc<ResourceCache> {
        &self.cache
    }

    /// Probe one locator
    ///
    /// Settles within `timeout + PROBE_GRACE`. Never fails: errors are
    /// reported in the outcome.
    pub async fn probe(&self, locator: &str, timeout: Duration) -> VerificationOutcome {
        let started = Instant::now();
        let deadline = timeout + PROBE_GRACE;

        let result = match tokio::time::timeout(deadline, self.prober.fetch(locator, timeout)).await
        {
            Ok(Ok(dimensions)) if dimensions.is_empty() => Err(ProbeFailure::InvalidResource {
                width: dimensions.width,
                height: dimensions.height,
            }),
            Ok(result) => result,
            Err(_) => Err(ProbeFailure::Timeout {
                timeout_ms: millis(timeout),
            }),
        };

        let elapsed_ms = millis(started.elapsed());
        let success = result.is_ok();
        self.cache.set(locator, success, elapsed_ms);

        match &result {
            Ok(dims) => tracing::trace!(
                locator,
                width = dims.width,
                height = dims.height,
                elapsed_ms,
                "probe succeeded"
            ),
            Err(failure) => tracing::trace!(
                locator,
                kind = ?failure.kind(),
                %failure,
                elapsed_ms,
                "probe failed"
            ),
        }

        let (dimensions, failure) = match result {
            Ok(dims) => (Some(dims), None),
            Err(failure) => (None, Some(failure)),
        };
        VerificationOutcome {
            locator: locator.to_string(),
            success,
            elapsed_ms,
            dimensions,
            failure,
        }
    }
}
