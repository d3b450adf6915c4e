//! Resolution results and batch reports

use serde::Serialize;

/// How a locator ended up being displayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadMethod {
    /// The original locator works
    Original,
    /// A cascade alternative works (unwrapped or proxied)
    Proxy,
    /// Nothing works; the caller should fall back to a placeholder
    Fallback,
}

/// Probe counters for one resolution
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AttemptCounts {
    pub(crate) original_probes: usize,
    pub(crate) proxy_probes: usize,
    pub(crate) original_working: bool,
}

/// Outcome of resolving one locator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    /// Locator as requested
    pub original: String,
    /// First candidate found retrievable
    pub working: Option<String>,
    /// Which stage produced `working`
    pub method: LoadMethod,
    /// First synthetic placeholder, set only when nothing works
    pub placeholder: Option<String>,
    #[serde(skip)]
    pub(crate) counts: AttemptCounts,
}

impl Resolution {
    /// Check if a working locator was found
    #[inline]
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.working.is_some()
    }
}

/// Aggregate probe counters for a batch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    /// Originals probed over the network
    pub original_attempts: usize,
    /// Cascade alternatives probed over the network
    pub proxy_attempts: usize,
    /// Originals found working, from cache or probe
    pub successful_originals: usize,
    /// Wall time of the whole batch
    pub total_processing_time_ms: u64,
}

/// Result of a batch resolution
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchReport {
    /// Working locators in input order
    pub working_locators: Vec<String>,
    /// Originals with no working candidate, in input order
    pub failed_locators: Vec<String>,
    /// `working / total * 100`, zero for an empty batch
    pub success_rate_percent: f64,
    /// Probe counters
    pub stats: BatchStats,
}

impl BatchReport {
    /// Build the report from per-locator resolutions in input order
    #[must_use]
    pub(crate) fn from_resolutions(resolutions: &[Resolution], elapsed_ms: u64) -> Self {
        let mut report = Self::default();
        for resolution in resolutions {
            match &resolution.working {
                Some(working) => report.working_locators.push(working.clone()),
                None => report.failed_locators.push(resolution.original.clone()),
            }
            report.stats.original_attempts += resolution.counts.original_probes;
            report.stats.proxy_attempts += resolution.counts.proxy_probes;
            if resolution.counts.original_working {
                report.stats.successful_originals += 1;
            }
        }
        report.success_rate_percent = percent(report.working_locators.len(), resolutions.len());
        report.stats.total_processing_time_ms = elapsed_ms;
        report
    }

    /// Number of locators in the batch
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.working_locators.len() + self.failed_locators.len()
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    part as f64 / total as f64 * 100.0
}
