//! Batch resolver
//!
//! Resolves each locator to a working variant by walking its
//! [`ProxyCascade`] one candidate at a time, and resolves batches in chunks
//! of bounded concurrency.
//!
//! # Per-locator flow
//!
//! ```text
//! for candidate in cascade (lazy):
//!     placeholder      → remember the first one, never probe
//!     cache hit true   → done
//!     cache hit false  → next candidate
//!     cache miss       → probe (retry transient failures) → done or next
//! ```

use crate::cascade::{CandidateKind, ProxyCascade};
use crate::report::{percent, AttemptCounts, BatchReport, LoadMethod, Resolution};
use futures::stream::{FuturesUnordered, StreamExt};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use vista_cache::ResourceCache;
use vista_config::{ConfigService, ResolverConfig};
use vista_locator::UnwrapRegistry;
use vista_probe::{Prober, Verifier};

/// Progress callback, receives a percentage in `[0, 100]`
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// Per-batch options
#[derive(Clone, Default)]
pub struct BatchOptions {
    /// Resolutions in flight at once; `None` uses `max_concurrent`
    pub concurrency_limit: Option<usize>,
    /// Called after every completed resolution
    pub on_progress: Option<ProgressFn>,
}

impl BatchOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With concurrency limit
    #[inline]
    #[must_use]
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = Some(limit);
        self
    }

    /// With progress callback
    #[must_use]
    pub fn with_progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }
}

impl Debug for BatchOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchOptions")
            .field("concurrency_limit", &self.concurrency_limit)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

/// Resolves locators to working variants
#[derive(Debug, Clone)]
pub struct BatchResolver {
    config: Arc<ConfigService>,
    verifier: Verifier,
    registry: Arc<UnwrapRegistry>,
}

impl BatchResolver {
    /// Create resolver
    ///
    /// The cache is the one the verifier writes to.
    #[must_use]
    pub fn new(config: Arc<ConfigService>, verifier: Verifier, registry: UnwrapRegistry) -> Self {
        Self {
            config,
            verifier,
            registry: Arc::new(registry),
        }
    }

    /// Create resolver with a fresh cache and the built-in unwrap rules
    #[must_use]
    pub fn with_prober(config: Arc<ConfigService>, prober: Arc<dyn Prober>) -> Self {
        let cache = Arc::new(ResourceCache::new(config.clone()));
        let verifier = Verifier::new(prober, cache);
        Self::new(config, verifier, UnwrapRegistry::with_defaults())
    }

    /// Shared verification cache
    #[inline]
    #[must_use]
    pub fn cache(&self) -> &Arc<ResourceCache> {
        self.verifier.cache()
    }

    /// Shared configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &Arc<ConfigService> {
        &self.config
    }

    /// Resolve one locator to a working variant
    ///
    /// Returns `None` when neither the original nor any real cascade
    /// candidate is retrievable.
    pub async fn resolve_one(&self, locator: &str, entity_name: Option<&str>) -> Option<String> {
        self.resolve_one_detailed(locator, entity_name).await.working
    }

    /// Resolve one locator and report how it was resolved
    pub async fn resolve_one_detailed(
        &self,
        locator: &str,
        entity_name: Option<&str>,
    ) -> Resolution {
        let config = self.config.config();
        let cascade = ProxyCascade::from_config(&config, Arc::clone(&self.registry));
        let cache = self.cache();

        let mut counts = AttemptCounts::default();
        let mut placeholder = None;

        for candidate in cascade.candidates(locator, entity_name) {
            if candidate.is_synthetic() {
                if placeholder.is_none() {
                    placeholder = Some(candidate.locator);
                }
                continue;
            }

            let is_original = candidate.kind == CandidateKind::Original;
            let working = if let Some(verified) = cache.get(&candidate.locator) {
                if config.debug_enabled {
                    tracing::debug!(
                        locator = %candidate.locator,
                        kind = ?candidate.kind,
                        verified,
                        "candidate served from cache"
                    );
                }
                verified
            } else {
                if is_original {
                    counts.original_probes += 1;
                } else {
                    counts.proxy_probes += 1;
                }
                self.probe_with_retry(&candidate.locator, candidate.kind, &config)
                    .await
            };

            if working {
                counts.original_working = is_original;
                return Resolution {
                    original: locator.to_string(),
                    working: Some(candidate.locator),
                    method: if is_original {
                        LoadMethod::Original
                    } else {
                        LoadMethod::Proxy
                    },
                    placeholder: None,
                    counts,
                };
            }
        }

        if config.debug_enabled {
            tracing::debug!(locator, "no working candidate");
        }
        Resolution {
            original: locator.to_string(),
            working: None,
            method: LoadMethod::Fallback,
            placeholder,
            counts,
        }
    }

    /// Probe a candidate, re-probing transient failures per the retry policy
    async fn probe_with_retry(
        &self,
        locator: &str,
        kind: CandidateKind,
        config: &ResolverConfig,
    ) -> bool {
        let timeout = config.probe_timeout();
        let mut attempt = 0;
        loop {
            let outcome = self.verifier.probe(locator, timeout).await;
            if config.debug_enabled {
                tracing::debug!(
                    locator,
                    ?kind,
                    attempt,
                    success = outcome.success,
                    elapsed_ms = outcome.elapsed_ms,
                    failure = ?outcome.failure,
                    "probed candidate"
                );
            }

            if outcome.success {
                return true;
            }
            if attempt >= config.retry_attempts || !outcome.is_transient_failure() {
                return false;
            }
            attempt += 1;
            tokio::time::sleep(config.retry_delay()).await;
        }
    }

    /// Resolve a batch of locators
    ///
    /// Locators are processed in chunks of the concurrency limit; each chunk
    /// runs concurrently in the calling task and completes before the next
    /// starts. Results keep input order.
    pub async fn resolve_batch(
        &self,
        locators: &[String],
        entity_name: Option<&str>,
        options: BatchOptions,
    ) -> BatchReport {
        let started = Instant::now();
        let total = locators.len();
        if total == 0 {
            return BatchReport::default();
        }

        let limit = options
            .concurrency_limit
            .unwrap_or_else(|| self.config.config().max_concurrent)
            .max(1);
        tracing::info!(total, limit, entity = entity_name, "resolving batch");

        let mut results: Vec<Option<Resolution>> = vec![None; total];
        let mut completed = 0;

        for (chunk_index, chunk) in locators.chunks(limit).enumerate() {
            let offset = chunk_index * limit;
            let mut in_flight: FuturesUnordered<_> = chunk
                .iter()
                .enumerate()
                .map(|(i, locator)| async move {
                    (offset + i, self.resolve_one_detailed(locator, entity_name).await)
                })
                .collect();

            while let Some((index, resolution)) = in_flight.next().await {
                results[index] = Some(resolution);
                completed += 1;
                if let Some(on_progress) = &options.on_progress {
                    on_progress(percent(completed, total));
                }
            }
        }

        let resolutions: Vec<Resolution> = results.into_iter().flatten().collect();
        let report = BatchReport::from_resolutions(&resolutions, millis(started.elapsed()));

        tracing::info!(
            working = report.working_locators.len(),
            failed = report.failed_locators.len(),
            original_attempts = report.stats.original_attempts,
            proxy_attempts = report.stats.proxy_attempts,
            elapsed_ms = report.stats.total_processing_time_ms,
            "batch resolved"
        );
        report
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use vista_probe::{Dimensions, ProbeFailure};
    use vista_test_utils::{proxied, services, test_config, ScriptedProber, TEST_PLACEHOLDER};

    const GOOD: &str = "https://good.example/a.jpg";
    const DEAD: &str = "https://dead.example/a.jpg";

    fn resolver(prober: &Arc<ScriptedProber>, config: ResolverConfig) -> BatchResolver {
        let (config, cache) = services(config);
        let verifier = Verifier::new(prober.clone(), cache);
        BatchResolver::new(config, verifier, UnwrapRegistry::with_defaults())
    }

    #[tokio::test]
    async fn original_works() {
        let prober = ScriptedProber::new().succeed(GOOD).into_arc();
        let resolver = resolver(&prober, test_config());

        let resolution = resolver.resolve_one_detailed(GOOD, Some("Louvre")).await;
        assert_eq!(resolution.working.as_deref(), Some(GOOD));
        assert_eq!(resolution.method, LoadMethod::Original);
        assert_eq!(resolution.placeholder, None);
        assert_eq!(prober.probe_log(), vec![GOOD]);
    }

    #[tokio::test]
    async fn proxy_rescues_dead_original() {
        let prober = ScriptedProber::new().succeed(&proxied(DEAD)).into_arc();
        let resolver = resolver(&prober, test_config());

        let resolution = resolver.resolve_one_detailed(DEAD, None).await;
        assert_eq!(resolution.working, Some(proxied(DEAD)));
        assert_eq!(resolution.method, LoadMethod::Proxy);
        assert_eq!(prober.probe_log(), vec![DEAD.to_string(), proxied(DEAD)]);
    }

    #[tokio::test]
    async fn exhausted_cascade_offers_placeholder_without_probing_it() {
        let prober = ScriptedProber::new().into_arc();
        let resolver = resolver(&prober, test_config());

        let resolution = resolver.resolve_one_detailed(DEAD, Some("Louvre")).await;
        assert_eq!(resolution.working, None);
        assert_eq!(resolution.method, LoadMethod::Fallback);
        assert_eq!(
            resolution.placeholder,
            Some(format!("{TEST_PLACEHOLDER}Louvre"))
        );
        assert!(prober
            .probe_log()
            .iter()
            .all(|l| !l.starts_with(TEST_PLACEHOLDER)));
    }

    #[tokio::test]
    async fn cached_success_skips_probe() {
        let prober = ScriptedProber::new().into_arc();
        let resolver = resolver(&prober, test_config());
        resolver.cache().set(GOOD, true, 5);

        assert_eq!(resolver.resolve_one(GOOD, None).await.as_deref(), Some(GOOD));
        assert_eq!(prober.probe_count(), 0);
    }

    #[tokio::test]
    async fn cached_failure_skips_original_probe() {
        let prober = ScriptedProber::new().succeed(&proxied(DEAD)).into_arc();
        let resolver = resolver(&prober, test_config());
        resolver.cache().set(DEAD, false, 5);

        let resolution = resolver.resolve_one_detailed(DEAD, None).await;
        assert_eq!(resolution.working, Some(proxied(DEAD)));
        assert_eq!(prober.probe_log(), vec![proxied(DEAD)]);
        assert_eq!(resolution.counts.original_probes, 0);
        assert_eq!(resolution.counts.proxy_probes, 1);
    }

    #[tokio::test]
    async fn every_probed_candidate_is_cached() {
        let prober = ScriptedProber::new().into_arc();
        let resolver = resolver(&prober, test_config());

        resolver.resolve_one(DEAD, None).await;
        assert_eq!(resolver.cache().get(DEAD), Some(false));
        assert_eq!(resolver.cache().get(&proxied(DEAD)), Some(false));
    }

    #[tokio::test(start_paused = true)]
    async fn transient_failures_are_retried() {
        let prober = ScriptedProber::new()
            .sequence(
                GOOD,
                vec![
                    Err(ProbeFailure::network("reset")),
                    Ok(Dimensions::new(10, 10)),
                ],
            )
            .into_arc();
        let resolver = resolver(&prober, test_config().with_retry(2, 100));

        let resolution = resolver.resolve_one_detailed(GOOD, None).await;
        assert_eq!(resolution.method, LoadMethod::Original);
        assert_eq!(prober.probes_of(GOOD), 2);
        assert_eq!(resolution.counts.original_probes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn content_failures_are_not_retried() {
        let prober = ScriptedProber::new()
            .fail(DEAD, ProbeFailure::InvalidResource { width: 0, height: 0 })
            .into_arc();
        let resolver = resolver(&prober, test_config().with_retry(3, 100));

        resolver.resolve_one(DEAD, None).await;
        assert_eq!(prober.probes_of(DEAD), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retry_gives_up_after_configured_attempts() {
        let prober = ScriptedProber::new().into_arc();
        let resolver = resolver(&prober, test_config().with_retry(2, 100));

        resolver.resolve_one(DEAD, None).await;
        assert_eq!(prober.probes_of(DEAD), 3);
    }

    #[tokio::test]
    async fn empty_batch() {
        let prober = ScriptedProber::new().into_arc();
        let resolver = resolver(&prober, test_config());
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();

        let report = resolver
            .resolve_batch(
                &[],
                Some("Louvre"),
                BatchOptions::new().with_progress(move |p| sink.lock().unwrap().push(p)),
            )
            .await;

        assert_eq!(report, BatchReport::default());
        assert_eq!(report.success_rate_percent, 0.0);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn progress_reaches_one_hundred() {
        let prober = ScriptedProber::new().with_default(Ok(Dimensions::new(1, 1))).into_arc();
        let resolver = resolver(&prober, test_config());
        let calls = Arc::new(Mutex::new(Vec::new()));
        let sink = calls.clone();
        let locators: Vec<String> = (0..4).map(|i| format!("https://a.example/{i}.jpg")).collect();

        resolver
            .resolve_batch(
                &locators,
                None,
                BatchOptions::new()
                    .with_concurrency_limit(3)
                    .with_progress(move |p| sink.lock().unwrap().push(p)),
            )
            .await;

        assert_eq!(*calls.lock().unwrap(), vec![25.0, 50.0, 75.0, 100.0]);
    }

    #[test]
    fn options_debug_hides_callback() {
        let options = BatchOptions::new().with_progress(|_| {});
        assert_eq!(
            format!("{options:?}"),
            "BatchOptions { concurrency_limit: None, on_progress: true }"
        );
    }
}
