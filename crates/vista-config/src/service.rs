//! Shared, runtime-mutable configuration
//!
//! Constructed once at startup and passed by `Arc` to the cache and resolver.
//! Readers take a copy of the config, so an update never changes a probe that
//! has already started.

use crate::config::{ConfigUpdate, Profile, ResolverConfig};
use crate::env;
use parking_lot::RwLock;
use std::time::Duration;

/// Cache sizing read on every cache operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Entry freshness window
    pub ttl: Duration,
    /// Eviction threshold
    pub max_entries: usize,
}

/// Configuration manager
///
/// Layering: defaults < profile < environment overrides < explicit updates.
#[derive(Debug)]
pub struct ConfigService {
    /// Defaults + profile + environment, restored by `reset_to_default`
    baseline: ResolverConfig,
    /// Live configuration
    current: RwLock<ResolverConfig>,
}

impl ConfigService {
    /// Create service from defaults and the development profile
    #[must_use]
    pub fn new() -> Self {
        Self::from_vars(&[])
    }

    /// Create service from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(&env::process_vars())
    }

    /// Create service from an explicit variable source
    #[must_use]
    pub fn from_vars(vars: &[(String, String)]) -> Self {
        let profile = env::profile_from_vars(vars);
        let mut baseline = ResolverConfig::default();
        log_rejected(baseline.apply(profile.overrides()));
        log_rejected(baseline.apply(env::update_from_vars(vars)));

        tracing::debug!(?profile, "configuration loaded");
        Self::with_config(baseline)
    }

    /// Create service with an exact baseline (no profile or environment)
    #[must_use]
    pub fn with_config(config: ResolverConfig) -> Self {
        Self {
            current: RwLock::new(config.clone()),
            baseline: config,
        }
    }

    /// Create service for a named profile without environment overrides
    #[must_use]
    pub fn for_profile(profile: Profile) -> Self {
        let mut baseline = ResolverConfig::default();
        log_rejected(baseline.apply(profile.overrides()));
        Self::with_config(baseline)
    }

    /// Current effective configuration (by value)
    #[must_use]
    pub fn config(&self) -> ResolverConfig {
        self.current.read().clone()
    }

    /// Cache TTL and capacity without copying the endpoint lists
    #[must_use]
    pub fn cache_settings(&self) -> CacheSettings {
        let config = self.current.read();
        CacheSettings {
            ttl: config.cache_ttl(),
            max_entries: config.max_cache_entries,
        }
    }

    /// Whether verbose cascade logging is on
    #[inline]
    #[must_use]
    pub fn debug_enabled(&self) -> bool {
        self.current.read().debug_enabled
    }

    /// Shallow-merge a partial update into the live config
    pub fn update(&self, update: ConfigUpdate) {
        tracing::info!(?update, "configuration updated");
        let rejected = self.current.write().apply(update);
        log_rejected(rejected);
    }

    /// Discard ad hoc updates
    pub fn reset_to_default(&self) {
        *self.current.write() = self.baseline.clone();
        tracing::info!("configuration reset to defaults");
    }

    /// Effective config as pretty JSON
    ///
    /// # Errors
    /// - `serde_json::Error` if serialization fails, which plain config
    ///   values never trigger
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&*self.current.read())
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

fn log_rejected(rejected: Vec<crate::ConfigError>) {
    for err in rejected {
        tracing::warn!(%err, "keeping previous config value");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn default_service_uses_development_profile() {
        let service = ConfigService::new();
        let config = service.config();
        assert_eq!(config.probe_timeout_ms, 8_000);
        assert_eq!(config.max_concurrent, 2);
        assert!(config.debug_enabled);
    }

    #[test]
    fn environment_beats_profile() {
        let service = ConfigService::from_vars(&vars(&[
            ("VISTA_PROFILE", "production"),
            ("VISTA_PROBE_TIMEOUT_MS", "1500"),
        ]));
        let config = service.config();
        assert_eq!(config.probe_timeout_ms, 1_500);
        assert_eq!(config.max_concurrent, 5);
    }

    #[test]
    fn zero_from_environment_keeps_profile_value() {
        let service = ConfigService::from_vars(&vars(&[("VISTA_MAX_CONCURRENT", "0")]));
        assert_eq!(service.config().max_concurrent, 2);
    }

    #[test]
    fn update_then_reset() {
        let service = ConfigService::from_vars(&vars(&[("VISTA_CACHE_TTL_MS", "1000")]));
        service.update(ConfigUpdate {
            cache_ttl_ms: Some(5),
            max_cache_entries: Some(10),
            ..ConfigUpdate::default()
        });
        assert_eq!(
            service.cache_settings(),
            CacheSettings {
                ttl: Duration::from_millis(5),
                max_entries: 10
            }
        );

        service.reset_to_default();
        let config = service.config();
        assert_eq!(config.cache_ttl_ms, 1_000);
        assert_eq!(config.max_cache_entries, 1_000);
    }

    #[test]
    fn snapshot_is_unaffected_by_later_updates() {
        let service = ConfigService::with_config(ResolverConfig::default());
        let snapshot = service.config();
        service.update(ConfigUpdate {
            probe_timeout_ms: Some(42),
            ..ConfigUpdate::default()
        });
        assert_eq!(snapshot.probe_timeout_ms, 5_000);
        assert_eq!(service.config().probe_timeout_ms, 42);
    }

    #[test]
    fn export_json_uses_camel_case() {
        let service = ConfigService::with_config(ResolverConfig::default());
        let json = service.export_json().unwrap();
        assert!(json.contains("\"probeTimeoutMs\": 5000"));
        assert!(json.contains("proxyEndpoints"));
    }
}
