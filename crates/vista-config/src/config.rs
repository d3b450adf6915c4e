//! Configuration types
//!
//! [`ResolverConfig`] is the effective configuration read by every probe and
//! cascade. [`ConfigUpdate`] is a partial override applied on top of it.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default proxy rewrite templates, tried in order
pub const DEFAULT_PROXY_ENDPOINTS: [&str; 3] = [
    "https://images.weserv.nl/?url=",
    "https://imageproxy.pimg.tw/resize?url=",
    "https://cors-anywhere.herokuapp.com/",
];

/// Default synthetic placeholder generators, tried in order
pub const DEFAULT_PLACEHOLDER_SERVICES: [&str; 2] = [
    "https://via.placeholder.com/400x300/f0f0f0/666666?text=",
    "https://picsum.photos/400/300?random=",
];

/// Effective resolver configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverConfig {
    /// Per-candidate probe deadline in milliseconds
    pub probe_timeout_ms: u64,
    /// Chunk size for batch resolution
    pub max_concurrent: usize,
    /// Re-probes of a transient failure before moving on
    pub retry_attempts: u32,
    /// Delay between re-probes in milliseconds
    pub retry_delay_ms: u64,
    /// Cache entry freshness window in milliseconds
    pub cache_ttl_ms: u64,
    /// Cache eviction threshold
    pub max_cache_entries: usize,
    /// Ordered proxy rewrite templates
    pub proxy_endpoints: Vec<String>,
    /// Ordered synthetic placeholder generators
    pub placeholder_services: Vec<String>,
    /// Verbose per-probe cascade logging
    pub debug_enabled: bool,
}

impl ResolverConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With proxy endpoints
    #[must_use]
    pub fn with_proxy_endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.proxy_endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// With placeholder services
    #[must_use]
    pub fn with_placeholder_services<I, S>(mut self, services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.placeholder_services = services.into_iter().map(Into::into).collect();
        self
    }

    /// With probe timeout
    #[inline]
    #[must_use]
    pub fn with_probe_timeout_ms(mut self, millis: u64) -> Self {
        self.probe_timeout_ms = millis;
        self
    }

    /// With max concurrent resolutions per chunk
    #[inline]
    #[must_use]
    pub fn with_max_concurrent(mut self, max: usize) -> Self {
        self.max_concurrent = max;
        self
    }

    /// With cache limits
    #[inline]
    #[must_use]
    pub fn with_cache_limits(mut self, ttl_ms: u64, max_entries: usize) -> Self {
        self.cache_ttl_ms = ttl_ms;
        self.max_cache_entries = max_entries;
        self
    }

    /// With retry policy
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, attempts: u32, delay_ms: u64) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay_ms = delay_ms;
        self
    }

    /// Probe deadline as a duration
    #[inline]
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Retry delay as a duration
    #[inline]
    #[must_use]
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Cache TTL as a duration
    #[inline]
    #[must_use]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_millis(self.cache_ttl_ms)
    }

    /// Apply a partial update
    ///
    /// Out-of-range values are skipped and reported; the prior value is kept.
    pub fn apply(&mut self, update: ConfigUpdate) -> Vec<ConfigError> {
        let mut rejected = Vec::new();

        if let Some(ms) = update.probe_timeout_ms {
            if ms == 0 {
                rejected.push(ConfigError::Invalid {
                    key: "probe_timeout_ms",
                    reason: "must be greater than zero",
                });
            } else {
                self.probe_timeout_ms = ms;
            }
        }
        if let Some(max) = update.max_concurrent {
            if max == 0 {
                rejected.push(ConfigError::Invalid {
                    key: "max_concurrent",
                    reason: "must be greater than zero",
                });
            } else {
                self.max_concurrent = max;
            }
        }
        if let Some(attempts) = update.retry_attempts {
            self.retry_attempts = attempts;
        }
        if let Some(delay) = update.retry_delay_ms {
            self.retry_delay_ms = delay;
        }
        if let Some(ttl) = update.cache_ttl_ms {
            self.cache_ttl_ms = ttl;
        }
        if let Some(max) = update.max_cache_entries {
            if max == 0 {
                rejected.push(ConfigError::Invalid {
                    key: "max_cache_entries",
                    reason: "must be greater than zero",
                });
            } else {
                self.max_cache_entries = max;
            }
        }
        if let Some(endpoints) = update.proxy_endpoints {
            self.proxy_endpoints = endpoints;
        }
        if let Some(services) = update.placeholder_services {
            self.placeholder_services = services;
        }
        if let Some(debug) = update.debug_enabled {
            self.debug_enabled = debug;
        }

        rejected
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: 5_000,
            max_concurrent: 3,
            retry_attempts: 0,
            retry_delay_ms: 1_000,
            cache_ttl_ms: 30 * 60 * 1_000,
            max_cache_entries: 1_000,
            proxy_endpoints: DEFAULT_PROXY_ENDPOINTS.iter().map(|s| (*s).to_string()).collect(),
            placeholder_services: DEFAULT_PLACEHOLDER_SERVICES
                .iter()
                .map(|s| (*s).to_string())
                .collect(),
            debug_enabled: false,
        }
    }
}

/// Partial configuration override
///
/// Every field is optional; only present fields are merged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase", deny_unknown_fields)]
pub struct ConfigUpdate {
    /// New per-candidate deadline in milliseconds; zero is rejected
    pub probe_timeout_ms: Option<u64>,
    /// New batch chunk size; zero is rejected
    pub max_concurrent: Option<usize>,
    /// New retry count for transient failures
    pub retry_attempts: Option<u32>,
    /// New delay between retries in milliseconds
    pub retry_delay_ms: Option<u64>,
    /// New cache freshness window in milliseconds
    pub cache_ttl_ms: Option<u64>,
    /// New cache eviction threshold; zero is rejected
    pub max_cache_entries: Option<usize>,
    /// Replacement proxy templates, in cascade order
    pub proxy_endpoints: Option<Vec<String>>,
    /// Replacement placeholder generators, in cascade order
    pub placeholder_services: Option<Vec<String>>,
    /// Toggle per-candidate cascade logging
    pub debug_enabled: Option<bool>,
}

impl ConfigUpdate {
    /// Create empty update
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse update from TOML text
    ///
    /// Keys use the camelCase field names (`probeTimeoutMs`, `proxyEndpoints`).
    ///
    /// # Errors
    /// - `ConfigError::Toml` for invalid TOML, wrong value types or unknown keys
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Read update from a TOML file
    ///
    /// # Errors
    /// - `ConfigError::Io` if the file cannot be read
    /// - `ConfigError::Toml` if its contents do not parse, as in [`Self::from_toml_str`]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text =
            std::fs::read_to_string(path).map_err(|e| ConfigError::io_error(path, e))?;
        Self::from_toml_str(&text)
    }

    /// Merge another update on top of this one
    #[must_use]
    pub fn merge(mut self, other: ConfigUpdate) -> Self {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if other.$field.is_some() { self.$field = other.$field; })*
            };
        }
        take!(
            probe_timeout_ms,
            max_concurrent,
            retry_attempts,
            retry_delay_ms,
            cache_ttl_ms,
            max_cache_entries,
            proxy_endpoints,
            placeholder_services,
            debug_enabled
        );
        self
    }
}

/// Environment profile applied between defaults and overrides
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Profile {
    /// Longer timeouts, lower concurrency, debug logging
    #[default]
    Development,
    /// Shorter timeouts, higher concurrency, longer cache TTL
    Production,
}

impl Profile {
    /// Overrides this profile applies on top of the defaults
    #[must_use]
    pub fn overrides(self) -> ConfigUpdate {
        match self {
            Profile::Development => ConfigUpdate {
                probe_timeout_ms: Some(8_000),
                max_concurrent: Some(2),
                debug_enabled: Some(true),
                ..ConfigUpdate::default()
            },
            Profile::Production => ConfigUpdate {
                probe_timeout_ms: Some(3_000),
                max_concurrent: Some(5),
                cache_ttl_ms: Some(60 * 60 * 1_000),
                debug_enabled: Some(false),
                ..ConfigUpdate::default()
            },
        }
    }
}

impl FromStr for Profile {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(Profile::Development),
            "production" | "prod" => Ok(Profile::Production),
            _ => Err(ConfigError::parse("profile", s)),
        }
    }
}
