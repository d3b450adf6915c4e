//! Environment-variable overrides
//!
//! Variables are read from an injectable source so the process environment
//! is only consulted by [`ConfigService::from_env`](crate::ConfigService::from_env).

use crate::config::{ConfigUpdate, Profile};
use crate::error::ConfigError;
use std::str::FromStr;

/// Prefix shared by every recognized variable
pub const ENV_PREFIX: &str = "VISTA_";

/// Profile selector variable
pub const PROFILE_VAR: &str = "VISTA_PROFILE";

/// Collect `VISTA_*` variables from the process environment
#[must_use]
pub fn process_vars() -> Vec<(String, String)> {
    std::env::vars()
        .filter(|(key, _)| key.starts_with(ENV_PREFIX))
        .collect()
}

/// Pick the profile named by `VISTA_PROFILE`, defaulting to development
#[must_use]
pub fn profile_from_vars(vars: &[(String, String)]) -> Profile {
    vars.iter()
        .find(|(key, _)| key == PROFILE_VAR)
        .and_then(|(_, value)| match value.parse::<Profile>() {
            Ok(profile) => Some(profile),
            Err(err) => {
                tracing::warn!(%err, "ignoring unknown profile");
                None
            }
        })
        .unwrap_or_default()
}

/// Build an update from recognized variables
///
/// Malformed values are logged and skipped; well-formed ones are kept.
#[must_use]
pub fn update_from_vars(vars: &[(String, String)]) -> ConfigUpdate {
    let mut update = ConfigUpdate::default();

    for (key, value) in vars {
        let result = match key.as_str() {
            "VISTA_PROBE_TIMEOUT_MS" => parse(key, value).map(|v| update.probe_timeout_ms = Some(v)),
            "VISTA_MAX_CONCURRENT" => parse(key, value).map(|v| update.max_concurrent = Some(v)),
            "VISTA_RETRY_ATTEMPTS" => parse(key, value).map(|v| update.retry_attempts = Some(v)),
            "VISTA_RETRY_DELAY_MS" => parse(key, value).map(|v| update.retry_delay_ms = Some(v)),
            "VISTA_CACHE_TTL_MS" => parse(key, value).map(|v| update.cache_ttl_ms = Some(v)),
            "VISTA_MAX_CACHE_ENTRIES" => {
                parse(key, value).map(|v| update.max_cache_entries = Some(v))
            }
            "VISTA_DEBUG" => parse_bool(key, value).map(|v| update.debug_enabled = Some(v)),
            "VISTA_PROXY_ENDPOINTS" => {
                update.proxy_endpoints = Some(split_list(value));
                Ok(())
            }
            "VISTA_PLACEHOLDER_SERVICES" => {
                update.placeholder_services = Some(split_list(value));
                Ok(())
            }
            _ => Ok(()),
        };

        if let Err(err) = result {
            tracing::warn!(%err, "ignoring malformed config override");
        }
    }

    update
}

fn parse<T: FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::parse(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::parse(key, value)),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
