//! Locator list intake
//!
//! Upstream catalogs hand over locator lists either as a JSON array or as a
//! comma-separated string, sometimes with relative paths. These helpers turn
//! that into clean absolute locators before resolution.

use crate::error::LocatorError;
use url::Url;

/// Parse a raw locator list
///
/// Accepts a JSON array of strings or a comma-separated list. Entries are
/// trimmed, `#fragment`s dropped and empty entries removed.
#[must_use]
pub fn parse_locator_list(raw: &str) -> Vec<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Vec::new();
    }

    let entries: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str::<Vec<String>>(raw)
            .unwrap_or_else(|_| raw.split(',').map(ToString::to_string).collect())
    } else {
        raw.split(',').map(ToString::to_string).collect()
    };

    entries
        .iter()
        .map(|entry| entry.split('#').next().unwrap_or_default().trim())
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parse the base URL used for relative locators
///
/// # Errors
/// - `LocatorError::InvalidBase` if `base` is not an absolute URL
pub fn parse_base(base: &str) -> Result<Url, LocatorError> {
    Url::parse(base).map_err(|source| LocatorError::InvalidBase {
        base: base.to_string(),
        source,
    })
}

/// Whether the locator is an absolute http(s) URL
#[inline]
#[must_use]
pub fn is_absolute(locator: &str) -> bool {
    locator.starts_with("http://") || locator.starts_with("https://")
}

/// Path prefix of image routes on the catalog server
pub const IMAGE_ROUTE: &str = "/image/";

/// Route that actually serves [`IMAGE_ROUTE`] paths
pub const SERVED_IMAGE_ROUTE: &str = "/api/v1/test-image/";

/// Resolve a possibly relative locator against the server root of `base`
///
/// Absolute http(s) locators pass through. Relative ones are rooted at the
/// scheme and host of `base`; the base path is ignored and a missing leading
/// `/` is added. Paths under [`IMAGE_ROUTE`] are moved to
/// [`SERVED_IMAGE_ROUTE`].
///
/// # Errors
/// - `LocatorError::Join` if the locator cannot be joined
pub fn absolutize(base: &Url, locator: &str) -> Result<String, LocatorError> {
    if is_absolute(locator) {
        return Ok(locator.to_string());
    }

    let path = if let Some(rest) = locator.strip_prefix(IMAGE_ROUTE) {
        format!("{SERVED_IMAGE_ROUTE}{rest}")
    } else {
        // `//host/...` would otherwise leave the base server
        format!("/{}", locator.trim_start_matches('/'))
    };

    base.join(&path)
        .map(String::from)
        .map_err(|source| LocatorError::Join {
            locator: locator.to_string(),
            source,
        })
}
