//! Canonical cache keys
//!
//! Provides [`CanonicalKey`], a locator with its volatile cache-busting
//! parameters removed. Two locators that differ only in those parameters map
//! to the same key.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use url::Url;

/// Query parameters that carry cache-busting tokens
pub const VOLATILE_PARAMS: [&str; 2] = ["_t", "timestamp"];

/// Parameter appended by [`with_cache_buster`]
pub const CACHE_BUSTER_PARAM: &str = "_t";

/// Cache index for a locator
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// Key as string slice
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for CanonicalKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[inline]
fn is_volatile(key: &str) -> bool {
    VOLATILE_PARAMS.contains(&key)
}

/// Canonical key for a locator
///
/// Absolute URLs are parsed and their query re-serialized without volatile
/// parameters.
/// Anything that does not parse (relative paths, garbage) is handled as a
/// plain string with the same parameter filtering.
#[must_use]
pub fn canonicalize(locator: &str) -> CanonicalKey {
    match Url::parse(locator) {
        Ok(url) => CanonicalKey(strip_volatile_url(url).into()),
        Err(_) => CanonicalKey(strip_volatile_raw(locator)),
    }
}

// Rebuilds every query so equivalent encodings (`%20` vs `+`) share a key.
fn strip_volatile_url(mut url: Url) -> Url {
    if url.query().is_none() {
        return url;
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_volatile(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }
    url
}

fn strip_volatile_raw(locator: &str) -> String {
    let (body, fragment) = match locator.split_once('#') {
        Some((body, fragment)) => (body, Some(fragment)),
        None => (locator, None),
    };

    let mut out = match body.split_once('?') {
        Some((path, query)) => {
            let kept: Vec<&str> = query
                .split('&')
                .filter(|pair| !pair.is_empty())
                .filter(|pair| !is_volatile(pair.split('=').next().unwrap_or_default()))
                .collect();
            if kept.is_empty() {
                path.to_string()
            } else {
                format!("{path}?{}", kept.join("&"))
            }
        }
        None => body.to_string(),
    };

    if let Some(fragment) = fragment {
        out.push('#');
        out.push_str(fragment);
    }
    out
}

/// Append a `_t=<millis>` cache-busting parameter
#[must_use]
pub fn with_cache_buster(locator: &str, millis: u128) -> String {
    let token = millis.to_string();
    match Url::parse(locator) {
        Ok(mut url) => {
            url.query_pairs_mut().append_pair(CACHE_BUSTER_PARAM, &token);
            url.into()
        }
        Err(_) => {
            let separator = if locator.contains('?') { '&' } else { '?' };
            format!("{locator}{separator}{CACHE_BUSTER_PARAM}={token}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn strips_timestamp_params() {
        let key = canonicalize("https://img.example/a.jpg?w=400&_t=1712345678901");
        assert_eq!(key.as_str(), "https://img.example/a.jpg?w=400");

        let key = canonicalize("https://img.example/a.jpg?timestamp=99");
        assert_eq!(key.as_str(), "https://img.example/a.jpg");
    }

    #[test]
    fn leaves_clean_urls_untouched() {
        let key = canonicalize("https://img.example/a.jpg?w=400&h=300");
        assert_eq!(key.as_str(), "https://img.example/a.jpg?w=400&h=300");
    }

    #[test]
    fn keys_equal_across_timestamps() {
        assert_eq!(
            canonicalize("https://img.example/a.jpg?_t=1"),
            canonicalize("https://img.example/a.jpg?_t=2")
        );
        assert_eq!(
            canonicalize("https://img.example/a.jpg?_t=1"),
            canonicalize("https://img.example/a.jpg")
        );
    }

    #[test]
    fn relative_locators_use_string_fallback() {
        assert_eq!(
            canonicalize("/image/hall/1.jpg?_t=5&size=large#top").as_str(),
            "/image/hall/1.jpg?size=large#top"
        );
        assert_eq!(canonicalize("/image/hall/1.jpg?_t=5").as_str(), "/image/hall/1.jpg");
    }

    #[test]
    fn cache_buster_roundtrips_through_canonicalize() {
        let original = "https://img.example/a.jpg?w=400";
        let busted = with_cache_buster(original, 1_700_000_000_000);
        assert!(busted.contains("_t=1700000000000"));
        assert_eq!(canonicalize(&busted), canonicalize(original));

        let relative = with_cache_buster("/image/a.jpg", 7);
        assert_eq!(relative, "/image/a.jpg?_t=7");
    }

    fn absolute_locator() -> impl Strategy<Value = String> {
        (
            "[a-z]{1,8}\\.example",
            "(/[a-zA-Z0-9_.-]{1,6}){0,3}",
            proptest::collection::vec(
                prop_oneof![
                    Just("_t".to_string()),
                    Just("timestamp".to_string()),
                    "[a-z]{1,4}"
                ],
                0..4,
            ),
            "[a-z0-9%+ ]{0,6}",
        )
            .prop_map(|(host, path, keys, value)| {
                let query: Vec<String> = keys.iter().map(|k| format!("{k}={value}")).collect();
                if query.is_empty() {
                    format!("https://{host}{path}")
                } else {
                    format!("https://{host}{path}?{}", query.join("&"))
                }
            })
    }

    proptest! {
        #[test]
        fn prop_canonicalize_is_idempotent(locator in absolute_locator()) {
            let once = canonicalize(&locator);
            let twice = canonicalize(once.as_str());
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_relative_canonicalize_is_idempotent(
            path in "(/[a-z0-9]{1,5}){1,3}",
            query in "([a-z_]{1,9}=[0-9]{0,3}&?){0,3}",
        ) {
            let locator = format!("{path}?{query}");
            let once = canonicalize(&locator);
            prop_assert_eq!(canonicalize(once.as_str()), once);
        }

        #[test]
        fn prop_timestamp_never_changes_key(
            locator in absolute_locator(),
            stamp in 0u128..u128::from(u64::MAX),
        ) {
            let busted = with_cache_buster(&locator, stamp);
            prop_assert_eq!(canonicalize(&busted), canonicalize(&locator));
        }
    }
}
