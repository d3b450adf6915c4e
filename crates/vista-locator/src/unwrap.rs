//! Platform wrapper unwrapping
//!
//! Some hosts serve an HTML wrapper or a decorated URL around the real image.
//! [`UnwrapRegistry`] holds `{name, pattern, rewrite}` rules that recover the
//! inner target, so new source platforms can be supported by registering a
//! rule instead of touching the cascade.

use crate::error::LocatorError;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use url::Url;

/// Rewrite function: receives the pattern captures and the full locator
pub type RewriteFn = Arc<dyn Fn(&Captures<'_>, &str) -> Option<String> + Send + Sync>;

static BAIKE_PIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://baike\.baidu\.com/pic/").expect("valid pattern"));

static BAIKE_CDN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://(?:bkimg\.cdn\.bcebos\.com|baikebcs\.bdimg\.com)/[^?#]*")
        .expect("valid pattern")
});

static GITHUB_BLOB: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://github\.com/([^/]+)/([^/]+)/blob/([^?#]+)").expect("valid pattern")
});

/// A single unwrap rule
#[derive(Clone)]
pub struct UnwrapRule {
    name: String,
    pattern: Regex,
    rewrite: RewriteFn,
}

impl UnwrapRule {
    /// Create rule from a compiled pattern
    pub fn new<F>(name: impl Into<String>, pattern: Regex, rewrite: F) -> Self
    where
        F: Fn(&Captures<'_>, &str) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            pattern,
            rewrite: Arc::new(rewrite),
        }
    }

    /// Create rule from pattern source
    ///
    /// # Errors
    /// - `LocatorError::Pattern` if the pattern does not compile
    pub fn from_pattern<F>(
        name: impl Into<String>,
        pattern: &str,
        rewrite: F,
    ) -> Result<Self, LocatorError>
    where
        F: Fn(&Captures<'_>, &str) -> Option<String> + Send + Sync + 'static,
    {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|source| LocatorError::Pattern {
            rule: name.clone(),
            source,
        })?;
        Ok(Self::new(name, pattern, rewrite))
    }

    /// Rule name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply rule; `None` when the pattern does not match or the rewrite declines
    #[must_use]
    pub fn apply(&self, locator: &str) -> Option<String> {
        let captures = self.pattern.captures(locator)?;
        (self.rewrite)(&captures, locator)
    }
}

impl Debug for UnwrapRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnwrapRule")
            .field("name", &self.name)
            .field("pattern", &self.pattern.as_str())
            .finish_non_exhaustive()
    }
}

/// Ordered set of unwrap rules
#[derive(Debug, Clone, Default)]
pub struct UnwrapRegistry {
    rules: Vec<UnwrapRule>,
}

impl UnwrapRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create registry with built-in rules
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(baike_picture_page());
        registry.register(baike_cdn_asset());
        registry.register(github_blob());
        registry
    }

    /// Register a rule (tried after existing rules)
    pub fn register(&mut self, rule: UnwrapRule) {
        self.rules.push(rule);
    }

    /// Remove rule by name
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|rule| rule.name != name);
        self.rules.len() != before
    }

    /// Check if a rule is registered
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.rules.iter().any(|rule| rule.name == name)
    }

    /// Rule names in application order
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.rules.iter().map(UnwrapRule::name).collect()
    }

    /// Number of rules
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Inner target of a wrapper locator
    ///
    /// The first rule that matches and produces a value wins.
    #[must_use]
    pub fn unwrap(&self, locator: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.apply(locator))
    }
}

/// Baike picture pages embed the image as a `pic=` query parameter
fn baike_picture_page() -> UnwrapRule {
    UnwrapRule::new("baike-picture-page", BAIKE_PIC.clone(), |_, locator| {
        let url = Url::parse(locator).ok()?;
        url.query_pairs()
            .find(|(key, _)| key == "pic")
            .map(|(_, value)| value.into_owned())
            .filter(|value| !value.is_empty())
    })
}

/// Baike CDN assets: the raw asset lives at the same path without query
fn baike_cdn_asset() -> UnwrapRule {
    UnwrapRule::new("baike-cdn-asset", BAIKE_CDN.clone(), |captures, _| {
        captures.get(0).map(|m| m.as_str().to_string())
    })
}

/// GitHub blob pages → raw.githubusercontent.com
fn github_blob() -> UnwrapRule {
    UnwrapRule::new("github-blob", GITHUB_BLOB.clone(), |captures, _| {
        Some(format!(
            "https://raw.githubusercontent.com/{}/{}/{}",
            captures.get(1)?.as_str(),
            captures.get(2)?.as_str(),
            captures.get(3)?.as_str()
        ))
    })
}
