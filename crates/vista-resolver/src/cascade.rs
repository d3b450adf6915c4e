//! Proxy cascade
//!
//! Ordered, lazily generated alternatives for one locator:
//!
//! ```text
//! original
//!   → unwrapped (platform wrapper removed, if different)
//!   → original through each proxy endpoint
//!   → unwrapped through each proxy endpoint (if different)
//!   → one synthetic placeholder per placeholder service (entity name only)
//! ```
//!
//! Nothing is rewritten until the consumer asks for the next candidate, so a
//! resolution that succeeds early never builds the tail of the cascade.

use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use vista_config::ResolverConfig;
use vista_locator::{encode_component, UnwrapRegistry};

/// Template marker replaced by the encoded target
pub const TARGET_MARKER: &str = "{url}";

/// Template marker replaced by the encoded entity name
pub const NAME_MARKER: &str = "{name}";

/// Where a candidate came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CandidateKind {
    /// The locator as given
    Original,
    /// Platform wrapper removed
    Unwrapped,
    /// Original through a proxy endpoint
    Proxied,
    /// Unwrapped locator through a proxy endpoint
    ProxiedUnwrapped,
    /// Generated placeholder, never probed
    Placeholder,
}

impl CandidateKind {
    /// Check if the candidate is generated rather than a real source
    #[inline]
    #[must_use]
    pub fn is_synthetic(self) -> bool {
        matches!(self, Self::Placeholder)
    }
}

/// One alternative locator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    /// Locator to probe
    pub locator: String,
    /// Origin of the locator
    pub kind: CandidateKind,
}

impl Candidate {
    fn new(locator: String, kind: CandidateKind) -> Self {
        Self { locator, kind }
    }

    /// Shorthand for `kind.is_synthetic()`
    #[inline]
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.kind.is_synthetic()
    }
}

/// Candidate generator over one config snapshot
#[derive(Debug, Clone)]
pub struct ProxyCascade {
    registry: Arc<UnwrapRegistry>,
    proxy_endpoints: Arc<[String]>,
    placeholder_services: Arc<[String]>,
}

impl ProxyCascade {
    /// Create cascade
    #[must_use]
    pub fn new(
        registry: Arc<UnwrapRegistry>,
        proxy_endpoints: Vec<String>,
        placeholder_services: Vec<String>,
    ) -> Self {
        Self {
            registry,
            proxy_endpoints: proxy_endpoints.into(),
            placeholder_services: placeholder_services.into(),
        }
    }

    /// Create cascade from the endpoints and services in `config`
    #[must_use]
    pub fn from_config(config: &ResolverConfig, registry: Arc<UnwrapRegistry>) -> Self {
        Self::new(
            registry,
            config.proxy_endpoints.clone(),
            config.placeholder_services.clone(),
        )
    }

    /// Lazy candidate sequence for `original`
    ///
    /// Placeholders are only produced when `entity_name` is given.
    #[must_use]
    pub fn candidates(&self, original: &str, entity_name: Option<&str>) -> CandidateIter {
        CandidateIter {
            cascade: self.clone(),
            original: original.to_string(),
            entity_name: entity_name
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            unwrapped: None,
            stage: Stage::Original,
            seen: HashSet::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Original,
    Unwrapped,
    Proxied(usize),
    ProxiedUnwrapped(usize),
    Placeholder(usize),
    Done,
}

/// Iterator returned by [`ProxyCascade::candidates`]
///
/// Skips locators already yielded.
#[derive(Debug)]
pub struct CandidateIter {
    cascade: ProxyCascade,
    original: String,
    entity_name: Option<String>,
    unwrapped: Option<String>,
    stage: Stage,
    seen: HashSet<String>,
}

impl CandidateIter {
    /// Produce the next raw candidate, advancing the stage
    fn step(&mut self) -> Option<Candidate> {
        loop {
            match self.stage {
                Stage::Original => {
                    self.stage = Stage::Unwrapped;
                    return Some(Candidate::new(self.original.clone(), CandidateKind::Original));
                }
                Stage::Unwrapped => {
                    self.stage = Stage::Proxied(0);
                    self.unwrapped = self
                        .cascade
                        .registry
                        .unwrap(&self.original)
                        .filter(|inner| *inner != self.original);
                    if let Some(inner) = &self.unwrapped {
                        return Some(Candidate::new(inner.clone(), CandidateKind::Unwrapped));
                    }
                }
                Stage::Proxied(i) => {
                    let Some(endpoint) = self.cascade.proxy_endpoints.get(i) else {
                        self.stage = Stage::ProxiedUnwrapped(0);
                        continue;
                    };
                    self.stage = Stage::Proxied(i + 1);
                    return Some(Candidate::new(
                        proxy_rewrite(endpoint, &self.original),
                        CandidateKind::Proxied,
                    ));
                }
                Stage::ProxiedUnwrapped(i) => {
                    let (Some(inner), Some(endpoint)) =
                        (&self.unwrapped, self.cascade.proxy_endpoints.get(i))
                    else {
                        self.stage = Stage::Placeholder(0);
                        continue;
                    };
                    self.stage = Stage::ProxiedUnwrapped(i + 1);
                    return Some(Candidate::new(
                        proxy_rewrite(endpoint, inner),
                        CandidateKind::ProxiedUnwrapped,
                    ));
                }
                Stage::Placeholder(i) => {
                    let (Some(name), Some(service)) =
                        (&self.entity_name, self.cascade.placeholder_services.get(i))
                    else {
                        self.stage = Stage::Done;
                        continue;
                    };
                    self.stage = Stage::Placeholder(i + 1);
                    return Some(Candidate::new(
                        placeholder_for(service, name),
                        CandidateKind::Placeholder,
                    ));
                }
                Stage::Done => return None,
            }
        }
    }
}

impl Iterator for CandidateIter {
    type Item = Candidate;

    fn next(&mut self) -> Option<Candidate> {
        loop {
            let candidate = self.step()?;
            if self.seen.insert(candidate.locator.clone()) {
                return Some(candidate);
            }
        }
    }
}

/// Rewrite `target` through a proxy endpoint template
///
/// `{url}` in the template is replaced by the percent-encoded target;
/// without the marker the encoded target is appended.
#[must_use]
pub fn proxy_rewrite(endpoint: &str, target: &str) -> String {
    let encoded = encode_component(target);
    if endpoint.contains(TARGET_MARKER) {
        endpoint.replace(TARGET_MARKER, &encoded)
    } else {
        format!("{endpoint}{encoded}")
    }
}

/// Placeholder locator for an entity from a service template
#[must_use]
pub fn placeholder_for(service: &str, entity_name: &str) -> String {
    let encoded = encode_component(entity_name);
    if service.contains(NAME_MARKER) {
        service.replace(NAME_MARKER, &encoded)
    } else {
        format!("{service}{encoded}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PROXY_A: &str = "https://proxy-a.example/?u=";
    const PROXY_B: &str = "https://proxy-b.example/fetch/{url}/raw";
    const SERVICE: &str = "https://placeholder.example/?text=";

    fn cascade() -> ProxyCascade {
        ProxyCascade::new(
            Arc::new(UnwrapRegistry::with_defaults()),
            vec![PROXY_A.to_string(), PROXY_B.to_string()],
            vec![SERVICE.to_string()],
        )
    }

    fn kinds(iter: CandidateIter) -> Vec<CandidateKind> {
        iter.map(|c| c.kind).collect()
    }

    #[test]
    fn proxy_rewrite_appends_encoded_target() {
        assert_eq!(
            proxy_rewrite("https://proxy.example/?u=", "https://dead.example/a.jpg"),
            "https://proxy.example/?u=https%3A%2F%2Fdead.example%2Fa.jpg"
        );
    }

    #[test]
    fn proxy_rewrite_fills_template() {
        assert_eq!(
            proxy_rewrite(PROXY_B, "https://a.example/x.png?s=1"),
            "https://proxy-b.example/fetch/https%3A%2F%2Fa.example%2Fx.png%3Fs%3D1/raw"
        );
    }

    #[test]
    fn spaces_in_target_are_percent_encoded() {
        assert_eq!(
            proxy_rewrite(PROXY_B, "https://a.example/my pic.jpg"),
            "https://proxy-b.example/fetch/https%3A%2F%2Fa.example%2Fmy%20pic.jpg/raw"
        );
        assert_eq!(
            proxy_rewrite(PROXY_A, "https://a.example/a+b.jpg"),
            "https://proxy-a.example/?u=https%3A%2F%2Fa.example%2Fa%2Bb.jpg"
        );
    }

    #[test]
    fn placeholder_encodes_entity_name() {
        assert_eq!(
            placeholder_for(SERVICE, "Summer Palace"),
            "https://placeholder.example/?text=Summer%20Palace"
        );
        assert_eq!(
            placeholder_for("https://p.example/{name}.png", "Louvre"),
            "https://p.example/Louvre.png"
        );
    }

    #[test]
    fn plain_locator_order() {
        let candidates: Vec<_> = cascade()
            .candidates("https://dead.example/a.jpg", Some("Louvre"))
            .collect();

        assert_eq!(
            candidates,
            vec![
                Candidate::new("https://dead.example/a.jpg".into(), CandidateKind::Original),
                Candidate::new(
                    "https://proxy-a.example/?u=https%3A%2F%2Fdead.example%2Fa.jpg".into(),
                    CandidateKind::Proxied
                ),
                Candidate::new(
                    "https://proxy-b.example/fetch/https%3A%2F%2Fdead.example%2Fa.jpg/raw".into(),
                    CandidateKind::Proxied
                ),
                Candidate::new(
                    "https://placeholder.example/?text=Louvre".into(),
                    CandidateKind::Placeholder
                ),
            ]
        );
    }

    #[test]
    fn wrapper_locator_order() {
        let iter = cascade().candidates(
            "https://github.com/org/repo/blob/main/img/a.png",
            Some("Louvre"),
        );
        assert_eq!(
            kinds(iter),
            vec![
                CandidateKind::Original,
                CandidateKind::Unwrapped,
                CandidateKind::Proxied,
                CandidateKind::Proxied,
                CandidateKind::ProxiedUnwrapped,
                CandidateKind::ProxiedUnwrapped,
                CandidateKind::Placeholder,
            ]
        );
    }

    #[test]
    fn no_entity_name_no_placeholders() {
        let iter = cascade().candidates("https://dead.example/a.jpg", None);
        assert!(iter.into_iter().all(|c| !c.is_synthetic()));

        let iter = cascade().candidates("https://dead.example/a.jpg", Some("  "));
        assert!(iter.into_iter().all(|c| !c.is_synthetic()));
    }

    #[test]
    fn placeholders_come_last_and_are_synthetic() {
        let candidates: Vec<_> = cascade()
            .candidates("https://dead.example/a.jpg", Some("Louvre"))
            .collect();
        let first_synthetic = candidates.iter().position(Candidate::is_synthetic).unwrap();
        assert!(candidates[first_synthetic..].iter().all(Candidate::is_synthetic));
    }

    #[test]
    fn duplicates_are_skipped() {
        let cascade = ProxyCascade::new(
            Arc::new(UnwrapRegistry::new()),
            vec![PROXY_A.to_string(), PROXY_A.to_string()],
            vec![],
        );
        let candidates: Vec<_> = cascade.candidates("https://dead.example/a.jpg", None).collect();
        assert_eq!(candidates.len(), 2);
    }

    #[test]
    fn no_proxies_yields_original_only() {
        let cascade = ProxyCascade::new(Arc::new(UnwrapRegistry::new()), vec![], vec![]);
        let candidates: Vec<_> = cascade.candidates("https://a.example/1.jpg", None).collect();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].kind, CandidateKind::Original);
    }

    #[test]
    fn deterministic() {
        let a: Vec<_> = cascade().candidates("https://dead.example/a.jpg", Some("X")).collect();
        let b: Vec<_> = cascade().candidates("https://dead.example/a.jpg", Some("X")).collect();
        assert_eq!(a, b);
    }
}
