//! Testing utilities for the Vista workspace
//!
//! Shared fixtures and a scripted [`Prober`] that never touches the network.

#![allow(missing_docs)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use vista_cache::ResourceCache;
use vista_config::{ConfigService, ResolverConfig};
use vista_probe::{Dimensions, ProbeFailure, Prober, Verifier};

pub const TEST_PROXY: &str = "https://proxy.example/?u=";
pub const TEST_PLACEHOLDER: &str = "https://placeholder.example/400x300?text=";

type Scripted = Result<Dimensions, ProbeFailure>;

/// Prober answering from a script
///
/// Each locator maps to a queue of outcomes; the last one repeats. Unscripted
/// locators get the default outcome (a network failure unless changed).
#[derive(Debug)]
pub struct ScriptedProber {
    script: Mutex<HashMap<String, VecDeque<Scripted>>>,
    delays: HashMap<String, Duration>,
    default: Scripted,
    delay: Duration,
    log: Mutex<Vec<String>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for ScriptedProber {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProber {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(HashMap::new()),
            delays: HashMap::new(),
            default: Err(ProbeFailure::network("unscripted locator")),
            delay: Duration::ZERO,
            log: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Locator answers with a 400x300 image
    pub fn succeed(self, locator: &str) -> Self {
        self.respond(locator, Ok(Dimensions::new(400, 300)))
    }

    pub fn fail(self, locator: &str, failure: ProbeFailure) -> Self {
        self.respond(locator, Err(failure))
    }

    pub fn respond(self, locator: &str, outcome: Scripted) -> Self {
        self.sequence(locator, vec![outcome])
    }

    /// Outcomes returned in order, the last one repeating
    pub fn sequence(self, locator: &str, outcomes: Vec<Scripted>) -> Self {
        self.script
            .lock()
            .insert(locator.to_string(), outcomes.into_iter().collect());
        self
    }

    pub fn with_default(mut self, outcome: Scripted) -> Self {
        self.default = outcome;
        self
    }

    /// Delay applied to every probe
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Delay applied to one locator, overriding the global delay
    pub fn with_delay_for(mut self, locator: &str, delay: Duration) -> Self {
        self.delays.insert(locator.to_string(), delay);
        self
    }

    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Every fetched locator, in call order
    pub fn probe_log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    pub fn probe_count(&self) -> usize {
        self.log.lock().len()
    }

    pub fn probes_of(&self, locator: &str) -> usize {
        self.log.lock().iter().filter(|l| l.as_str() == locator).count()
    }

    /// Highest number of fetches observed in flight at once
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn reset_log(&self) {
        self.log.lock().clear();
        self.max_in_flight.store(0, Ordering::SeqCst);
    }

    fn next_outcome(&self, locator: &str) -> Scripted {
        let mut script = self.script.lock();
        match script.get_mut(locator) {
            Some(queue) if queue.len() > 1 => {
                queue.pop_front().unwrap_or_else(|| self.default.clone())
            }
            Some(queue) => queue.front().cloned().unwrap_or_else(|| self.default.clone()),
            None => self.default.clone(),
        }
    }
}

#[async_trait]
impl Prober for ScriptedProber {
    async fn fetch(&self, locator: &str, _timeout: Duration) -> Result<Dimensions, ProbeFailure> {
        self.log.lock().push(locator.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        let delay = self.delays.get(locator).copied().unwrap_or(self.delay);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        } else {
            tokio::task::yield_now().await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.next_outcome(locator)
    }
}

/// Config with one test proxy and one test placeholder service
pub fn test_config() -> ResolverConfig {
    ResolverConfig::default()
        .with_proxy_endpoints([TEST_PROXY])
        .with_placeholder_services([TEST_PLACEHOLDER])
        .with_probe_timeout_ms(1_000)
        .with_max_concurrent(3)
}

/// Shared config service and cache over `config`
pub fn services(config: ResolverConfig) -> (Arc<ConfigService>, Arc<ResourceCache>) {
    let config = Arc::new(ConfigService::with_config(config));
    let cache = Arc::new(ResourceCache::new(config.clone()));
    (config, cache)
}

pub fn verifier(prober: Arc<ScriptedProber>, cache: Arc<ResourceCache>) -> Verifier {
    Verifier::new(prober, cache)
}

/// Locator as rewritten through [`TEST_PROXY`]
pub fn proxied(locator: &str) -> String {
    format!("{TEST_PROXY}{}", vista_locator::encode_component(locator))
}
