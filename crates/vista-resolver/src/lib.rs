//! Vista Resolver
//!
//! Proxy fallback cascade and batch resolution over the verification cache.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use vista_config::ConfigService;
//! use vista_probe::HttpProber;
//! use vista_resolver::{BatchOptions, BatchResolver};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Arc::new(ConfigService::from_env());
//! let resolver = BatchResolver::with_prober(config, Arc::new(HttpProber::new()?));
//!
//! let locators = vec!["https://img.example/hall.jpg".to_string()];
//! let report = resolver
//!     .resolve_batch(&locators, Some("Great Hall"), BatchOptions::new())
//!     .await;
//! println!("{}% working", report.success_rate_percent);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cascade;
pub mod report;
pub mod resolver;

pub use cascade::{
    placeholder_for, proxy_rewrite, Candidate, CandidateIter, CandidateKind, ProxyCascade,
};
pub use report::{BatchReport, BatchStats, LoadMethod, Resolution};
pub use resolver::{BatchOptions, BatchResolver, ProgressFn};
