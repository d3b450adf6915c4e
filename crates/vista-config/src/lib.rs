//! Vista Config Manager
//!
//! Holds the merged runtime configuration read by the cache, verifier and
//! resolver: probe timeouts, concurrency, retry policy, cache limits, proxy
//! endpoints, placeholder services and the debug switch.
//!
//! # Layering
//!
//! ```text
//! defaults < profile (VISTA_PROFILE) < VISTA_* variables < ConfigService::update
//! ```
//!
//! # Example
//!
//! ```rust
//! use vista_config::{ConfigService, ConfigUpdate};
//!
//! let service = ConfigService::new();
//! service.update(ConfigUpdate {
//!     max_concurrent: Some(4),
//!     ..ConfigUpdate::default()
//! });
//! assert_eq!(service.config().max_concurrent, 4);
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod env;
pub mod error;
pub mod service;

pub use config::{ConfigUpdate, Profile, ResolverConfig};
pub use error::ConfigError;
pub use service::{CacheSettings, ConfigService};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
