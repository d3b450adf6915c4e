//! Vista Locator Normalizer
//!
//! Pure functions over locator strings:
//!
//! - **Canonicalize**: strip cache-busting parameters to get a stable cache key
//! - **Unwrap**: recover the real image behind a platform wrapper URL
//! - **Intake**: parse raw locator lists and resolve relative entries
//!
//! # Example
//!
//! ```rust
//! use vista_locator::{canonicalize, UnwrapRegistry};
//!
//! let key = canonicalize("https://img.example/a.jpg?_t=1712345678");
//! assert_eq!(key.as_str(), "https://img.example/a.jpg");
//!
//! let registry = UnwrapRegistry::with_defaults();
//! assert!(registry.unwrap("https://good.example/a.jpg").is_none());
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod canonical;
pub mod encode;
pub mod error;
pub mod intake;
pub mod unwrap;

pub use canonical::{canonicalize, with_cache_buster, CanonicalKey, VOLATILE_PARAMS};
pub use encode::encode_component;
pub use error::LocatorError;
pub use intake::{
    absolutize, is_absolute, parse_base, parse_locator_list, IMAGE_ROUTE, SERVED_IMAGE_ROUTE,
};
pub use unwrap::{RewriteFn, UnwrapRegistry, UnwrapRule};
