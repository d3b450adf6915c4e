//! Vista Verifier
//!
//! Bounded-time probes of single image locators.
//!
//! # Architecture
//!
//! ```text
//! Verifier::probe ──► Prober::fetch (HttpProber: reqwest + image header)
//!        │                 │
//!        │◄── timeout ─────┘  (local timer, timeout + PROBE_GRACE)
//!        ▼
//!   ResourceCache::set   (always, success or failure)
//! ```
//!
//! A probe succeeds only when the fetch completes in time and the body
//! decodes to an image with non-zero width and height.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod error;
pub mod prober;
pub mod verifier;

pub use error::{FailureKind, ProbeFailure};
pub use prober::{decode_dimensions, Dimensions, HttpProber, Prober};
pub use verifier::{VerificationOutcome, Verifier, PROBE_GRACE};
