//! Probe failure taxonomy
//!
//! Every probe ends in success or one of these. They are values, not
//! exceptions: the verifier folds them into a
//! [`VerificationOutcome`](crate::VerificationOutcome) and never returns them
//! as errors.

use serde::Serialize;

/// Why a probe failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ProbeFailure {
    /// Candidate did not settle within the deadline
    #[error("timed out after {timeout_ms}ms")]
    Timeout {
        /// Deadline that was exceeded
        timeout_ms: u64,
    },

    /// Fetch failed outright (DNS, connect, reset, TLS)
    #[error("network error: {message}")]
    Network {
        /// Transport error text
        message: String,
    },

    /// Server answered with a non-success status
    #[error("http status {status}")]
    Status {
        /// HTTP status code
        status: u16,
    },

    /// Body is an image with zero width or height
    #[error("invalid resource: {width}x{height}")]
    InvalidResource {
        /// Reported width
        width: u32,
        /// Reported height
        height: u32,
    },

    /// Body could not be read as an image at all
    #[error("undecodable resource: {message}")]
    Undecodable {
        /// Decoder error text
        message: String,
    },
}

/// Coarse failure class used for logging and retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    /// Deadline exceeded
    Timeout,
    /// Transport or HTTP-level failure
    Network,
    /// Fetched but failed the content check
    InvalidResource,
}

impl ProbeFailure {
    /// Create network failure
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
        }
    }

    /// Create undecodable failure
    pub fn undecodable(message: impl Into<String>) -> Self {
        Self::Undecodable {
            message: message.into(),
        }
    }

    /// Failure class
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Network { .. } | Self::Status { .. } => FailureKind::Network,
            Self::InvalidResource { .. } | Self::Undecodable { .. } => {
                FailureKind::InvalidResource
            }
        }
    }

    /// Check if a re-probe could plausibly succeed
    ///
    /// Timeouts, transport errors, 429 and 5xx are transient; content
    /// failures and other statuses are not.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Network { .. } => true,
            Self::Status { status } => *status == 429 || *status >= 500,
            Self::InvalidResource { .. } | Self::Undecodable { .. } => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_display() {
        let err = ProbeFailure::Timeout { timeout_ms: 5_000 };
        assert_eq!(err.to_string(), "timed out after 5000ms");

        let err = ProbeFailure::InvalidResource { width: 0, height: 0 };
        assert_eq!(err.to_string(), "invalid resource: 0x0");
    }

    #[test]
    fn failure_kinds() {
        assert_eq!(ProbeFailure::network("reset").kind(), FailureKind::Network);
        assert_eq!(ProbeFailure::Status { status: 404 }.kind(), FailureKind::Network);
        assert_eq!(
            ProbeFailure::undecodable("not an image").kind(),
            FailureKind::InvalidResource
        );
    }

    #[test]
    fn transient_classification() {
        assert!(ProbeFailure::Timeout { timeout_ms: 1 }.is_transient());
        assert!(ProbeFailure::network("reset").is_transient());
        assert!(ProbeFailure::Status { status: 503 }.is_transient());
        assert!(ProbeFailure::Status { status: 429 }.is_transient());
        assert!(!ProbeFailure::Status { status: 404 }.is_transient());
        assert!(!ProbeFailure::InvalidResource { width: 0, height: 10 }.is_transient());
    }
}
