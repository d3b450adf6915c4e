//! Network probes
//!
//! [`Prober`] is the seam between the verifier and the network. The
//! production implementation, [`HttpProber`], issues a GET with a
//! cache-busting parameter, requires a 2xx status and reads the image header
//! to learn its dimensions.

use crate::error::ProbeFailure;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt::Debug;
use std::io::Cursor;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use vista_locator::with_cache_buster;

/// Pixel dimensions reported by a fetched image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Dimensions {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl Dimensions {
    /// Create dimensions
    #[inline]
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Zero width or height (a 200 with an empty or placeholder body)
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Fetches one locator and reports what came back
///
/// Implementations should honour `timeout` themselves; the verifier adds its
/// own hard deadline on top.
#[async_trait]
pub trait Prober: Send + Sync + Debug {
    /// Fetch `locator` and report the image dimensions
    async fn fetch(&self, locator: &str, timeout: Duration) -> Result<Dimensions, ProbeFailure>;
}

/// HTTP prober backed by `reqwest`
#[derive(Debug, Clone)]
pub struct HttpProber {
    client: reqwest::Client,
    cache_bust: bool,
}

impl HttpProber {
    /// Create prober with a default client
    ///
    /// # Errors
    /// Returns the client builder error (TLS backend initialisation).
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("vista/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client))
    }

    /// Create prober around an existing client
    #[inline]
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            cache_bust: true,
        }
    }

    /// Toggle the `_t` cache-busting parameter
    #[inline]
    #[must_use]
    pub fn with_cache_bust(mut self, enabled: bool) -> Self {
        self.cache_bust = enabled;
        self
    }

    fn request_url(&self, locator: &str) -> String {
        if !self.cache_bust {
            return locator.to_string();
        }
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis())
            .unwrap_or_default();
        with_cache_buster(locator, millis)
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn fetch(&self, locator: &str, timeout: Duration) -> Result<Dimensions, ProbeFailure> {
        let timeout_ms = millis(timeout);
        let classify = |err: reqwest::Error| {
            if err.is_timeout() {
                ProbeFailure::Timeout { timeout_ms }
            } else {
                ProbeFailure::network(err.to_string())
            }
        };

        let response = self
            .client
            .get(self.request_url(locator))
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProbeFailure::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(classify)?;
        decode_dimensions(&body)
    }
}

/// Read image dimensions from an encoded body
///
/// # Errors
/// - `ProbeFailure::Undecodable` if the format is unknown or the header is corrupt
/// - `ProbeFailure::InvalidResource` if either dimension is zero
pub fn decode_dimensions(body: &[u8]) -> Result<Dimensions, ProbeFailure> {
    if body.is_empty() {
        return Err(ProbeFailure::InvalidResource { width: 0, height: 0 });
    }

    let (width, height) = image::ImageReader::new(Cursor::new(body))
        .with_guessed_format()
        .map_err(|e| ProbeFailure::undecodable(e.to_string()))?
        .into_dimensions()
        .map_err(|e| ProbeFailure::undecodable(e.to_string()))?;

    let dimensions = Dimensions::new(width, height);
    if dimensions.is_empty() {
        return Err(ProbeFailure::InvalidResource { width, height });
    }
    Ok(dimensions)
}

#[inline]
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
