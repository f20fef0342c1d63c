//! Rate-limit retry policy
//!
//! Decides what happens when the server answers 429 and how long to wait
//! before the request may be resubmitted.

use crate::error::{Error, Result};
use reqwest::header::HeaderMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Preferred wait hint, in seconds
pub const RETRY_AFTER: &str = "retry-after";

/// Fallback wait hint, in seconds
pub const RATELIMIT_RESET: &str = "ratelimit-reset";

/// Wait used when neither header is usable
pub const DEFAULT_WAIT: Duration = Duration::from_secs(60);

/// Added to every computed wait to absorb clock skew
pub const SAFETY_MARGIN: Duration = Duration::from_secs(1);

/// What the transport does with a rate-limited response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitAction {
    /// Sleep for the duration, then re-issue the same request
    Retry(Duration),
    /// Record the duration and hand the 429 back to the caller
    Defer(Duration),
}

impl RateLimitAction {
    /// The computed wait, whichever way it is handled
    pub fn wait(&self) -> Duration {
        match self {
            Self::Retry(d) | Self::Defer(d) => *d,
        }
    }
}

/// Retry policy for 429 responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retry internally instead of returning the 429 to the caller
    pub auto_retry: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { auto_retry: true }
    }
}

impl RetryPolicy {
    /// Create a policy
    pub fn new(auto_retry: bool) -> Self {
        Self { auto_retry }
    }

    /// Decide how to handle a rate-limited response
    pub fn on_rate_limited(&self, headers: &HeaderMap) -> RateLimitAction {
        let wait = compute_wait(headers);
        if self.auto_retry {
            RateLimitAction::Retry(wait)
        } else {
            RateLimitAction::Defer(wait)
        }
    }
}

/// Compute how long to wait before resubmitting a rate-limited request
///
/// Reads `retry-after`, then `ratelimit-reset`, as whole seconds, defaulting
/// to 60. The result always includes [`SAFETY_MARGIN`].
pub fn compute_wait(headers: &HeaderMap) -> Duration {
    let base = header_seconds(headers, RETRY_AFTER)
        .or_else(|| {
            debug!("No usable {RETRY_AFTER} header, trying {RATELIMIT_RESET}");
            header_seconds(headers, RATELIMIT_RESET)
        })
        .map_or_else(
            || {
                debug!("No usable rate limit header, waiting {DEFAULT_WAIT:?}");
                DEFAULT_WAIT
            },
            Duration::from_secs,
        );

    base.saturating_add(SAFETY_MARGIN)
}

fn header_seconds(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}

/// Sleep for `wait` unless the token is cancelled first
///
/// Returns [`Error::Cancelled`] as soon as the token fires.
pub async fn wait_for_retry(cancel: &CancellationToken, wait: Duration) -> Result<()> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => {
            debug!("Rate limit wait aborted by cancellation");
            Err(Error::Cancelled)
        }
        () = tokio::time::sleep(wait) => Ok(()),
    }
}
