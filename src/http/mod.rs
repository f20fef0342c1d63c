//! HTTP transport module
//!
//! Provides the authenticated transport and its rate-limit retry policy.
//!
//! # Features
//!
//! - **Per-verb status classification**: GET 200, POST 200/201, PUT/PATCH 200/204, DELETE 204
//! - **Rate-limit handling**: wait and re-issue on 429, or return it with the computed wait
//! - **Cancellation**: every call races a `CancellationToken`

mod client;
mod retry;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, Transport};
pub use retry::{
    compute_wait, wait_for_retry, RateLimitAction, RetryPolicy, DEFAULT_WAIT, RATELIMIT_RESET,
    RETRY_AFTER, SAFETY_MARGIN,
};

#[cfg(test)]
mod tests;
