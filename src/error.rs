//! Error types for the helpdesk client
//!
//! Every public API returns `Result<T, Error>`. Responses the server rejected
//! surface as [`Error::Api`], which keeps the raw body and response metadata
//! so callers can show the original failure message.

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::fmt;
use thiserror::Error;

/// A response whose status was not accepted for the verb that produced it
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
}

impl ApiError {
    /// Create an API error from a raw response
    ///
    /// Mostly useful for callers mocking the client in their own tests.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
        }
    }

    /// HTTP status code returned by the server
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// HTTP headers returned by the server
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw response body, byte-for-byte
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Response body decoded as UTF-8 (lossy)
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = if self.body.is_empty() {
            self.status.canonical_reason().unwrap_or_default().to_string()
        } else {
            self.body_text()
        };
        write!(f, "{}: {}", self.status.as_u16(), message)
    }
}

impl std::error::Error for ApiError {}

/// The main error type for the helpdesk client
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // HTTP Errors
    // ============================================================================
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{0}")]
    Api(#[from] ApiError),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Caller Errors
    // ============================================================================
    #[error("Invalid options: {options}")]
    Options { options: String },

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("{subdomain} is an invalid subdomain")]
    InvalidSubdomain { subdomain: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    // ============================================================================
    // I/O Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an options error describing the missing or rejected options
    pub fn options(options: impl Into<String>) -> Self {
        Self::Options {
            options: options.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an invalid subdomain error
    pub fn invalid_subdomain(subdomain: impl Into<String>) -> Self {
        Self::InvalidSubdomain {
            subdomain: subdomain.into(),
        }
    }

    /// Borrow the API error, if the server rejected the request
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            Error::Api(err) => Some(err),
            _ => None,
        }
    }

    /// Check if the request was abandoned through its cancellation token
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Check if this is a 429 surfaced because auto-retry was off
    pub fn is_rate_limited(&self) -> bool {
        self.api()
            .is_some_and(|e| e.status() == StatusCode::TOO_MANY_REQUESTS)
    }

    /// Check if resubmitting the same request could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect(),
            Error::Api(e) => is_retryable_status(e.status()),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is retryable
fn is_retryable_status(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Result type alias for the helpdesk client
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to a local failure
    ///
    /// Server responses, transport failures and cancellation pass through
    /// unchanged so callers can still match on them.
    fn context(self, message: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, message: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let inner: Error = e.into();
            match inner {
                Error::Api(_) | Error::Http(_) | Error::Cancelled => inner,
                inner => Error::config(format!("{}: {}", message.into(), inner)),
            }
        })
    }
}
