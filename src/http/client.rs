//! HTTP transport for the helpdesk API
//!
//! Issues one authenticated request per call, reads the whole body, and
//! classifies the status per verb. Rate-limited responses go through the
//! [`RetryPolicy`]: either wait and re-issue, or hand the 429 back with the
//! computed wait recorded on the client.

use super::retry::{wait_for_retry, RateLimitAction, RetryPolicy};
use crate::auth::{authorize, Credential};
use crate::config::{default_headers, insert_header, USER_AGENT_HEADER};
use crate::error::{ApiError, Error, Result};
use crate::types::{Method, StringMap};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL every request path is appended to
    pub base_url: Option<Url>,
    /// Limit on establishing a connection; a call has no overall deadline
    pub connect_timeout: Option<Duration>,
    /// Wait and retry on 429 instead of returning it
    pub auto_retry: bool,
    /// Headers sent with every request
    pub default_headers: StringMap,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            connect_timeout: None,
            auto_retry: true,
            default_headers: default_headers(),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: Url) -> Self {
        self.config.base_url = Some(url);
        self
    }

    /// Set the connection establishment timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    /// Choose whether 429 responses are retried internally
    pub fn auto_retry(mut self, auto_retry: bool) -> Self {
        self.config.auto_retry = auto_retry;
        self
    }

    /// Add or override a header on this config's own copy
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        insert_header(&mut self.config.default_headers, key, value);
        self
    }

    /// Set user agent
    pub fn user_agent(self, agent: impl Into<String>) -> Self {
        self.header(USER_AGENT_HEADER, agent)
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// The five verbs resource wrappers are written against
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a resource; 200 is the only success
    async fn get(&self, cancel: &CancellationToken, path: &str) -> Result<Bytes>;

    /// POST a JSON-encoded body; 200 or 201 is success
    async fn post_json(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: Bytes,
    ) -> Result<Bytes>;

    /// PUT a JSON-encoded body; 200 or 204 is success
    async fn put_json(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: Bytes,
    ) -> Result<Bytes>;

    /// PATCH a JSON-encoded body; 200 or 204 is success
    async fn patch_json(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: Bytes,
    ) -> Result<Bytes>;

    /// DELETE a resource; 204 is the only success
    async fn delete(&self, cancel: &CancellationToken, path: &str) -> Result<()>;
}

/// HTTP client for the helpdesk API
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    credential: Option<Arc<dyn Credential>>,
    /// Last computed 429 wait in milliseconds, 0 when none was recorded
    last_wait_ms: AtomicU64,
}

impl HttpClient {
    /// Create a new HTTP client with default configuration
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build()?;

        Ok(Self::with_reqwest(client, config))
    }

    /// Wrap an existing reqwest client, sharing its connection pool
    pub fn with_reqwest(client: Client, config: HttpClientConfig) -> Self {
        Self {
            client,
            config,
            credential: None,
            last_wait_ms: AtomicU64::new(0),
        }
    }

    /// Set the credential used for the `Authorization` header
    #[must_use]
    pub fn with_credential(mut self, credential: impl Credential + 'static) -> Self {
        self.credential = Some(Arc::new(credential));
        self
    }

    /// Set the credential used for the `Authorization` header
    pub fn set_credential(&mut self, credential: Arc<dyn Credential>) {
        self.credential = Some(credential);
    }

    /// Set a header on this client only
    pub fn set_header(&mut self, key: impl Into<String>, value: impl Into<String>) {
        insert_header(&mut self.config.default_headers, key, value);
    }

    /// Point the client at a different base URL
    pub fn set_base_url(&mut self, url: Url) {
        self.config.base_url = Some(url);
    }

    /// Current configuration
    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Get the underlying reqwest client
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// The wait computed for the last 429 returned to the caller
    ///
    /// Only recorded when auto-retry is off.
    pub fn last_retry_wait(&self) -> Option<Duration> {
        match self.last_wait_ms.load(Ordering::Acquire) {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// GET a resource; 200 is the only success
    pub async fn get(&self, cancel: &CancellationToken, path: &str) -> Result<Bytes> {
        self.send(Method::GET, cancel, path, None).await
    }

    /// DELETE a resource; 204 is the only success
    pub async fn delete(&self, cancel: &CancellationToken, path: &str) -> Result<()> {
        self.send(Method::DELETE, cancel, path, None).await?;
        Ok(())
    }

    /// Make a GET request and decode the JSON body
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        path: &str,
    ) -> Result<T> {
        let body = self.get(cancel, path).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    /// POST a serializable body
    pub async fn post<B: Serialize + ?Sized + Sync>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: &B,
    ) -> Result<Bytes> {
        let body = encode(body)?;
        self.send(Method::POST, cancel, path, Some(body)).await
    }

    /// PUT a serializable body
    pub async fn put<B: Serialize + ?Sized + Sync>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: &B,
    ) -> Result<Bytes> {
        let body = encode(body)?;
        self.send(Method::PUT, cancel, path, Some(body)).await
    }

    /// PATCH a serializable body
    pub async fn patch<B: Serialize + ?Sized + Sync>(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: &B,
    ) -> Result<Bytes> {
        let body = encode(body)?;
        self.send(Method::PATCH, cancel, path, Some(body)).await
    }

    /// Issue a request, retrying on 429 while auto-retry is on
    ///
    /// The loop has no attempt ceiling; it ends on a non-429 status, a
    /// transport error, or cancellation.
    pub async fn send(
        &self,
        method: Method,
        cancel: &CancellationToken,
        path: &str,
        body: Option<Bytes>,
    ) -> Result<Bytes> {
        let url = self.build_url(path)?;
        let policy = RetryPolicy::new(self.config.auto_retry);
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!("{} {} (attempt {})", method, url, attempt);

            let mut req = self.client.request(method.into(), url.clone());
            for (key, value) in &self.config.default_headers {
                req = req.header(key.as_str(), value.as_str());
            }
            if let Some(ref credential) = self.credential {
                req = authorize(req, credential.as_ref());
            }
            if let Some(ref body) = body {
                req = req.body(body.clone());
            }

            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                response = req.send() => response?,
            };

            let status = response.status();
            let headers = response.headers().clone();
            let bytes = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(Error::Cancelled),
                bytes = response.bytes() => bytes?,
            };

            if status == StatusCode::TOO_MANY_REQUESTS {
                match policy.on_rate_limited(&headers) {
                    RateLimitAction::Retry(wait) => {
                        warn!(
                            "Rate limited (429) on {} {}, attempt {}, waiting {:?}",
                            method, path, attempt, wait
                        );
                        wait_for_retry(cancel, wait).await?;
                        continue;
                    }
                    RateLimitAction::Defer(wait) => {
                        warn!(
                            "Rate limited (429) on {} {}, retry after {:?}",
                            method, path, wait
                        );
                        self.record_wait(wait);
                        return Err(ApiError::new(status, headers, bytes).into());
                    }
                }
            }

            if !method.accepts(status) {
                debug!("{} {} failed with {}", method, url, status.as_u16());
                return Err(ApiError::new(status, headers, bytes).into());
            }

            debug!("Request succeeded: {} {}", method, url);
            return Ok(bytes);
        }
    }

    fn record_wait(&self, wait: Duration) {
        let ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX).max(1);
        self.last_wait_ms.store(ms, Ordering::Release);
    }

    /// Build full URL from path
    ///
    /// Paths are appended verbatim to the base URL (they already carry their
    /// query string). An absolute URL is accepted only on the base URL's
    /// origin, so credentials never leave it.
    fn build_url(&self, path: &str) -> Result<Url> {
        let base = self.config.base_url.as_ref().ok_or_else(|| {
            Error::config("No base URL configured (set a subdomain or endpoint URL)")
        })?;

        if path.starts_with("http://") || path.starts_with("https://") {
            let url = Url::parse(path)?;
            if url.origin() != base.origin() {
                return Err(Error::config(format!(
                    "Refusing to send request to {} outside the base URL {}",
                    url.origin().ascii_serialization(),
                    base.origin().ascii_serialization()
                )));
            }
            return Ok(url);
        }

        let base = base.as_str().trim_end_matches('/');
        let sep = if path.starts_with('/') || path.is_empty() { "" } else { "/" };
        Ok(Url::parse(&format!("{base}{sep}{path}"))?)
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn get(&self, cancel: &CancellationToken, path: &str) -> Result<Bytes> {
        HttpClient::get(self, cancel, path).await
    }

    async fn post_json(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: Bytes,
    ) -> Result<Bytes> {
        self.send(Method::POST, cancel, path, Some(body)).await
    }

    async fn put_json(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: Bytes,
    ) -> Result<Bytes> {
        self.send(Method::PUT, cancel, path, Some(body)).await
    }

    async fn patch_json(
        &self,
        cancel: &CancellationToken,
        path: &str,
        body: Bytes,
    ) -> Result<Bytes> {
        self.send(Method::PATCH, cancel, path, Some(body)).await
    }

    async fn delete(&self, cancel: &CancellationToken, path: &str) -> Result<()> {
        HttpClient::delete(self, cancel, path).await
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_credential", &self.credential.is_some())
            .field("last_retry_wait", &self.last_retry_wait())
            .finish_non_exhaustive()
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(body)?))
}
