//! Client configuration
//!
//! Default headers, base URL construction, and the YAML settings document
//! the `helpdesk` binary reads.

use crate::auth::StaticCredential;
use crate::error::{Error, Result, ResultExt};
use crate::http::HttpClientConfig;
use crate::types::StringMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use url::Url;

// ============================================================================
// Headers
// ============================================================================

/// Header carrying the product identifier
pub const USER_AGENT_HEADER: &str = "User-Agent";

/// Header carrying the body media type
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

/// Product identifier sent unless overridden
pub const DEFAULT_USER_AGENT: &str = concat!("helpdesk-client/", env!("CARGO_PKG_VERSION"));

/// Environment variable that overrides the secret in a settings file
pub const TOKEN_ENV: &str = "HELPDESK_TOKEN";

static DEFAULT_HEADERS: Lazy<StringMap> = Lazy::new(|| {
    let mut headers = StringMap::new();
    headers.insert(USER_AGENT_HEADER.to_string(), DEFAULT_USER_AGENT.to_string());
    headers.insert(
        CONTENT_TYPE_HEADER.to_string(),
        "application/json".to_string(),
    );
    headers
});

/// A fresh copy of the process-wide default headers
///
/// Each client owns its copy; overriding a header never leaks into other
/// clients.
pub fn default_headers() -> StringMap {
    DEFAULT_HEADERS.clone()
}

/// Insert a header, replacing any entry whose name differs only in case
pub fn insert_header(headers: &mut StringMap, key: impl Into<String>, value: impl Into<String>) {
    let key = key.into();
    headers.retain(|k, _| !k.eq_ignore_ascii_case(&key));
    headers.insert(key, value.into());
}

// ============================================================================
// Base URLs
// ============================================================================

static SUBDOMAIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z0-9][a-z0-9-]+[a-z0-9]$").expect("valid subdomain regex"));

/// Check an account subdomain
pub fn validate_subdomain(subdomain: &str) -> Result<()> {
    if SUBDOMAIN_RE.is_match(subdomain) {
        Ok(())
    } else {
        Err(Error::invalid_subdomain(subdomain))
    }
}

/// Base URL of the support API: `https://<subdomain>.zendesk.com/api/v2`
pub fn support_base_url(subdomain: &str) -> Result<Url> {
    validate_subdomain(subdomain)?;
    Ok(Url::parse(&format!("https://{subdomain}.zendesk.com/api/v2"))?)
}

/// Base URL of the conversations API for one app
pub fn conversations_base_url(subdomain: &str, app_id: &str) -> Result<Url> {
    validate_subdomain(subdomain)?;
    if app_id.is_empty() {
        return Err(Error::config(
            "An app id is required for the conversations API",
        ));
    }
    Ok(Url::parse(&format!(
        "https://{subdomain}.zendesk.com/sc/v2/apps/{app_id}"
    ))?)
}

/// Parse an endpoint URL without subdomain validation (mock servers, proxies)
pub fn endpoint_url(url: &str) -> Result<Url> {
    Ok(Url::parse(url)?)
}

// ============================================================================
// Settings
// ============================================================================

/// Settings document
///
/// ```yaml
/// subdomain: acme
/// email: agent@acme.com
/// token: abc123
/// auto_retry: false
/// headers:
///   X-Trace: enabled
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Account subdomain, used to build the support API base URL
    #[serde(default)]
    pub subdomain: Option<String>,

    /// Full base URL; takes precedence over `subdomain`
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Conversations app id; switches to the conversations API
    #[serde(default)]
    pub app_id: Option<String>,

    /// Retry 429 responses internally
    #[serde(default = "default_true")]
    pub auto_retry: bool,

    /// Connection establishment timeout in seconds (none by default)
    #[serde(default)]
    pub connect_timeout_seconds: Option<u64>,

    /// Extra or overriding headers
    #[serde(default)]
    pub headers: StringMap,

    /// User agent override
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Basic-auth user name
    #[serde(default)]
    pub email: Option<String>,

    /// Token or password
    #[serde(default)]
    pub token: Option<String>,

    /// Send `token` as a bearer token
    #[serde(default)]
    pub bearer: bool,
}

fn default_true() -> bool {
    true
}

impl Settings {
    /// Parse settings from a YAML string
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load settings from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .context(format!("Failed to read settings file '{}'", path.display()))?;
        Self::from_yaml_str(&content)
            .context(format!("Invalid settings file '{}'", path.display()))
    }

    /// Replace the token with `HELPDESK_TOKEN` when it is set
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.is_empty() {
                self.token = Some(token);
            }
        }
        self
    }

    /// Resolve the base URL
    pub fn base_url(&self) -> Result<Url> {
        if let Some(url) = &self.endpoint_url {
            return endpoint_url(url);
        }
        let subdomain = self
            .subdomain
            .as_deref()
            .ok_or_else(|| Error::config("Settings need either `subdomain` or `endpoint_url`"))?;
        match &self.app_id {
            Some(app_id) => conversations_base_url(subdomain, app_id),
            None => support_base_url(subdomain),
        }
    }

    /// Build the credential, if a token is configured
    pub fn credential(&self) -> Result<Option<StaticCredential>> {
        let Some(token) = &self.token else {
            return Ok(None);
        };
        if self.bearer {
            return Ok(Some(StaticCredential::bearer(token.clone())));
        }
        let email = self
            .email
            .as_deref()
            .ok_or_else(|| Error::config("Basic auth needs `email` alongside `token`"))?;
        Ok(Some(StaticCredential::basic(email, token.clone())))
    }

    /// Turn the settings into a transport config
    pub fn to_http_config(&self) -> Result<HttpClientConfig> {
        let mut builder = HttpClientConfig::builder()
            .base_url(self.base_url()?)
            .auto_retry(self.auto_retry);
        if let Some(secs) = self.connect_timeout_seconds {
            builder = builder.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(agent) = &self.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        for (key, value) in &self.headers {
            builder = builder.header(key.clone(), value.clone());
        }
        Ok(builder.build())
    }
}
