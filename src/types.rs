//! Common types used throughout the helpdesk client
//!
//! Shared type aliases and the HTTP verb table used by the transport.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// Ordered string map, used for headers and extra query parameters
pub type StringMap = BTreeMap<String, String>;

// ============================================================================
// HTTP Types
// ============================================================================

/// HTTP verbs the API is called with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[allow(clippy::upper_case_acronyms)]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl Method {
    /// Status codes that count as success for this verb
    ///
    /// Some write endpoints reply 204 without a body, so PUT and PATCH accept
    /// it alongside 200.
    pub fn accepted_statuses(self) -> &'static [StatusCode] {
        match self {
            Method::GET => &[StatusCode::OK],
            Method::POST => &[StatusCode::OK, StatusCode::CREATED],
            Method::PUT | Method::PATCH => &[StatusCode::OK, StatusCode::NO_CONTENT],
            Method::DELETE => &[StatusCode::NO_CONTENT],
        }
    }

    /// Check if a status is a success for this verb
    pub fn accepts(self, status: StatusCode) -> bool {
        self.accepted_statuses().contains(&status)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::PATCH => reqwest::Method::PATCH,
            Method::DELETE => reqwest::Method::DELETE,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(reqwest::Method::from(*self).as_str())
    }
}
