//! Credential capability and request authorization
//!
//! The transport only needs three facts about a credential, so concrete
//! credential kinds live with the caller and plug in through [`Credential`].

use reqwest::RequestBuilder;
use std::fmt;

/// Capability the transport needs to build an `Authorization` header
pub trait Credential: Send + Sync {
    /// `true` when the secret is sent as a bearer token
    fn is_bearer(&self) -> bool;

    /// The token or password
    fn secret(&self) -> &str;

    /// Basic-auth user name; ignored for bearer credentials
    fn email(&self) -> &str;
}

/// Apply the credential's `Authorization` header to a request
pub fn authorize(req: RequestBuilder, credential: &dyn Credential) -> RequestBuilder {
    if credential.is_bearer() {
        req.bearer_auth(credential.secret())
    } else {
        req.basic_auth(credential.email(), Some(credential.secret()))
    }
}

/// Plain credential value built from settings
#[derive(Clone, PartialEq, Eq)]
pub struct StaticCredential {
    email: String,
    secret: String,
    bearer: bool,
}

impl StaticCredential {
    /// Basic-auth credential (`email`, `secret`)
    pub fn basic(email: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            secret: secret.into(),
            bearer: false,
        }
    }

    /// Bearer-token credential
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            email: String::new(),
            secret: token.into(),
            bearer: true,
        }
    }
}

impl Credential for StaticCredential {
    fn is_bearer(&self) -> bool {
        self.bearer
    }

    fn secret(&self) -> &str {
        &self.secret
    }

    fn email(&self) -> &str {
        &self.email
    }
}

// Never print the secret
impl fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticCredential")
            .field("email", &self.email)
            .field("bearer", &self.bearer)
            .finish_non_exhaustive()
    }
}
