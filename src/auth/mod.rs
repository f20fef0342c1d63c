//! Authentication module
//!
//! Supports bearer tokens and HTTP basic auth through the [`Credential`]
//! capability trait.

mod credential;

pub use credential::{authorize, Credential, StaticCredential};

#[cfg(test)]
mod tests;
