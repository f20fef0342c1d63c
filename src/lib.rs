// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]

//! # Helpdesk Client
//!
//! Shared core underneath a ticketing API client: the HTTP transport with
//! rate-limit handling, and a pagination iterator that walks either of the
//! API's two pagination protocols through one interface.
//!
//! ## Features
//!
//! - **Transport**: GET/POST/PUT/PATCH/DELETE with per-verb status rules
//! - **Rate Limits**: 429 waits computed from `retry-after` / `ratelimit-reset`,
//!   retried internally or surfaced to the caller
//! - **Pagination**: Offset (page number) and cursor (`page[after]`) protocols
//! - **Cancellation**: every request and rate-limit wait is cancelable
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use helpdesk_client::{Collection, HttpClient, HttpClientConfig, PaginationOptions};
//! use helpdesk_client::auth::StaticCredential;
//! use helpdesk_client::config::support_base_url;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> helpdesk_client::Result<()> {
//!     let config = HttpClientConfig::builder()
//!         .base_url(support_base_url("acme")?)
//!         .build();
//!     let client = HttpClient::with_config(config)?
//!         .with_credential(StaticCredential::basic("agent@acme.com/token", "abc123"));
//!
//!     let views: Collection<serde_json::Value> = Collection::new("/views.json", "views");
//!     let mut pages = views.iter(&client, &PaginationOptions::new(), CancellationToken::new());
//!     while pages.has_more() {
//!         for view in pages.get_next().await? {
//!             println!("{view}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                  Resource wrappers (callers)                    │
//! │      Collection::new(path, key)    list()    iter() → pages     │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────────────┬───────────┴───────────┬──────────────────────┐
//! │    Pagination    │         HTTP          │        Auth          │
//! ├──────────────────┼───────────────────────┼──────────────────────┤
//! │ PageIterator     │ Transport / HttpClient│ Credential           │
//! │ Offset | Cursor  │ RetryPolicy (429)     │ Bearer | Basic       │
//! │ add_options      │ ApiError              │                      │
//! └──────────────────┴───────────────────────┴──────────────────────┘
//! ```

#![warn(clippy::all)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the client
pub mod error;

/// Common types and type aliases
pub mod types;

/// Credentials and request authorization
pub mod auth;

/// HTTP transport with rate-limit handling
pub mod http;

/// Offset and cursor pagination
pub mod pagination;

/// Base URLs, default headers and settings files
pub mod config;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{ApiError, Error, Result};
pub use types::*;

// Re-export commonly used types
pub use http::{HttpClient, HttpClientConfig, RetryPolicy, Transport};
pub use pagination::{Collection, CursorState, PageIterator, PageState, PaginationOptions};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
