//! CLI module
//!
//! Command-line interface for exploring the API by hand.
//!
//! # Commands
//!
//! - `get` - Print a resource
//! - `delete` - Delete a resource
//! - `list` - Page through a collection, one record per line

mod commands;
mod runner;

pub use commands::{Cli, Commands};
pub use runner::{build_client, Runner};
