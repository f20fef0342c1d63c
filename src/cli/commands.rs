//! CLI commands and argument parsing

use crate::pagination::DEFAULT_PAGE_SIZE;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Helpdesk API explorer
#[derive(Parser, Debug)]
#[command(name = "helpdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Settings file (YAML)
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// GET a resource and print the response body
    Get {
        /// Path relative to the base URL, e.g. /tickets/1.json
        path: String,
    },

    /// DELETE a resource
    Delete {
        /// Path relative to the base URL
        path: String,
    },

    /// Page through a collection, printing one record per line
    List {
        /// Collection path, e.g. /views.json
        path: String,

        /// JSON key holding the records, e.g. views
        key: String,

        /// Use cursor pagination instead of page numbers
        #[arg(long)]
        cursor: bool,

        /// Records per page
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
    },
}
