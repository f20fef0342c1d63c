//! Pagination module
//!
//! Supports: Offset (page number + page size), Cursor (`page[after]`)
//!
//! # Overview
//!
//! List endpoints return one page per request plus a position record
//! ([`PageState`] or [`CursorState`]). [`PageIterator`] walks those pages
//! one at a time, bound to a single protocol for its whole life, and
//! [`Collection`] wires any listable resource into it.

mod collection;
mod iterator;
mod query;
mod types;

pub use collection::Collection;
pub use iterator::{CursorFetch, Fetcher, OffsetFetch, PageIterator};
pub use query::add_options;
pub use types::{
    CursorOptions, CursorState, OffsetOptions, PageState, PaginationMode, PaginationOptions,
    DEFAULT_PAGE_SIZE,
};
