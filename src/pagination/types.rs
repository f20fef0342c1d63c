//! Pagination types
//!
//! Per-response position records for both protocols, and the query options
//! sent to the server.

use crate::types::StringMap;
use serde::{Deserialize, Deserializer, Serialize};

/// Default number of records per page
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Treat an explicit JSON `null` like a missing field
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Treat `null` and `""` as an absent link
fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.filter(|s| !s.is_empty()))
}

// ============================================================================
// Offset pagination
// ============================================================================

/// Position in an offset-paginated sequence
///
/// Decoded from the response envelope: `count`, `next_page`, `previous_page`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageState {
    /// Total number of records the server reports
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
    /// Link to the following page, present iff one exists
    #[serde(default, deserialize_with = "empty_as_none")]
    pub next_page: Option<String>,
    /// Link to the preceding page
    #[serde(default, deserialize_with = "empty_as_none")]
    pub previous_page: Option<String>,
}

impl PageState {
    /// Check if a following page exists
    pub fn has_next(&self) -> bool {
        self.next_page.is_some()
    }

    /// Check if a preceding page exists
    pub fn has_previous(&self) -> bool {
        self.previous_page.is_some()
    }
}

/// Query options for one offset-paginated request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OffsetOptions {
    /// 1-based page number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Records per page
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_page: Option<u32>,
    /// Extra query parameters
    #[serde(flatten)]
    pub params: StringMap,
}

// ============================================================================
// Cursor pagination
// ============================================================================

/// Position in a cursor-paginated sequence
///
/// Decoded from the response's `meta` object. When `has_more` is false the
/// `after_cursor` must not be used for another fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorState {
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_more: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub after_cursor: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub before_cursor: String,
}

/// Query options for one cursor-paginated request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CursorOptions {
    #[serde(rename = "page[size]", skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    #[serde(rename = "page[after]", skip_serializing_if = "Option::is_none")]
    pub page_after: Option<String>,
    #[serde(rename = "page[before]", skip_serializing_if = "Option::is_none")]
    pub page_before: Option<String>,
    /// Extra query parameters
    #[serde(flatten)]
    pub params: StringMap,
}

// ============================================================================
// Iterator options
// ============================================================================

/// Which protocol an iterator speaks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaginationMode {
    /// Page number and page size; ends when `next_page` is absent
    Offset,
    /// Opaque cursor; ends when `has_more` is false
    #[default]
    Cursor,
}

/// Options for a whole scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationOptions {
    /// Records per page
    pub page_size: u32,
    /// Protocol, fixed for the life of the iterator
    pub mode: PaginationMode,
    /// Extra query parameters sent with every page (filters, sorting)
    pub params: StringMap,
}

impl Default for PaginationOptions {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            mode: PaginationMode::default(),
            params: StringMap::new(),
        }
    }
}

impl PaginationOptions {
    /// Cursor pagination with the default page size
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset pagination with the given page size
    pub fn offset(page_size: u32) -> Self {
        Self {
            page_size,
            mode: PaginationMode::Offset,
            ..Self::default()
        }
    }

    /// Cursor pagination with the given page size
    pub fn cursor(page_size: u32) -> Self {
        Self {
            page_size,
            mode: PaginationMode::Cursor,
            ..Self::default()
        }
    }

    /// Add a query parameter sent with every page
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}
