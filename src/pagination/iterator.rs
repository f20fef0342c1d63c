//! Page iterator over either pagination protocol
//!
//! The iterator is bound to exactly one protocol at construction. Each
//! [`PageIterator::get_next`] issues one fetch and returns one page in server
//! order; nothing is prefetched or buffered.

use super::types::{
    CursorOptions, CursorState, OffsetOptions, PageState, PaginationMode, PaginationOptions,
};
use crate::error::Result;
use crate::types::StringMap;
use futures::future::BoxFuture;
use futures::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Fetches one offset-paginated page
pub type OffsetFetch<'a, T> = Box<
    dyn FnMut(CancellationToken, OffsetOptions) -> BoxFuture<'a, Result<(Vec<T>, PageState)>>
        + Send
        + 'a,
>;

/// Fetches one cursor-paginated page
pub type CursorFetch<'a, T> = Box<
    dyn FnMut(CancellationToken, CursorOptions) -> BoxFuture<'a, Result<(Vec<T>, CursorState)>>
        + Send
        + 'a,
>;

/// The bound fetch operation and its protocol-specific position
pub enum Fetcher<'a, T> {
    Offset {
        fetch: OffsetFetch<'a, T>,
        /// Next page to request, starting at 1
        page_index: u32,
    },
    Cursor {
        fetch: CursorFetch<'a, T>,
        /// Cursor for the next request, empty for the first
        after_cursor: String,
    },
}

impl<T> Fetcher<'_, T> {
    /// Protocol this fetcher speaks
    pub fn mode(&self) -> PaginationMode {
        match self {
            Self::Offset { .. } => PaginationMode::Offset,
            Self::Cursor { .. } => PaginationMode::Cursor,
        }
    }
}

impl<T> std::fmt::Debug for Fetcher<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Offset { page_index, .. } => f
                .debug_struct("Offset")
                .field("page_index", page_index)
                .finish_non_exhaustive(),
            Self::Cursor { after_cursor, .. } => f
                .debug_struct("Cursor")
                .field("after_cursor", after_cursor)
                .finish_non_exhaustive(),
        }
    }
}

/// Walks a paginated resource one page at a time
///
/// Not meant to be shared: it is a single position in a sequence. Once the
/// server reports the end, [`has_more`](Self::has_more) stays false and
/// [`get_next`](Self::get_next) returns an empty page without fetching.
#[derive(Debug)]
pub struct PageIterator<'a, T> {
    fetcher: Fetcher<'a, T>,
    page_size: u32,
    params: StringMap,
    has_more: bool,
    cancel: CancellationToken,
}

impl<'a, T> PageIterator<'a, T> {
    /// Build an iterator from both fetch operations, keeping the one that
    /// matches `options.mode`
    pub fn new(
        options: &PaginationOptions,
        cancel: CancellationToken,
        offset: OffsetFetch<'a, T>,
        cursor: CursorFetch<'a, T>,
    ) -> Self {
        let fetcher = match options.mode {
            PaginationMode::Offset => Fetcher::Offset {
                fetch: offset,
                page_index: 1,
            },
            PaginationMode::Cursor => Fetcher::Cursor {
                fetch: cursor,
                after_cursor: String::new(),
            },
        };
        Self::from_fetcher(fetcher, options.page_size, cancel).with_params(options.params.clone())
    }

    /// Offset-mode iterator starting at page 1
    pub fn offset(fetch: OffsetFetch<'a, T>, page_size: u32, cancel: CancellationToken) -> Self {
        Self::from_fetcher(
            Fetcher::Offset {
                fetch,
                page_index: 1,
            },
            page_size,
            cancel,
        )
    }

    /// Cursor-mode iterator starting before the first cursor
    pub fn cursor(fetch: CursorFetch<'a, T>, page_size: u32, cancel: CancellationToken) -> Self {
        Self::from_fetcher(
            Fetcher::Cursor {
                fetch,
                after_cursor: String::new(),
            },
            page_size,
            cancel,
        )
    }

    fn from_fetcher(fetcher: Fetcher<'a, T>, page_size: u32, cancel: CancellationToken) -> Self {
        Self {
            fetcher,
            page_size,
            params: StringMap::new(),
            has_more: true,
            cancel,
        }
    }

    /// Send these query parameters with every page
    #[must_use]
    pub fn with_params(mut self, params: StringMap) -> Self {
        self.params = params;
        self
    }

    /// Whether another page may exist; never does I/O
    pub fn has_more(&self) -> bool {
        self.has_more
    }

    /// Protocol this iterator was built for
    pub fn mode(&self) -> PaginationMode {
        self.fetcher.mode()
    }

    /// Next page number (offset mode only)
    pub fn page_index(&self) -> Option<u32> {
        match &self.fetcher {
            Fetcher::Offset { page_index, .. } => Some(*page_index),
            Fetcher::Cursor { .. } => None,
        }
    }

    /// Cursor for the next request (cursor mode only)
    pub fn after_cursor(&self) -> Option<&str> {
        match &self.fetcher {
            Fetcher::Cursor { after_cursor, .. } => Some(after_cursor),
            Fetcher::Offset { .. } => None,
        }
    }

    /// Fetch the next page
    ///
    /// On error the position is unchanged, so calling again retries the same
    /// page. After the last page this returns an empty `Vec` without I/O.
    pub async fn get_next(&mut self) -> Result<Vec<T>> {
        if !self.has_more {
            return Ok(Vec::new());
        }

        let page_size = (self.page_size > 0).then_some(self.page_size);

        match &mut self.fetcher {
            Fetcher::Offset { fetch, page_index } => {
                let opts = OffsetOptions {
                    page: Some(*page_index),
                    per_page: page_size,
                    params: self.params.clone(),
                };
                debug!("Fetching offset page {}", page_index);
                let (items, page) = fetch(self.cancel.clone(), opts).await?;

                self.has_more = page.has_next();
                if self.has_more {
                    *page_index += 1;
                }
                Ok(items)
            }
            Fetcher::Cursor {
                fetch,
                after_cursor,
            } => {
                let opts = CursorOptions {
                    page_size,
                    page_after: Some(after_cursor.clone()),
                    page_before: None,
                    params: self.params.clone(),
                };
                debug!("Fetching cursor page after {:?}", after_cursor);
                let (items, meta) = fetch(self.cancel.clone(), opts).await?;

                if meta.has_more && meta.after_cursor.is_empty() {
                    warn!(
                        "Server reported more pages without a cursor, next fetch restarts from the first page"
                    );
                }
                self.has_more = meta.has_more;
                *after_cursor = meta.after_cursor;
                Ok(items)
            }
        }
    }

    /// Turn the iterator into a stream of pages
    ///
    /// The stream ends after the last page. An error is yielded once and
    /// ends the stream.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<T>>> + Send + 'a
    where
        T: Send + 'a,
    {
        futures::stream::unfold(Some(self), |state| async move {
            let mut iter = state?;
            if !iter.has_more() {
                return None;
            }
            match iter.get_next().await {
                Ok(items) => Some((Ok(items), Some(iter))),
                Err(e) => Some((Err(e), None)),
            }
        })
    }
}
