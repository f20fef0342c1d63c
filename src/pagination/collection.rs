//! Generic paginated resource
//!
//! Resource wrappers only differ by path and the JSON key holding the
//! records. [`Collection`] supplies the path builder and both fetch
//! operations for any such resource.

use super::iterator::{CursorFetch, OffsetFetch, PageIterator};
use super::query::add_options;
use super::types::{CursorOptions, CursorState, OffsetOptions, PageState, PaginationOptions};
use crate::error::{Error, Result};
use crate::http::Transport;
use futures::FutureExt;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;
use tokio_util::sync::CancellationToken;

/// A listable resource such as `/views.json` keyed by `"views"`
pub struct Collection<T> {
    path: String,
    key: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            key: self.key.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("path", &self.path)
            .field("key", &self.key)
            .finish()
    }
}

impl<T> Collection<T>
where
    T: DeserializeOwned + Send + 'static,
{
    /// Describe a resource by path and record key
    pub fn new(path: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
            _marker: PhantomData,
        }
    }

    /// Resource path, relative to the base URL
    pub fn path(&self) -> &str {
        &self.path
    }

    /// JSON key holding the records
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Fetch one offset-paginated page; `None` requests the server default
    pub async fn fetch_offset<C: Transport + ?Sized>(
        &self,
        client: &C,
        cancel: &CancellationToken,
        opts: Option<&OffsetOptions>,
    ) -> Result<(Vec<T>, PageState)> {
        let url = match opts {
            Some(opts) => add_options(&self.path, opts)?,
            None => add_options(&self.path, &OffsetOptions::default())?,
        };
        let mut body = self.get_envelope(client, cancel, &url).await?;
        let items = self.take_items(&mut body)?;
        let page: PageState = serde_json::from_value(body)?;
        Ok((items, page))
    }

    /// Fetch one cursor-paginated page; `None` requests the server default
    pub async fn fetch_cursor<C: Transport + ?Sized>(
        &self,
        client: &C,
        cancel: &CancellationToken,
        opts: Option<&CursorOptions>,
    ) -> Result<(Vec<T>, CursorState)> {
        let url = match opts {
            Some(opts) => add_options(&self.path, opts)?,
            None => add_options(&self.path, &CursorOptions::default())?,
        };
        let mut body = self.get_envelope(client, cancel, &url).await?;
        let items = self.take_items(&mut body)?;
        let meta = match body.get_mut("meta").map(Value::take) {
            Some(meta) => serde_json::from_value(meta)?,
            None => CursorState::default(),
        };
        Ok((items, meta))
    }

    /// Fetch one offset-paginated page with explicit options
    ///
    /// Fails with [`Error::Options`] before any request when `opts` is `None`.
    pub async fn list<C: Transport + ?Sized>(
        &self,
        client: &C,
        cancel: &CancellationToken,
        opts: Option<&OffsetOptions>,
    ) -> Result<(Vec<T>, PageState)> {
        let opts = opts.ok_or_else(|| {
            Error::options(format!("page options are required to list {}", self.path))
        })?;
        self.fetch_offset(client, cancel, Some(opts)).await
    }

    /// Iterate over every page using the protocol in `options`
    pub fn iter<'a, C: Transport + ?Sized>(
        &self,
        client: &'a C,
        options: &PaginationOptions,
        cancel: CancellationToken,
    ) -> PageIterator<'a, T> {
        let offset_resource = self.clone();
        let offset: OffsetFetch<'a, T> = Box::new(move |cancel, opts| {
            let resource = offset_resource.clone();
            async move { resource.fetch_offset(client, &cancel, Some(&opts)).await }.boxed()
        });

        let cursor_resource = self.clone();
        let cursor: CursorFetch<'a, T> = Box::new(move |cancel, opts| {
            let resource = cursor_resource.clone();
            async move { resource.fetch_cursor(client, &cancel, Some(&opts)).await }.boxed()
        });

        PageIterator::new(options, cancel, offset, cursor)
    }

    async fn get_envelope<C: Transport + ?Sized>(
        &self,
        client: &C,
        cancel: &CancellationToken,
        url: &str,
    ) -> Result<Value> {
        let body = client.get(cancel, url).await?;
        Ok(serde_json::from_slice(&body)?)
    }

    fn take_items(&self, body: &mut Value) -> Result<Vec<T>> {
        match body.get_mut(&self.key).map(Value::take) {
            Some(Value::Null) => Ok(Vec::new()),
            Some(records) => Ok(serde_json::from_value(records)?),
            None => Err(Error::decode(format!(
                "response for {} has no '{}' field",
                self.path, self.key
            ))),
        }
    }
}
