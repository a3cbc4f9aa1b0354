//! Page requests and the response envelope returned to clients.

use serde::Serialize;
use url::Url;

use crate::cursor::{Cursor, CursorError};

/// Page size used when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Largest page a caller may request.
pub const MAX_PAGE_SIZE: u32 = 100;

const CURSOR_PARAM: &str = "cursor";
const LIMIT_PARAM: &str = "limit";

/// A validated `(limit, offset)` window.
///
/// ## Invariants
/// - `limit` lies within `1..=MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    limit: u32,
    cursor: Cursor,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl PageRequest {
    /// Build a request, clamping the limit into the supported range.
    #[must_use]
    pub fn new(limit: Option<u32>, cursor: Option<Cursor>) -> Self {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        Self {
            limit,
            cursor: cursor.unwrap_or_default(),
        }
    }

    /// Build a request from raw query string values.
    ///
    /// # Errors
    /// Returns [`CursorError`] when a cursor is present but cannot be decoded.
    pub fn from_query(limit: Option<u32>, cursor: Option<&str>) -> Result<Self, CursorError> {
        let decoded = cursor.map(Cursor::decode).transpose()?;
        Ok(Self::new(limit, decoded))
    }

    /// Maximum number of items in the page.
    #[must_use]
    pub const fn limit(&self) -> u32 {
        self.limit
    }

    /// Number of items to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.cursor.offset()
    }

    /// Position this page starts from.
    #[must_use]
    pub const fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Cursor for the following page, if one may exist.
    ///
    /// A page shorter than the limit is the last one.
    #[must_use]
    pub fn next_cursor(&self, returned: usize) -> Option<Cursor> {
        let returned = u64::try_from(returned).unwrap_or(u64::MAX);
        (returned >= u64::from(self.limit)).then(|| self.cursor.advance(returned))
    }
}

/// Navigation links for a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PaginationLinks {
    /// Link reproducing the current page.
    #[serde(rename = "self")]
    pub current: String,
    /// Link to the following page, absent on the last page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl PaginationLinks {
    fn build(base: &Url, limit: u32, current: Cursor, next: Option<Cursor>) -> Self {
        Self {
            current: with_window(base, limit, current).into(),
            next: next.map(|cursor| with_window(base, limit, cursor).into()),
        }
    }
}

fn with_window(base: &Url, limit: u32, cursor: Cursor) -> Url {
    let retained: Vec<(String, String)> = base
        .query_pairs()
        .filter(|(name, _)| name != CURSOR_PARAM && name != LIMIT_PARAM)
        .map(|(name, value)| (name.into_owned(), value.into_owned()))
        .collect();

    let mut url = base.clone();
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in &retained {
            pairs.append_pair(name, value);
        }
        pairs.append_pair(LIMIT_PARAM, &limit.to_string());
        if cursor.offset() > 0 {
            pairs.append_pair(CURSOR_PARAM, &cursor.encode());
        }
    }
    url
}

/// Envelope wrapping one page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    /// Items in collection order.
    pub data: Vec<T>,
    /// Limit applied to this page.
    pub limit: u32,
    /// Opaque token for the following page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
    /// Navigation links derived from the request URL.
    pub links: PaginationLinks,
}

impl<T> Paginated<T> {
    /// Wrap a page of items fetched for `request`.
    ///
    /// `base` is the URL the page was requested from; its unrelated query
    /// parameters (such as a search filter) are preserved in the links.
    #[must_use]
    pub fn new(data: Vec<T>, request: &PageRequest, base: &Url) -> Self {
        let next = request.next_cursor(data.len());
        Self {
            links: PaginationLinks::build(base, request.limit(), request.cursor(), next),
            next_cursor: next.map(Cursor::encode),
            limit: request.limit(),
            data,
        }
    }

    /// Transform every item while keeping the navigation state.
    #[must_use]
    pub fn map<U, F>(self, f: F) -> Paginated<U>
    where
        F: FnMut(T) -> U,
    {
        Paginated {
            data: self.data.into_iter().map(f).collect(),
            limit: self.limit,
            next_cursor: self.next_cursor,
            links: self.links,
        }
    }
}
