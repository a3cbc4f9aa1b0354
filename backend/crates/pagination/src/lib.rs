//! Opaque cursor and page envelope primitives.
//!
//! Every "load more" endpoint pages through an ordered collection with a
//! `(limit, offset)` window. The offset never lives on the server: callers
//! receive it back as an opaque [`Cursor`] token inside a [`Paginated`]
//! envelope and present it on the next request, so concurrent readers of the
//! same collection cannot disturb each other.
//!
//! ```
//! use pagination::{Cursor, PageRequest, Paginated};
//! use url::Url;
//!
//! let request = PageRequest::new(Some(2), None);
//! let base = Url::parse("https://tsuki.test/api/v1/feed").expect("valid url");
//! let page = Paginated::new(vec!["a", "b"], &request, &base);
//!
//! let next = page.next_cursor.as_deref().expect("full page has a successor");
//! assert_eq!(Cursor::decode(next).expect("round trip").offset(), 2);
//! ```

mod cursor;
mod page;

pub use cursor::{Cursor, CursorError};
pub use page::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, PageRequest, Paginated, PaginationLinks};
