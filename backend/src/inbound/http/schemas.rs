//! OpenAPI schema definitions for the pagination envelope.
//!
//! The `pagination` crate stays framework-agnostic and does not derive
//! `ToSchema`. These wrappers mirror `Paginated<T>` for each collection the
//! API serves so the generated document describes the real response shape.

use utoipa::ToSchema;

use crate::domain::{CommentView, PostView, UserSummary};

/// OpenAPI schema for `pagination::PaginationLinks`.
#[derive(ToSchema)]
#[expect(
    dead_code,
    reason = "Used only for OpenAPI schema generation via utoipa"
)]
pub struct PaginationLinksSchema {
    /// Link reproducing the current page.
    #[schema(rename = "self", example = "https://tsuki.example/api/v1/feed?limit=10")]
    current: String,
    /// Link to the following page; absent on the last page.
    next: Option<String>,
}

macro_rules! page_schema {
    ($name:ident, $item:ty, $doc:literal) => {
        #[doc = $doc]
        #[derive(ToSchema)]
        #[schema(rename_all = "camelCase")]
        #[expect(
            dead_code,
            reason = "Used only for OpenAPI schema generation via utoipa"
        )]
        pub struct $name {
            /// Items in collection order.
            data: Vec<$item>,
            /// Limit applied to this page.
            limit: u32,
            /// Opaque cursor for the following page; absent on the last page.
            next_cursor: Option<String>,
            /// Navigation links.
            links: PaginationLinksSchema,
        }
    };
}

page_schema!(UserPage, UserSummary, "A page of user search results.");
page_schema!(PostPage, PostView, "A page of posts.");
page_schema!(CommentPage, CommentView, "A page of comments.");
