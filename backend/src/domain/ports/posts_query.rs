//! Driving port for reading posts, feeds and comments.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{CommentView, Error, PostDetail, PostId, PostView, UserId};

/// Content read models consumed by inbound adapters.
#[async_trait]
pub trait PostsQuery: Send + Sync {
    /// A single post with its voters.
    async fn detail(&self, id: &PostId, viewer: Option<&UserId>) -> Result<PostDetail, Error>;

    /// Posts written by `username`, newest first.
    async fn by_author(
        &self,
        username: &str,
        viewer: Option<&UserId>,
        page: &PageRequest,
    ) -> Result<Vec<PostView>, Error>;

    /// Posts by `viewer` and the accounts they follow, newest first.
    async fn feed(&self, viewer: &UserId, page: &PageRequest) -> Result<Vec<PostView>, Error>;

    /// Comments on a post, oldest first.
    async fn comments(
        &self,
        post: &PostId,
        viewer: Option<&UserId>,
        page: &PageRequest,
    ) -> Result<Vec<CommentView>, Error>;
}
