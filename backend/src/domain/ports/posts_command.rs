//! Driving port for publishing and removing posts and comments.

use async_trait::async_trait;

use crate::domain::{
    CommentContent, CommentId, CommentView, Error, NewPost, PostId, PostView, UserId,
};

/// Content mutations called by inbound adapters.
#[async_trait]
pub trait PostsCommand: Send + Sync {
    /// Publish a post, storing its image first.
    async fn create(&self, post: NewPost) -> Result<PostView, Error>;

    /// Delete a post written by `actor`.
    async fn delete(&self, actor: &UserId, id: &PostId) -> Result<(), Error>;

    /// Comment on a post.
    async fn comment(
        &self,
        actor: &UserId,
        post: &PostId,
        content: CommentContent,
    ) -> Result<CommentView, Error>;

    /// Delete a comment written by `actor`.
    async fn delete_comment(
        &self,
        actor: &UserId,
        post: &PostId,
        comment: &CommentId,
    ) -> Result<(), Error>;
}
