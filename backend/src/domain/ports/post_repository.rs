//! Ports for posts and comments.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{
    Comment, CommentId, CommentRecord, Error, Post, PostId, PostRecord, UserId, Username,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by post and comment repository adapters.
    pub enum ContentStoreError {
        /// Repository connection could not be established.
        Connection { message: String } => "content repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "content repository query failed: {message}",
        /// The referenced post or author no longer exists.
        MissingParent => "referenced post or author does not exist",
    }
}

impl From<ContentStoreError> for Error {
    fn from(value: ContentStoreError) -> Self {
        match value {
            ContentStoreError::Connection { message } => Self::service_unavailable(message),
            ContentStoreError::Query { message } => Self::internal(message),
            ContentStoreError::MissingParent => Self::not_found("Post does not exist."),
        }
    }
}

/// Persistence contract for posts.
#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Store a new post.
    async fn insert(&self, post: &Post) -> Result<(), ContentStoreError>;

    /// Fetch the bare post row.
    async fn find(&self, id: &PostId) -> Result<Option<Post>, ContentStoreError>;

    /// Fetch a post with author and vote tally as seen by `viewer`.
    async fn find_record(
        &self,
        id: &PostId,
        viewer: Option<&UserId>,
    ) -> Result<Option<PostRecord>, ContentStoreError>;

    /// Delete a post with its votes and comments; `false` when absent.
    async fn delete(&self, id: &PostId) -> Result<bool, ContentStoreError>;

    /// Posts written by `author`, newest first.
    async fn by_author(
        &self,
        author: &UserId,
        viewer: Option<&UserId>,
        page: &PageRequest,
    ) -> Result<Vec<PostRecord>, ContentStoreError>;

    /// Posts by `viewer` and everyone `viewer` follows, newest first.
    async fn feed(
        &self,
        viewer: &UserId,
        page: &PageRequest,
    ) -> Result<Vec<PostRecord>, ContentStoreError>;

    /// Usernames of everyone who voted on the post, ordered by username.
    async fn voters(&self, id: &PostId) -> Result<Vec<Username>, ContentStoreError>;
}

/// Persistence contract for comments.
#[async_trait]
pub trait CommentRepository: Send + Sync {
    /// Store a new comment.
    async fn insert(&self, comment: &Comment) -> Result<(), ContentStoreError>;

    /// Fetch a comment with its author.
    async fn find_record(
        &self,
        id: &CommentId,
    ) -> Result<Option<CommentRecord>, ContentStoreError>;

    /// Delete a comment; `false` when absent.
    async fn delete(&self, id: &CommentId) -> Result<bool, ContentStoreError>;

    /// Comments on `post`, oldest first.
    async fn for_post(
        &self,
        post: &PostId,
        page: &PageRequest,
    ) -> Result<Vec<CommentRecord>, ContentStoreError>;
}
