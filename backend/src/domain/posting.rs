//! Posts, comments and the feed.
//!
//! Publishing stores the image first and only then writes the post row. When
//! the store rejects the row the stored image is removed again. A timed out or
//! disconnected insert may still commit, so its image is kept.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use pagination::PageRequest;

use crate::domain::directory::USER_NOT_FOUND_MESSAGE;
use crate::domain::ports::{
    CommentRepository, ImageStore, PostRepository, PostsCommand, PostsQuery, UserRepository,
};
use crate::domain::{
    Comment, CommentContent, CommentId, CommentView, Error, ErrorCode, NewPost, Post, PostDetail,
    PostId, PostView, StoreDeadline, UserId,
};

/// Message returned when a post id matches nothing.
pub const POST_NOT_FOUND_MESSAGE: &str = "Post does not exist.";

/// Message returned when a comment id matches nothing under the post.
pub const COMMENT_NOT_FOUND_MESSAGE: &str = "Comment does not exist.";

/// Message returned when someone other than the author mutates content.
pub const NOT_AUTHOR_MESSAGE: &str = "Cannot perform this task.";

/// Driven ports used by [`PostService`].
#[derive(Clone)]
pub struct PostStores<P, C, U, I> {
    /// Post persistence.
    pub posts: Arc<P>,
    /// Comment persistence.
    pub comments: Arc<C>,
    /// Account lookups.
    pub users: Arc<U>,
    /// Image uploads.
    pub images: Arc<I>,
}

/// Content service implementing [`PostsCommand`] and [`PostsQuery`].
#[derive(Clone)]
pub struct PostService<P, C, U, I> {
    stores: PostStores<P, C, U, I>,
    clock: Arc<dyn Clock>,
    deadline: StoreDeadline,
}

impl<P, C, U, I> PostService<P, C, U, I> {
    /// Create a service over `stores`.
    pub fn new(
        stores: PostStores<P, C, U, I>,
        clock: Arc<dyn Clock>,
        deadline: StoreDeadline,
    ) -> Self {
        Self {
            stores,
            clock,
            deadline,
        }
    }
}

/// Whether a failed insert could still have written the row.
///
/// Timeouts and lost connections leave the outcome unknown; every other
/// failure means the row was rejected.
fn insert_may_have_committed(err: &Error) -> bool {
    err.code() == ErrorCode::ServiceUnavailable
}

/// File name component of a stored image URL.
fn image_file_name(url: &str) -> Option<&str> {
    url.rsplit('/').next().filter(|name| !name.is_empty())
}

impl<P, C, U, I> PostService<P, C, U, I>
where
    P: PostRepository,
    C: CommentRepository,
    U: UserRepository,
    I: ImageStore,
{
    async fn require_post(&self, id: &PostId) -> Result<Post, Error> {
        self.deadline
            .run("posts.find", self.stores.posts.find(id))
            .await?
            .ok_or_else(|| Error::not_found(POST_NOT_FOUND_MESSAGE))
    }

    async fn discard_image(&self, file_name: &str) {
        let removal = self
            .deadline
            .run("images.remove", self.stores.images.remove(file_name))
            .await;
        if let Err(err) = removal {
            tracing::warn!(file_name, error = %err, "failed to remove stored image");
        }
    }
}

#[async_trait]
impl<P, C, U, I> PostsCommand for PostService<P, C, U, I>
where
    P: PostRepository,
    C: CommentRepository,
    U: UserRepository,
    I: ImageStore,
{
    async fn create(&self, post: NewPost) -> Result<PostView, Error> {
        let NewPost {
            author,
            content,
            image,
        } = post;
        let stored = match image {
            Some(upload) => Some(
                self.deadline
                    .run("images.save", self.stores.images.save(&upload))
                    .await?,
            ),
            None => None,
        };
        let row = Post {
            id: PostId::random(),
            author: author.clone(),
            content,
            image_url: stored.as_ref().map(|image| image.url.clone()),
            created_at: self.clock.utc(),
        };
        if let Err(err) = self
            .deadline
            .run("posts.insert", self.stores.posts.insert(&row))
            .await
        {
            if let Some(image) = stored {
                if insert_may_have_committed(&err) {
                    tracing::warn!(
                        post_id = %row.id,
                        file_name = %image.file_name,
                        "post insert outcome unknown; keeping stored image"
                    );
                } else {
                    self.discard_image(&image.file_name).await;
                }
            }
            return Err(err);
        }
        tracing::info!(post_id = %row.id, author = %author, "post published");
        let record = self
            .deadline
            .run(
                "posts.find_record",
                self.stores.posts.find_record(&row.id, Some(&author)),
            )
            .await?
            .ok_or_else(|| Error::internal("post missing after insert"))?;
        Ok(PostView::from_record(record, Some(&author)))
    }

    async fn delete(&self, actor: &UserId, id: &PostId) -> Result<(), Error> {
        let post = self.require_post(id).await?;
        if post.author != *actor {
            return Err(Error::forbidden(NOT_AUTHOR_MESSAGE));
        }
        let removed = self
            .deadline
            .run("posts.delete", self.stores.posts.delete(id))
            .await?;
        if !removed {
            return Err(Error::not_found(POST_NOT_FOUND_MESSAGE));
        }
        if let Some(file_name) = post.image_url.as_deref().and_then(image_file_name) {
            self.discard_image(file_name).await;
        }
        Ok(())
    }

    async fn comment(
        &self,
        actor: &UserId,
        post: &PostId,
        content: CommentContent,
    ) -> Result<CommentView, Error> {
        self.require_post(post).await?;
        let row = Comment {
            id: CommentId::random(),
            post_id: *post,
            author: actor.clone(),
            content,
            created_at: self.clock.utc(),
        };
        self.deadline
            .run("comments.insert", self.stores.comments.insert(&row))
            .await?;
        let record = self
            .deadline
            .run("comments.find_record", self.stores.comments.find_record(&row.id))
            .await?
            .ok_or_else(|| Error::internal("comment missing after insert"))?;
        Ok(CommentView::from_record(record, Some(actor)))
    }

    async fn delete_comment(
        &self,
        actor: &UserId,
        post: &PostId,
        comment: &CommentId,
    ) -> Result<(), Error> {
        let record = self
            .deadline
            .run("comments.find_record", self.stores.comments.find_record(comment))
            .await?
            .filter(|record| record.comment.post_id == *post)
            .ok_or_else(|| Error::not_found(COMMENT_NOT_FOUND_MESSAGE))?;
        if record.comment.author != *actor {
            return Err(Error::forbidden(NOT_AUTHOR_MESSAGE));
        }
        let removed = self
            .deadline
            .run("comments.delete", self.stores.comments.delete(comment))
            .await?;
        if removed {
            Ok(())
        } else {
            Err(Error::not_found(COMMENT_NOT_FOUND_MESSAGE))
        }
    }
}

#[async_trait]
impl<P, C, U, I> PostsQuery for PostService<P, C, U, I>
where
    P: PostRepository,
    C: CommentRepository,
    U: UserRepository,
    I: ImageStore,
{
    async fn detail(&self, id: &PostId, viewer: Option<&UserId>) -> Result<PostDetail, Error> {
        let record = self
            .deadline
            .run("posts.find_record", self.stores.posts.find_record(id, viewer))
            .await?
            .ok_or_else(|| Error::not_found(POST_NOT_FOUND_MESSAGE))?;
        let voters = self
            .deadline
            .run("posts.voters", self.stores.posts.voters(id))
            .await?;
        Ok(PostDetail {
            post: PostView::from_record(record, viewer),
            voters,
        })
    }

    async fn by_author(
        &self,
        username: &str,
        viewer: Option<&UserId>,
        page: &PageRequest,
    ) -> Result<Vec<PostView>, Error> {
        let author = self
            .deadline
            .run(
                "users.find_by_username",
                self.stores.users.find_by_username(username),
            )
            .await?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND_MESSAGE))?;
        let records = self
            .deadline
            .run(
                "posts.by_author",
                self.stores.posts.by_author(&author.id, viewer, page),
            )
            .await?;
        Ok(records
            .into_iter()
            .map(|record| PostView::from_record(record, viewer))
            .collect())
    }

    async fn feed(&self, viewer: &UserId, page: &PageRequest) -> Result<Vec<PostView>, Error> {
        let records = self
            .deadline
            .run("posts.feed", self.stores.posts.feed(viewer, page))
            .await?;
        Ok(records
            .into_iter()
            .map(|record| PostView::from_record(record, Some(viewer)))
            .collect())
    }

    async fn comments(
        &self,
        post: &PostId,
        viewer: Option<&UserId>,
        page: &PageRequest,
    ) -> Result<Vec<CommentView>, Error> {
        self.require_post(post).await?;
        let records = self
            .deadline
            .run("comments.for_post", self.stores.comments.for_post(post, page))
            .await?;
        Ok(records
            .into_iter()
            .map(|record| CommentView::from_record(record, viewer))
            .collect())
    }
}
