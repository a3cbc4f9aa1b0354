//! Comments left on posts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::{PostId, UserId, UserSummary};

/// Maximum comment length in characters.
pub const COMMENT_CONTENT_MAX: usize = 2000;

/// Validation failures for comment payloads.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommentValidationError {
    /// The body is blank.
    #[error("comment must not be empty")]
    Empty,
    /// The body exceeds [`COMMENT_CONTENT_MAX`].
    #[error("comment must be at most {max} characters")]
    TooLong {
        /// Maximum length.
        max: usize,
    },
}

/// Comment identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct CommentId(Uuid);

impl CommentId {
    /// Wrap an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Fresh identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for CommentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Validated comment body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CommentContent(String);

impl CommentContent {
    /// Validate a body; surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, CommentValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CommentValidationError::Empty);
        }
        if trimmed.chars().count() > COMMENT_CONTENT_MAX {
            return Err(CommentValidationError::TooLong {
                max: COMMENT_CONTENT_MAX,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for CommentContent {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<CommentContent> for String {
    fn from(value: CommentContent) -> Self {
        value.0
    }
}

impl TryFrom<String> for CommentContent {
    type Error = CommentValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Stored comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comment {
    /// Identifier.
    pub id: CommentId,
    /// Post commented on.
    pub post_id: PostId,
    /// Commenting user.
    pub author: UserId,
    /// Body text.
    pub content: CommentContent,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

/// Comment joined with its author, as read from storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentRecord {
    /// The comment row.
    pub comment: Comment,
    /// Author listing data.
    pub author: UserSummary,
}

/// Comment as presented to a reader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    /// Identifier.
    pub id: CommentId,
    /// Post commented on.
    pub post_id: PostId,
    /// Author listing data.
    pub author: UserSummary,
    /// Body text.
    #[schema(value_type = String)]
    pub content: CommentContent,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Whether the viewer wrote the comment.
    pub own: bool,
}

impl CommentView {
    /// Present a stored record to `viewer`.
    #[must_use]
    pub fn from_record(record: CommentRecord, viewer: Option<&UserId>) -> Self {
        let CommentRecord { comment, author } = record;
        Self {
            own: viewer.is_some_and(|id| *id == comment.author),
            id: comment.id,
            post_id: comment.post_id,
            author,
            content: comment.content,
            created_at: comment.created_at,
        }
    }
}
