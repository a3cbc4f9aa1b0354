//! Internal Diesel row structs.
//!
//! Rows never leave the persistence layer. Conversions into domain types
//! re-run domain validation and report failures as plain strings, which the
//! repositories surface as query errors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::credentials::PasswordHash;
use crate::domain::ports::{AccountChanges, StoredAccount};
use crate::domain::{
    Comment, CommentContent, CommentId, Email, Post, PostContent, PostId, User, UserId,
    UserSummary, Username,
};

use super::schema::{comments, follows, posts, users, votes};

/// Full account row including the credential.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: String,
    pub avatar: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for StoredAccount {
    type Error = String;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = row
            .email
            .map(Email::new)
            .transpose()
            .map_err(|err| format!("stored email invalid: {err}"))?;
        Ok(Self {
            user: User {
                id: UserId::from_uuid(row.id),
                username: parse_username(row.username)?,
                email,
                avatar: row.avatar,
                verified: row.verified,
                created_at: row.created_at,
            },
            password_hash: PasswordHash::from_stored(row.password_hash),
        })
    }
}

/// Listing projection of the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserSummaryRow {
    pub id: Uuid,
    pub username: String,
    pub avatar: Option<String>,
}

impl TryFrom<UserSummaryRow> for UserSummary {
    type Error = String;

    fn try_from(row: UserSummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            username: parse_username(row.username)?,
            avatar: row.avatar,
        })
    }
}

pub(crate) fn parse_username(raw: String) -> Result<Username, String> {
    Username::new(&raw).map_err(|err| format!("stored username {raw:?} invalid: {err}"))
}

#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: Option<&'a str>,
    pub password_hash: &'a str,
    pub avatar: Option<&'a str>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a StoredAccount> for NewUserRow<'a> {
    fn from(account: &'a StoredAccount) -> Self {
        let user = &account.user;
        Self {
            id: *user.id.as_uuid(),
            username: user.username.as_ref(),
            email: user.email.as_ref().map(AsRef::<str>::as_ref),
            password_hash: account.password_hash.as_str(),
            avatar: user.avatar.as_deref(),
            verified: user.verified,
            created_at: user.created_at,
        }
    }
}

/// Partial account update; `None` fields are left as stored.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub(crate) struct UserChangesRow<'a> {
    pub email: Option<&'a str>,
    pub password_hash: Option<&'a str>,
    pub avatar: Option<&'a str>,
}

impl<'a> From<&'a AccountChanges> for UserChangesRow<'a> {
    fn from(changes: &'a AccountChanges) -> Self {
        Self {
            email: changes.email.as_ref().map(AsRef::<str>::as_ref),
            password_hash: changes.password_hash.as_ref().map(PasswordHash::as_str),
            avatar: changes.avatar.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = posts)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PostRow {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<PostRow> for Post {
    type Error = String;

    fn try_from(row: PostRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PostId::from_uuid(row.id),
            author: UserId::from_uuid(row.author_id),
            content: PostContent::new(&row.content)
                .map_err(|err| format!("stored post {} invalid: {err}", row.id))?,
            image_url: row.image_url,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = posts)]
pub(crate) struct NewPostRow<'a> {
    pub id: Uuid,
    pub author_id: Uuid,
    pub content: &'a str,
    pub image_url: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Post> for NewPostRow<'a> {
    fn from(post: &'a Post) -> Self {
        Self {
            id: *post.id.as_uuid(),
            author_id: *post.author.as_uuid(),
            content: post.content.as_ref(),
            image_url: post.image_url.as_deref(),
            created_at: post.created_at,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = comments)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct CommentRow {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<CommentRow> for Comment {
    type Error = String;

    fn try_from(row: CommentRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CommentId::from_uuid(row.id),
            post_id: PostId::from_uuid(row.post_id),
            author: UserId::from_uuid(row.author_id),
            content: CommentContent::new(&row.content)
                .map_err(|err| format!("stored comment {} invalid: {err}", row.id))?,
            created_at: row.created_at,
        })
    }
}

#[derive(Debug, Insertable)]
#[diesel(table_name = comments)]
pub(crate) struct NewCommentRow<'a> {
    pub id: Uuid,
    pub post_id: Uuid,
    pub author_id: Uuid,
    pub content: &'a str,
    pub created_at: DateTime<Utc>,
}

impl<'a> From<&'a Comment> for NewCommentRow<'a> {
    fn from(comment: &'a Comment) -> Self {
        Self {
            id: *comment.id.as_uuid(),
            post_id: *comment.post_id.as_uuid(),
            author_id: *comment.author.as_uuid(),
            content: comment.content.as_ref(),
            created_at: comment.created_at,
        }
    }
}

/// Edge rows take `created_at` from the column default.
#[derive(Debug, Insertable)]
#[diesel(table_name = follows)]
pub(crate) struct NewFollowRow {
    pub follower_id: Uuid,
    pub followed_id: Uuid,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = votes)]
pub(crate) struct NewVoteRow {
    pub user_id: Uuid,
    pub post_id: Uuid,
}
