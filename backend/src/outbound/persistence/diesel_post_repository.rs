//! PostgreSQL-backed [`PostRepository`].
//!
//! Listings load the page of posts joined with their authors first, then
//! fetch vote tallies and the viewer's own votes for exactly those ids.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use pagination::PageRequest;
use uuid::Uuid;

use crate::domain::ports::{ContentStoreError, PostRepository};
use crate::domain::{Post, PostId, PostRecord, UserId, UserSummary, Username};

use super::diesel_error_mapping::{DbFailure, classify};
use super::diesel_helpers::{collect_rows, page_bounds, tally};
use super::models::{NewPostRow, PostRow, UserSummaryRow, parse_username};
use super::pool::{DbPool, PoolError};
use super::schema::{comments, follows, posts, users, votes};

/// Diesel implementation of the post store.
#[derive(Clone)]
pub struct DieselPostRepository {
    pool: DbPool,
}

impl DieselPostRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

pub(super) fn map_pool_error(error: PoolError) -> ContentStoreError {
    ContentStoreError::connection(error.into_message())
}

pub(super) fn map_diesel_error(error: diesel::result::Error) -> ContentStoreError {
    match classify(error) {
        DbFailure::Connection(message) => ContentStoreError::connection(message),
        DbFailure::ForeignKeyViolation => ContentStoreError::missing_parent(),
        DbFailure::UniqueViolation(_) => ContentStoreError::query("duplicate identifier"),
        DbFailure::Query(message) => ContentStoreError::query(message),
    }
}

type PostWithAuthor = (PostRow, UserSummaryRow);

/// Combine joined rows with vote tallies, preserving row order.
fn assemble(
    rows: Vec<PostWithAuthor>,
    tallies: &HashMap<Uuid, i64>,
    voted: &HashSet<Uuid>,
) -> Result<Vec<PostRecord>, String> {
    rows.into_iter()
        .map(|(post, author)| {
            let id = post.id;
            Ok(PostRecord {
                post: Post::try_from(post)?,
                author: UserSummary::try_from(author)?,
                votes: tallies.get(&id).copied().map_or(0, tally),
                voted: voted.contains(&id),
            })
        })
        .collect()
}

async fn with_votes(
    conn: &mut AsyncPgConnection,
    rows: Vec<PostWithAuthor>,
    viewer: Option<&UserId>,
) -> Result<Vec<PostRecord>, ContentStoreError> {
    let ids: Vec<Uuid> = rows.iter().map(|(post, _)| post.id).collect();
    if ids.is_empty() {
        return Ok(Vec::new());
    }
    let tallies: Vec<(Uuid, i64)> = votes::table
        .filter(votes::post_id.eq_any(&ids))
        .group_by(votes::post_id)
        .select((votes::post_id, count_star()))
        .load(conn)
        .await
        .map_err(map_diesel_error)?;
    let voted: Vec<Uuid> = match viewer {
        Some(viewer) => votes::table
            .filter(votes::user_id.eq(*viewer.as_uuid()))
            .filter(votes::post_id.eq_any(&ids))
            .select(votes::post_id)
            .load(conn)
            .await
            .map_err(map_diesel_error)?,
        None => Vec::new(),
    };
    assemble(
        rows,
        &tallies.into_iter().collect(),
        &voted.into_iter().collect(),
    )
    .map_err(ContentStoreError::query)
}

#[async_trait]
impl PostRepository for DieselPostRepository {
    async fn insert(&self, post: &Post) -> Result<(), ContentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(posts::table)
            .values(NewPostRow::from(post))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find(&self, id: &PostId) -> Result<Option<Post>, ContentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<PostRow> = posts::table
            .find(*id.as_uuid())
            .select(PostRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(Post::try_from)
            .transpose()
            .map_err(ContentStoreError::query)
    }

    async fn find_record(
        &self,
        id: &PostId,
        viewer: Option<&UserId>,
    ) -> Result<Option<PostRecord>, ContentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<PostWithAuthor> = posts::table
            .inner_join(users::table)
            .filter(posts::id.eq(*id.as_uuid()))
            .select((PostRow::as_select(), UserSummaryRow::as_select()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        Ok(with_votes(&mut conn, vec![row], viewer).await?.pop())
    }

    async fn delete(&self, id: &PostId) -> Result<bool, ContentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let post_id = *id.as_uuid();
        let removed = conn
            .transaction(|conn| {
                async move {
                    diesel::delete(votes::table.filter(votes::post_id.eq(post_id)))
                        .execute(conn)
                        .await?;
                    diesel::delete(comments::table.filter(comments::post_id.eq(post_id)))
                        .execute(conn)
                        .await?;
                    diesel::delete(posts::table.find(post_id))
                        .execute(conn)
                        .await
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn by_author(
        &self,
        author: &UserId,
        viewer: Option<&UserId>,
        page: &PageRequest,
    ) -> Result<Vec<PostRecord>, ContentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_bounds(page);
        let rows: Vec<PostWithAuthor> = posts::table
            .inner_join(users::table)
            .filter(posts::author_id.eq(*author.as_uuid()))
            .select((PostRow::as_select(), UserSummaryRow::as_select()))
            .order_by((posts::created_at.desc(), posts::id.desc()))
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_votes(&mut conn, rows, viewer).await
    }

    async fn feed(
        &self,
        viewer: &UserId,
        page: &PageRequest,
    ) -> Result<Vec<PostRecord>, ContentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_bounds(page);
        let viewer_id = *viewer.as_uuid();
        let followed = follows::table
            .filter(follows::follower_id.eq(viewer_id))
            .select(follows::followed_id);
        let rows: Vec<PostWithAuthor> = posts::table
            .inner_join(users::table)
            .filter(
                posts::author_id
                    .eq(viewer_id)
                    .or(posts::author_id.eq_any(followed)),
            )
            .select((PostRow::as_select(), UserSummaryRow::as_select()))
            .order_by((posts::created_at.desc(), posts::id.desc()))
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        with_votes(&mut conn, rows, Some(viewer)).await
    }

    async fn voters(&self, id: &PostId) -> Result<Vec<Username>, ContentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let names: Vec<String> = votes::table
            .inner_join(users::table)
            .filter(votes::post_id.eq(*id.as_uuid()))
            .select(users::username)
            .order_by(users::username.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            names.into_iter().map(parse_username),
            ContentStoreError::query,
        )
    }
}
