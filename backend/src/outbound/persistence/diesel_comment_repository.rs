//! PostgreSQL-backed [`CommentRepository`].

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::PageRequest;

use crate::domain::ports::{CommentRepository, ContentStoreError};
use crate::domain::{Comment, CommentId, CommentRecord, PostId, UserSummary};

use super::diesel_helpers::{collect_rows, page_bounds};
use super::diesel_post_repository::{map_diesel_error, map_pool_error};
use super::models::{CommentRow, NewCommentRow, UserSummaryRow};
use super::pool::DbPool;
use super::schema::{comments, users};

/// Diesel implementation of the comment store.
#[derive(Clone)]
pub struct DieselCommentRepository {
    pool: DbPool,
}

impl DieselCommentRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn into_record((comment, author): (CommentRow, UserSummaryRow)) -> Result<CommentRecord, String> {
    Ok(CommentRecord {
        comment: Comment::try_from(comment)?,
        author: UserSummary::try_from(author)?,
    })
}

#[async_trait]
impl CommentRepository for DieselCommentRepository {
    async fn insert(&self, comment: &Comment) -> Result<(), ContentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(comments::table)
            .values(NewCommentRow::from(comment))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn find_record(
        &self,
        id: &CommentId,
    ) -> Result<Option<CommentRecord>, ContentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<(CommentRow, UserSummaryRow)> = comments::table
            .inner_join(users::table)
            .filter(comments::id.eq(*id.as_uuid()))
            .select((CommentRow::as_select(), UserSummaryRow::as_select()))
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        row.map(into_record)
            .transpose()
            .map_err(ContentStoreError::query)
    }

    async fn delete(&self, id: &CommentId) -> Result<bool, ContentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(comments::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn for_post(
        &self,
        post: &PostId,
        page: &PageRequest,
    ) -> Result<Vec<CommentRecord>, ContentStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_bounds(page);
        let rows: Vec<(CommentRow, UserSummaryRow)> = comments::table
            .inner_join(users::table)
            .filter(comments::post_id.eq(*post.as_uuid()))
            .select((CommentRow::as_select(), UserSummaryRow::as_select()))
            .order_by((comments::created_at.asc(), comments::id.asc()))
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(rows.into_iter().map(into_record), ContentStoreError::query)
    }
}
