//! PostgreSQL-backed [`UserRepository`].

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use pagination::PageRequest;

use crate::domain::ports::{
    AccountChanges, FollowCounts, StoredAccount, UserPersistenceError, UserRepository,
};
use crate::domain::{User, UserId, UserSummary, Username};

use super::diesel_error_mapping::{DbFailure, classify};
use super::diesel_helpers::{collect_rows, page_bounds, tally};
use super::models::{NewUserRow, UserChangesRow, UserRow, UserSummaryRow, parse_username};
use super::pool::{DbPool, PoolError};
use super::schema::{follows, users};

/// Diesel implementation of the account store.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> UserPersistenceError {
    UserPersistenceError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    match classify(error) {
        DbFailure::Connection(message) => UserPersistenceError::connection(message),
        DbFailure::UniqueViolation(column) => UserPersistenceError::duplicate(column.field()),
        DbFailure::ForeignKeyViolation => UserPersistenceError::query("foreign key violation"),
        DbFailure::Query(message) => UserPersistenceError::query(message),
    }
}

/// Escape `LIKE` metacharacters so the filter matches literally.
fn like_pattern(filter: &str) -> String {
    let mut escaped = String::with_capacity(filter.len() + 2);
    escaped.push('%');
    for ch in filter.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn into_account(row: Option<UserRow>) -> Result<Option<StoredAccount>, UserPersistenceError> {
    row.map(StoredAccount::try_from)
        .transpose()
        .map_err(UserPersistenceError::query)
}

fn into_usernames(names: Vec<String>) -> Result<Vec<Username>, UserPersistenceError> {
    collect_rows(names.into_iter().map(parse_username), UserPersistenceError::query)
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(&self, account: &StoredAccount) -> Result<(), UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(users::table)
            .values(NewUserRow::from(account))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
    }

    async fn update(
        &self,
        id: &UserId,
        changes: &AccountChanges,
    ) -> Result<Option<User>, UserPersistenceError> {
        if *changes == AccountChanges::default() {
            return self.find_by_id(id).await;
        }
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = diesel::update(users::table.find(*id.as_uuid()))
            .set(UserChangesRow::from(changes))
            .returning(UserRow::as_returning())
            .get_result(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(into_account(row)?.map(|account| account.user))
    }

    /// Follows, votes, posts and comments go with the row through the
    /// `ON DELETE CASCADE` foreign keys.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let removed = diesel::delete(users::table.find(*id.as_uuid()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(removed > 0)
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        Ok(into_account(row)?.map(|account| account.user))
    }

    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        let account = self.find_account(username).await?;
        Ok(account.map(|account| account.user))
    }

    async fn find_account(
        &self,
        username: &str,
    ) -> Result<Option<StoredAccount>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::username.eq(username))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;
        into_account(row)
    }

    async fn search(
        &self,
        filter: &str,
        page: &PageRequest,
    ) -> Result<Vec<UserSummary>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let (offset, limit) = page_bounds(page);
        let rows: Vec<UserSummaryRow> = users::table
            .filter(users::username.ilike(like_pattern(filter)))
            .select(UserSummaryRow::as_select())
            .order_by(users::username.asc())
            .offset(offset)
            .limit(limit)
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        collect_rows(
            rows.into_iter().map(UserSummary::try_from),
            UserPersistenceError::query,
        )
    }

    async fn followers(&self, user: &UserId) -> Result<Vec<Username>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let names: Vec<String> = follows::table
            .inner_join(users::table.on(users::id.eq(follows::follower_id)))
            .filter(follows::followed_id.eq(*user.as_uuid()))
            .select(users::username)
            .order_by(users::username.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_usernames(names)
    }

    async fn following(&self, user: &UserId) -> Result<Vec<Username>, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let names: Vec<String> = follows::table
            .inner_join(users::table.on(users::id.eq(follows::followed_id)))
            .filter(follows::follower_id.eq(*user.as_uuid()))
            .select(users::username)
            .order_by(users::username.asc())
            .load(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        into_usernames(names)
    }

    async fn follow_counts(&self, user: &UserId) -> Result<FollowCounts, UserPersistenceError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let id = *user.as_uuid();
        let followers: i64 = follows::table
            .filter(follows::followed_id.eq(id))
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        let following: i64 = follows::table
            .filter(follows::follower_id.eq(id))
            .select(count_star())
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(FollowCounts {
            followers: tally(followers),
            following: tally(following),
        })
    }
}
