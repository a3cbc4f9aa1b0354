//! PostgreSQL-backed [`EdgeRepository`] for follows and votes.
//!
//! A toggle runs inside one transaction that first takes a transaction-scoped
//! advisory lock on the edge key, then deletes the edge and, only when no row
//! was removed, inserts it. Toggles of the same edge therefore queue behind
//! each other and each one observes the previous commit, so concurrent
//! callers see a strict alternation of `Added` and `Removed`.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel_async::scoped_futures::ScopedFutureExt as _;
use diesel_async::{AsyncConnection as _, AsyncPgConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{EdgeRepository, EdgeStoreError};
use crate::domain::{EdgeKey, Relation, ToggleOutcome};

use super::diesel_error_mapping::{DbFailure, classify};
use super::models::{NewFollowRow, NewVoteRow};
use super::pool::{DbPool, PoolError};
use super::schema::{follows, votes};

/// Diesel implementation of the follow and vote edge store.
#[derive(Clone)]
pub struct DieselEdgeRepository {
    pool: DbPool,
}

impl DieselEdgeRepository {
    /// Create a repository over `pool`.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> EdgeStoreError {
    EdgeStoreError::connection(error.into_message())
}

fn map_diesel_error(error: diesel::result::Error) -> EdgeStoreError {
    match classify(error) {
        DbFailure::Connection(message) => EdgeStoreError::connection(message),
        DbFailure::ForeignKeyViolation => EdgeStoreError::missing_target(),
        DbFailure::UniqueViolation(_) => EdgeStoreError::query("edge already exists"),
        DbFailure::Query(message) => EdgeStoreError::query(message),
    }
}

/// Text hashed into the advisory lock identifier for `key`.
fn advisory_lock_key(key: &EdgeKey) -> String {
    format!("{}:{}:{}", key.relation(), key.actor(), key.target())
}

/// Block until no other transaction holds the lock for `key`.
///
/// The lock is released when the surrounding transaction ends.
async fn lock_edge(
    conn: &mut AsyncPgConnection,
    key: &EdgeKey,
) -> Result<(), diesel::result::Error> {
    diesel::sql_query("SELECT pg_advisory_xact_lock(hashtextextended($1, 0))")
        .bind::<Text, _>(advisory_lock_key(key))
        .execute(conn)
        .await?;
    Ok(())
}

async fn delete_edge(
    conn: &mut AsyncPgConnection,
    key: &EdgeKey,
) -> Result<usize, diesel::result::Error> {
    let actor = *key.actor().as_uuid();
    let target = *key.target();
    match key.relation() {
        Relation::Follow => {
            diesel::delete(follows::table.find((actor, target)))
                .execute(conn)
                .await
        }
        Relation::Vote => {
            diesel::delete(votes::table.find((actor, target)))
                .execute(conn)
                .await
        }
    }
}

async fn insert_edge(
    conn: &mut AsyncPgConnection,
    key: &EdgeKey,
) -> Result<usize, diesel::result::Error> {
    let actor = *key.actor().as_uuid();
    let target = *key.target();
    match key.relation() {
        Relation::Follow => {
            diesel::insert_into(follows::table)
                .values(NewFollowRow {
                    follower_id: actor,
                    followed_id: target,
                })
                .on_conflict_do_nothing()
                .execute(conn)
                .await
        }
        Relation::Vote => {
            diesel::insert_into(votes::table)
                .values(NewVoteRow {
                    user_id: actor,
                    post_id: target,
                })
                .on_conflict_do_nothing()
                .execute(conn)
                .await
        }
    }
}

#[async_trait]
impl EdgeRepository for DieselEdgeRepository {
    async fn exists(&self, key: &EdgeKey) -> Result<bool, EdgeStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let actor = *key.actor().as_uuid();
        let target = *key.target();
        let query = match key.relation() {
            Relation::Follow => {
                diesel::select(diesel::dsl::exists(follows::table.find((actor, target))))
                    .get_result(&mut conn)
                    .await
            }
            Relation::Vote => {
                diesel::select(diesel::dsl::exists(votes::table.find((actor, target))))
                    .get_result(&mut conn)
                    .await
            }
        };
        query.map_err(map_diesel_error)
    }

    async fn toggle(&self, key: &EdgeKey) -> Result<ToggleOutcome, EdgeStoreError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let outcome = conn
            .transaction(|conn| {
                async move {
                    lock_edge(conn, key).await?;
                    if delete_edge(conn, key).await? > 0 {
                        Ok(ToggleOutcome::Removed)
                    } else {
                        insert_edge(conn, key).await?;
                        Ok(ToggleOutcome::Added)
                    }
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)?;
        debug!(relation = %key.relation(), ?outcome, "edge toggled");
        Ok(outcome)
    }
}
