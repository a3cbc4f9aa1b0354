//! Port for account persistence and follow-graph lookups keyed by user.

use async_trait::async_trait;
use pagination::PageRequest;
use serde_json::json;

use crate::domain::credentials::PasswordHash;
use crate::domain::{Email, Error, User, UserId, UserSummary, Username};

use super::define_port_error;

/// Message returned when signup collides with an existing account.
pub const ACCOUNT_EXISTS_MESSAGE: &str = "Account already exists with the given username/email.";

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserPersistenceError {
        /// Repository connection could not be established.
        Connection { message: String } => "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "user repository query failed: {message}",
        /// A unique column (username or email) already holds this value.
        Duplicate { field: String } => "an account already uses this {field}",
    }
}

impl From<UserPersistenceError> for Error {
    fn from(value: UserPersistenceError) -> Self {
        match value {
            UserPersistenceError::Connection { message } => Self::service_unavailable(message),
            UserPersistenceError::Query { message } => Self::internal(message),
            UserPersistenceError::Duplicate { field } => {
                Self::conflict(ACCOUNT_EXISTS_MESSAGE).with_details(json!({ "field": field }))
            }
        }
    }
}

/// Account row together with its credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredAccount {
    /// Public account data.
    pub user: User,
    /// Argon2id hash of the password.
    pub password_hash: PasswordHash,
}

/// Column changes applied to an existing account; `None` leaves a column
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountChanges {
    /// Replacement avatar URL.
    pub avatar: Option<String>,
    /// Replacement contact address.
    pub email: Option<Email>,
    /// Replacement credential.
    pub password_hash: Option<PasswordHash>,
}

/// Follower and following tallies for one account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FollowCounts {
    /// Accounts following this one.
    pub followers: u64,
    /// Accounts this one follows.
    pub following: u64,
}

/// Persistence contract for accounts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account; unique clashes surface as
    /// [`UserPersistenceError::Duplicate`].
    async fn insert(&self, account: &StoredAccount) -> Result<(), UserPersistenceError>;

    /// Apply `changes` and return the updated account, or `None` when no
    /// account has this id. An email clash surfaces as
    /// [`UserPersistenceError::Duplicate`].
    async fn update(
        &self,
        id: &UserId,
        changes: &AccountChanges,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Remove an account together with its follows, votes, posts and
    /// comments. Returns whether a row was removed.
    async fn delete(&self, id: &UserId) -> Result<bool, UserPersistenceError>;

    /// Fetch an account by id.
    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch an account by exact username.
    async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch an account and its credential for login.
    async fn find_account(
        &self,
        username: &str,
    ) -> Result<Option<StoredAccount>, UserPersistenceError>;

    /// Accounts whose username contains `filter` (case-insensitive), ordered
    /// by username.
    async fn search(
        &self,
        filter: &str,
        page: &PageRequest,
    ) -> Result<Vec<UserSummary>, UserPersistenceError>;

    /// Usernames of accounts following `user`, ordered by username.
    async fn followers(&self, user: &UserId) -> Result<Vec<Username>, UserPersistenceError>;

    /// Usernames of accounts `user` follows, ordered by username.
    async fn following(&self, user: &UserId) -> Result<Vec<Username>, UserPersistenceError>;

    /// Follower and following tallies.
    async fn follow_counts(&self, user: &UserId) -> Result<FollowCounts, UserPersistenceError>;
}
