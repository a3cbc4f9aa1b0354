//! Driving port for reading accounts and the follow graph.

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::{Error, User, UserId, UserProfile, UserSummary, Username};

/// Account read models consumed by inbound adapters.
#[async_trait]
pub trait UsersQuery: Send + Sync {
    /// The signed-in account.
    async fn current(&self, id: &UserId) -> Result<User, Error>;

    /// Username search, ordered by username.
    async fn search(&self, filter: &str, page: &PageRequest) -> Result<Vec<UserSummary>, Error>;

    /// Profile of `username` as seen by `viewer`.
    async fn profile(&self, username: &str, viewer: Option<&UserId>)
    -> Result<UserProfile, Error>;

    /// Who follows `username`.
    async fn followers(&self, username: &str) -> Result<Vec<Username>, Error>;

    /// Whom `username` follows.
    async fn following(&self, username: &str) -> Result<Vec<Username>, Error>;
}
