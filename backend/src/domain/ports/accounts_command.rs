//! Driving port for signup, login and self-service account changes.

use async_trait::async_trait;

use crate::domain::{Error, LoginCredentials, ProfileUpdate, SignupDetails, User, UserId};

/// Account use-cases called by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountsCommand: Send + Sync {
    /// Register a local account.
    async fn signup(&self, details: &SignupDetails) -> Result<User, Error>;

    /// Check credentials and return the matching account.
    async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error>;

    /// Apply profile changes to the account `id`, re-hashing a new password.
    async fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<User, Error>;

    /// Delete the account `id` and everything it authored.
    async fn delete_account(&self, id: &UserId) -> Result<(), Error>;
}
