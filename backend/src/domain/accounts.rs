//! Signup, login and self-service account changes.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::credentials::CredentialStore;
use crate::domain::directory::USER_NOT_FOUND_MESSAGE;
use crate::domain::ports::{AccountChanges, AccountsCommand, StoredAccount, UserRepository};
use crate::domain::{
    Error, LoginCredentials, ProfileUpdate, SignupDetails, StoreDeadline, User, UserId,
};

/// Message returned when no account matches the login username.
pub const UNKNOWN_USER_MESSAGE: &str = "User does not exist.";

/// Message returned when the password does not match.
pub const WRONG_PASSWORD_MESSAGE: &str = "Incorrect password.";

/// Account service implementing [`AccountsCommand`].
#[derive(Clone)]
pub struct AccountService<U> {
    users: Arc<U>,
    credentials: CredentialStore,
    clock: Arc<dyn Clock>,
    deadline: StoreDeadline,
}

impl<U> AccountService<U> {
    /// Create a service over `users`.
    pub fn new(users: Arc<U>, clock: Arc<dyn Clock>, deadline: StoreDeadline) -> Self {
        Self {
            users,
            credentials: CredentialStore,
            clock,
            deadline,
        }
    }
}

#[async_trait]
impl<U> AccountsCommand for AccountService<U>
where
    U: UserRepository,
{
    async fn signup(&self, details: &SignupDetails) -> Result<User, Error> {
        let password_hash = self
            .credentials
            .hash(details.password())
            .await
            .map_err(|err| Error::internal(err.to_string()))?;
        let user = User {
            id: UserId::random(),
            username: details.username().clone(),
            email: details.email().cloned(),
            avatar: None,
            verified: false,
            created_at: self.clock.utc(),
        };
        let account = StoredAccount {
            user,
            password_hash,
        };
        self.deadline
            .run("users.insert", self.users.insert(&account))
            .await?;
        tracing::info!(user_id = %account.user.id, "account created");
        Ok(account.user)
    }

    async fn login(&self, credentials: &LoginCredentials) -> Result<User, Error> {
        let account = self
            .deadline
            .run(
                "users.find_account",
                self.users.find_account(credentials.username()),
            )
            .await?
            .ok_or_else(|| Error::unauthorized(UNKNOWN_USER_MESSAGE))?;
        if !self
            .credentials
            .verify(credentials.password(), &account.password_hash)
            .await
        {
            tracing::info!(user_id = %account.user.id, "login rejected");
            return Err(Error::unauthorized(WRONG_PASSWORD_MESSAGE));
        }
        Ok(account.user)
    }

    async fn update_profile(&self, id: &UserId, update: &ProfileUpdate) -> Result<User, Error> {
        let password_hash = match update.password() {
            Some(password) => Some(
                self.credentials
                    .hash(password)
                    .await
                    .map_err(|err| Error::internal(err.to_string()))?,
            ),
            None => None,
        };
        let changes = AccountChanges {
            avatar: update.avatar().map(str::to_owned),
            email: update.email().cloned(),
            password_hash,
        };
        let user = self
            .deadline
            .run("users.update", self.users.update(id, &changes))
            .await?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND_MESSAGE))?;
        tracing::info!(
            user_id = %id,
            password_changed = changes.password_hash.is_some(),
            "account updated"
        );
        Ok(user)
    }

    async fn delete_account(&self, id: &UserId) -> Result<(), Error> {
        let removed = self
            .deadline
            .run("users.delete", self.users.delete(id))
            .await?;
        if !removed {
            return Err(Error::not_found(USER_NOT_FOUND_MESSAGE));
        }
        tracing::info!(user_id = %id, "account deleted");
        Ok(())
    }
}
