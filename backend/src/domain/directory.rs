//! Account lookups, search and follow-graph reads.

use std::sync::Arc;

use async_trait::async_trait;
use pagination::PageRequest;

use crate::domain::ports::{EdgeRepository, UserRepository, UsersQuery};
use crate::domain::{
    EdgeKey, Error, StoreDeadline, User, UserId, UserProfile, UserSummary, Username,
};

/// Message returned when a username or id matches no account.
pub const USER_NOT_FOUND_MESSAGE: &str = "User does not exist.";

/// Directory service implementing [`UsersQuery`].
#[derive(Clone)]
pub struct DirectoryService<U, E> {
    users: Arc<U>,
    edges: Arc<E>,
    deadline: StoreDeadline,
}

impl<U, E> DirectoryService<U, E> {
    /// Create a service over the user and edge repositories.
    pub const fn new(users: Arc<U>, edges: Arc<E>, deadline: StoreDeadline) -> Self {
        Self {
            users,
            edges,
            deadline,
        }
    }
}

impl<U, E> DirectoryService<U, E>
where
    U: UserRepository,
    E: EdgeRepository,
{
    async fn require(&self, username: &str) -> Result<User, Error> {
        self.deadline
            .run("users.find_by_username", self.users.find_by_username(username))
            .await?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND_MESSAGE))
    }
}

#[async_trait]
impl<U, E> UsersQuery for DirectoryService<U, E>
where
    U: UserRepository,
    E: EdgeRepository,
{
    async fn current(&self, id: &UserId) -> Result<User, Error> {
        self.deadline
            .run("users.find_by_id", self.users.find_by_id(id))
            .await?
            .ok_or_else(|| Error::not_found(USER_NOT_FOUND_MESSAGE))
    }

    async fn search(&self, filter: &str, page: &PageRequest) -> Result<Vec<UserSummary>, Error> {
        self.deadline
            .run("users.search", self.users.search(filter.trim(), page))
            .await
    }

    async fn profile(
        &self,
        username: &str,
        viewer: Option<&UserId>,
    ) -> Result<UserProfile, Error> {
        let user = self.require(username).await?;
        let counts = self
            .deadline
            .run("users.follow_counts", self.users.follow_counts(&user.id))
            .await?;
        let followed = match viewer {
            Some(viewer) => {
                let key = EdgeKey::follow(viewer.clone(), &user.id);
                self.deadline
                    .run("edge.exists", self.edges.exists(&key))
                    .await?
            }
            None => false,
        };
        Ok(UserProfile {
            own: viewer.is_some_and(|id| *id == user.id),
            user: UserSummary::from(&user),
            followers: counts.followers,
            following: counts.following,
            followed,
        })
    }

    async fn followers(&self, username: &str) -> Result<Vec<Username>, Error> {
        let user = self.require(username).await?;
        self.deadline
            .run("users.followers", self.users.followers(&user.id))
            .await
    }

    async fn following(&self, username: &str) -> Result<Vec<Username>, Error> {
        let user = self.require(username).await?;
        self.deadline
            .run("users.following", self.users.following(&user.id))
            .await
    }
}
