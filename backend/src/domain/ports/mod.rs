//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (`*Repository`, [`ImageStore`]) are implemented by outbound
//! adapters; driving ports (`*Command`, `*Query`) are implemented by domain
//! services and consumed by the HTTP adapter.

mod macros;
pub(crate) use macros::define_port_error;

mod accounts_command;
mod edge_repository;
mod image_store;
#[cfg(any(test, feature = "test-support"))]
mod memory;
mod post_repository;
mod posts_command;
mod posts_query;
mod toggle_command;
mod user_repository;
mod users_query;

#[cfg(test)]
pub use accounts_command::MockAccountsCommand;
pub use accounts_command::AccountsCommand;
#[cfg(test)]
pub use edge_repository::MockEdgeRepository;
pub use edge_repository::{EdgeRepository, EdgeStoreError};
#[cfg(test)]
pub use image_store::MockImageStore;
pub use image_store::{ImageStore, ImageStoreError, StoredImage};
#[cfg(any(test, feature = "test-support"))]
pub use memory::{InMemoryImageStore, InMemorySocialStore};
pub use post_repository::{CommentRepository, ContentStoreError, PostRepository};
pub use posts_command::PostsCommand;
pub use posts_query::PostsQuery;
#[cfg(test)]
pub use toggle_command::MockToggleCommand;
pub use toggle_command::ToggleCommand;
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{
    ACCOUNT_EXISTS_MESSAGE, AccountChanges, FollowCounts, StoredAccount, UserPersistenceError,
    UserRepository,
};
pub use users_query::UsersQuery;
