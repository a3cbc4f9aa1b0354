//! PostgreSQL persistence adapters using Diesel.
//!
//! Repositories implement the driven ports from [`crate::domain::ports`] over
//! a shared [`DbPool`] of `diesel-async` connections. They translate between
//! row structs and domain types and hold no business rules.
//!
//! - Row structs (`models`) and table definitions (`schema`) stay private to
//!   this module.
//! - Database failures are classified once (`diesel_error_mapping`) and then
//!   mapped onto each port's error enum: dropped connections become
//!   `Connection`, unique clashes on signup become `Duplicate`, and foreign
//!   key violations report the missing parent.
//!
//! # Example
//!
//! ```no_run
//! use tsuki::outbound::persistence::{DbPool, DieselUserRepository, PoolConfig};
//!
//! # async fn connect() -> Result<(), tsuki::outbound::persistence::PoolError> {
//! let pool = DbPool::new(PoolConfig::new("postgres://tsuki@localhost/tsuki")).await?;
//! let users = DieselUserRepository::new(pool);
//! # let _ = users;
//! # Ok(())
//! # }
//! ```

mod diesel_comment_repository;
mod diesel_edge_repository;
mod diesel_error_mapping;
mod diesel_helpers;
mod diesel_post_repository;
mod diesel_user_repository;
mod models;
mod pool;
mod schema;

pub use diesel_comment_repository::DieselCommentRepository;
pub use diesel_edge_repository::DieselEdgeRepository;
pub use diesel_post_repository::DieselPostRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, PoolConfig, PoolError};
