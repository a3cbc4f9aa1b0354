//! Domain primitives, aggregates and services.
//!
//! Purpose: define strongly typed entities shared by the HTTP adapter and
//! the persistence layer, plus the services implementing the driving ports.
//! Types validate on construction and stay immutable afterwards; each type's
//! Rustdoc records its invariants and serialisation contract.
//!
//! Public surface:
//! - [`Error`] and [`ErrorCode`]: the error payload every adapter returns.
//! - Accounts: [`User`], [`UserId`], [`Username`], [`Email`],
//!   [`LoginCredentials`], [`SignupDetails`].
//! - Session identity: [`TokenService`], [`TokenSettings`], [`TokenClaims`].
//! - Content: [`Post`], [`Comment`] and their read models.
//! - Relations: [`EdgeKey`], [`ToggleOutcome`].
//! - Services: [`AccountService`], [`DirectoryService`], [`PostService`],
//!   [`ToggleService`].

mod accounts;
mod auth;
mod comment;
pub mod credentials;
mod directory;
pub mod error;
#[cfg(test)]
pub(crate) mod fixture_clock;
pub mod ports;
mod post;
mod posting;
mod store_deadline;
mod toggle;
mod token;
pub mod trace_id;
mod user;

pub use self::accounts::{AccountService, UNKNOWN_USER_MESSAGE, WRONG_PASSWORD_MESSAGE};
pub use self::auth::{
    AuthValidationError, LoginCredentials, PASSWORD_MIN, ProfileUpdate, SignupDetails,
};
pub use self::comment::{
    COMMENT_CONTENT_MAX, Comment, CommentContent, CommentId, CommentRecord,
    CommentValidationError, CommentView,
};
pub use self::directory::{DirectoryService, USER_NOT_FOUND_MESSAGE};
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::post::{
    IMAGE_MAX_BYTES, ImageKind, ImageUpload, NewPost, POST_CONTENT_MAX, Post, PostContent,
    PostDetail, PostId, PostRecord, PostValidationError, PostView,
};
pub use self::posting::{
    COMMENT_NOT_FOUND_MESSAGE, NOT_AUTHOR_MESSAGE, POST_NOT_FOUND_MESSAGE, PostService,
    PostStores,
};
pub use self::store_deadline::{DEFAULT_STORE_TIMEOUT, STORE_TIMEOUT_MESSAGE, StoreDeadline};
pub use self::toggle::{EdgeKey, Relation, ToggleOutcome, ToggleService, ToggleState};
pub use self::token::{
    INVALID_TOKEN_MESSAGE, SessionToken, TokenClaims, TokenError, TokenService, TokenSettings,
};
pub use self::trace_id::TraceId;
pub use self::user::{
    Email, USERNAME_MAX, USERNAME_MIN, User, UserId, UserProfile, UserSummary,
    UserValidationError, Username,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use tsuki::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
