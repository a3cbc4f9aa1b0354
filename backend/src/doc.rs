//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every `/api/v1` endpoint, the health probes, the
//! request and response bodies, and the session cookie security scheme. The
//! document backs Swagger UI in debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::domain::{
    CommentView, Error, ErrorCode, PostDetail, PostView, ToggleState, User, UserProfile,
    UserSummary,
};
use crate::inbound::http::accounts::{LoginRequest, SignupRequest, UpdateProfileRequest};
use crate::inbound::http::comments::CommentRequest;
use crate::inbound::http::posts::{CreatePostRequest, ImagePayload};
use crate::inbound::http::schemas::{CommentPage, PaginationLinksSchema, PostPage, UserPage};
use crate::inbound::http::session_config::SESSION_COOKIE_NAME;

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                SESSION_COOKIE_NAME,
                "Encrypted session cookie set by POST /api/v1/signup or /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Tsuki API",
        description = "Accounts, follows, posts, comments, votes and a paginated feed behind a cookie session."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::signup,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::current_user,
        crate::inbound::http::accounts::update_profile,
        crate::inbound::http::accounts::delete_account,
        crate::inbound::http::users::search_users,
        crate::inbound::http::users::profile,
        crate::inbound::http::users::followers,
        crate::inbound::http::users::following,
        crate::inbound::http::users::toggle_follow,
        crate::inbound::http::posts::create_post,
        crate::inbound::http::posts::get_post,
        crate::inbound::http::posts::delete_post,
        crate::inbound::http::posts::toggle_vote,
        crate::inbound::http::posts::posts_by_user,
        crate::inbound::http::posts::feed,
        crate::inbound::http::comments::list_comments,
        crate::inbound::http::comments::add_comment,
        crate::inbound::http::comments::delete_comment,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        User,
        UserSummary,
        UserProfile,
        PostView,
        PostDetail,
        CommentView,
        ToggleState,
        SignupRequest,
        LoginRequest,
        UpdateProfileRequest,
        CreatePostRequest,
        ImagePayload,
        CommentRequest,
        PaginationLinksSchema,
        UserPage,
        PostPage,
        CommentPage,
    )),
    tags(
        (name = "accounts", description = "Signup, login, the current session and account changes"),
        (name = "users", description = "Search, profiles and follows"),
        (name = "posts", description = "Posts, votes and the feed"),
        (name = "comments", description = "Comments on posts"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
