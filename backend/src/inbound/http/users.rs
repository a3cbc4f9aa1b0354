//! Users API handlers: search, profiles, follow lists and the follow toggle.
//!
//! ```text
//! GET /api/v1/users?search=ad&limit=10
//! GET /api/v1/users/ada
//! GET /api/v1/users/ada/followers
//! POST /api/v1/users/3fa85f64-5717-4562-b3fc-2c963f66afa6/follow
//! ```

use actix_web::{HttpRequest, HttpResponse, web};
use pagination::Paginated;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::domain::{EdgeKey, Error, ToggleState, UserId, UserProfile, UserSummary, Username};
use crate::inbound::http::ApiResult;
use crate::inbound::http::paging::{PageQuery, paginate, toggle_response};
use crate::inbound::http::schemas::UserPage;
use crate::inbound::http::state::HttpState;
use crate::middleware::{AuthenticatedUser, SessionGate, Viewer};

/// `GET /users` query parameters.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive substring of the username.
    #[serde(default)]
    pub search: Option<String>,
}

/// Search users by username.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(SearchQuery, PageQuery),
    responses(
        (status = 200, description = "Matching users", body = UserPage),
        (status = 400, description = "Invalid cursor", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "searchUsers",
    security([])
)]
pub async fn search_users(
    req: HttpRequest,
    state: web::Data<HttpState>,
    search: web::Query<SearchQuery>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<UserSummary>>> {
    let request = page.to_request()?;
    let filter = search.into_inner().search.unwrap_or_default();
    let users = state.users.search(&filter, &request).await?;
    Ok(web::Json(paginate(&req, users, &request)?))
}

/// Profile with follower counts and viewer flags.
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}",
    params(("username" = String, Path, description = "Account handle")),
    responses(
        (status = 200, description = "Profile", body = UserProfile),
        (status = 404, description = "No such user", body = Error)
    ),
    tags = ["users"],
    operation_id = "userProfile",
    security([])
)]
pub async fn profile(
    state: web::Data<HttpState>,
    viewer: Viewer,
    username: web::Path<String>,
) -> ApiResult<web::Json<UserProfile>> {
    let profile = state.users.profile(&username, viewer.id()).await?;
    Ok(web::Json(profile))
}

/// Usernames following `username`.
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}/followers",
    params(("username" = String, Path, description = "Account handle")),
    responses(
        (status = 200, description = "Follower usernames", body = [String]),
        (status = 404, description = "No such user", body = Error)
    ),
    tags = ["users"],
    operation_id = "userFollowers",
    security([])
)]
pub async fn followers(
    state: web::Data<HttpState>,
    username: web::Path<String>,
) -> ApiResult<web::Json<Vec<Username>>> {
    Ok(web::Json(state.users.followers(&username).await?))
}

/// Usernames `username` follows.
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}/following",
    params(("username" = String, Path, description = "Account handle")),
    responses(
        (status = 200, description = "Followed usernames", body = [String]),
        (status = 404, description = "No such user", body = Error)
    ),
    tags = ["users"],
    operation_id = "userFollowing",
    security([])
)]
pub async fn following(
    state: web::Data<HttpState>,
    username: web::Path<String>,
) -> ApiResult<web::Json<Vec<Username>>> {
    Ok(web::Json(state.users.following(&username).await?))
}

/// Follow or unfollow the user with the given id.
#[utoipa::path(
    post,
    path = "/api/v1/users/{id}/follow",
    params(("id" = String, Path, description = "User id to follow or unfollow")),
    responses(
        (status = 200, description = "New follow state (AJAX callers)", body = ToggleState),
        (status = 302, description = "Back to the referring page (form posts)"),
        (status = 400, description = "Malformed id", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 404, description = "No such user", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["users"],
    operation_id = "toggleFollow"
)]
pub async fn toggle_follow(
    req: HttpRequest,
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let target = UserId::new(id.as_str())?;
    let outcome = state
        .toggles
        .toggle(&EdgeKey::follow(user.into_inner(), &target))
        .await?;
    let followed = state.users.current(&target).await?;
    let fallback = format!("/api/v1/users/{}", followed.username);
    Ok(toggle_response(&req, outcome, &fallback))
}

/// Register the user routes.
///
/// `/users/{username}/posts` lives with the post handlers.
pub fn configure(cfg: &mut web::ServiceConfig, gate: &SessionGate) {
    cfg.route("/users", web::get().to(search_users))
        .route("/users/{username}", web::get().to(profile))
        .route("/users/{username}/followers", web::get().to(followers))
        .route("/users/{username}/following", web::get().to(following))
        .route(
            "/users/{id}/follow",
            web::post().to(toggle_follow).wrap(gate.clone()),
        );
}
