//! Account API handlers: signup, login, logout and the current user's own
//! account.
//!
//! ```text
//! POST /api/v1/signup {"username":"ada","email":"ada@example.com","password":"correct horse"}
//! POST /api/v1/login {"username":"ada","password":"correct horse"}
//! POST /api/v1/logout
//! GET /api/v1/me
//! PATCH /api/v1/me {"avatar":"https://cdn.example/ada.png","password":"new secret phrase"}
//! DELETE /api/v1/me
//! ```

use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, LoginCredentials, ProfileUpdate, SignupDetails, User, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::middleware::{AuthenticatedUser, SessionGate};

/// Signup request body for `POST /api/v1/signup`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    /// Desired handle.
    pub username: String,
    /// Optional contact address.
    #[serde(default)]
    pub email: Option<String>,
    /// Plaintext password, at least eight characters.
    pub password: String,
}

/// Login request body for `POST /api/v1/login`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account handle.
    pub username: String,
    /// Plaintext password.
    pub password: String,
}

/// Profile changes for `PATCH /api/v1/me`; omitted fields stay as they are.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    /// Replacement avatar URL.
    #[serde(default)]
    pub avatar: Option<String>,
    /// Replacement contact address.
    #[serde(default)]
    pub email: Option<String>,
    /// Replacement password, at least eight characters.
    #[serde(default)]
    pub password: Option<String>,
}

/// Issue a token for `user` and store it in the session.
fn establish_session(state: &HttpState, session: &SessionContext, user: &UserId) -> ApiResult<()> {
    let token = state.tokens.issue(user)?;
    session.establish(&token, user)
}

/// Create an account and sign it in.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = User, headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Username taken", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "signup",
    security([])
)]
pub async fn signup(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<SignupRequest>,
) -> ApiResult<HttpResponse> {
    let SignupRequest {
        username,
        email,
        password,
    } = payload.into_inner();
    let details = SignupDetails::try_from_parts(&username, email.as_deref(), &password)?;
    let user = state.accounts.signup(&details).await?;
    establish_session(&state, &session, &user.id)?;
    Ok(HttpResponse::Created().json(user))
}

/// Authenticate a user and establish a session.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login success", body = User, headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unknown user or wrong password", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequest>,
) -> ApiResult<web::Json<User>> {
    let LoginRequest { username, password } = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&username, &password)?;
    let user = state.accounts.login(&credentials).await?;
    establish_session(&state, &session, &user.id)?;
    tracing::info!(user_id = %user.id, "user logged in");
    Ok(web::Json(user))
}

/// End the session and expire its cookie.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses(
        (status = 204, description = "Session cleared"),
        (status = 401, description = "Not logged in", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "logout"
)]
pub async fn logout(user: AuthenticatedUser, session: SessionContext) -> HttpResponse {
    session.end();
    tracing::info!(user_id = %user.id(), "user logged out");
    HttpResponse::NoContent().finish()
}

/// The signed-in user's account.
#[utoipa::path(
    get,
    path = "/api/v1/me",
    responses(
        (status = 200, description = "Current user", body = User),
        (status = 401, description = "Not logged in", body = Error),
        (status = 404, description = "Account no longer exists", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "currentUser"
)]
pub async fn current_user(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
) -> ApiResult<web::Json<User>> {
    let account = state.users.current(user.id()).await?;
    Ok(web::Json(account))
}

/// Change the signed-in user's avatar, email or password.
#[utoipa::path(
    patch,
    path = "/api/v1/me",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated account", body = User),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 404, description = "Account no longer exists", body = Error),
        (status = 409, description = "Email taken", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "updateProfile"
)]
pub async fn update_profile(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<UpdateProfileRequest>,
) -> ApiResult<web::Json<User>> {
    let UpdateProfileRequest {
        avatar,
        email,
        password,
    } = payload.into_inner();
    let update =
        ProfileUpdate::try_from_parts(avatar.as_deref(), email.as_deref(), password.as_deref())?;
    let account = state.accounts.update_profile(user.id(), &update).await?;
    Ok(web::Json(account))
}

/// Delete the signed-in user's account and end the session.
#[utoipa::path(
    delete,
    path = "/api/v1/me",
    responses(
        (status = 204, description = "Account deleted and session cleared"),
        (status = 401, description = "Not logged in", body = Error),
        (status = 404, description = "Account no longer exists", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "deleteAccount"
)]
pub async fn delete_account(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    session: SessionContext,
) -> ApiResult<HttpResponse> {
    state.accounts.delete_account(user.id()).await?;
    session.end();
    Ok(HttpResponse::NoContent().finish())
}

/// Register the account routes.
pub fn configure(cfg: &mut web::ServiceConfig, gate: &SessionGate) {
    cfg.route("/signup", web::post().to(signup))
        .route("/login", web::post().to(login))
        .route("/logout", web::post().to(logout).wrap(gate.clone()))
        .service(
            web::resource("/me")
                .wrap(gate.clone())
                .route(web::get().to(current_user))
                .route(web::patch().to(update_profile))
                .route(web::delete().to(delete_account)),
        );
}
