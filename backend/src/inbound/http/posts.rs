//! Posts API handlers: publishing, reading, deleting, voting and the feed.
//!
//! ```text
//! POST /api/v1/posts {"content":"hello","image":{"fileName":"cat.png","data":"iVBORw0..."}}
//! GET /api/v1/posts/{id}
//! DELETE /api/v1/posts/{id}
//! POST /api/v1/posts/{id}/vote
//! GET /api/v1/users/{username}/posts?limit=10
//! GET /api/v1/feed?cursor=...
//! ```

use actix_web::{HttpRequest, HttpResponse, web};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::domain::{
    EdgeKey, Error, ImageKind, ImageUpload, NewPost, PostContent, PostDetail, PostId, PostView,
    ToggleState,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::comments;
use crate::inbound::http::paging::{PageQuery, paginate, toggle_response};
use crate::inbound::http::schemas::PostPage;
use crate::inbound::http::state::HttpState;
use crate::middleware::{AuthenticatedUser, SessionGate, Viewer};

/// Image attached inline to a new post.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    /// Original file name; its extension selects the image type.
    #[schema(example = "cat.png")]
    pub file_name: String,
    /// Base64-encoded file bytes.
    pub data: String,
}

impl TryFrom<ImagePayload> for ImageUpload {
    type Error = Error;

    fn try_from(value: ImagePayload) -> Result<Self, Self::Error> {
        let kind = ImageKind::from_file_name(&value.file_name)?;
        let bytes = STANDARD.decode(value.data.trim()).map_err(|err| {
            Error::invalid_request(format!("image data is not valid base64: {err}"))
                .with_details(json!({ "field": "image" }))
        })?;
        Ok(Self::new(kind, bytes)?)
    }
}

/// Request body for `POST /api/v1/posts`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    /// Body text, 1 to 5000 characters.
    pub content: String,
    /// Optional inline image.
    #[serde(default)]
    pub image: Option<ImagePayload>,
}

/// Publish a post, storing its image first.
#[utoipa::path(
    post,
    path = "/api/v1/posts",
    request_body = CreatePostRequest,
    responses(
        (status = 201, description = "Post published", body = PostView),
        (status = 400, description = "Invalid content or image", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["posts"],
    operation_id = "createPost"
)]
pub async fn create_post(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    payload: web::Json<CreatePostRequest>,
) -> ApiResult<HttpResponse> {
    let CreatePostRequest { content, image } = payload.into_inner();
    let post = NewPost {
        author: user.into_inner(),
        content: PostContent::new(content)?,
        image: image.map(ImageUpload::try_from).transpose()?,
    };
    let view = state.posts.create(post).await?;
    Ok(HttpResponse::Created().json(view))
}

/// A single post with its voters.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "Post", body = PostDetail),
        (status = 404, description = "No such post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "getPost",
    security([])
)]
pub async fn get_post(
    state: web::Data<HttpState>,
    viewer: Viewer,
    id: web::Path<PostId>,
) -> ApiResult<web::Json<PostDetail>> {
    let detail = state.posts_query.detail(&id, viewer.id()).await?;
    Ok(web::Json(detail))
}

/// Delete one of the caller's posts together with its comments and votes.
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Not the author", body = Error),
        (status = 404, description = "No such post", body = Error)
    ),
    tags = ["posts"],
    operation_id = "deletePost"
)]
pub async fn delete_post(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<PostId>,
) -> ApiResult<HttpResponse> {
    state.posts.delete(user.id(), &id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Vote for a post, or withdraw the vote.
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/vote",
    params(("id" = String, Path, description = "Post id")),
    responses(
        (status = 200, description = "New vote state (AJAX callers)", body = ToggleState),
        (status = 302, description = "Back to the referring page (form posts)"),
        (status = 401, description = "Not logged in", body = Error),
        (status = 404, description = "No such post", body = Error),
        (status = 503, description = "Storage unavailable", body = Error)
    ),
    tags = ["posts"],
    operation_id = "toggleVote"
)]
pub async fn toggle_vote(
    req: HttpRequest,
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<PostId>,
) -> ApiResult<HttpResponse> {
    let outcome = state
        .toggles
        .toggle(&EdgeKey::vote(user.into_inner(), &id))
        .await?;
    let fallback = format!("/api/v1/posts/{}", id.into_inner());
    Ok(toggle_response(&req, outcome, &fallback))
}

/// Posts written by `username`, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/users/{username}/posts",
    params(("username" = String, Path, description = "Account handle"), PageQuery),
    responses(
        (status = 200, description = "Posts", body = PostPage),
        (status = 404, description = "No such user", body = Error)
    ),
    tags = ["posts"],
    operation_id = "postsByUser",
    security([])
)]
pub async fn posts_by_user(
    req: HttpRequest,
    state: web::Data<HttpState>,
    viewer: Viewer,
    username: web::Path<String>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<PostView>>> {
    let request = page.to_request()?;
    let posts = state
        .posts_query
        .by_author(&username, viewer.id(), &request)
        .await?;
    Ok(web::Json(paginate(&req, posts, &request)?))
}

/// Posts by the caller and everyone they follow, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/feed",
    params(PageQuery),
    responses(
        (status = 200, description = "Feed page", body = PostPage),
        (status = 400, description = "Invalid cursor", body = Error),
        (status = 401, description = "Not logged in", body = Error)
    ),
    tags = ["posts"],
    operation_id = "feed"
)]
pub async fn feed(
    req: HttpRequest,
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<PostView>>> {
    let request = page.to_request()?;
    let posts = state.posts_query.feed(user.id(), &request).await?;
    Ok(web::Json(paginate(&req, posts, &request)?))
}

/// Register the post and comment routes.
pub fn configure(cfg: &mut web::ServiceConfig, gate: &SessionGate) {
    cfg.route("/posts", web::post().to(create_post).wrap(gate.clone()))
        .service(
            web::resource("/posts/{id}")
                .route(web::get().to(get_post))
                .route(web::delete().to(delete_post).wrap(gate.clone())),
        )
        .route(
            "/posts/{id}/vote",
            web::post().to(toggle_vote).wrap(gate.clone()),
        )
        .service(
            web::resource("/posts/{id}/comments")
                .route(web::get().to(comments::list_comments))
                .route(web::post().to(comments::add_comment).wrap(gate.clone())),
        )
        .route(
            "/posts/{id}/comments/{comment_id}",
            web::delete().to(comments::delete_comment).wrap(gate.clone()),
        )
        .route("/users/{username}/posts", web::get().to(posts_by_user))
        .route("/feed", web::get().to(feed).wrap(gate.clone()));
}

#[cfg(test)]
mod tests;
