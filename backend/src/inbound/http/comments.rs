//! Comment API handlers.
//!
//! ```text
//! GET /api/v1/posts/{id}/comments?limit=10
//! POST /api/v1/posts/{id}/comments {"content":"nice"}
//! DELETE /api/v1/posts/{id}/comments/{comment_id}
//! ```

use actix_web::{HttpRequest, HttpResponse, web};
use pagination::Paginated;
use serde::{Deserialize, Serialize};

use crate::domain::{CommentContent, CommentId, CommentView, Error, PostId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::paging::{PageQuery, paginate};
use crate::inbound::http::schemas::CommentPage;
use crate::inbound::http::state::HttpState;
use crate::middleware::{AuthenticatedUser, Viewer};

/// Request body for `POST /api/v1/posts/{id}/comments`.
#[derive(Deserialize, Serialize, utoipa::ToSchema)]
pub struct CommentRequest {
    /// Body text, 1 to 2000 characters.
    pub content: String,
}

/// Comments on a post, oldest first.
#[utoipa::path(
    get,
    path = "/api/v1/posts/{id}/comments",
    params(("id" = String, Path, description = "Post id"), PageQuery),
    responses(
        (status = 200, description = "Comments", body = CommentPage),
        (status = 404, description = "No such post", body = Error)
    ),
    tags = ["comments"],
    operation_id = "listComments",
    security([])
)]
pub async fn list_comments(
    req: HttpRequest,
    state: web::Data<HttpState>,
    viewer: Viewer,
    id: web::Path<PostId>,
    page: web::Query<PageQuery>,
) -> ApiResult<web::Json<Paginated<CommentView>>> {
    let request = page.to_request()?;
    let comments = state
        .posts_query
        .comments(&id, viewer.id(), &request)
        .await?;
    Ok(web::Json(paginate(&req, comments, &request)?))
}

/// Comment on a post.
#[utoipa::path(
    post,
    path = "/api/v1/posts/{id}/comments",
    params(("id" = String, Path, description = "Post id")),
    request_body = CommentRequest,
    responses(
        (status = 201, description = "Comment added", body = CommentView),
        (status = 400, description = "Invalid content", body = Error),
        (status = 401, description = "Not logged in", body = Error),
        (status = 404, description = "No such post", body = Error)
    ),
    tags = ["comments"],
    operation_id = "addComment"
)]
pub async fn add_comment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    id: web::Path<PostId>,
    payload: web::Json<CommentRequest>,
) -> ApiResult<HttpResponse> {
    let content = CommentContent::new(payload.into_inner().content)?;
    let comment = state.posts.comment(user.id(), &id, content).await?;
    Ok(HttpResponse::Created().json(comment))
}

/// Delete one of the caller's comments.
#[utoipa::path(
    delete,
    path = "/api/v1/posts/{id}/comments/{comment_id}",
    params(
        ("id" = String, Path, description = "Post id"),
        ("comment_id" = String, Path, description = "Comment id")
    ),
    responses(
        (status = 204, description = "Comment deleted"),
        (status = 401, description = "Not logged in", body = Error),
        (status = 403, description = "Not the author", body = Error),
        (status = 404, description = "No such comment", body = Error)
    ),
    tags = ["comments"],
    operation_id = "deleteComment"
)]
pub async fn delete_comment(
    state: web::Data<HttpState>,
    user: AuthenticatedUser,
    path: web::Path<(PostId, CommentId)>,
) -> ApiResult<HttpResponse> {
    let (post, comment) = path.into_inner();
    state.posts.delete_comment(user.id(), &post, &comment).await?;
    Ok(HttpResponse::NoContent().finish())
}
