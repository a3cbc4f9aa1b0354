//! HTTP adapter mapping for domain errors.
//!
//! Purpose: keep the domain error type HTTP-agnostic while letting Actix
//! handlers and extractors turn failures into the shared JSON error body.

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, ResponseError, http::StatusCode};
use pagination::CursorError;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::domain::{
    AuthValidationError, CommentValidationError, Error, ErrorCode, PostValidationError,
    TRACE_ID_HEADER, UserValidationError,
};

/// Convenient result alias for HTTP handlers.
pub type ApiResult<T> = Result<T, Error>;

/// Generic message shown in place of internal failure details.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

const fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::InvalidRequest => StatusCode::BAD_REQUEST,
        ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
        ErrorCode::Forbidden => StatusCode::FORBIDDEN,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Conflict => StatusCode::CONFLICT,
        ErrorCode::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn redact_if_internal(error: &Error) -> Error {
    if matches!(error.code(), ErrorCode::InternalError) {
        let mut redacted = Error::internal(INTERNAL_ERROR_MESSAGE);
        if let Some(id) = error.trace_id() {
            redacted = redacted.with_trace_id(id.to_owned());
        }
        redacted
    } else {
        error.clone()
    }
}

/// Wire body: the domain payload plus the HTTP status line under `error`,
/// e.g. `{"error": "401 Unauthorized", "code": "unauthorized", ...}`.
#[derive(Serialize)]
struct ErrorBody<'a> {
    #[serde(rename = "error")]
    status_line: String,
    #[serde(flatten)]
    payload: &'a Error,
}

fn status_line(status: StatusCode) -> String {
    match status.canonical_reason() {
        Some(reason) => format!("{} {reason}", status.as_u16()),
        None => status.as_u16().to_string(),
    }
}

impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        status_for(self.code())
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self.code(), ErrorCode::InternalError) {
            error!(message = %self.message(), trace_id = ?self.trace_id(), "internal error");
        }
        let mut builder = HttpResponse::build(self.status_code());
        if let Some(id) = self.trace_id() {
            builder.insert_header((TRACE_ID_HEADER, id.to_owned()));
        }

        let payload = redact_if_internal(self);
        builder.json(ErrorBody {
            status_line: status_line(self.status_code()),
            payload: &payload,
        })
    }
}

impl From<actix_web::Error> for Error {
    fn from(err: actix_web::Error) -> Self {
        error!(error = %err, "actix error promoted to domain error");
        Self::internal(INTERNAL_ERROR_MESSAGE)
    }
}

fn field_error(field: &str, message: String) -> Error {
    Error::invalid_request(message).with_details(json!({ "field": field }))
}

impl From<UserValidationError> for Error {
    fn from(err: UserValidationError) -> Self {
        let field = match err {
            UserValidationError::EmptyId | UserValidationError::InvalidId => "id",
            UserValidationError::InvalidEmail => "email",
            UserValidationError::UsernameTooShort { .. }
            | UserValidationError::UsernameTooLong { .. }
            | UserValidationError::UsernameInvalidCharacters => "username",
        };
        field_error(field, err.to_string())
    }
}

impl From<AuthValidationError> for Error {
    fn from(err: AuthValidationError) -> Self {
        match err {
            AuthValidationError::EmptyUsername => field_error("username", err.to_string()),
            AuthValidationError::EmptyPassword | AuthValidationError::PasswordTooShort { .. } => {
                field_error("password", err.to_string())
            }
            AuthValidationError::BlankAvatar => field_error("avatar", err.to_string()),
            AuthValidationError::EmptyUpdate => Error::invalid_request(err.to_string()),
            AuthValidationError::Field(inner) => inner.into(),
        }
    }
}

impl From<PostValidationError> for Error {
    fn from(err: PostValidationError) -> Self {
        let field = match err {
            PostValidationError::EmptyContent | PostValidationError::ContentTooLong { .. } => {
                "content"
            }
            PostValidationError::EmptyImage
            | PostValidationError::ImageTooLarge { .. }
            | PostValidationError::UnsupportedImageType { .. } => "image",
        };
        field_error(field, err.to_string())
    }
}

impl From<CommentValidationError> for Error {
    fn from(err: CommentValidationError) -> Self {
        field_error("content", err.to_string())
    }
}

impl From<CursorError> for Error {
    fn from(err: CursorError) -> Self {
        field_error("cursor", err.to_string())
    }
}

/// `JsonConfig` error handler answering malformed bodies with the shared
/// error payload.
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid request body: {err}")).into()
}

/// `QueryConfig` error handler for malformed query strings.
pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    Error::invalid_request(format!("invalid query string: {err}")).into()
}

/// `PathConfig` error handler for path segments that do not parse.
pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    Error::not_found(format!("no resource at this path: {err}")).into()
}
