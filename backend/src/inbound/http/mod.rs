//! HTTP inbound adapter exposing REST endpoints.

pub mod accounts;
pub mod comments;
pub mod error;
pub mod health;
pub mod paging;
pub mod posts;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod token_config;
pub mod users;

use actix_web::web;

pub use error::ApiResult;
use error::{json_error_handler, path_error_handler, query_error_handler};

use crate::middleware::SessionGate;

/// Largest accepted JSON body; a post carries its image base64-encoded.
pub const JSON_BODY_LIMIT: usize = 16 * 1024 * 1024;

/// Register every `/api/v1` route, gating the protected ones with `gate`.
///
/// The caller wraps the enclosing scope in the session middleware and
/// registers [`state::HttpState`] as application data.
pub fn configure(cfg: &mut web::ServiceConfig, gate: &SessionGate) {
    cfg.app_data(
        web::JsonConfig::default()
            .limit(JSON_BODY_LIMIT)
            .error_handler(json_error_handler),
    )
    .app_data(web::QueryConfig::default().error_handler(query_error_handler))
    .app_data(web::PathConfig::default().error_handler(path_error_handler));
    accounts::configure(cfg, gate);
    users::configure(cfg, gate);
    posts::configure(cfg, gate);
}
