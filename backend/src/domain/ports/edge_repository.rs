//! Port for existence-only relation edges (follows and votes).

use async_trait::async_trait;

use crate::domain::{EdgeKey, Error, ToggleOutcome};

use super::define_port_error;

define_port_error! {
    /// Errors raised by edge repository adapters.
    pub enum EdgeStoreError {
        /// Repository connection could not be established.
        Connection { message: String } => "edge repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "edge repository query failed: {message}",
        /// The user or post at the far end of the edge does not exist.
        MissingTarget => "edge target does not exist",
    }
}

impl From<EdgeStoreError> for Error {
    fn from(value: EdgeStoreError) -> Self {
        match value {
            EdgeStoreError::Connection { message } => Self::service_unavailable(message),
            EdgeStoreError::Query { message } => Self::internal(message),
            EdgeStoreError::MissingTarget => Self::not_found("Target does not exist."),
        }
    }
}

/// Persistence contract for follow and vote edges.
///
/// ## Invariants
/// - At most one edge exists per key.
/// - [`EdgeRepository::toggle`] is atomic: concurrent callers observe a
///   strict alternation of `Added` and `Removed`, never two edges.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EdgeRepository: Send + Sync {
    /// Whether the edge is currently present.
    async fn exists(&self, key: &EdgeKey) -> Result<bool, EdgeStoreError>;

    /// Remove the edge if present, otherwise create it.
    async fn toggle(&self, key: &EdgeKey) -> Result<ToggleOutcome, EdgeStoreError>;
}
