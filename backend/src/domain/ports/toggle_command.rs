//! Driving port for follow and vote flips.

use async_trait::async_trait;

use crate::domain::{EdgeKey, Error, ToggleOutcome};

/// Toggle use-cases called by inbound adapters.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ToggleCommand: Send + Sync {
    /// Whether the edge is present. Store failures are reported, never
    /// folded into `false`.
    async fn exists(&self, key: &EdgeKey) -> Result<bool, Error>;

    /// Flip the edge.
    async fn toggle(&self, key: &EdgeKey) -> Result<ToggleOutcome, Error>;
}
