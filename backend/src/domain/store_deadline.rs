//! Upper bound on a single storage round trip.
//!
//! Every service wraps its port calls in [`StoreDeadline::run`] so a stalled
//! store surfaces as `service_unavailable` instead of a hung request.

use std::future::Future;
use std::time::Duration;

use crate::domain::Error;

/// Default bound applied when configuration does not override it.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Message returned when the store misses its deadline.
pub const STORE_TIMEOUT_MESSAGE: &str = "storage did not respond in time";

/// Per-operation timeout for driven port calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreDeadline(Duration);

impl StoreDeadline {
    /// Bound store calls by `limit`.
    #[must_use]
    pub const fn new(limit: Duration) -> Self {
        Self(limit)
    }

    /// Configured bound.
    #[must_use]
    pub const fn limit(self) -> Duration {
        self.0
    }

    /// Await `call`, converting its port error and the timeout into
    /// [`Error`].
    pub async fn run<T, E, F>(self, operation: &'static str, call: F) -> Result<T, Error>
    where
        F: Future<Output = Result<T, E>>,
        E: Into<Error>,
    {
        match tokio::time::timeout(self.0, call).await {
            Ok(result) => result.map_err(Into::into),
            Err(_) => {
                tracing::warn!(
                    operation,
                    timeout_ms = u64::try_from(self.0.as_millis()).unwrap_or(u64::MAX),
                    "store call timed out"
                );
                Err(Error::service_unavailable(STORE_TIMEOUT_MESSAGE))
            }
        }
    }
}

impl Default for StoreDeadline {
    fn default() -> Self {
        Self(DEFAULT_STORE_TIMEOUT)
    }
}
