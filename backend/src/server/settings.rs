//! Command-line and environment settings for the server binary.
//!
//! Every flag can also be supplied through a `TSUKI_`-prefixed environment
//! variable. Secrets are not accepted here; the session key and token secret
//! are read from files named by their own variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::domain::StoreDeadline;
use crate::outbound::persistence::PoolConfig;

/// Runtime settings for `tsuki`.
#[derive(Debug, Clone, Parser)]
#[command(name = "tsuki", version, about = "Session-authenticated social backend")]
pub struct AppSettings {
    /// Socket address to listen on.
    #[arg(long, env = "TSUKI_BIND_ADDR", default_value = "0.0.0.0:8080")]
    pub bind_addr: SocketAddr,

    /// PostgreSQL connection string.
    #[arg(long, env = "TSUKI_DATABASE_URL", hide_env_values = true)]
    pub database_url: String,

    /// Directory receiving uploaded post images.
    #[arg(long, env = "TSUKI_UPLOAD_DIR", default_value = "uploads")]
    pub upload_dir: PathBuf,

    /// Public origin prefixed to stored image URLs.
    #[arg(long, env = "TSUKI_PUBLIC_BASE_URL", default_value = "http://localhost:8080")]
    pub public_base_url: String,

    /// `iss` claim written into and required from session tokens.
    #[arg(long, env = "TSUKI_TOKEN_ISSUER", default_value = "tsuki")]
    pub token_issuer: String,

    /// Upper bound on each storage call, in milliseconds.
    #[arg(long, env = "TSUKI_STORE_TIMEOUT_MS", default_value_t = 5_000)]
    pub store_timeout_ms: u64,

    /// Maximum pooled database connections.
    #[arg(
        long,
        env = "TSUKI_POOL_MAX_SIZE",
        default_value_t = 10,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub pool_max_size: u32,
}

impl AppSettings {
    /// Deadline applied to every repository call.
    #[must_use]
    pub fn store_deadline(&self) -> StoreDeadline {
        StoreDeadline::new(Duration::from_millis(self.store_timeout_ms))
    }

    /// Pool configuration for [`crate::outbound::persistence::DbPool`].
    #[must_use]
    pub fn pool_config(&self) -> PoolConfig {
        PoolConfig::new(self.database_url.clone()).with_max_size(self.pool_max_size)
    }
}
