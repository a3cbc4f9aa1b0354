//! Backend entry-point: loads settings and secrets, connects the pool and
//! serves the REST API.

use std::sync::Arc;

use actix_web::web;
use clap::Parser;
use color_eyre::eyre::{Context, Result};
use mockable::{Clock, DefaultClock, DefaultEnv};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use tsuki::domain::TokenService;
use tsuki::inbound::http::health::HealthState;
use tsuki::inbound::http::session_config::fingerprint::{key_fingerprint, secret_fingerprint};
use tsuki::inbound::http::session_config::{BuildMode, session_settings_from_env};
use tsuki::inbound::http::token_config::token_settings_from_env;
use tsuki::outbound::FsImageStore;
use tsuki::outbound::persistence::DbPool;
use tsuki::server::settings::AppSettings;
use tsuki::server::{ProductionAdapters, ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::parse();
    let env = DefaultEnv::new();
    let mode = BuildMode::from_debug_assertions();

    let session = session_settings_from_env(&env, mode).wrap_err("invalid session settings")?;
    info!(
        fingerprint = %key_fingerprint(&session.key),
        "session key loaded"
    );
    let token_settings = token_settings_from_env(&env, mode, &settings.token_issuer)
        .wrap_err("invalid token settings")?;
    info!(
        fingerprint = %secret_fingerprint(token_settings.secret()),
        issuer = token_settings.issuer(),
        "token secret loaded"
    );

    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);
    let tokens = Arc::new(TokenService::new(&token_settings, Arc::clone(&clock)));

    let pool = DbPool::new(settings.pool_config())
        .await
        .wrap_err("failed to build database pool")?;
    let images = FsImageStore::open(
        &settings.upload_dir,
        &settings.public_base_url,
        Arc::clone(&clock),
    )
    .wrap_err_with(|| format!("failed to open upload dir {}", settings.upload_dir.display()))?;

    let state = ProductionAdapters::diesel(&pool, images).into_http_state(
        tokens,
        clock,
        settings.store_deadline(),
    );

    info!(bind_addr = %settings.bind_addr, "starting server");
    let config = ServerConfig::new(session, settings.bind_addr, state);
    create_server(web::Data::new(HealthState::new()), config)
        .wrap_err("failed to bind listener")?
        .await
        .wrap_err("server terminated")
}
