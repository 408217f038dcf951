//! Chirpy authentication server.
//!
//! Loads configuration from the environment, connects to PostgreSQL and
//! serves the auth endpoints.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Error;
use chirpy_auth::{
    AuthManager,
    db::{Database, PgRefreshTokenRepository, PgUserRepository},
};
use chirpy_server::{api, config::ServerConfig, logging, membership::PgMembershipService};
use pico_args::Arguments;
use tracing::info;

const HELP: &str = "\
Run the Chirpy authentication server

USAGE:
  chirpy_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8080]
  --db-url     URL         Database connection string  [default: env DB_URL]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND                 Server bind address (e.g., 0.0.0.0:8080)
  DB_URL                      PostgreSQL connection string
  JWT_SECRET                  Access token signing secret (required, >= 32 chars)
  PASSWORD_PEPPER             Password hashing pepper (optional, >= 16 chars)
  POLKA_KEY                   API key expected from webhook callers
  ACCESS_TOKEN_MAX_TTL_SECS   Access token lifetime cap [default: 3600]
  REFRESH_TOKEN_TTL_SECS      Refresh token lifetime, at most 10 years [default: 5184000]
  DB_MAX_CONNECTIONS          Connection pool size [default: 10]
  ROTATE_REFRESH_TOKENS       Rotate refresh tokens on refresh [default: false]
  PLATFORM                    `dev` enables permissive CORS
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let database_url: Option<String> = pargs.opt_value_from_str("--db-url")?;

    logging::init();

    let config = ServerConfig::from_env(bind, database_url)?;
    info!("Starting Chirpy auth server at {}", config.bind);

    let db = Database::new(&config.database)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to connect to database: {}", e))?;
    info!("Database connected successfully");

    let pool = db.pool().clone();
    let auth_manager = AuthManager::new(
        config.auth_config()?,
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgRefreshTokenRepository::new(pool.clone())),
    )?;

    let state = api::AppState {
        auth_manager: Arc::new(auth_manager),
        membership: Arc::new(PgMembershipService::new(pool)),
        database: Some(db.clone()),
        dev_mode: config.is_dev(),
    };

    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", config.bind, e))?;

    info!(
        "Server is running at http://{}. Press Ctrl+C to stop.",
        config.bind
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    info!("Shutting down server...");
    db.close().await;

    Ok(())
}

/// Graceful shutdown signal
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install CTRL+C signal handler");
    }
}
