//! Persistence for users and refresh tokens.
//!
//! The auth core only sees the [`UserRepository`] and
//! [`RefreshTokenRepository`] traits. PostgreSQL implementations back the
//! server; in-memory ones back tests.

use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

pub mod memory;
pub mod repository;
pub mod timeouts;

pub use memory::{InMemoryRefreshTokenRepository, InMemoryUserRepository};
pub use repository::{
    PgRefreshTokenRepository, PgUserRepository, RefreshTokenRepository, UserRepository,
};
pub use timeouts::{RepositoryError, RepositoryResult};

use timeouts::DEFAULT_QUERY_TIMEOUT;

/// Pool size used unless the deployment overrides it
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// Connection pool settings
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    pub max_connections: u32,
    /// Longest wait for a pooled connection
    pub acquire_timeout: Duration,
}

impl DatabaseConfig {
    /// Settings for `url`. Waiting for a connection is bounded by the same
    /// limit as a query.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            acquire_timeout: DEFAULT_QUERY_TIMEOUT,
        }
    }
}

/// Database connection pool wrapper
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use chirpy_auth::db::{Database, DatabaseConfig};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), sqlx::Error> {
    ///     let db = Database::new(&DatabaseConfig::new("postgres://postgres@localhost/chirpy")).await?;
    ///     db.health_check().await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: &DatabaseConfig) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.url)
            .await?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check if the database connection is healthy
    pub async fn health_check(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    /// Close the database connection pool
    pub async fn close(self) {
        self.pool.close().await;
    }
}
