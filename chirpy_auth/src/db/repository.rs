//! Repository traits and their PostgreSQL implementations.
//!
//! Lookups return `Ok(None)` for "no such row", so callers branch on a tagged
//! result instead of comparing against a driver-specific error value.
//!
//! Expected schema:
//!
//! ```sql
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY,
//!     email TEXT NOT NULL UNIQUE,
//!     hashed_password TEXT NOT NULL,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE refresh_tokens (
//!     token TEXT PRIMARY KEY,
//!     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL,
//!     expires_at TIMESTAMPTZ NOT NULL,
//!     revoked_at TIMESTAMPTZ
//! );
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use super::timeouts::{RepositoryResult, with_default_timeout};
use crate::auth::{RefreshToken, User, UserId};

/// Read access to the user store
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> RepositoryResult<Option<User>>;

    /// Find user by email
    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
}

/// Refresh token persistence
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Insert a new token record
    async fn insert(&self, record: &RefreshToken) -> RepositoryResult<()>;

    /// Find a record by its exact token string
    async fn find_by_token(&self, token: &str) -> RepositoryResult<Option<RefreshToken>>;

    /// All records belonging to a user
    async fn find_by_user(&self, user_id: UserId) -> RepositoryResult<Vec<RefreshToken>>;

    /// Set `revoked_at` if it is still unset. Returns whether a row changed.
    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> RepositoryResult<bool>;
}

/// Default PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(r: &PgRow) -> User {
    User {
        id: r.get("id"),
        email: r.get("email"),
        hashed_password: r.get("hashed_password"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, user_id: UserId) -> RepositoryResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT id, email, hashed_password, created_at, updated_at
                 FROM users WHERE id = $1",
            )
            .bind(user_id)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT id, email, hashed_password, created_at, updated_at
                 FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }
}

/// Default PostgreSQL implementation of `RefreshTokenRepository`
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn refresh_token_from_row(r: &PgRow) -> RefreshToken {
    RefreshToken {
        token: r.get("token"),
        user_id: r.get("user_id"),
        created_at: r.get("created_at"),
        updated_at: r.get("updated_at"),
        expires_at: r.get("expires_at"),
        revoked_at: r.get("revoked_at"),
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn insert(&self, record: &RefreshToken) -> RepositoryResult<()> {
        with_default_timeout(
            sqlx::query(
                r#"
                INSERT INTO refresh_tokens (token, user_id, created_at, updated_at, expires_at, revoked_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(&record.token)
            .bind(record.user_id)
            .bind(record.created_at)
            .bind(record.updated_at)
            .bind(record.expires_at)
            .bind(record.revoked_at)
            .execute(&self.pool),
        )
        .await?;

        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> RepositoryResult<Option<RefreshToken>> {
        let row = with_default_timeout(
            sqlx::query(
                "SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
                 FROM refresh_tokens WHERE token = $1",
            )
            .bind(token)
            .fetch_optional(&self.pool),
        )
        .await?;

        Ok(row.as_ref().map(refresh_token_from_row))
    }

    async fn find_by_user(&self, user_id: UserId) -> RepositoryResult<Vec<RefreshToken>> {
        let rows = with_default_timeout(
            sqlx::query(
                "SELECT token, user_id, created_at, updated_at, expires_at, revoked_at
                 FROM refresh_tokens WHERE user_id = $1
                 ORDER BY created_at DESC",
            )
            .bind(user_id)
            .fetch_all(&self.pool),
        )
        .await?;

        Ok(rows.iter().map(refresh_token_from_row).collect())
    }

    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> RepositoryResult<bool> {
        let result = with_default_timeout(
            sqlx::query(
                "UPDATE refresh_tokens SET revoked_at = $2, updated_at = $2
                 WHERE token = $1 AND revoked_at IS NULL",
            )
            .bind(token)
            .bind(at)
            .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
