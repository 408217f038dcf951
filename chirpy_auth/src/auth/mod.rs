//! Credential and token lifecycle: password hashing, `Authorization` header
//! parsing, signed access tokens and persisted refresh tokens.
//!
//! This module implements:
//! - Argon2id password hashing with an optional server-side pepper
//! - HS256 JWT access tokens (lifetime capped at one hour)
//! - Opaque 256-bit refresh tokens with idempotent revocation and optional rotation
//! - Strict `Bearer` / `ApiKey` header extraction
//!
//! ## Example
//!
//! ```no_run
//! use chirpy_auth::auth::{AuthConfig, AuthManager};
//! use chirpy_auth::db::{Database, DatabaseConfig, PgRefreshTokenRepository, PgUserRepository};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&DatabaseConfig::new("postgres://postgres@localhost/chirpy")).await?;
//!     let auth = AuthManager::new(
//!         AuthConfig::new("jwt_secret_at_least_32_characters_long"),
//!         Arc::new(PgUserRepository::new(db.pool().clone())),
//!         Arc::new(PgRefreshTokenRepository::new(db.pool().clone())),
//!     )?;
//!
//!     let login = auth.login("walt@breakingbad.com", "04234", None).await?;
//!     println!("Logged in user: {}", login.user.id);
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod config;
pub mod credentials;
pub mod errors;
pub mod manager;
pub mod models;
pub mod password;
pub mod refresh;

pub use config::{AuthConfig, PasswordConfig, TOKEN_ISSUER};
pub use errors::{AuthError, AuthResult};
pub use manager::AuthManager;
pub use models::{
    AccessTokenClaims, Credential, CredentialKind, LoginResponse, RefreshResponse, RefreshToken,
    RefreshTokenState, User, UserId,
};
pub use password::PasswordHasher;
pub use refresh::RefreshTokenStore;
