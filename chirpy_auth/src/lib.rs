//! # Chirpy Auth
//!
//! Authentication and session core for the Chirpy HTTP API.
//!
//! ## Core Modules
//!
//! - [`auth`]: Password hashing, credential extraction, access and refresh tokens
//! - [`db`]: User and refresh token repositories (PostgreSQL and in-memory)
//!
//! ## Example
//!
//! ```
//! use chirpy_auth::auth::access;
//! use chrono::Duration;
//! use uuid::Uuid;
//!
//! let user_id = Uuid::new_v4();
//! let token = access::issue(user_id, "secret", Duration::minutes(5)).unwrap();
//! assert_eq!(access::validate(&token, "secret").unwrap(), user_id);
//! ```

/// Credential and token lifecycle.
pub mod auth;

/// Persistence collaborators.
pub mod db;

pub use auth::{AuthError, AuthManager, AuthResult};
