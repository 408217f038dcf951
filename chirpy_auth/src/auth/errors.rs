//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// `Authorization` header absent, not ASCII, wrong scheme, or blank value
    #[error("Credential missing or malformed")]
    CredentialMissing,

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Password verification failed
    #[error("Invalid password")]
    PasswordMismatch,

    /// User not found
    #[error("User not found")]
    UserNotFound,

    /// Access token could not be signed
    #[error("Failed to sign access token")]
    SigningFailed,

    /// Access token lifetime must be strictly positive
    #[error("Token lifetime must be positive")]
    InvalidTtl,

    /// Access token is not a well-formed signed token
    #[error("Malformed access token")]
    TokenMalformed,

    /// Access token signature does not verify with the configured secret
    #[error("Invalid access token signature")]
    TokenBadSignature,

    /// Access token is past its expiry
    #[error("Access token expired")]
    TokenExpired,

    /// Access token was issued by someone else
    #[error("Access token issuer mismatch")]
    TokenWrongIssuer,

    /// OS random source failed while generating a refresh token
    #[error("Failed to gather entropy")]
    EntropyFailure,

    /// Refresh token not found
    #[error("Refresh token not found")]
    RefreshTokenNotFound,

    /// Refresh token was revoked
    #[error("Refresh token revoked")]
    RefreshTokenRevoked,

    /// Refresh token expired
    #[error("Refresh token expired")]
    RefreshTokenExpired,

    /// API key does not match the configured key
    #[error("Invalid API key")]
    InvalidApiKey,

    /// Persistence collaborator failed
    #[error("Persistence failed: {0}")]
    PersistFailed(#[from] RepositoryError),
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Persistence errors are sanitized to prevent information disclosure
    /// about the internal system structure. Password and unknown-user errors
    /// collapse into one message so a caller cannot tell which accounts exist.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::PersistFailed(_)
            | AuthError::HashingFailed
            | AuthError::SigningFailed
            | AuthError::EntropyFailure => "Internal server error".to_string(),
            AuthError::PasswordMismatch | AuthError::UserNotFound => {
                "Incorrect email or password".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Whether the error was caused by the caller's credentials rather than
    /// by the server.
    pub fn is_unauthorized(&self) -> bool {
        !matches!(
            self,
            AuthError::PersistFailed(_)
                | AuthError::HashingFailed
                | AuthError::SigningFailed
                | AuthError::EntropyFailure
                | AuthError::InvalidTtl
        )
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
