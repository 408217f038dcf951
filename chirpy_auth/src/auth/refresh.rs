//! Opaque, persisted refresh tokens.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rand::{TryRngCore, rngs::OsRng};

use super::{
    errors::{AuthError, AuthResult},
    models::{RefreshToken, RefreshTokenState, UserId},
};
use crate::db::RefreshTokenRepository;

/// Bytes of entropy per refresh token (rendered as twice as many hex chars)
pub const REFRESH_TOKEN_BYTES: usize = 32;

/// Generate a random refresh token string
///
/// # Errors
///
/// * `AuthError::EntropyFailure` - The OS random source is unavailable
pub fn generate() -> AuthResult<String> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|_| AuthError::EntropyFailure)?;
    Ok(hex::encode(bytes))
}

/// Refresh token lifecycle on top of a persistence collaborator
#[derive(Clone)]
pub struct RefreshTokenStore {
    repository: Arc<dyn RefreshTokenRepository>,
}

impl RefreshTokenStore {
    pub fn new(repository: Arc<dyn RefreshTokenRepository>) -> Self {
        Self { repository }
    }

    /// Create and persist a new, unrevoked token for `user_id`
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidTtl` - `ttl` is zero, negative, or runs past the
    ///   representable date range
    /// * `AuthError::EntropyFailure` - The OS random source is unavailable
    pub async fn issue_for_user(&self, user_id: UserId, ttl: Duration) -> AuthResult<RefreshToken> {
        if ttl <= Duration::zero() {
            return Err(AuthError::InvalidTtl);
        }

        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or(AuthError::InvalidTtl)?;
        let record = RefreshToken {
            token: generate()?,
            user_id,
            created_at: now,
            updated_at: now,
            expires_at,
            revoked_at: None,
        };

        self.repository.insert(&record).await?;
        Ok(record)
    }

    /// Validate a presented token and return its user
    ///
    /// # Errors
    ///
    /// * `AuthError::RefreshTokenNotFound` - No such token
    /// * `AuthError::RefreshTokenRevoked` - Revoked, whether or not it also expired
    /// * `AuthError::RefreshTokenExpired` - Past `expires_at`
    pub async fn validate(&self, raw: &str) -> AuthResult<UserId> {
        self.find_active(raw).await.map(|record| record.user_id)
    }

    /// Revoke a token. Revoking an already revoked token succeeds.
    ///
    /// # Errors
    ///
    /// * `AuthError::RefreshTokenNotFound` - No such token
    pub async fn revoke(&self, raw: &str) -> AuthResult<()> {
        let record = self
            .repository
            .find_by_token(raw)
            .await?
            .ok_or(AuthError::RefreshTokenNotFound)?;

        if record.revoked_at.is_some() {
            return Ok(());
        }

        // A concurrent revoke may win the race; either way the token ends revoked.
        self.repository.mark_revoked(raw, Utc::now()).await?;
        Ok(())
    }

    /// Exchange an active token for a new one bound to the same user
    ///
    /// Only one of two concurrent rotations of the same token succeeds; the
    /// other sees `AuthError::RefreshTokenRevoked`.
    pub async fn rotate(&self, raw: &str, ttl: Duration) -> AuthResult<RefreshToken> {
        let record = self.find_active(raw).await?;
        if !self.repository.mark_revoked(raw, Utc::now()).await? {
            return Err(AuthError::RefreshTokenRevoked);
        }
        self.issue_for_user(record.user_id, ttl).await
    }

    /// Any currently active token belonging to `user_id`
    pub async fn active_for_user(&self, user_id: UserId) -> AuthResult<Option<RefreshToken>> {
        let now = Utc::now();
        let records = self.repository.find_by_user(user_id).await?;

        Ok(records
            .into_iter()
            .filter(|record| record.is_active_at(now))
            .max_by_key(|record| record.expires_at))
    }

    async fn find_active(&self, raw: &str) -> AuthResult<RefreshToken> {
        let record = self
            .repository
            .find_by_token(raw)
            .await?
            .ok_or(AuthError::RefreshTokenNotFound)?;

        match record.state_at(Utc::now()) {
            RefreshTokenState::Revoked => Err(AuthError::RefreshTokenRevoked),
            RefreshTokenState::Expired => Err(AuthError::RefreshTokenExpired),
            RefreshTokenState::Active => Ok(record),
        }
    }
}
