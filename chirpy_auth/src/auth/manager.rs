//! Authentication manager implementation.

use std::sync::Arc;

use chrono::Duration;
use http::HeaderMap;
use log::{debug, info, warn};
use subtle::ConstantTimeEq;

use super::{
    access,
    config::AuthConfig,
    credentials,
    errors::{AuthError, AuthResult},
    models::{LoginResponse, RefreshResponse, User, UserId},
    password::PasswordHasher,
    refresh::RefreshTokenStore,
};
use crate::db::{RefreshTokenRepository, UserRepository};

/// Authentication manager
///
/// Wires the password hasher, access token codec and refresh token store to
/// the user and refresh token repositories.
#[derive(Clone)]
pub struct AuthManager {
    config: AuthConfig,
    hasher: PasswordHasher,
    users: Arc<dyn UserRepository>,
    refresh_tokens: RefreshTokenStore,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `config` - Secrets, lifetimes and password cost parameters
    /// * `users` - User lookup collaborator
    /// * `refresh_tokens` - Refresh token persistence collaborator
    ///
    /// # Errors
    ///
    /// * `AuthError::HashingFailed` - Password cost parameters are invalid
    pub fn new(
        config: AuthConfig,
        users: Arc<dyn UserRepository>,
        refresh_tokens: Arc<dyn RefreshTokenRepository>,
    ) -> AuthResult<Self> {
        let hasher = PasswordHasher::new(&config.password)?;

        Ok(Self {
            config,
            hasher,
            users,
            refresh_tokens: RefreshTokenStore::new(refresh_tokens),
        })
    }

    /// Login a user
    ///
    /// `requested_ttl` is clamped to the configured maximum access token
    /// lifetime. An active refresh token for the user is reused when one
    /// exists; otherwise a new one is issued. The lookup and the insert are
    /// separate calls, so two concurrent logins may both issue a token.
    ///
    /// # Errors
    ///
    /// * `AuthError::UserNotFound` - No user with that email
    /// * `AuthError::PasswordMismatch` - Incorrect password
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        requested_ttl: Option<Duration>,
    ) -> AuthResult<LoginResponse> {
        let user = self
            .users
            .find_by_email(email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        self.hasher.verify(password, &user.hashed_password)?;

        let ttl = access::clamp_ttl(requested_ttl, self.config.max_access_token_ttl);
        let access_token = access::issue(user.id, &self.config.jwt_secret, ttl)?;

        let refresh_token = match self.refresh_tokens.active_for_user(user.id).await? {
            Some(existing) => {
                debug!("Reusing active refresh token for user {}", user.id);
                existing.token
            }
            None => {
                self.refresh_tokens
                    .issue_for_user(user.id, self.config.refresh_token_ttl)
                    .await?
                    .token
            }
        };

        info!("User {} logged in", user.id);

        Ok(LoginResponse {
            user,
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new access token
    ///
    /// With rotation enabled the presented token is revoked and a replacement
    /// is returned alongside the access token.
    ///
    /// # Errors
    ///
    /// * `AuthError::RefreshTokenNotFound` - Unknown refresh token
    /// * `AuthError::RefreshTokenRevoked` - Token was revoked
    /// * `AuthError::RefreshTokenExpired` - Token expired
    /// * `AuthError::UserNotFound` - Token outlived its user
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<RefreshResponse> {
        let (user_id, rotated) = if self.config.rotate_refresh_tokens {
            let record = self
                .refresh_tokens
                .rotate(refresh_token, self.config.refresh_token_ttl)
                .await
                .inspect_err(|e| {
                    if matches!(e, AuthError::RefreshTokenRevoked) {
                        warn!("Revoked refresh token presented for rotation");
                    }
                })?;
            (record.user_id, Some(record.token))
        } else {
            (self.refresh_tokens.validate(refresh_token).await?, None)
        };

        let user = self.find_user(user_id).await?;

        let access_token = access::issue(
            user.id,
            &self.config.jwt_secret,
            self.config.max_access_token_ttl,
        )?;

        Ok(RefreshResponse {
            user_id: user.id,
            access_token,
            refresh_token: rotated,
        })
    }

    /// Revoke a refresh token (logout). Idempotent.
    pub async fn revoke(&self, refresh_token: &str) -> AuthResult<()> {
        self.refresh_tokens.revoke(refresh_token).await?;
        debug!("Refresh token revoked");
        Ok(())
    }

    /// Verify an access token
    pub fn verify_access_token(&self, token: &str) -> AuthResult<UserId> {
        access::validate(token, &self.config.jwt_secret)
    }

    /// Resolve the user behind `Authorization: Bearer <access token>`
    pub fn authenticate(&self, headers: &HeaderMap) -> AuthResult<UserId> {
        let token = credentials::extract_bearer(headers)?;
        self.verify_access_token(&token)
    }

    /// Resolve the user behind `Authorization: Bearer <access token>` and
    /// load their record
    pub async fn current_user(&self, headers: &HeaderMap) -> AuthResult<User> {
        let user_id = self.authenticate(headers)?;
        self.find_user(user_id).await
    }

    /// Load a user record by ID
    pub async fn find_user(&self, user_id: UserId) -> AuthResult<User> {
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Check `Authorization: ApiKey <key>` against the configured key
    ///
    /// # Errors
    ///
    /// * `AuthError::CredentialMissing` - No API key credential
    /// * `AuthError::InvalidApiKey` - Key differs, or no key is configured
    pub fn authorize_api_key(&self, headers: &HeaderMap) -> AuthResult<()> {
        let presented = credentials::extract_api_key(headers)?;
        let expected = self
            .config
            .api_key
            .as_deref()
            .ok_or(AuthError::InvalidApiKey)?;

        if bool::from(presented.as_bytes().ct_eq(expected.as_bytes())) {
            Ok(())
        } else {
            Err(AuthError::InvalidApiKey)
        }
    }

    /// Hash a password for storage by the user store
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        self.hasher.hash(password)
    }
}
