//! Signed, self-contained access tokens.
//!
//! Tokens are HS256 JWTs. Validation needs only the token and the shared
//! secret; the server keeps no record of issued tokens and cannot revoke them.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};

use super::{
    config::TOKEN_ISSUER,
    errors::{AuthError, AuthResult},
    models::{AccessTokenClaims, UserId},
};

/// Issue an access token for `user_id` that expires after `ttl`
///
/// # Errors
///
/// * `AuthError::InvalidTtl` - `ttl` is zero, negative, or runs past the
///   representable date range
/// * `AuthError::SigningFailed` - Encoding or signing failed
pub fn issue(user_id: UserId, signing_secret: &str, ttl: Duration) -> AuthResult<String> {
    if ttl <= Duration::zero() {
        return Err(AuthError::InvalidTtl);
    }

    let now = Utc::now();
    let expires_at = now.checked_add_signed(ttl).ok_or(AuthError::InvalidTtl)?;
    let claims = AccessTokenClaims {
        iss: TOKEN_ISSUER.to_string(),
        sub: user_id,
        iat: now.timestamp_millis(),
        exp: expires_at.timestamp_millis(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_secret.as_bytes()),
    )
    .map_err(|_| AuthError::SigningFailed)
}

/// Validate an access token and return the user it was issued to
///
/// Checks run in order: signature, issuer, expiry.
pub fn validate(token: &str, signing_secret: &str) -> AuthResult<UserId> {
    let claims = decode_claims(token, signing_secret)?;

    if claims.iss != TOKEN_ISSUER {
        return Err(AuthError::TokenWrongIssuer);
    }

    if Utc::now().timestamp_millis() >= claims.exp {
        return Err(AuthError::TokenExpired);
    }

    Ok(claims.sub)
}

/// Clamp a caller-requested lifetime to the server maximum
///
/// Missing, zero, negative or oversized requests all yield `max`.
pub fn clamp_ttl(requested: Option<Duration>, max: Duration) -> Duration {
    match requested {
        Some(ttl) if ttl > Duration::zero() && ttl < max => ttl,
        _ => max,
    }
}

/// Verify the signature and return the claims as issued
///
/// Issuer and expiry are left to the caller; [`validate`] checks both.
pub fn decode_claims(token: &str, signing_secret: &str) -> AuthResult<AccessTokenClaims> {
    // Expiry is in milliseconds and checked by hand.
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims = HashSet::new();

    decode::<AccessTokenClaims>(
        token,
        &DecodingKey::from_secret(signing_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::InvalidSignature => AuthError::TokenBadSignature,
        _ => AuthError::TokenMalformed,
    })
}
