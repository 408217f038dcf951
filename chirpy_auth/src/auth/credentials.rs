//! `Authorization` header parsing.
//!
//! Accepts exactly `Bearer <token>` or `ApiKey <key>`: case-sensitive scheme,
//! one separating space, non-blank value. Every other shape, including a
//! missing header, is [`AuthError::CredentialMissing`].

use http::{HeaderMap, header::AUTHORIZATION};

use super::{
    errors::{AuthError, AuthResult},
    models::{Credential, CredentialKind},
};

const BEARER_PREFIX: &str = "Bearer ";
const API_KEY_PREFIX: &str = "ApiKey ";

/// Extract the token from `Authorization: Bearer <token>`
pub fn extract_bearer(headers: &HeaderMap) -> AuthResult<String> {
    extract_with_prefix(headers, BEARER_PREFIX)
}

/// Extract the key from `Authorization: ApiKey <key>`
pub fn extract_api_key(headers: &HeaderMap) -> AuthResult<String> {
    extract_with_prefix(headers, API_KEY_PREFIX)
}

/// Extract whichever credential scheme the request carries
pub fn extract(headers: &HeaderMap) -> AuthResult<Credential> {
    if let Ok(raw) = extract_bearer(headers) {
        return Ok(Credential {
            kind: CredentialKind::Bearer,
            raw,
        });
    }

    extract_api_key(headers).map(|raw| Credential {
        kind: CredentialKind::ApiKey,
        raw,
    })
}

fn extract_with_prefix(headers: &HeaderMap, prefix: &str) -> AuthResult<String> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix(prefix))
        .ok_or(AuthError::CredentialMissing)?;

    if value.trim().is_empty() {
        return Err(AuthError::CredentialMissing);
    }

    Ok(value.to_string())
}
