//! Authentication configuration.
//!
//! Built once at startup and passed explicitly to [`AuthManager`](super::AuthManager);
//! nothing here is read from or written to process-wide state.

use chrono::Duration;

/// Issuer stamped into, and required from, every access token
pub const TOKEN_ISSUER: &str = "chirpy";

/// Server-enforced cap on access token lifetime
pub const MAX_ACCESS_TOKEN_TTL: Duration = Duration::hours(1);

/// Default refresh token lifetime
pub const DEFAULT_REFRESH_TOKEN_TTL: Duration = Duration::days(60);

/// Token and credential settings
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Symmetric secret for access token signing
    pub jwt_secret: String,

    /// Upper bound for caller-requested access token lifetimes
    pub max_access_token_ttl: Duration,

    /// Lifetime of every refresh token
    pub refresh_token_ttl: Duration,

    /// Revoke the presented refresh token and hand out a new one on refresh
    pub rotate_refresh_tokens: bool,

    /// Key expected in `Authorization: ApiKey <key>` for webhook callers
    pub api_key: Option<String>,

    /// Password hashing parameters
    pub password: PasswordConfig,
}

impl AuthConfig {
    /// Configuration with default lifetimes for the given signing secret
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            max_access_token_ttl: MAX_ACCESS_TOKEN_TTL,
            refresh_token_ttl: DEFAULT_REFRESH_TOKEN_TTL,
            rotate_refresh_tokens: false,
            api_key: None,
            password: PasswordConfig::default(),
        }
    }
}

/// Argon2id cost parameters
#[derive(Debug, Clone)]
pub struct PasswordConfig {
    /// Memory cost in KiB
    pub memory_kib: u32,

    /// Number of passes
    pub iterations: u32,

    /// Degree of parallelism
    pub parallelism: u32,

    /// Server-side secret appended to every password before hashing
    pub pepper: Option<String>,
}

impl PasswordConfig {
    /// Cheap parameters for tests. Never use in production.
    pub fn testing() -> Self {
        Self {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
            pepper: None,
        }
    }
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: argon2::Params::DEFAULT_M_COST,
            iterations: argon2::Params::DEFAULT_T_COST,
            parallelism: argon2::Params::DEFAULT_P_COST,
            pepper: None,
        }
    }
}
