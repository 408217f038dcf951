//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use chirpy_auth::{
    auth::{AuthConfig, PasswordConfig},
    db::{DEFAULT_MAX_CONNECTIONS, DatabaseConfig},
};
use chrono::Duration;
use std::net::SocketAddr;

/// Longest accepted refresh token lifetime
pub const MAX_REFRESH_TOKEN_TTL_SECS: i64 = 10 * 365 * 24 * 3600;

/// Complete server configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Security configuration
    pub security: SecurityConfig,
    /// Token lifetimes
    pub tokens: TokenConfig,
    /// Deployment platform (`dev` enables development-only behavior)
    pub platform: String,
}

/// Security-related configuration
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// JWT signing secret (required)
    pub jwt_secret: String,
    /// Password hashing pepper
    pub password_pepper: Option<String>,
    /// Key webhook callers present as `Authorization: ApiKey <key>`
    pub polka_key: Option<String>,
}

/// Token lifetime configuration
#[derive(Debug, Clone)]
pub struct TokenConfig {
    /// Maximum access token lifetime in seconds
    pub access_token_max_ttl_secs: i64,
    /// Refresh token lifetime in seconds
    pub refresh_token_ttl_secs: i64,
    /// Rotate refresh tokens on every refresh
    pub rotate_refresh_tokens: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Arguments
    ///
    /// * `bind_override` - Optional bind address override (from CLI args)
    /// * `database_url_override` - Optional database URL override (from CLI args)
    ///
    /// # Errors
    ///
    /// Returns error if required variables are missing or invalid
    pub fn from_env(
        bind_override: Option<SocketAddr>,
        database_url_override: Option<String>,
    ) -> Result<Self, ConfigError> {
        let bind = match bind_override {
            Some(bind) => bind,
            None => match std::env::var("SERVER_BIND") {
                Ok(value) => value.parse().map_err(|_| ConfigError::Invalid {
                    var: "SERVER_BIND".to_string(),
                    reason: format!("{value:?} is not an IP:PORT address"),
                })?,
                Err(_) => SocketAddr::from(([127, 0, 0, 1], 8080)),
            },
        };

        let database_url = database_url_override
            .or_else(|| std::env::var("DB_URL").ok())
            .or_else(|| std::env::var("DATABASE_URL").ok())
            .ok_or_else(|| ConfigError::MissingRequired {
                var: "DB_URL".to_string(),
                hint: "e.g. postgres://postgres@localhost:5432/chirpy?sslmode=disable".to_string(),
            })?;

        let database = DatabaseConfig {
            max_connections: parse_env("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            ..DatabaseConfig::new(database_url)
        };

        // Security configuration (REQUIRED)
        let jwt_secret = std::env::var("JWT_SECRET").map_err(|_| ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Generate with: openssl rand -base64 64".to_string(),
        })?;

        let security = SecurityConfig {
            jwt_secret,
            password_pepper: std::env::var("PASSWORD_PEPPER").ok(),
            polka_key: std::env::var("POLKA_KEY").ok(),
        };

        let tokens = TokenConfig {
            access_token_max_ttl_secs: parse_env("ACCESS_TOKEN_MAX_TTL_SECS", 3600)?,
            refresh_token_ttl_secs: parse_env("REFRESH_TOKEN_TTL_SECS", 60 * 24 * 3600)?,
            rotate_refresh_tokens: parse_env("ROTATE_REFRESH_TOKENS", false)?,
        };

        let config = ServerConfig {
            bind,
            database,
            security,
            tokens,
            platform: std::env::var("PLATFORM").unwrap_or_else(|_| "prod".to_string()),
        };
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.jwt_secret.len() < 32 {
            return Err(ConfigError::Invalid {
                var: "JWT_SECRET".to_string(),
                reason: "Must be at least 32 characters (128-bit security)".to_string(),
            });
        }

        if self
            .security
            .password_pepper
            .as_ref()
            .is_some_and(|pepper| pepper.len() < 16)
        {
            return Err(ConfigError::Invalid {
                var: "PASSWORD_PEPPER".to_string(),
                reason: "Must be at least 16 characters (64-bit security)".to_string(),
            });
        }

        if self.tokens.access_token_max_ttl_secs <= 0 || self.tokens.access_token_max_ttl_secs > 3600 {
            return Err(ConfigError::Invalid {
                var: "ACCESS_TOKEN_MAX_TTL_SECS".to_string(),
                reason: "Must be between 1 and 3600".to_string(),
            });
        }

        if self.tokens.refresh_token_ttl_secs > MAX_REFRESH_TOKEN_TTL_SECS {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_TTL_SECS".to_string(),
                reason: format!("Must be at most {MAX_REFRESH_TOKEN_TTL_SECS} (10 years)"),
            });
        }

        if self.tokens.refresh_token_ttl_secs <= self.tokens.access_token_max_ttl_secs {
            return Err(ConfigError::Invalid {
                var: "REFRESH_TOKEN_TTL_SECS".to_string(),
                reason: format!(
                    "Must be greater than the access token lifetime ({}s)",
                    self.tokens.access_token_max_ttl_secs
                ),
            });
        }

        Ok(())
    }

    /// Whether development-only behavior is enabled
    pub fn is_dev(&self) -> bool {
        self.platform == "dev"
    }

    /// Authentication settings derived from this configuration
    ///
    /// # Errors
    ///
    /// Returns the first [`validate`](Self::validate) failure
    pub fn auth_config(&self) -> Result<AuthConfig, ConfigError> {
        self.validate()?;

        Ok(AuthConfig {
            max_access_token_ttl: Duration::seconds(self.tokens.access_token_max_ttl_secs),
            refresh_token_ttl: Duration::seconds(self.tokens.refresh_token_ttl_secs),
            rotate_refresh_tokens: self.tokens.rotate_refresh_tokens,
            api_key: self.security.polka_key.clone(),
            password: PasswordConfig {
                pepper: self.security.password_pepper.clone(),
                ..PasswordConfig::default()
            },
            ..AuthConfig::new(self.security.jwt_secret.clone())
        })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse an environment variable, using `default` only when it is unset
fn parse_env<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    parse_value(key, std::env::var(key).ok(), default)
}

fn parse_value<T>(key: &str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("{raw:?} could not be parsed"),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirpy_auth::{auth::RefreshTokenStore, db::InMemoryRefreshTokenRepository};
    use std::sync::Arc;
    use uuid::Uuid;

    fn config() -> ServerConfig {
        ServerConfig {
            bind: "127.0.0.1:8080".parse().unwrap(),
            database: DatabaseConfig::new("postgres://localhost/chirpy_test"),
            security: SecurityConfig {
                jwt_secret: "a".repeat(32),
                password_pepper: None,
                polka_key: Some("f271c81ff7084ee5b99a5091b42d486e".to_string()),
            },
            tokens: TokenConfig {
                access_token_max_ttl_secs: 3600,
                refresh_token_ttl_secs: 60 * 24 * 3600,
                rotate_refresh_tokens: false,
            },
            platform: "dev".to_string(),
        }
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingRequired {
            var: "JWT_SECRET".to_string(),
            hint: "Use openssl".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("JWT_SECRET"));
        assert!(msg.contains("Use openssl"));
    }

    #[test]
    fn test_valid_config() {
        let config = config();
        assert!(config.validate().is_ok());
        assert!(config.is_dev());
    }

    #[test]
    fn test_short_jwt_secret() {
        let mut config = config();
        config.security.jwt_secret = "short".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_short_pepper() {
        let mut config = config();
        config.security.password_pepper = Some("tiny".to_string());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_access_ttl_above_one_hour() {
        let mut config = config();
        config.tokens.access_token_max_ttl_secs = 7200;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_refresh_ttl_not_longer_than_access() {
        let mut config = config();
        config.tokens.refresh_token_ttl_secs = 60;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
    }

    #[test]
    fn test_refresh_ttl_upper_limit() {
        let mut config = config();

        config.tokens.refresh_token_ttl_secs = MAX_REFRESH_TOKEN_TTL_SECS;
        assert!(config.validate().is_ok());

        for too_long in [MAX_REFRESH_TOKEN_TTL_SECS + 1, 9_000_000_000_000, i64::MAX] {
            config.tokens.refresh_token_ttl_secs = too_long;
            assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
            assert!(config.auth_config().is_err());
        }
    }

    #[tokio::test]
    async fn test_refresh_ttl_at_limit_issues_tokens() {
        let mut config = config();
        config.tokens.refresh_token_ttl_secs = MAX_REFRESH_TOKEN_TTL_SECS;
        let auth = config.auth_config().unwrap();

        let store = RefreshTokenStore::new(Arc::new(InMemoryRefreshTokenRepository::new()));
        let record = store
            .issue_for_user(Uuid::new_v4(), auth.refresh_token_ttl)
            .await
            .unwrap();
        assert!(record.expires_at > record.created_at + Duration::days(3650 - 1));
    }

    #[test]
    fn test_access_ttl_out_of_range() {
        let mut config = config();
        for bad in [0, -1, i64::MIN, i64::MAX] {
            config.tokens.access_token_max_ttl_secs = bad;
            assert!(matches!(config.validate(), Err(ConfigError::Invalid { .. })));
        }
    }

    #[test]
    fn test_auth_config() {
        let auth = config().auth_config().unwrap();
        assert_eq!(auth.max_access_token_ttl, Duration::hours(1));
        assert_eq!(auth.refresh_token_ttl, Duration::days(60));
        assert_eq!(auth.api_key.as_deref(), Some("f271c81ff7084ee5b99a5091b42d486e"));
        assert!(!auth.rotate_refresh_tokens);
    }

    #[test]
    fn test_parse_value_rejects_garbage() {
        for raw in ["1", "yes", "ture", ""] {
            assert!(matches!(
                parse_value("ROTATE_REFRESH_TOKENS", Some(raw.to_string()), false),
                Err(ConfigError::Invalid { .. })
            ));
        }
        assert!(matches!(
            parse_value("ACCESS_TOKEN_MAX_TTL_SECS", Some("abc".to_string()), 3600_i64),
            Err(ConfigError::Invalid { .. })
        ));
    }

    #[test]
    fn test_parse_value() {
        assert!(parse_value("ROTATE_REFRESH_TOKENS", Some("true".to_string()), false).unwrap());
        assert!(!parse_value("ROTATE_REFRESH_TOKENS", None, false).unwrap());
        assert_eq!(
            parse_value("ACCESS_TOKEN_MAX_TTL_SECS", Some(" 600 ".to_string()), 3600_i64).unwrap(),
            600
        );
        assert_eq!(parse_value("ACCESS_TOKEN_MAX_TTL_SECS", None, 3600_i64).unwrap(), 3600);
    }
}
