//! Argon2id password hashing.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString, rand_core::OsRng,
    },
};

use super::{
    config::PasswordConfig,
    errors::{AuthError, AuthResult},
};

/// Salted, cost-tunable password hasher.
///
/// Hashes are PHC strings, so the salt and cost parameters travel with the
/// hash and verification does not depend on the current configuration.
#[derive(Clone)]
pub struct PasswordHasher {
    argon2: Argon2<'static>,
    pepper: Option<String>,
}

impl PasswordHasher {
    /// Build a hasher from cost parameters and an optional server-side pepper
    ///
    /// # Errors
    ///
    /// * `AuthError::HashingFailed` - Cost parameters rejected by Argon2
    pub fn new(config: &PasswordConfig) -> AuthResult<Self> {
        let params = Params::new(
            config.memory_kib,
            config.iterations,
            config.parallelism,
            None,
        )
        .map_err(|_| AuthError::HashingFailed)?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
            pepper: config.pepper.clone(),
        })
    }

    /// Hash a plaintext password with a fresh random salt
    pub fn hash(&self, plaintext: &str) -> AuthResult<String> {
        let salt = SaltString::generate(&mut OsRng);

        Ok(self
            .argon2
            .hash_password(self.peppered(plaintext).as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify a plaintext password against a stored hash
    ///
    /// An unparseable stored hash is reported as a mismatch.
    pub fn verify(&self, plaintext: &str, stored_hash: &str) -> AuthResult<()> {
        let parsed_hash = PasswordHash::new(stored_hash).map_err(|_| AuthError::PasswordMismatch)?;

        self.argon2
            .verify_password(self.peppered(plaintext).as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::PasswordMismatch)
    }

    fn peppered(&self, plaintext: &str) -> String {
        match &self.pepper {
            Some(pepper) => format!("{plaintext}{pepper}"),
            None => plaintext.to_string(),
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            argon2: Argon2::default(),
            pepper: None,
        }
    }
}
