//! Chirpy Red membership, granted by payment provider webhooks.
//!
//! Membership lives on the `users` table next to the fields the auth core
//! reads:
//!
//! ```sql
//! ALTER TABLE users ADD COLUMN is_chirpy_red BOOLEAN NOT NULL DEFAULT FALSE;
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chirpy_auth::{
    auth::UserId,
    db::{RepositoryResult, timeouts::with_default_timeout},
};
use sqlx::PgPool;

/// Grants paid membership to users
#[async_trait]
pub trait MembershipService: Send + Sync {
    /// Mark `user_id` as a Chirpy Red member. Upgrading a member again is a
    /// no-op. Returns `false` when no such user exists.
    async fn upgrade(&self, user_id: UserId) -> RepositoryResult<bool>;
}

/// PostgreSQL implementation of `MembershipService`
pub struct PgMembershipService {
    pool: PgPool,
}

impl PgMembershipService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipService for PgMembershipService {
    async fn upgrade(&self, user_id: UserId) -> RepositoryResult<bool> {
        let result = with_default_timeout(
            sqlx::query(
                "UPDATE users SET is_chirpy_red = TRUE, updated_at = NOW()
                 WHERE id = $1",
            )
            .bind(user_id)
            .execute(&self.pool),
        )
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Membership flags held in memory, keyed by user
#[derive(Clone, Default)]
pub struct InMemoryMembershipService {
    members: Arc<Mutex<HashMap<UserId, bool>>>,
}

impl InMemoryMembershipService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user who has not paid yet
    pub fn add_user(&self, user_id: UserId) {
        self.members().entry(user_id).or_insert(false);
    }

    pub fn is_member(&self, user_id: UserId) -> bool {
        self.members().get(&user_id).copied().unwrap_or(false)
    }

    fn members(&self) -> std::sync::MutexGuard<'_, HashMap<UserId, bool>> {
        self.members
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl MembershipService for InMemoryMembershipService {
    async fn upgrade(&self, user_id: UserId) -> RepositoryResult<bool> {
        Ok(match self.members().get_mut(&user_id) {
            Some(member) => {
                *member = true;
                true
            }
            None => false,
        })
    }
}
