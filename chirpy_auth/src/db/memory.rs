//! In-memory repositories for tests and local development.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::repository::{RefreshTokenRepository, UserRepository};
use super::timeouts::RepositoryResult;
use crate::auth::{RefreshToken, User, UserId};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panic while holding the lock cannot leave a map half-updated.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// User store backed by a `HashMap`
#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<Mutex<HashMap<UserId, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(self, user: User) -> Self {
        self.add_user(user);
        self
    }

    pub fn add_user(&self, user: User) {
        lock(&self.users).insert(user.id, user);
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, user_id: UserId) -> RepositoryResult<Option<User>> {
        Ok(lock(&self.users).get(&user_id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        Ok(lock(&self.users)
            .values()
            .find(|u| u.email == email)
            .cloned())
    }
}

/// Refresh token store backed by a `HashMap` keyed on the token string
#[derive(Clone, Default)]
pub struct InMemoryRefreshTokenRepository {
    tokens: Arc<Mutex<HashMap<String, RefreshToken>>>,
}

impl InMemoryRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of one record
    pub fn get(&self, token: &str) -> Option<RefreshToken> {
        lock(&self.tokens).get(token).cloned()
    }

    pub fn len(&self) -> usize {
        lock(&self.tokens).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RefreshTokenRepository for InMemoryRefreshTokenRepository {
    async fn insert(&self, record: &RefreshToken) -> RepositoryResult<()> {
        lock(&self.tokens).insert(record.token.clone(), record.clone());
        Ok(())
    }

    async fn find_by_token(&self, token: &str) -> RepositoryResult<Option<RefreshToken>> {
        Ok(self.get(token))
    }

    async fn find_by_user(&self, user_id: UserId) -> RepositoryResult<Vec<RefreshToken>> {
        Ok(lock(&self.tokens)
            .values()
            .filter(|r| r.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn mark_revoked(&self, token: &str, at: DateTime<Utc>) -> RepositoryResult<bool> {
        let mut tokens = lock(&self.tokens);
        match tokens.get_mut(token) {
            Some(record) if record.revoked_at.is_none() => {
                record.revoked_at = Some(at);
                record.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
