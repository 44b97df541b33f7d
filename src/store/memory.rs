use std::{
    collections::{hash_map::Entry, HashMap},
    sync::{Mutex, MutexGuard},
};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{RefreshTokenStore, RevokeOutcome, StoreError, UserStore};
use crate::models::{refresh_token::RefreshTokenRecord, user::UserRecord};

fn lock<T>(m: &Mutex<T>) -> Result<MutexGuard<'_, T>, StoreError> {
    m.lock()
        .map_err(|_| StoreError::Backend("in-memory store lock poisoned".into()))
}

/// Users keyed by normalised email.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserRecord) -> Result<(), StoreError> {
        let key = user.email.trim().to_lowercase();
        match lock(&self.users)?.entry(key) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(lock(&self.users)?.get(email).cloned())
    }
}

#[derive(Debug, Default)]
pub struct InMemoryRefreshTokenStore {
    tokens: Mutex<HashMap<String, RefreshTokenRecord>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        lock(&self.tokens).map(|t| t.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        match lock(&self.tokens)?.entry(record.token.clone()) {
            Entry::Occupied(_) => Err(StoreError::Conflict),
            Entry::Vacant(slot) => {
                slot.insert(record.clone());
                Ok(())
            }
        }
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        Ok(lock(&self.tokens)?.get(token).cloned())
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        when: DateTime<Utc>,
    ) -> Result<RevokeOutcome, StoreError> {
        let mut tokens = lock(&self.tokens)?;
        let Some(record) = tokens.get_mut(token) else {
            return Ok(RevokeOutcome::NotFound);
        };
        if record.revoked_at.is_some() {
            return Ok(RevokeOutcome::AlreadyRevoked);
        }
        record.revoked_at = Some(when);
        record.updated_at = when;
        Ok(RevokeOutcome::Revoked)
    }
}
