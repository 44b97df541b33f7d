//! Persistence seams for the session service.
//!
//! [`UserStore`] is read-only credential lookup owned by user management.
//! [`RefreshTokenStore`] holds refresh-token state and is the only shared
//! mutable resource: implementations must make `create` reject duplicates and
//! make `revoke` a single atomic write so concurrent revokes and refreshes on
//! the same token never observe a half-applied update.

pub mod memory;
pub mod mongo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{refresh_token::RefreshTokenRecord, user::UserRecord};

pub use memory::{InMemoryRefreshTokenStore, InMemoryUserStore};
pub use mongo::{MongoRefreshTokenStore, MongoUserStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record already exists")]
    Conflict,

    #[error("store call timed out")]
    Timeout,

    #[error("store backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    Revoked,
    AlreadyRevoked,
    NotFound,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `email` is already normalised (trimmed, lowercase).
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError>;
}

#[async_trait]
pub trait RefreshTokenStore: Send + Sync {
    /// Fails with [`StoreError::Conflict`] if the token value already exists.
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), StoreError>;

    async fn find_refresh_token(&self, token: &str)
        -> Result<Option<RefreshTokenRecord>, StoreError>;

    /// Sets `revoked_at` and `updated_at` to `when` unless already revoked.
    async fn revoke_refresh_token(
        &self,
        token: &str,
        when: DateTime<Utc>,
    ) -> Result<RevokeOutcome, StoreError>;
}
