use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{bson_to_chrono, chrono_to_bson};
use crate::{auth::tokens::sha256_hex, store::StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshTokenState {
    Active,
    /// Past `expires_at` and never revoked.
    Expired,
    /// Explicitly revoked. Terminal regardless of `expires_at`.
    Revoked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTokenRecord {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn state(&self, now: DateTime<Utc>) -> RefreshTokenState {
        if self.revoked_at.is_some() {
            RefreshTokenState::Revoked
        } else if now > self.expires_at {
            RefreshTokenState::Expired
        } else {
            RefreshTokenState::Active
        }
    }

    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.state(now) == RefreshTokenState::Active
    }
}

/// Persisted form. Only the SHA-256 of the token is stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenDoc {
    pub token_hash: String,
    pub user_id: String,

    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
    pub expires_at: BsonDateTime,

    pub revoked_at: Option<BsonDateTime>,
}

impl From<&RefreshTokenRecord> for RefreshTokenDoc {
    fn from(r: &RefreshTokenRecord) -> Self {
        Self {
            token_hash: sha256_hex(&r.token),
            user_id: r.user_id.to_string(),
            created_at: chrono_to_bson(r.created_at),
            updated_at: chrono_to_bson(r.updated_at),
            expires_at: chrono_to_bson(r.expires_at),
            revoked_at: r.revoked_at.map(chrono_to_bson),
        }
    }
}

impl RefreshTokenDoc {
    /// Rebuild the record for the token the caller presented.
    pub fn into_record(self, token: &str) -> Result<RefreshTokenRecord, StoreError> {
        let user_id = Uuid::parse_str(&self.user_id)
            .map_err(|e| StoreError::Backend(format!("bad refresh token owner: {e}")))?;
        Ok(RefreshTokenRecord {
            token: token.to_string(),
            user_id,
            created_at: bson_to_chrono(self.created_at)?,
            updated_at: bson_to_chrono(self.updated_at)?,
            expires_at: bson_to_chrono(self.expires_at)?,
            revoked_at: self.revoked_at.map(bson_to_chrono).transpose()?,
        })
    }
}
