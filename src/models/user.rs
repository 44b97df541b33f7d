use std::fmt;

use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{bson_to_chrono, chrono_to_bson};
use crate::store::StoreError;

/// A user as seen by the credential check. Owned by user management; read-only here.
#[derive(Clone)]
pub struct UserRecord {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserPublic {
    fn from(u: UserRecord) -> Self {
        Self {
            id: u.id,
            email: u.email,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDoc {
    #[serde(rename = "_id")]
    pub id: String,

    pub email: String,
    pub password_hash: String,

    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

impl From<&UserRecord> for UserDoc {
    fn from(u: &UserRecord) -> Self {
        Self {
            id: u.id.to_string(),
            email: u.email.clone(),
            password_hash: u.password_hash.clone(),
            created_at: chrono_to_bson(u.created_at),
            updated_at: chrono_to_bson(u.updated_at),
        }
    }
}

impl TryFrom<UserDoc> for UserRecord {
    type Error = StoreError;

    fn try_from(d: UserDoc) -> Result<Self, Self::Error> {
        let id = Uuid::parse_str(&d.id)
            .map_err(|e| StoreError::Backend(format!("bad user id {:?}: {e}", d.id)))?;
        Ok(Self {
            id,
            email: d.email,
            password_hash: d.password_hash,
            created_at: bson_to_chrono(d.created_at)?,
            updated_at: bson_to_chrono(d.updated_at)?,
        })
    }
}
