use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::{
    bson::{doc, Bson},
    error::{ErrorKind, WriteFailure},
    options::{ClientOptions, IndexOptions},
    Client, Collection, Database, IndexModel,
};

use super::{RefreshTokenStore, RevokeOutcome, StoreError, UserStore};
use crate::{
    auth::tokens::sha256_hex,
    models::{
        chrono_to_bson,
        refresh_token::{RefreshTokenDoc, RefreshTokenRecord},
        user::{UserDoc, UserRecord},
    },
};

const DUPLICATE_KEY: i32 = 11000;

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        if is_duplicate_key(&e) {
            StoreError::Conflict
        } else {
            StoreError::Backend(e.to_string())
        }
    }
}

fn is_duplicate_key(e: &mongodb::error::Error) -> bool {
    matches!(
        e.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(we)) if we.code == DUPLICATE_KEY
    )
}

pub async fn open_database(uri: &str, db_name: &str) -> Result<Database, StoreError> {
    let mut opts = ClientOptions::parse(uri).await?;
    opts.app_name = Some("session-auth".to_string());
    let client = Client::with_options(opts)?;
    Ok(client.database(db_name))
}

#[derive(Clone)]
pub struct MongoUserStore {
    users: Collection<UserDoc>,
}

impl MongoUserStore {
    pub async fn init(db: &Database) -> Result<Self, StoreError> {
        let users: Collection<UserDoc> = db.collection("users");
        let email_index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        users.create_index(email_index).await?;
        Ok(Self { users })
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        self.users
            .find_one(doc! { "email": email })
            .await?
            .map(UserRecord::try_from)
            .transpose()
    }
}

#[derive(Clone)]
pub struct MongoRefreshTokenStore {
    tokens: Collection<RefreshTokenDoc>,
}

impl MongoRefreshTokenStore {
    pub async fn init(db: &Database) -> Result<Self, StoreError> {
        let tokens: Collection<RefreshTokenDoc> = db.collection("refresh_tokens");
        let hash_index = IndexModel::builder()
            .keys(doc! { "token_hash": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        tokens.create_index(hash_index).await?;

        // per-user lookups, e.g. revoking every session of one account
        let user_index = IndexModel::builder().keys(doc! { "user_id": 1 }).build();
        tokens.create_index(user_index).await?;

        Ok(Self { tokens })
    }
}

#[async_trait]
impl RefreshTokenStore for MongoRefreshTokenStore {
    async fn create_refresh_token(&self, record: &RefreshTokenRecord) -> Result<(), StoreError> {
        self.tokens
            .insert_one(RefreshTokenDoc::from(record))
            .await?;
        Ok(())
    }

    async fn find_refresh_token(
        &self,
        token: &str,
    ) -> Result<Option<RefreshTokenRecord>, StoreError> {
        self.tokens
            .find_one(doc! { "token_hash": sha256_hex(token) })
            .await?
            .map(|d| d.into_record(token))
            .transpose()
    }

    async fn revoke_refresh_token(
        &self,
        token: &str,
        when: DateTime<Utc>,
    ) -> Result<RevokeOutcome, StoreError> {
        let token_hash = sha256_hex(token);
        let when = chrono_to_bson(when);

        let res = self
            .tokens
            .update_one(
                doc! { "token_hash": &token_hash, "revoked_at": Bson::Null },
                doc! { "$set": { "revoked_at": when, "updated_at": when } },
            )
            .await?;
        if res.matched_count > 0 {
            return Ok(RevokeOutcome::Revoked);
        }

        let exists = self
            .tokens
            .find_one(doc! { "token_hash": &token_hash })
            .await?
            .is_some();
        Ok(if exists {
            RevokeOutcome::AlreadyRevoked
        } else {
            RevokeOutcome::NotFound
        })
    }
}
