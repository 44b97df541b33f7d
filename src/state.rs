use std::sync::Arc;

use crate::{
    auth::tokens::OsRandom,
    clock::SystemClock,
    config::Config,
    password::Argon2Hasher,
    services::SessionService,
    store::{mongo::open_database, MongoRefreshTokenStore, MongoUserStore, StoreError},
};

#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionService>,
}

impl AppState {
    pub fn new(sessions: SessionService) -> Self {
        Self {
            sessions: Arc::new(sessions),
        }
    }

    /// Production wiring: MongoDB stores, Argon2id, OS randomness, wall clock.
    pub async fn connect(cfg: &Config) -> Result<Self, StoreError> {
        let db = open_database(&cfg.mongodb_uri, &cfg.db_name).await?;
        let users = MongoUserStore::init(&db).await?;
        let refresh_tokens = MongoRefreshTokenStore::init(&db).await?;

        Ok(Self::new(SessionService::new(
            Arc::new(users),
            Arc::new(refresh_tokens),
            Arc::new(Argon2Hasher::default()),
            Arc::new(OsRandom),
            Arc::new(SystemClock),
            cfg.session.clone(),
        )))
    }
}
