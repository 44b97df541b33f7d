#![allow(dead_code)]

use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration as StdDuration,
};

use chrono::{DateTime, Utc};
use session_auth::{
    auth::{
        jwt::SigningSecret,
        tokens::{OsRandom, SecureRandomSource},
    },
    clock::ManualClock,
    config::SessionSettings,
    models::user::UserRecord,
    password::{Argon2Hasher, CredentialHasher},
    services::SessionService,
    store::{InMemoryRefreshTokenStore, InMemoryUserStore, RefreshTokenStore},
};
use uuid::Uuid;

pub const EMAIL: &str = "a@example.com";
pub const PASSWORD: &str = "secret123";
pub const SECRET: &str = "integration-test-secret";

pub fn t0() -> DateTime<Utc> {
    DateTime::from_timestamp(1_700_000_000, 0).unwrap()
}

pub fn settings() -> SessionSettings {
    SessionSettings::new(SigningSecret::new(SECRET).unwrap())
}

/// Fills every request with the next scripted byte, then with `fallback`.
pub struct ScriptedRandom {
    script: Mutex<VecDeque<u8>>,
    fallback: u8,
}

impl ScriptedRandom {
    pub fn new(script: &[u8], fallback: u8) -> Self {
        Self {
            script: Mutex::new(script.iter().copied().collect()),
            fallback,
        }
    }
}

impl SecureRandomSource for ScriptedRandom {
    fn fill_bytes(&self, dest: &mut [u8]) {
        let b = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        dest.fill(b);
    }
}

pub struct Harness {
    pub service: Arc<SessionService>,
    pub clock: Arc<ManualClock>,
    pub tokens: Arc<InMemoryRefreshTokenStore>,
    pub user: UserRecord,
}

pub struct HarnessBuilder {
    rng: Arc<dyn SecureRandomSource>,
    settings: SessionSettings,
    tokens: Option<Arc<dyn RefreshTokenStore>>,
    hasher: Option<Arc<dyn CredentialHasher>>,
}

impl HarnessBuilder {
    pub fn rng(mut self, rng: impl SecureRandomSource + 'static) -> Self {
        self.rng = Arc::new(rng);
        self
    }

    pub fn store_timeout(mut self, t: StdDuration) -> Self {
        self.settings.store_timeout = t;
        self
    }

    pub fn refresh_ttl(mut self, ttl: chrono::Duration) -> Self {
        self.settings.refresh_ttl = ttl;
        self
    }

    pub fn hash_timeout(mut self, t: StdDuration) -> Self {
        self.settings.hash_timeout = t;
        self
    }

    /// Replace the refresh-token store handed to the service.
    pub fn token_store(mut self, store: impl RefreshTokenStore + 'static) -> Self {
        self.tokens = Some(Arc::new(store));
        self
    }

    pub fn hasher(mut self, hasher: impl CredentialHasher + 'static) -> Self {
        self.hasher = Some(Arc::new(hasher));
        self
    }

    pub fn build(self) -> Harness {
        let fast = Argon2Hasher::insecure_fast().unwrap();
        let user = UserRecord {
            id: Uuid::new_v4(),
            email: EMAIL.to_string(),
            password_hash: fast.hash(PASSWORD).unwrap(),
            created_at: t0(),
            updated_at: t0(),
        };

        let users = InMemoryUserStore::new();
        users.insert(user.clone()).unwrap();

        let tokens = Arc::new(InMemoryRefreshTokenStore::new());
        let token_store = match self.tokens {
            Some(store) => store,
            None => tokens.clone() as Arc<dyn RefreshTokenStore>,
        };
        let hasher = match self.hasher {
            Some(hasher) => hasher,
            None => Arc::new(fast) as Arc<dyn CredentialHasher>,
        };
        let clock = Arc::new(ManualClock::new(t0()));

        let service = SessionService::new(
            Arc::new(users),
            token_store,
            hasher,
            self.rng,
            clock.clone(),
            self.settings,
        );

        Harness {
            service: Arc::new(service),
            clock,
            tokens,
            user,
        }
    }
}

pub fn harness() -> HarnessBuilder {
    HarnessBuilder {
        rng: Arc::new(OsRandom),
        settings: settings(),
        tokens: None,
        hasher: None,
    }
}
