//! Login, refresh, revoke and request authentication.
//!
//! Refresh tokens move through three states: `Active`, `Expired` (reached
//! passively once `now > expires_at`) and `Revoked` (explicit and terminal).
//! The record is re-read on every refresh and revoke so that a committed
//! revocation is always observed; nothing about token state is cached here.
//!
//! Failures that would tell a caller *why* a credential was rejected (unknown
//! email vs wrong password, missing vs expired vs revoked refresh token) are
//! collapsed into a single error and only distinguished in the logs.

use std::{future::Future, sync::Arc};

use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        jwt::{issue_access_token, validate_access_token},
        tokens::{generate_refresh_token, new_refresh_record, SecureRandomSource},
    },
    clock::Clock,
    config::SessionSettings,
    dto::auth::LoginRequest,
    errors::AuthError,
    models::{refresh_token::RefreshTokenState, user::UserPublic},
    password::CredentialHasher,
    store::{RefreshTokenStore, RevokeOutcome, StoreError, UserStore},
};

#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: UserPublic,
    pub access_token: String,
    pub refresh_token: String,
}

pub struct SessionService {
    users: Arc<dyn UserStore>,
    refresh_tokens: Arc<dyn RefreshTokenStore>,
    hasher: Arc<dyn CredentialHasher>,
    rng: Arc<dyn SecureRandomSource>,
    clock: Arc<dyn Clock>,
    settings: SessionSettings,
    decoy_hash: String,
}

/// Hashed once per service so unknown accounts still pay for a verify.
const DECOY_PASSWORD: &str = "decoy-password-for-unknown-accounts";

impl SessionService {
    pub fn new(
        users: Arc<dyn UserStore>,
        refresh_tokens: Arc<dyn RefreshTokenStore>,
        hasher: Arc<dyn CredentialHasher>,
        rng: Arc<dyn SecureRandomSource>,
        clock: Arc<dyn Clock>,
        settings: SessionSettings,
    ) -> Self {
        let decoy_hash = hasher.hash(DECOY_PASSWORD).unwrap_or_else(|e| {
            warn!(error = %e, "could not prepare decoy password hash");
            String::new()
        });
        Self {
            users,
            refresh_tokens,
            hasher,
            rng,
            clock,
            settings,
            decoy_hash,
        }
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    #[instrument(skip_all)]
    pub async fn login(&self, req: LoginRequest) -> Result<LoginOutcome, AuthError> {
        let email = req.email.trim().to_lowercase();
        if email.is_empty() || req.password.trim().is_empty() {
            return Err(AuthError::Validation("email and password are required".into()));
        }

        let user = self
            .within_deadline(self.users.find_user_by_email(&email))
            .await?;
        let Some(user) = user else {
            // same hashing work as a wrong password
            self.verify_password(&req.password, &self.decoy_hash).await?;
            debug!("login rejected: no account for email");
            return Err(AuthError::InvalidCredentials);
        };

        if !self.verify_password(&req.password, &user.password_hash).await? {
            debug!(user_id = %user.id, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.clock.now();
        let ttl = self.settings.access_ttl_for(req.expires_in_seconds);
        let access_token =
            issue_access_token(&user.id.to_string(), &self.settings.secret, ttl, now)?;
        let refresh_token = self.persist_refresh_token(user.id).await?;

        info!(user_id = %user.id, ttl_seconds = ttl.num_seconds(), "login succeeded");
        Ok(LoginOutcome {
            user: UserPublic::from(user),
            access_token,
            refresh_token,
        })
    }

    /// Exchange a refresh token for a new access token. The refresh token
    /// itself is left as it is: no rotation, no sliding expiry.
    #[instrument(skip_all)]
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let record = self
            .within_deadline(self.refresh_tokens.find_refresh_token(refresh_token))
            .await?;
        let Some(record) = record else {
            info!(reason = "not_found", "refresh rejected");
            return Err(AuthError::InvalidToken);
        };

        let now = self.clock.now();
        match record.state(now) {
            RefreshTokenState::Active => {}
            RefreshTokenState::Expired => {
                info!(user_id = %record.user_id, reason = "expired", "refresh rejected");
                return Err(AuthError::InvalidToken);
            }
            RefreshTokenState::Revoked => {
                info!(user_id = %record.user_id, reason = "revoked", "refresh rejected");
                return Err(AuthError::InvalidToken);
            }
        }

        let token = issue_access_token(
            &record.user_id.to_string(),
            &self.settings.secret,
            self.settings.access_ttl,
            now,
        )?;
        debug!(user_id = %record.user_id, "access token refreshed");
        Ok(token)
    }

    /// Idempotent: revoking an already revoked token succeeds.
    #[instrument(skip_all)]
    pub async fn revoke(&self, refresh_token: &str) -> Result<(), AuthError> {
        if refresh_token.is_empty() {
            return Err(AuthError::InvalidToken);
        }

        let now = self.clock.now();
        let outcome = self
            .within_deadline(self.refresh_tokens.revoke_refresh_token(refresh_token, now))
            .await?;
        match outcome {
            RevokeOutcome::Revoked => {
                info!("refresh token revoked");
                Ok(())
            }
            RevokeOutcome::AlreadyRevoked => {
                debug!("refresh token was already revoked");
                Ok(())
            }
            RevokeOutcome::NotFound => {
                info!(reason = "not_found", "revoke rejected");
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Resolve the user behind an access token.
    pub fn authenticate_request(&self, access_token: &str) -> Result<Uuid, AuthError> {
        let subject = validate_access_token(access_token, &self.settings.secret, self.clock.now())
            .map_err(|e| {
                debug!(reason = %e, "access token rejected");
                AuthError::Unauthorized
            })?;
        Uuid::parse_str(&subject).map_err(|_| {
            warn!("access token subject is not a user id");
            AuthError::Unauthorized
        })
    }

    /// Generate and store a refresh token, regenerating once on collision.
    async fn persist_refresh_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        let mut retried = false;
        loop {
            let token = generate_refresh_token(self.rng.as_ref());
            let record =
                new_refresh_record(token, user_id, self.clock.now(), self.settings.refresh_ttl)?;

            match self
                .within_deadline(self.refresh_tokens.create_refresh_token(&record))
                .await
            {
                Ok(()) => return Ok(record.token),
                Err(StoreError::Conflict) if !retried => {
                    warn!(%user_id, "refresh token collision, regenerating");
                    retried = true;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    async fn verify_password(&self, password: &str, hash: &str) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        let (password, hash) = (password.to_owned(), hash.to_owned());
        let task = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash));

        match tokio::time::timeout(self.settings.hash_timeout, task).await {
            Ok(Ok(matched)) => Ok(matched),
            Ok(Err(e)) if e.is_cancelled() => Err(AuthError::Cancelled),
            Ok(Err(e)) => Err(AuthError::Internal(format!("password check panicked: {e}"))),
            Err(_) => {
                warn!("password verification exceeded its deadline");
                Err(AuthError::Timeout)
            }
        }
    }

    async fn within_deadline<T>(
        &self,
        op: impl Future<Output = Result<T, StoreError>>,
    ) -> Result<T, StoreError> {
        tokio::time::timeout(self.settings.store_timeout, op)
            .await
            .map_err(|_| StoreError::Timeout)?
    }
}
