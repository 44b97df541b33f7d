use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use super::jwt::TokenError;
use crate::models::refresh_token::RefreshTokenRecord;

/// Entropy per refresh token. Hex encoding doubles the length.
pub const REFRESH_TOKEN_BYTES: usize = 32;

pub trait SecureRandomSource: Send + Sync {
    fn fill_bytes(&self, dest: &mut [u8]);
}

/// The operating system CSPRNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsRandom;

impl SecureRandomSource for OsRandom {
    fn fill_bytes(&self, dest: &mut [u8]) {
        OsRng.fill_bytes(dest);
    }
}

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

pub fn generate_refresh_token(rng: &dyn SecureRandomSource) -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    rng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub fn new_refresh_record(
    token: String,
    user_id: Uuid,
    now: DateTime<Utc>,
    ttl: Duration,
) -> Result<RefreshTokenRecord, TokenError> {
    let expires_at = now.checked_add_signed(ttl).ok_or(TokenError::InvalidTtl)?;
    Ok(RefreshTokenRecord {
        token,
        user_id,
        created_at: now,
        updated_at: now,
        expires_at,
        revoked_at: None,
    })
}
