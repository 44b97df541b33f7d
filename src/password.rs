//! Password hashing behind the [`CredentialHasher`] capability.
//!
//! [`Argon2Hasher`] produces PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`)
//! so every hash carries its own salt and cost. Verification reads those
//! parameters back out of the stored string, which lets the cost be raised
//! later without invalidating existing hashes.

use argon2::{
    password_hash::SaltString, Algorithm, Argon2, Params, PasswordHash, PasswordHasher,
    PasswordVerifier, Version,
};
use std::sync::OnceLock;

use rand::rngs::OsRng;
use thiserror::Error;

/// Longest password accepted by [`CredentialHasher::hash`], in bytes.
pub const MAX_PASSWORD_BYTES: usize = 72;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("password is empty or exceeds {MAX_PASSWORD_BYTES} bytes")]
    EmptyInput,

    #[error("hashing failed: {0}")]
    Internal(String),
}

pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// `false` covers both a wrong password and an unreadable hash.
    fn verify(&self, password: &str, hash: &str) -> bool;
}

#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
    /// Stands in for unreadable stored hashes so they cost a full verify.
    decoy: OnceLock<Option<String>>,
}

impl Default for Argon2Hasher {
    fn default() -> Self {
        Self::from_argon2(Argon2::default())
    }
}

impl Argon2Hasher {
    /// Argon2id with explicit memory (KiB), iteration and lane counts.
    pub fn with_cost(m_cost: u32, t_cost: u32, p_cost: u32) -> Result<Self, HashError> {
        let params = Params::new(m_cost, t_cost, p_cost, None)
            .map_err(|e| HashError::Internal(format!("argon2 params: {e}")))?;
        Ok(Self::from_argon2(Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            params,
        )))
    }

    /// Cheapest parameters argon2 allows. Only meant for tests.
    pub fn insecure_fast() -> Result<Self, HashError> {
        Self::with_cost(Params::MIN_M_COST, 1, 1)
    }

    fn from_argon2(argon2: Argon2<'static>) -> Self {
        Self {
            argon2,
            decoy: OnceLock::new(),
        }
    }

    fn decoy(&self) -> Option<&str> {
        self.decoy
            .get_or_init(|| {
                let salt = SaltString::generate(&mut OsRng);
                self.argon2
                    .hash_password(b"decoy", &salt)
                    .map(|h| h.to_string())
                    .ok()
            })
            .as_deref()
    }
}

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        if password.is_empty() || password.len() > MAX_PASSWORD_BYTES {
            return Err(HashError::EmptyInput);
        }
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| HashError::Internal(format!("argon2 hash: {e}")))?
            .to_string();
        Ok(hash)
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let parsed = match PasswordHash::new(hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "stored password hash is malformed");
                if let Some(decoy) = self.decoy().and_then(|d| PasswordHash::new(d).ok()) {
                    let _ = self.argon2.verify_password(password.as_bytes(), &decoy);
                }
                return false;
            }
        };
        self.argon2
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}
