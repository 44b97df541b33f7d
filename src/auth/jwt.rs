//! Access token codec: HS256 JWTs with `sub`, `iss`, `iat`, `exp` and `jti`.
//!
//! Expiry is checked against the `now` handed in by the caller, never the
//! wall clock, so issuing and validating are reproducible under a test clock.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use thiserror::Error;
use uuid::Uuid;

use crate::models::jwt::Claims;

/// `iss` claim of every access token minted here.
pub const ISSUER: &str = "session-auth";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token ttl must be positive")]
    InvalidTtl,
    #[error("signing secret is empty")]
    EmptySecret,
    #[error("malformed token")]
    Malformed,
    #[error("bad signature")]
    BadSignature,
    #[error("wrong issuer")]
    WrongIssuer,
    #[error("token expired")]
    Expired,
    #[error("signing failed")]
    Signing,
}

/// HMAC key material. Never printed.
#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(TokenError::EmptySecret);
        }
        Ok(Self(secret))
    }

    fn keys(&self) -> Keys {
        Keys {
            encoding: EncodingKey::from_secret(&self.0),
            decoding: DecodingKey::from_secret(&self.0),
        }
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

pub fn new_access_claims(
    subject: &str,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<Claims, TokenError> {
    let exp = now.checked_add_signed(ttl).ok_or(TokenError::InvalidTtl)?;
    Ok(Claims {
        sub: subject.to_string(),
        iss: ISSUER.to_string(),
        iat: now.timestamp(),
        exp: exp.timestamp(),
        jti: Uuid::new_v4().to_string(),
    })
}

pub fn issue_access_token(
    subject: &str,
    secret: &SigningSecret,
    ttl: Duration,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    if ttl <= Duration::zero() {
        return Err(TokenError::InvalidTtl);
    }
    let claims = new_access_claims(subject, ttl, now)?;
    encode(&Header::new(Algorithm::HS256), &claims, &secret.keys().encoding)
        .map_err(|_| TokenError::Signing)
}

/// Returns the subject of a well-formed, correctly signed, unexpired token.
pub fn validate_access_token(
    token: &str,
    secret: &SigningSecret,
    now: DateTime<Utc>,
) -> Result<String, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.set_required_spec_claims(&["exp", "sub", "iss"]);

    let data = decode::<Claims>(token, &secret.keys().decoding, &validation).map_err(|e| {
        match e.kind() {
            ErrorKind::InvalidSignature => TokenError::BadSignature,
            _ => TokenError::Malformed,
        }
    })?;
    let claims = data.claims;

    if claims.iss != ISSUER {
        return Err(TokenError::WrongIssuer);
    }
    if now.timestamp() > claims.exp {
        return Err(TokenError::Expired);
    }
    Ok(claims.sub)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t0() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    fn secret() -> SigningSecret {
        SigningSecret::new("test-signing-secret").unwrap()
    }

    #[test]
    fn issue_then_validate_returns_subject() {
        let token = issue_access_token("user-42", &secret(), Duration::hours(1), t0()).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains(|c| matches!(c, '+' | '/' | '=')));
        assert_eq!(
            validate_access_token(&token, &secret(), t0()).unwrap(),
            "user-42"
        );
    }

    #[test]
    fn different_secret_is_bad_signature() {
        let token = issue_access_token("user-42", &secret(), Duration::hours(1), t0()).unwrap();
        let other = SigningSecret::new("another-secret").unwrap();

        assert_eq!(
            validate_access_token(&token, &other, t0()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn expiry_is_checked_against_supplied_time() {
        let ttl = Duration::hours(1);
        let token = issue_access_token("user-42", &secret(), ttl, t0()).unwrap();

        let just_before = t0() + ttl - Duration::seconds(1);
        assert!(validate_access_token(&token, &secret(), just_before).is_ok());

        let after = t0() + ttl + Duration::seconds(1);
        assert_eq!(
            validate_access_token(&token, &secret(), after),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let mut claims = new_access_claims("user-42", Duration::hours(1), t0()).unwrap();
        claims.iss = "someone-else".into();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(b"test-signing-secret"),
        )
        .unwrap();

        assert_eq!(
            validate_access_token(&token, &secret(), t0()),
            Err(TokenError::WrongIssuer)
        );
    }

    #[test]
    fn garbage_is_malformed() {
        for token in ["", "abc", "a.b.c", "not a token at all"] {
            assert_eq!(
                validate_access_token(token, &secret(), t0()),
                Err(TokenError::Malformed),
                "{token:?}"
            );
        }
    }

    #[test]
    fn tampered_payload_fails_signature() {
        let token = issue_access_token("user-42", &secret(), Duration::hours(1), t0()).unwrap();
        let forged_claims = new_access_claims("user-1", Duration::hours(1), t0()).unwrap();
        let forged = encode(
            &Header::new(Algorithm::HS256),
            &forged_claims,
            &EncodingKey::from_secret(b"attacker"),
        )
        .unwrap();

        let parts: Vec<&str> = token.split('.').collect();
        let forged_parts: Vec<&str> = forged.split('.').collect();
        let spliced = format!("{}.{}.{}", parts[0], forged_parts[1], parts[2]);

        assert_eq!(
            validate_access_token(&spliced, &secret(), t0()),
            Err(TokenError::BadSignature)
        );
    }

    #[test]
    fn non_positive_ttl_is_refused() {
        assert_eq!(
            issue_access_token("user-42", &secret(), Duration::zero(), t0()),
            Err(TokenError::InvalidTtl)
        );
        assert_eq!(
            issue_access_token("user-42", &secret(), Duration::seconds(-5), t0()),
            Err(TokenError::InvalidTtl)
        );
    }

    #[test]
    fn unrepresentable_expiry_is_refused() {
        assert_eq!(
            issue_access_token("user-42", &secret(), Duration::hours(1), DateTime::<Utc>::MAX_UTC),
            Err(TokenError::InvalidTtl)
        );
    }

    #[test]
    fn tokens_minted_in_the_same_second_differ() {
        let a = issue_access_token("user-42", &secret(), Duration::hours(1), t0()).unwrap();
        let b = issue_access_token("user-42", &secret(), Duration::hours(1), t0()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn empty_secret_is_refused() {
        assert!(matches!(
            SigningSecret::new(""),
            Err(TokenError::EmptySecret)
        ));
        assert_eq!(format!("{:?}", secret()), "SigningSecret(<redacted>)");
    }
}
