use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

use crate::auth::jwt::SigningSecret;

pub const DEFAULT_ACCESS_TTL_SECONDS: i64 = 60 * 60;
pub const DEFAULT_REFRESH_TTL_SECONDS: i64 = 60 * 24 * 60 * 60;
/// Upper bound for `JWT_ACCESS_TTL_MAX_SECONDS`.
pub const ACCESS_TTL_CEILING_SECONDS: i64 = 24 * 60 * 60;
/// Upper bound for `JWT_REFRESH_TTL_SECONDS`, ten years.
pub const REFRESH_TTL_CEILING_SECONDS: i64 = 10 * 365 * 24 * 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Everything the session service needs besides its stores.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub secret: SigningSecret,
    pub access_ttl: Duration,
    pub access_ttl_max: Duration,
    pub refresh_ttl: Duration,
    pub store_timeout: StdDuration,
    pub hash_timeout: StdDuration,
}

impl SessionSettings {
    pub fn new(secret: SigningSecret) -> Self {
        Self {
            secret,
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TTL_SECONDS),
            access_ttl_max: Duration::seconds(DEFAULT_ACCESS_TTL_SECONDS),
            refresh_ttl: Duration::seconds(DEFAULT_REFRESH_TTL_SECONDS),
            store_timeout: StdDuration::from_secs(5),
            hash_timeout: StdDuration::from_secs(10),
        }
    }

    /// Requested lifetime if it lies in `(0, access_ttl_max]`, otherwise the default.
    pub fn access_ttl_for(&self, requested_seconds: Option<i64>) -> Duration {
        match requested_seconds.and_then(Duration::try_seconds) {
            Some(ttl) if ttl > Duration::zero() && ttl <= self.access_ttl_max => ttl,
            _ => self.access_ttl,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.access_ttl_max <= Duration::zero() || self.refresh_ttl <= Duration::zero() {
            return Err(ConfigError::Invalid("token lifetimes must be positive".into()));
        }
        if self.access_ttl_max > Duration::seconds(ACCESS_TTL_CEILING_SECONDS) {
            return Err(ConfigError::Invalid(format!(
                "max access ttl must not exceed {ACCESS_TTL_CEILING_SECONDS}s"
            )));
        }
        if self.refresh_ttl > Duration::seconds(REFRESH_TTL_CEILING_SECONDS) {
            return Err(ConfigError::Invalid(format!(
                "refresh ttl must not exceed {REFRESH_TTL_CEILING_SECONDS}s"
            )));
        }
        if self.access_ttl <= Duration::zero() || self.access_ttl > self.access_ttl_max {
            return Err(ConfigError::Invalid(
                "default access ttl must lie in (0, max access ttl]".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub mongodb_uri: String,
    pub db_name: String,
    pub bind_addr: String,
    pub session: SessionSettings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let secs = |key: &str, default: i64| {
            var(key)
                .and_then(|v| v.trim().parse::<i64>().ok())
                .and_then(Duration::try_seconds)
                .unwrap_or(Duration::seconds(default))
        };
        let millis = |key: &str, default: u64| {
            var(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(StdDuration::from_millis)
                .unwrap_or(StdDuration::from_millis(default))
        };

        let mongodb_uri = var("MONGODB_URI").ok_or(ConfigError::Missing("MONGODB_URI"))?;
        let db_name = var("DB_NAME").unwrap_or_else(|| "auth_db".to_string());
        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| "127.0.0.1:3000".to_string());

        let secret = var("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let secret = SigningSecret::new(secret)
            .map_err(|_| ConfigError::Invalid("JWT_SECRET must not be empty".into()))?;

        let session = SessionSettings {
            secret,
            access_ttl: secs("JWT_ACCESS_TTL_SECONDS", DEFAULT_ACCESS_TTL_SECONDS),
            access_ttl_max: secs("JWT_ACCESS_TTL_MAX_SECONDS", DEFAULT_ACCESS_TTL_SECONDS),
            refresh_ttl: secs("JWT_REFRESH_TTL_SECONDS", DEFAULT_REFRESH_TTL_SECONDS),
            store_timeout: millis("STORE_TIMEOUT_MS", 5_000),
            hash_timeout: millis("HASH_TIMEOUT_MS", 10_000),
        };
        session.validate()?;

        Ok(Self {
            mongodb_uri,
            db_name,
            bind_addr,
            session,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply() {
        let cfg = Config::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://localhost:27017"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();

        assert_eq!(cfg.db_name, "auth_db");
        assert_eq!(cfg.bind_addr, "127.0.0.1:3000");
        assert_eq!(cfg.session.access_ttl, Duration::hours(1));
        assert_eq!(cfg.session.access_ttl_max, Duration::hours(1));
        assert_eq!(cfg.session.refresh_ttl, Duration::days(60));
        assert_eq!(cfg.session.store_timeout, StdDuration::from_secs(5));
    }

    #[test]
    fn secret_is_required_and_non_empty() {
        let missing = Config::from_lookup(lookup(&[("MONGODB_URI", "mongodb://x")]));
        assert!(matches!(missing, Err(ConfigError::Missing("JWT_SECRET"))));

        let empty = Config::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://x"),
            ("JWT_SECRET", ""),
        ]));
        assert!(matches!(empty, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn unparseable_numbers_fall_back() {
        let cfg = Config::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://x"),
            ("JWT_SECRET", "s"),
            ("JWT_ACCESS_TTL_SECONDS", "soon"),
            ("STORE_TIMEOUT_MS", "250"),
        ]))
        .unwrap();
        assert_eq!(cfg.session.access_ttl, Duration::hours(1));
        assert_eq!(cfg.session.store_timeout, StdDuration::from_millis(250));
    }

    #[test]
    fn default_access_ttl_must_fit_under_max() {
        let res = Config::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://x"),
            ("JWT_SECRET", "s"),
            ("JWT_ACCESS_TTL_SECONDS", "7200"),
        ]));
        assert!(matches!(res, Err(ConfigError::Invalid(_))));

        let res = Config::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://x"),
            ("JWT_SECRET", "s"),
            ("JWT_REFRESH_TTL_SECONDS", "0"),
        ]));
        assert!(matches!(res, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn oversized_lifetimes_are_rejected() {
        let res = Config::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://x"),
            ("JWT_SECRET", "s"),
            ("JWT_REFRESH_TTL_SECONDS", "10000000000000"),
        ]));
        assert!(matches!(res, Err(ConfigError::Invalid(_))));

        let res = Config::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://x"),
            ("JWT_SECRET", "s"),
            ("JWT_ACCESS_TTL_MAX_SECONDS", "86401"),
        ]));
        assert!(matches!(res, Err(ConfigError::Invalid(_))));

        let cfg = Config::from_lookup(lookup(&[
            ("MONGODB_URI", "mongodb://x"),
            ("JWT_SECRET", "s"),
            ("JWT_ACCESS_TTL_MAX_SECONDS", "86400"),
            ("JWT_REFRESH_TTL_SECONDS", "315360000"),
        ]))
        .unwrap();
        assert_eq!(cfg.session.access_ttl_max, Duration::days(1));
        assert_eq!(cfg.session.refresh_ttl, Duration::days(3650));
    }

    #[test]
    fn requested_ttl_is_clamped_to_default() {
        let settings = SessionSettings::new(SigningSecret::new("s").unwrap());

        assert_eq!(settings.access_ttl_for(None), Duration::hours(1));
        assert_eq!(settings.access_ttl_for(Some(60)), Duration::seconds(60));
        assert_eq!(settings.access_ttl_for(Some(3600)), Duration::hours(1));
        assert_eq!(settings.access_ttl_for(Some(0)), Duration::hours(1));
        assert_eq!(settings.access_ttl_for(Some(-30)), Duration::hours(1));
        assert_eq!(settings.access_ttl_for(Some(3601)), Duration::hours(1));
        assert_eq!(settings.access_ttl_for(Some(i64::MAX)), Duration::hours(1));
    }
}
