//! Password authentication and session management.
//!
//! Credentials are checked with Argon2id, callers get a short-lived HS256
//! access token plus a long-lived opaque refresh token, and refresh tokens
//! can be exchanged for new access tokens until they expire or are revoked.
//! Time, randomness, hashing and storage are all injected so the whole flow
//! runs deterministically in tests.

pub mod auth;
pub mod clock;
pub mod config;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod password;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
