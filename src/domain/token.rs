//! Invitation token issuing.
//!
//! The raw token only ever travels inside the activation link. Storage
//! holds its SHA-256 digest, and activation digests the presented token
//! the same way before looking it up.

use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::config::INVITATION_TOKEN_BYTES;

/// A freshly issued activation token and its stored form.
#[derive(Clone, PartialEq, Eq)]
pub struct IssuedToken {
    /// Sent to the account holder, never persisted
    pub raw: String,
    /// Hex SHA-256 of `raw`, the only persisted form
    pub digest: String,
}

impl std::fmt::Debug for IssuedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IssuedToken")
            .field("raw", &"[REDACTED]")
            .field("digest", &self.digest)
            .finish()
    }
}

impl IssuedToken {
    /// Generate a new 256-bit token.
    pub fn issue() -> Self {
        let raw = random_hex(INVITATION_TOKEN_BYTES);
        let digest = digest(&raw);
        Self { raw, digest }
    }
}

/// Invitation row to persist alongside a new account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInvitation {
    pub token_digest: String,
    pub expiry: DateTime<Utc>,
}

impl NewInvitation {
    /// Invitation for `token` expiring `ttl` after `now`.
    pub fn for_token(token: &IssuedToken, ttl: Duration, now: DateTime<Utc>) -> Self {
        Self {
            token_digest: token.digest.clone(),
            expiry: now + ttl,
        }
    }
}

/// Deterministic one-way digest of a token.
pub fn digest(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

/// Hex string of `bytes` random bytes from the OS generator.
pub fn random_hex(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}
