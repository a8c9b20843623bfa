//! Credential hashing.
//!
//! Passwords are hashed with Argon2id and a per-hash random salt. The
//! cost parameters are written into the PHC string, so verification
//! always uses the cost the hash was created with.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};

use crate::config::{MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH};
use crate::errors::{AppError, AppResult};

/// Argon2 work factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    /// Memory in KiB
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Hashed password value object.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output (security)
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash a plain text password with the default cost.
    ///
    /// # Errors
    /// Returns a validation error if the password length is out of bounds.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        Self::with_cost(plain_text, &HashCost::default())
    }

    /// Hash a plain text password with an explicit cost.
    pub fn with_cost(plain_text: &str, cost: &HashCost) -> AppResult<Self> {
        let length = plain_text.chars().count();
        if length < MIN_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LENGTH
            )));
        }
        if length > MAX_PASSWORD_LENGTH as usize {
            return Err(AppError::validation(format!(
                "Password must be at most {} characters",
                MAX_PASSWORD_LENGTH
            )));
        }

        let hash = Self::hash(plain_text, cost)?;
        Ok(Self { hash })
    }

    /// Wrap a stored hash.
    pub fn from_hash(hash: String) -> Self {
        Self { hash }
    }

    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this hash.
    ///
    /// A malformed stored hash is a plain mismatch to the caller; the
    /// parse failure is only logged.
    pub fn verify(&self, plain_text: &str) -> bool {
        let parsed = match PasswordHash::new(&self.hash) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash is malformed");
                return false;
            }
        };

        Argon2::default()
            .verify_password(plain_text.as_bytes(), &parsed)
            .is_ok()
    }

    fn hash(plain_text: &str, cost: &HashCost) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2(cost)?
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::internal(format!("Password hash failed: {}", e)))?;
        Ok(hash.to_string())
    }

    fn argon2(cost: &HashCost) -> AppResult<Argon2<'static>> {
        let params = Params::new(cost.memory_kib, cost.iterations, cost.parallelism, None)
            .map_err(|e| AppError::internal(format!("Invalid Argon2 parameters: {}", e)))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl From<Password> for String {
    fn from(password: Password) -> Self {
        password.hash
    }
}
