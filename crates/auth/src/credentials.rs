//! Password hashing and verification.
//!
//! The auth core only needs two capabilities: turn a secret into an opaque
//! hash and check a candidate against one. [`Argon2Verifier`] provides both
//! with salted Argon2id.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Argon2, Params, Version};

use crate::error::AuthError;

/// Hash/verify capability consumed by the token service.
pub trait CredentialVerifier: Send + Sync {
    /// Hash a secret into a self-describing string (PHC format).
    fn hash(&self, secret: &str) -> Result<String, AuthError>;

    /// Check `candidate` against `stored`. A malformed `stored` value is a
    /// mismatch, never an error.
    fn verify(&self, stored: &str, candidate: &str) -> bool;
}

/// Argon2 cost parameters.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct HashParams {
    /// Iterations.
    pub time_cost: u32,
    /// Memory in KiB.
    pub memory_cost_kib: u32,
    /// Lanes.
    pub parallelism: u32,
}

impl Default for HashParams {
    /// time_cost=3, memory_cost=64 MiB, parallelism=4.
    fn default() -> Self {
        Self {
            time_cost: 3,
            memory_cost_kib: 64 * 1024,
            parallelism: 4,
        }
    }
}

impl HashParams {
    fn to_argon2(self) -> Result<Params, AuthError> {
        Params::new(self.memory_cost_kib, self.time_cost, self.parallelism, None)
            .map_err(|e| AuthError::configuration(format!("invalid argon2 parameters: {e}")))
    }
}

/// Salted Argon2id hasher.
#[derive(Debug, Clone, Default)]
pub struct Argon2Verifier {
    params: HashParams,
}

impl Argon2Verifier {
    pub fn new(params: HashParams) -> Result<Self, AuthError> {
        params.to_argon2()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> HashParams {
        self.params
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, secret: &str) -> Result<String, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }

        let argon2 = Argon2::new(
            argon2::Algorithm::Argon2id,
            Version::V0x13,
            self.params.to_argon2()?,
        );
        let salt = SaltString::generate(&mut OsRng);
        let hash = argon2
            .hash_password(secret.as_bytes(), &salt)
            .map_err(|e| AuthError::configuration(format!("password hashing failed: {e}")))?;
        Ok(hash.to_string())
    }

    fn verify(&self, stored: &str, candidate: &str) -> bool {
        // Cost parameters and salt come from the stored PHC string.
        let Ok(parsed) = PasswordHash::new(stored) else {
            return false;
        };
        Argon2::default()
            .verify_password(candidate.as_bytes(), &parsed)
            .is_ok()
    }
}
