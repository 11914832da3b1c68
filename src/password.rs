//! Password hashing using bcrypt

use crate::error::{AppError, AppResult};

/// CredentialHasher
///
/// Salted one-way hashing of account passwords. The work factor comes from
/// configuration so tests can run with the minimum cost.
#[derive(Clone, Debug)]
pub struct CredentialHasher {
    cost: u32,
}

impl CredentialHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    /// Hash a password with a fresh random salt.
    pub fn hash(&self, password: &str) -> AppResult<String> {
        bcrypt::hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("password hashing failed: {e}")))
    }

    /// Check a password against a stored digest. A malformed digest never verifies.
    pub fn verify(&self, password: &str, digest: &str) -> bool {
        match bcrypt::verify(password, digest) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!("stored password digest could not be parsed: {e}");
                false
            }
        }
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}
