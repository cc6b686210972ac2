/// Password Hashing and Verification
///
/// Handles password hashing with bcrypt. The cost factor is deliberately
/// high; tests construct a hasher with [`MIN_HASH_COST`].

use bcrypt::{hash, verify};

use crate::error::AppError;

/// bcrypt cost used for stored credentials
pub const DEFAULT_HASH_COST: u32 = 14;

/// Lowest cost bcrypt accepts
pub const MIN_HASH_COST: u32 = 4;

/// A plaintext password did not match the stored hash.
///
/// Also returned when the stored hash cannot be parsed, so callers cannot
/// tell a corrupt record from a wrong password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("password does not match stored hash")]
pub struct PasswordMismatch;

/// bcrypt hasher with a fixed cost factor
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(DEFAULT_HASH_COST)
    }
}

impl PasswordHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash a password using bcrypt
    ///
    /// Any input is accepted, including the empty string.
    ///
    /// # Errors
    /// Returns error only if bcrypt itself fails (bad cost, RNG failure)
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.cost)
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
    }

    /// Verify a password against its hash
    ///
    /// # Errors
    /// Returns `PasswordMismatch` for a wrong password or an unreadable hash
    pub fn verify(&self, password: &str, hash: &str) -> Result<(), PasswordMismatch> {
        match verify(password, hash) {
            Ok(true) => Ok(()),
            Ok(false) => Err(PasswordMismatch),
            Err(e) => {
                tracing::warn!(error = %e, "Stored password hash could not be read");
                Err(PasswordMismatch)
            }
        }
    }

    /// [`hash`](Self::hash) on the blocking thread pool
    pub async fn hash_in_background(&self, password: String) -> Result<String, AppError> {
        let hasher = *self;
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|e| AppError::Internal(format!("Password hashing task failed: {}", e)))?
    }

    /// [`verify`](Self::verify) on the blocking thread pool
    pub async fn verify_in_background(&self, password: String, hash: String) -> Result<(), PasswordMismatch> {
        let hasher = *self;
        match tokio::task::spawn_blocking(move || hasher.verify(&password, &hash)).await {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(error = %e, "Password verification task failed");
                Err(PasswordMismatch)
            }
        }
    }
}

/// Hash a password with the default cost
pub fn hash_password(password: &str) -> Result<String, AppError> {
    PasswordHasher::default().hash(password)
}

/// Verify a password against a bcrypt hash
pub fn verify_password(password: &str, hash: &str) -> Result<(), PasswordMismatch> {
    // verification reads the cost from the hash itself
    PasswordHasher::default().verify(password, hash)
}
