/// Refresh Token Management
///
/// Refresh tokens are:
/// - 32 bytes from the OS random source, hex-encoded (64 characters)
/// - Persisted with a fixed lifetime (60 days by default)
/// - Reusable until they expire or are revoked (no rotation on refresh)
///
/// Unknown, expired and revoked tokens are reported identically.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use uuid::Uuid;

use crate::error::{AppError, AuthError, DatabaseError};
use crate::store::{RefreshToken, SessionStore, User};

const TOKEN_BYTES: usize = 32;

/// Default refresh token lifetime in days
pub const REFRESH_TOKEN_LIFETIME_DAYS: i64 = 60;

/// The operating system random source failed
#[derive(Debug, thiserror::Error)]
#[error("secure random source failed: {0}")]
pub struct EntropyError(#[from] rand::Error);

impl From<EntropyError> for AppError {
    fn from(err: EntropyError) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Generate a new cryptographically secure refresh token
pub fn generate_refresh_token() -> Result<String, EntropyError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}

/// Issues, resolves and revokes refresh tokens against a [`SessionStore`]
#[derive(Debug, Clone, Copy)]
pub struct RefreshTokenManager {
    lifetime: Duration,
}

impl Default for RefreshTokenManager {
    fn default() -> Self {
        Self::new(Duration::days(REFRESH_TOKEN_LIFETIME_DAYS))
    }
}

impl RefreshTokenManager {
    pub fn new(lifetime: Duration) -> Self {
        Self { lifetime }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Generate and persist a refresh token for `user_id`
    ///
    /// Each call writes a new row, so it is not safe to retry blindly.
    pub async fn issue(&self, user_id: Uuid, store: &dyn SessionStore) -> Result<RefreshToken, AppError> {
        self.issue_at(user_id, store, Utc::now()).await
    }

    pub async fn issue_at(
        &self,
        user_id: Uuid,
        store: &dyn SessionStore,
        now: DateTime<Utc>,
    ) -> Result<RefreshToken, AppError> {
        let token = RefreshToken {
            token: generate_refresh_token()?,
            user_id,
            created_at: now,
            updated_at: now,
            expires_at: now + self.lifetime,
            revoked_at: None,
        };

        let saved = store.create_refresh_token(token).await?;
        tracing::debug!(user_id = %user_id, expires_at = %saved.expires_at, "Refresh token issued");
        Ok(saved)
    }

    /// Owner of a refresh token that is neither revoked nor expired
    ///
    /// # Errors
    /// `AuthError::RefreshTokenRejected` for any unusable token;
    /// store failures pass through
    pub async fn resolve_user(&self, token: &str, store: &dyn SessionStore) -> Result<User, AppError> {
        match store.get_user_by_valid_refresh_token(token, Utc::now()).await {
            Ok(user) => Ok(user),
            Err(DatabaseError::NotFound(_)) => {
                tracing::warn!("Refresh token unknown, expired or revoked");
                Err(AuthError::RefreshTokenRejected.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Revoke a refresh token
    ///
    /// Revoking an already revoked token succeeds and keeps the original
    /// revocation time.
    pub async fn revoke(&self, token: &str, store: &dyn SessionStore) -> Result<(), AppError> {
        match store.revoke_refresh_token(token, Utc::now()).await {
            Ok(()) => Ok(()),
            Err(DatabaseError::NotFound(_)) => {
                tracing::warn!("Attempt to revoke unknown refresh token");
                Err(AuthError::RefreshTokenRejected.into())
            }
            Err(e) => Err(e.into()),
        }
    }
}
