//! Persistence for users and refresh tokens.
//!
//! The auth core only talks to [`SessionStore`]; `PgStore` is the production
//! backend and `InMemoryStore` backs tests and local runs. Every method is a
//! single atomic statement against the backend.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::DatabaseError;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

/// A stored user account
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub is_chirpy_red: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// The user as shown to clients, without the password hash
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            email: self.email.clone(),
            is_chirpy_red: self.is_chirpy_red,
        }
    }
}

/// Public part of a user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub email: String,
    pub is_chirpy_red: bool,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserUpdate {
    pub id: Uuid,
    pub email: String,
    pub hashed_password: String,
    pub updated_at: DateTime<Utc>,
}

/// A persisted refresh token
///
/// `revoked_at` goes from `None` to `Some` once and is never cleared.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshToken {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Usable iff not revoked and `now` is strictly before `expires_at`
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        !self.is_revoked() && now < self.expires_at
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError>;

    async fn update_user(&self, update: UserUpdate) -> Result<User, DatabaseError>;

    async fn get_user_by_email(&self, email: &str) -> Result<User, DatabaseError>;

    /// Mark the user as a Chirpy Red member
    async fn upgrade_user(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<User, DatabaseError>;

    /// Remove every user and, through them, every refresh token
    async fn delete_users(&self) -> Result<u64, DatabaseError>;

    async fn create_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, DatabaseError>;

    /// Owner of `token`, provided it is neither revoked nor expired at `now`
    ///
    /// The usability filter is part of the lookup itself.
    async fn get_user_by_valid_refresh_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<User, DatabaseError>;

    /// Set `revoked_at` on `token`; an earlier revocation time is kept
    async fn revoke_refresh_token(&self, token: &str, now: DateTime<Utc>) -> Result<(), DatabaseError>;
}
