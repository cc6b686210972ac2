use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{NewUser, RefreshToken, SessionStore, User, UserUpdate};
use crate::error::DatabaseError;

#[derive(Debug, Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

impl Tables {
    fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
        self.users
            .values()
            .any(|u| u.email == email && Some(u.id) != except)
    }
}

/// Process-local store with the same semantics as the Postgres schema:
/// unique emails, unique token values, tokens deleted with their user.
///
/// A single mutex serialises every call, so each one is atomic.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw refresh token row, for inspection in tests
    pub async fn refresh_token(&self, token: &str) -> Option<RefreshToken> {
        self.tables.lock().await.refresh_tokens.get(token).cloned()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, DatabaseError> {
        let mut tables = self.tables.lock().await;
        if tables.email_taken(&user.email, None) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        let created = User {
            id: user.id,
            email: user.email,
            hashed_password: user.hashed_password,
            is_chirpy_red: false,
            created_at: user.created_at,
            updated_at: user.created_at,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn update_user(&self, update: UserUpdate) -> Result<User, DatabaseError> {
        let mut tables = self.tables.lock().await;
        if tables.email_taken(&update.email, Some(update.id)) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "Email already registered".to_string(),
            ));
        }

        let user = tables
            .users
            .get_mut(&update.id)
            .ok_or_else(|| DatabaseError::NotFound("user".to_string()))?;
        user.email = update.email;
        user.hashed_password = update.hashed_password;
        user.updated_at = update.updated_at;
        Ok(user.clone())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        let tables = self.tables.lock().await;
        tables
            .users
            .values()
            .find(|u| u.email == email)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("user".to_string()))
    }

    async fn upgrade_user(&self, user_id: Uuid, now: DateTime<Utc>) -> Result<User, DatabaseError> {
        let mut tables = self.tables.lock().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| DatabaseError::NotFound("user".to_string()))?;
        user.is_chirpy_red = true;
        user.updated_at = now;
        Ok(user.clone())
    }

    async fn delete_users(&self) -> Result<u64, DatabaseError> {
        let mut tables = self.tables.lock().await;
        let deleted = tables.users.len() as u64;
        tables.users.clear();
        tables.refresh_tokens.clear();
        Ok(deleted)
    }

    async fn create_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, DatabaseError> {
        let mut tables = self.tables.lock().await;
        if !tables.users.contains_key(&token.user_id) {
            return Err(DatabaseError::QueryExecution(
                "refresh token references unknown user".to_string(),
            ));
        }
        if tables.refresh_tokens.contains_key(&token.token) {
            return Err(DatabaseError::UniqueConstraintViolation(
                "refresh token already exists".to_string(),
            ));
        }

        tables.refresh_tokens.insert(token.token.clone(), token.clone());
        Ok(token)
    }

    async fn get_user_by_valid_refresh_token(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<User, DatabaseError> {
        let tables = self.tables.lock().await;
        tables
            .refresh_tokens
            .get(token)
            .filter(|t| t.is_usable_at(now))
            .and_then(|t| tables.users.get(&t.user_id))
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound("refresh token".to_string()))
    }

    async fn revoke_refresh_token(&self, token: &str, now: DateTime<Utc>) -> Result<(), DatabaseError> {
        let mut tables = self.tables.lock().await;
        let row = tables
            .refresh_tokens
            .get_mut(token)
            .ok_or_else(|| DatabaseError::NotFound("refresh token".to_string()))?;

        if row.revoked_at.is_none() {
            row.revoked_at = Some(now);
            row.updated_at = now;
        }
        Ok(())
    }
}
