//! Login, refresh and revoke flows.
//!
//! `SessionService` owns the auth policy (hash cost, token lifetimes, the
//! signing secret) and composes the password hasher, access token codec and
//! refresh token manager over a [`SessionStore`].

use actix_web::http::header::HeaderMap;
use chrono::Duration;
use std::sync::Arc;
use tokio::sync::OnceCell;
use uuid::Uuid;

use crate::auth::{
    generate_access_token, get_bearer_token, validate_access_token, PasswordHasher, RefreshTokenManager,
};
use crate::configuration::{JwtSettings, PasswordSettings};
use crate::error::{AppError, AuthError, DatabaseError};
use crate::store::{RefreshToken, SessionStore, User};

/// Tokens handed out by a successful login
#[derive(Debug, Clone)]
pub struct LoginSession {
    pub user: User,
    pub access_token: String,
    pub refresh_token: RefreshToken,
}

#[derive(Clone)]
pub struct SessionService {
    store: Arc<dyn SessionStore>,
    jwt: JwtSettings,
    hasher: PasswordHasher,
    refresh_tokens: RefreshTokenManager,
    dummy_hash: Arc<OnceCell<String>>,
}

const DUMMY_PASSWORD: &str = "chirpy-no-such-user";

impl SessionService {
    pub fn new(store: Arc<dyn SessionStore>, jwt: JwtSettings, password: PasswordSettings) -> Self {
        let refresh_tokens = RefreshTokenManager::new(jwt.refresh_token_ttl());
        Self {
            store,
            jwt,
            hasher: PasswordHasher::new(password.cost),
            refresh_tokens,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }

    pub fn store(&self) -> &dyn SessionStore {
        self.store.as_ref()
    }

    pub fn hasher(&self) -> &PasswordHasher {
        &self.hasher
    }

    /// Lifetime for a login access token
    ///
    /// The configured lifetime unless the caller asks for a shorter, positive
    /// one; anything longer or non-positive is ignored.
    pub fn access_token_ttl(&self, requested_seconds: Option<i64>) -> Duration {
        match requested_seconds {
            Some(seconds) if seconds > 0 && seconds <= self.jwt.access_token_expiry => Duration::seconds(seconds),
            _ => self.jwt.access_token_ttl(),
        }
    }

    /// Verify credentials and issue an access token plus a refresh token
    ///
    /// # Errors
    /// `AuthError::InvalidCredentials` for an unknown email or a wrong password
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        expires_in_seconds: Option<i64>,
    ) -> Result<LoginSession, AppError> {
        let user = match self.store.get_user_by_email(email.trim()).await {
            Ok(user) => Some(user),
            Err(DatabaseError::NotFound(_)) => None,
            Err(e) => return Err(e.into()),
        };

        let stored_hash = match &user {
            Some(user) => user.hashed_password.clone(),
            None => self.dummy_hash().await?.clone(),
        };
        let verified = self
            .hasher
            .verify_in_background(password.to_string(), stored_hash)
            .await;

        let user = match (user, verified) {
            (Some(user), Ok(())) => user,
            (Some(user), Err(_)) => {
                tracing::debug!(user_id = %user.id, "Login with wrong password");
                return Err(AuthError::InvalidCredentials.into());
            }
            (None, _) => {
                tracing::debug!("Login for unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        let ttl = self.access_token_ttl(expires_in_seconds);
        let access_token = generate_access_token(&user.id, &self.jwt.secret, ttl)?;
        let refresh_token = self.refresh_tokens.issue(user.id, self.store.as_ref()).await?;

        Ok(LoginSession {
            user,
            access_token,
            refresh_token,
        })
    }

    /// bcrypt hash at the configured cost, checked in place of a stored hash
    /// when the email is unknown so both login failures take as long
    async fn dummy_hash(&self) -> Result<&String, AppError> {
        self.dummy_hash
            .get_or_try_init(|| self.hasher.hash_in_background(DUMMY_PASSWORD.to_string()))
            .await
    }

    /// Exchange the `Bearer` refresh token for a fresh access token
    ///
    /// The refresh token stays valid; it is not rotated.
    pub async fn refresh(&self, headers: &HeaderMap) -> Result<(User, String), AppError> {
        let token = get_bearer_token(headers)?;
        let user = self.refresh_tokens.resolve_user(&token, self.store.as_ref()).await?;
        let access_token = generate_access_token(&user.id, &self.jwt.secret, self.jwt.access_token_ttl())?;

        Ok((user, access_token))
    }

    /// Revoke the `Bearer` refresh token
    pub async fn revoke(&self, headers: &HeaderMap) -> Result<(), AppError> {
        let token = get_bearer_token(headers)?;
        self.refresh_tokens.revoke(&token, self.store.as_ref()).await
    }

    /// User id of a valid access token
    pub fn authenticate(&self, access_token: &str) -> Result<Uuid, AppError> {
        validate_access_token(access_token, &self.jwt.secret)
            .map_err(|e| AuthError::AccessTokenRejected(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{decode_claims_at, AuthHeaderError, TokenError, MIN_HASH_COST};
    use std::time::Instant;
    use crate::store::{InMemoryStore, NewUser};
    use actix_web::http::header::{HeaderValue, AUTHORIZATION};
    use chrono::Utc;

    const SECRET: &str = "session-test-secret";

    async fn service_with_user(email: &str, password: &str) -> (SessionService, Arc<InMemoryStore>, User) {
        let store = Arc::new(InMemoryStore::new());
        let service = SessionService::new(
            store.clone(),
            JwtSettings::new(SECRET),
            PasswordSettings { cost: MIN_HASH_COST },
        );
        let user = store
            .create_user(NewUser {
                id: Uuid::new_v4(),
                email: email.to_string(),
                hashed_password: service.hasher().hash(password).unwrap(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        (service, store, user)
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", token)).unwrap(),
        );
        headers
    }

    #[test]
    fn test_access_token_ttl_is_capped() {
        let service = SessionService::new(
            Arc::new(InMemoryStore::new()),
            JwtSettings::new(SECRET),
            PasswordSettings::default(),
        );

        assert_eq!(service.access_token_ttl(None), Duration::hours(1));
        assert_eq!(service.access_token_ttl(Some(60)), Duration::seconds(60));
        assert_eq!(service.access_token_ttl(Some(3600)), Duration::hours(1));
        assert_eq!(service.access_token_ttl(Some(7200)), Duration::hours(1));
        assert_eq!(service.access_token_ttl(Some(0)), Duration::hours(1));
        assert_eq!(service.access_token_ttl(Some(-5)), Duration::hours(1));
    }

    #[tokio::test]
    async fn login_issues_both_tokens() {
        let (service, _, user) = service_with_user("a@b.com", "secret1").await;

        let session = service.login("a@b.com", "secret1", None).await.unwrap();

        assert_eq!(session.user.id, user.id);
        assert_eq!(session.refresh_token.token.len(), 64);
        assert_eq!(session.refresh_token.user_id, user.id);

        let claims = decode_claims_at(&session.access_token, SECRET, Utc::now()).unwrap();
        assert_eq!(claims.lifetime_seconds(), 3600);
        assert_eq!(service.authenticate(&session.access_token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn login_honours_shorter_lifetime() {
        let (service, _, _) = service_with_user("a@b.com", "secret1").await;

        let session = service.login("a@b.com", "secret1", Some(120)).await.unwrap();

        let claims = decode_claims_at(&session.access_token, SECRET, Utc::now()).unwrap();
        assert_eq!(claims.lifetime_seconds(), 120);
    }

    #[tokio::test]
    async fn login_failures_are_indistinguishable() {
        let (service, _, _) = service_with_user("a@b.com", "secret1").await;

        let wrong_password = service.login("a@b.com", "secret2", None).await;
        let unknown_user = service.login("nobody@b.com", "secret1", None).await;

        assert!(matches!(wrong_password, Err(AppError::Auth(AuthError::InvalidCredentials))));
        assert!(matches!(unknown_user, Err(AppError::Auth(AuthError::InvalidCredentials))));
    }

    #[tokio::test]
    async fn login_trims_email() {
        let (service, _, user) = service_with_user("a@b.com", "secret1").await;

        let session = service.login("  a@b.com ", "secret1", None).await.unwrap();
        assert_eq!(session.user.id, user.id);
    }

    #[tokio::test]
    async fn dummy_hash_uses_configured_cost() {
        let (service, _, _) = service_with_user("a@b.com", "secret1").await;

        let first = service.dummy_hash().await.unwrap().clone();
        let second = service.dummy_hash().await.unwrap().clone();

        assert!(first.starts_with("$2b$04$"));
        assert_eq!(first, second);
        assert!(service.hasher().verify(DUMMY_PASSWORD, &first).is_ok());
    }

    #[tokio::test]
    async fn unknown_email_costs_a_password_check() {
        let store = Arc::new(InMemoryStore::new());
        let service = SessionService::new(store.clone(), JwtSettings::new(SECRET), PasswordSettings { cost: 10 });
        store
            .create_user(NewUser {
                id: Uuid::new_v4(),
                email: "a@b.com".to_string(),
                hashed_password: service.hasher().hash("secret1").unwrap(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        // first unknown-email login also builds the dummy hash
        let _ = service.login("warmup@b.com", "secret1", None).await;

        let started = Instant::now();
        let wrong_password = service.login("a@b.com", "secret2", None).await;
        let wrong_password_time = started.elapsed();

        let started = Instant::now();
        let unknown_email = service.login("nobody@b.com", "secret1", None).await;
        let unknown_email_time = started.elapsed();

        assert!(wrong_password.is_err());
        assert!(unknown_email.is_err());
        assert!(
            unknown_email_time * 3 >= wrong_password_time,
            "wrong password took {:?}, unknown email took {:?}",
            wrong_password_time,
            unknown_email_time
        );
    }

    #[tokio::test]
    async fn refresh_issues_token_for_same_user() {
        let (service, _, user) = service_with_user("a@b.com", "secret1").await;
        let session = service.login("a@b.com", "secret1", None).await.unwrap();

        let (owner, access_token) = service.refresh(&bearer(&session.refresh_token.token)).await.unwrap();

        assert_eq!(owner.id, user.id);
        assert_eq!(service.authenticate(&access_token).unwrap(), user.id);
        let claims = decode_claims_at(&access_token, SECRET, Utc::now()).unwrap();
        assert_eq!(claims.lifetime_seconds(), 3600);
    }

    #[tokio::test]
    async fn refresh_token_is_reusable() {
        let (service, _, _) = service_with_user("a@b.com", "secret1").await;
        let session = service.login("a@b.com", "secret1", None).await.unwrap();
        let headers = bearer(&session.refresh_token.token);

        assert!(service.refresh(&headers).await.is_ok());
        assert!(service.refresh(&headers).await.is_ok());
    }

    #[tokio::test]
    async fn revoked_refresh_token_is_rejected() {
        let (service, store, _) = service_with_user("a@b.com", "secret1").await;
        let session = service.login("a@b.com", "secret1", None).await.unwrap();
        let headers = bearer(&session.refresh_token.token);

        service.revoke(&headers).await.unwrap();

        let result = service.refresh(&headers).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::RefreshTokenRejected))));
        let row = store.refresh_token(&session.refresh_token.token).await.unwrap();
        assert!(row.revoked_at.is_some());
    }

    #[tokio::test]
    async fn access_token_survives_revocation() {
        let (service, _, user) = service_with_user("a@b.com", "secret1").await;
        let session = service.login("a@b.com", "secret1", None).await.unwrap();

        service.revoke(&bearer(&session.refresh_token.token)).await.unwrap();

        assert_eq!(service.authenticate(&session.access_token).unwrap(), user.id);
    }

    #[tokio::test]
    async fn refresh_without_header_is_a_header_error() {
        let (service, _, _) = service_with_user("a@b.com", "secret1").await;

        let result = service.refresh(&HeaderMap::new()).await;
        assert!(matches!(result, Err(AppError::Header(AuthHeaderError::MissingHeader))));
    }

    #[tokio::test]
    async fn access_token_is_not_a_refresh_token() {
        let (service, _, _) = service_with_user("a@b.com", "secret1").await;
        let session = service.login("a@b.com", "secret1", None).await.unwrap();

        let result = service.refresh(&bearer(&session.access_token)).await;
        assert!(matches!(result, Err(AppError::Auth(AuthError::RefreshTokenRejected))));
    }

    #[test]
    fn authenticate_rejects_foreign_tokens() {
        let service = SessionService::new(
            Arc::new(InMemoryStore::new()),
            JwtSettings::new(SECRET),
            PasswordSettings::default(),
        );
        let foreign = generate_access_token(&Uuid::new_v4(), "other-secret", Duration::hours(1)).unwrap();

        let result = service.authenticate(&foreign);
        assert!(matches!(
            result,
            Err(AppError::Auth(AuthError::AccessTokenRejected(TokenError::SignatureInvalid)))
        ));
    }
}
