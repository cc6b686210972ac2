/// JWT Token Generation and Validation
///
/// Access tokens are HS256-signed JWTs carrying only the user id. They are
/// never stored; a token is good while its signature verifies under the
/// server secret and the clock is before `exp`.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, TOKEN_ISSUER};
use crate::error::AppError;

/// Why an access token was refused. Only ever logged, never sent to clients.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token signature does not verify")]
    SignatureInvalid,
    #[error("token has expired")]
    Expired,
    #[error("token subject is not a user id")]
    MalformedSubject,
    #[error("token issuer is not accepted")]
    InvalidIssuer,
    #[error("token is malformed: {0}")]
    Malformed(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
            _ => TokenError::Malformed(err.to_string()),
        }
    }
}

/// Generate a new access token for a user
///
/// # Errors
/// Returns error if token encoding fails
pub fn generate_access_token(user_id: &Uuid, secret: &str, ttl: Duration) -> Result<String, AppError> {
    generate_access_token_at(user_id, secret, ttl, Utc::now())
}

/// Same as [`generate_access_token`] with an explicit issue time
pub fn generate_access_token_at(
    user_id: &Uuid,
    secret: &str,
    ttl: Duration,
    issued_at: DateTime<Utc>,
) -> Result<String, AppError> {
    let claims = Claims::new(*user_id, issued_at, ttl);

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
}

/// Validate an access token and return the user id it was issued for
///
/// # Errors
/// Returns the internal reason the token was refused
pub fn validate_access_token(token: &str, secret: &str) -> Result<Uuid, TokenError> {
    validate_access_token_at(token, secret, Utc::now())
}

/// Same as [`validate_access_token`] evaluated at `now`
pub fn validate_access_token_at(token: &str, secret: &str, now: DateTime<Utc>) -> Result<Uuid, TokenError> {
    decode_claims_at(token, secret, now)?.user_id()
}

/// Verify signature, issuer and expiry, returning the full claims
pub fn decode_claims_at(token: &str, secret: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[TOKEN_ISSUER]);
    validation.set_required_spec_claims(&["exp", "iss", "sub"]);
    // expiry is checked below against `now`, without leeway
    validation.validate_exp = false;
    validation.leeway = 0;

    let claims = decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)?;

    if claims.is_expired_at(now) {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}
