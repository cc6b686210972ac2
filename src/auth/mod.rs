/// Authentication module
///
/// Handles password hashing, Authorization header parsing, JWT access
/// tokens and refresh token management.

mod bearer;
mod claims;
mod jwt;
mod password;
mod refresh_token;

pub use bearer::{extract_credential, get_api_key, get_bearer_token, AuthHeaderError, AuthScheme};
pub use claims::{Claims, TOKEN_ISSUER};
pub use jwt::{
    decode_claims_at, generate_access_token, generate_access_token_at, validate_access_token,
    validate_access_token_at, TokenError,
};
pub use password::{hash_password, verify_password, PasswordHasher, PasswordMismatch, DEFAULT_HASH_COST, MIN_HASH_COST};
pub use refresh_token::{
    generate_refresh_token, EntropyError, RefreshTokenManager, REFRESH_TOKEN_LIFETIME_DAYS,
};
