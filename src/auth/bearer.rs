/// Authorization Header Parsing
///
/// Splits `Authorization: <Scheme> <credential>` into its credential.
/// Two schemes are understood: `Bearer` for session tokens and `ApiKey`
/// for service-to-service keys.

use actix_web::http::header::{HeaderMap, AUTHORIZATION};
use std::fmt;

/// Scheme expected in front of the credential
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    Bearer,
    ApiKey,
}

impl AuthScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthScheme::Bearer => "Bearer",
            AuthScheme::ApiKey => "ApiKey",
        }
    }
}

impl fmt::Display for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum AuthHeaderError {
    #[error("authorization header is missing")]
    MissingHeader,
    #[error("authorization header is malformed (expected `{0} <credential>`)")]
    MalformedHeader(AuthScheme),
}

/// Extract the credential for `scheme` from the request headers
///
/// The header must hold exactly two whitespace-separated tokens and the
/// first one must equal the scheme name (case-sensitive). The second token
/// is returned verbatim.
pub fn extract_credential(headers: &HeaderMap, scheme: AuthScheme) -> Result<String, AuthHeaderError> {
    let value = match headers.get(AUTHORIZATION) {
        None => return Err(AuthHeaderError::MissingHeader),
        Some(value) if value.is_empty() => return Err(AuthHeaderError::MissingHeader),
        Some(value) => value
            .to_str()
            .map_err(|_| AuthHeaderError::MalformedHeader(scheme))?,
    };

    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(found), Some(credential), None) if found == scheme.as_str() => Ok(credential.to_string()),
        (None, _, _) => Err(AuthHeaderError::MissingHeader),
        _ => Err(AuthHeaderError::MalformedHeader(scheme)),
    }
}

/// `Authorization: Bearer <token>`
pub fn get_bearer_token(headers: &HeaderMap) -> Result<String, AuthHeaderError> {
    extract_credential(headers, AuthScheme::Bearer)
}

/// `Authorization: ApiKey <key>`
pub fn get_api_key(headers: &HeaderMap) -> Result<String, AuthHeaderError> {
    extract_credential(headers, AuthScheme::ApiKey)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::header::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn test_bearer_token_extracted() {
        let headers = headers_with("Bearer abc.def.ghi");
        assert_eq!(get_bearer_token(&headers), Ok("abc.def.ghi".to_string()));
    }

    #[test]
    fn test_api_key_extracted() {
        let headers = headers_with("ApiKey f271c81ff7084ee5b99a5091b42d486e");
        assert_eq!(
            get_api_key(&headers),
            Ok("f271c81ff7084ee5b99a5091b42d486e".to_string())
        );
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let headers = headers_with("Bearer    token123  ");
        assert_eq!(get_bearer_token(&headers), Ok("token123".to_string()));
    }

    #[test]
    fn test_missing_header() {
        let headers = HeaderMap::new();
        assert_eq!(get_bearer_token(&headers), Err(AuthHeaderError::MissingHeader));
    }

    #[test]
    fn test_empty_header_counts_as_missing() {
        let headers = headers_with("");
        assert_eq!(get_bearer_token(&headers), Err(AuthHeaderError::MissingHeader));
    }

    #[test]
    fn test_scheme_without_token_is_malformed() {
        let headers = headers_with("Bearer");
        assert_eq!(
            get_bearer_token(&headers),
            Err(AuthHeaderError::MalformedHeader(AuthScheme::Bearer))
        );
    }

    #[test]
    fn test_wrong_scheme_is_malformed() {
        let headers = headers_with("Token xyz");
        assert_eq!(
            get_bearer_token(&headers),
            Err(AuthHeaderError::MalformedHeader(AuthScheme::Bearer))
        );
    }

    #[test]
    fn test_scheme_is_case_sensitive() {
        let headers = headers_with("bearer xyz");
        assert!(get_bearer_token(&headers).is_err());

        let headers = headers_with("apikey xyz");
        assert!(get_api_key(&headers).is_err());
    }

    #[test]
    fn test_extra_tokens_are_malformed() {
        let headers = headers_with("Bearer abc def");
        assert_eq!(
            get_bearer_token(&headers),
            Err(AuthHeaderError::MalformedHeader(AuthScheme::Bearer))
        );
    }

    #[test]
    fn test_bearer_header_is_not_an_api_key() {
        let headers = headers_with("Bearer abc");
        assert_eq!(
            get_api_key(&headers),
            Err(AuthHeaderError::MalformedHeader(AuthScheme::ApiKey))
        );
    }
}
