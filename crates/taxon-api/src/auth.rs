//! Token authentication.
//!
//! Tokens are opaque. A request carries `Authorization: Token <t>` or
//! `Authorization: Bearer <t>`; the owning user reference is the token's
//! fingerprint, so the raw token never reaches storage or logs.

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use taxon_core::token_fingerprint;

use crate::ApiError;

/// Extractor that requires an `Authorization` token.
///
/// Usage:
/// ```ignore
/// async fn my_handler(auth: RequireAuth) -> impl IntoResponse {
///     format!("hello {}", auth.user)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct RequireAuth {
    /// Fingerprint of the presented token.
    pub user: String,
}

/// Pull the token out of an `Authorization` header value.
pub fn parse_authorization(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !(scheme.eq_ignore_ascii_case("token") || scheme.eq_ignore_ascii_case("bearer")) {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_authorization)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        Ok(RequireAuth {
            user: token_fingerprint(token),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_token_and_bearer_schemes() {
        assert_eq!(parse_authorization("Token abc123"), Some("abc123"));
        assert_eq!(parse_authorization("Bearer abc123"), Some("abc123"));
        assert_eq!(parse_authorization("bearer  abc123 "), Some("abc123"));
    }

    #[test]
    fn test_parse_rejects_other_schemes() {
        assert_eq!(parse_authorization("Basic dXNlcjpwYXNz"), None);
        assert_eq!(parse_authorization("Token "), None);
        assert_eq!(parse_authorization("abc123"), None);
    }
}
