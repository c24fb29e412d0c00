//! Admin token authentication.
//!
//! Destructive operations (delete, bulk cleanup) require a shared admin
//! token passed in the X-Admin-Token header. When no token is configured
//! on the server, those operations are disabled entirely rather than open.

use axum::http::HeaderMap;

use crate::errors::{AppError, AppResult};

/// Header carrying the admin token.
pub static ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Checks the admin token on a request.
///
/// # Errors
/// * [`AppError::NotConfigured`] when the server has no admin token set.
/// * [`AppError::Unauthorized`] when the header is missing or does not match.
pub fn require_admin_token(headers: &HeaderMap, configured: Option<&str>) -> AppResult<()> {
    let Some(expected) = configured else {
        return Err(AppError::NotConfigured(
            "admin token not set up on server".to_string(),
        ));
    };

    let supplied = headers
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok());

    match supplied {
        Some(token) if token == expected => Ok(()),
        _ => Err(AppError::Unauthorized(
            "admin token required or invalid".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ADMIN_TOKEN_HEADER, HeaderValue::from_str(token).unwrap());
        headers
    }

    #[test]
    fn matching_token_passes() {
        assert!(require_admin_token(&headers_with("secret"), Some("secret")).is_ok());
    }

    #[test]
    fn wrong_or_missing_token_is_unauthorized() {
        let err = require_admin_token(&headers_with("nope"), Some("secret")).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err = require_admin_token(&HeaderMap::new(), Some("secret")).unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn unconfigured_token_disables_the_action() {
        let err = require_admin_token(&headers_with("any"), None).unwrap_err();
        assert!(matches!(err, AppError::NotConfigured(_)));
    }
}
