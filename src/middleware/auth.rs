use axum::Json;
use axum::extract::FromRequestParts;
use axum::http::{HeaderMap, StatusCode, request::Parts};
use axum::response::{IntoResponse, Response};
use serde_json::json;
use subtle::ConstantTimeEq;

use crate::router::McpState;

fn token_matches(candidate: &str, expected: &str) -> bool {
    candidate.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Ensure the inbound request is authorized.
/// With no token configured every request passes. Otherwise accepts either:
/// - Header: `Authorization: Bearer <token>`
/// - Header: `x-api-key: <token>`
pub fn ensure_authorized(headers: &HeaderMap, expected: Option<&str>) -> Result<(), Response> {
    let Some(expected) = expected else {
        return Ok(());
    };

    // 1) header: Authorization: Bearer <token>
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        let auth = auth.trim();
        if let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
            && token_matches(token.trim(), expected)
        {
            return Ok(());
        }
    }

    // 2) header: x-api-key
    if let Some(key) = headers.get("x-api-key").and_then(|v| v.to_str().ok())
        && token_matches(key.trim(), expected)
    {
        return Ok(());
    }

    Err((
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "unauthorized", "reason": "invalid or missing token"})),
    )
        .into_response())
}

#[derive(Debug, Clone, Copy)]
pub struct RequireKeyAuth;

impl FromRequestParts<McpState> for RequireKeyAuth {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &McpState,
    ) -> Result<Self, Self::Rejection> {
        ensure_authorized(&parts.headers, state.config.auth_token())?;
        Ok(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(name: &'static str, value: &str) -> HeaderMap {
        let mut h = HeaderMap::new();
        h.insert(name, HeaderValue::from_str(value).unwrap());
        h
    }

    #[test]
    fn open_when_no_token_configured() {
        assert!(ensure_authorized(&HeaderMap::new(), None).is_ok());
    }

    #[test]
    fn accepts_bearer_and_api_key() {
        assert!(ensure_authorized(&headers("authorization", "Bearer s3cret"), Some("s3cret")).is_ok());
        assert!(ensure_authorized(&headers("x-api-key", "s3cret"), Some("s3cret")).is_ok());
    }

    #[test]
    fn rejects_wrong_or_missing_token() {
        let err = ensure_authorized(&headers("authorization", "Bearer nope"), Some("s3cret"))
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
        assert!(ensure_authorized(&HeaderMap::new(), Some("s3cret")).is_err());
        assert!(ensure_authorized(&headers("authorization", "Basic s3cret"), Some("s3cret")).is_err());
    }
}
