/**
 * Routes Module
 * API route handlers plus the shared auth guards and response envelopes.
 */
pub mod about;
pub mod auth;
pub mod categories;
pub mod contact;
pub mod contact_page;
pub mod events;
pub mod gallery;
pub mod health;
pub mod page_hero;
pub mod settings;
pub mod stats;
pub mod testimonials;
pub mod users;

use axum::{
    http::{HeaderMap, StatusCode},
    Json,
};
use serde::Serialize;

use crate::routes::auth::{verify_access_token, Claims};

/// Error response envelope shared by every handler.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: None,
        }
    }

    pub fn with_message(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: Some(message.into()),
        }
    }
}

/// Success response (for deletes and other ack-only endpoints).
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

/// The uniform early-return type for guard failures.
pub type Rejection = (StatusCode, Json<ErrorResponse>);

pub fn bad_request(msg: &str) -> Rejection {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse::new(msg)))
}

pub fn not_found() -> Rejection {
    (StatusCode::NOT_FOUND, Json(ErrorResponse::new("Not found")))
}

pub fn db_unavailable() -> Rejection {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(ErrorResponse::new("Database not available")),
    )
}

pub fn internal_error() -> Rejection {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::with_message(
            "Internal error",
            "Something went wrong. Please try again later.",
        )),
    )
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// `protect`: require a valid bearer token; returns the decoded claims.
/// The role/status inside are a point-in-time snapshot from login - there is
/// no per-request database re-check.
pub fn require_auth(headers: &HeaderMap) -> Result<Claims, Rejection> {
    match bearer_token(headers) {
        Some(token) => verify_access_token(token).map_err(|_| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new("Invalid or expired token")),
            )
        }),
        None => Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("Authorization required")),
        )),
    }
}

/// `adminOnly`: require a valid token whose role claim is ADMIN.
pub fn require_admin(headers: &HeaderMap) -> Result<Claims, Rejection> {
    let claims = require_auth(headers)?;
    if claims.role != "ADMIN" {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new("Admins only")),
        ));
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::auth::create_access_token;

    fn headers_with(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "authorization",
            format!("Bearer {}", token).parse().unwrap(),
        );
        headers
    }

    #[test]
    fn test_internal_error_body_carries_message() {
        let (status, body) = internal_error();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let json = serde_json::to_value(&body.0).unwrap();
        assert_eq!(json["error"], "Internal error");
        assert!(json["message"].is_string());
    }

    #[test]
    fn test_error_response_new_omits_message() {
        let json = serde_json::to_value(ErrorResponse::new("Not found")).unwrap();
        assert_eq!(json["error"], "Not found");
        assert!(json.get("message").is_none());
    }

    #[test]
    fn test_require_auth_missing_header() {
        let headers = HeaderMap::new();
        let err = require_auth(&headers).unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_require_auth_malformed_header() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", "Token abc".parse().unwrap());
        let err = require_auth(&headers).unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_require_auth_garbage_token() {
        let err = require_auth(&headers_with("not.a.jwt")).unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_require_admin_rejects_user_role() {
        let token =
            create_access_token("11111111-1111-1111-1111-111111111111", "u@x.com", "USER", "APPROVED")
                .unwrap();
        let err = require_admin(&headers_with(&token)).unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_require_admin_accepts_admin_role() {
        let token = create_access_token(
            "11111111-1111-1111-1111-111111111111",
            "a@x.com",
            "ADMIN",
            "APPROVED",
        )
        .unwrap();
        let claims = require_admin(&headers_with(&token)).unwrap();
        assert_eq!(claims.role, "ADMIN");
        assert_eq!(claims.email, "a@x.com");
    }
}
