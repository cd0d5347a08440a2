/**
 * User Administration Routes
 * Admin console endpoints for approving, blocking, promoting, and removing
 * registered accounts.
 */
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::db::{self, models::UserPublic};
use crate::routes::{db_unavailable, internal_error, not_found, require_admin, SuccessResponse};

const COLUMNS: &str = "id, email, role, status, created_at";

/// GET /api/users - list all accounts, newest first (admin).
/// The password hash is never part of the projection.
pub async fn list_users(headers: HeaderMap) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, UserPublic>(&format!(
        "SELECT {} FROM users ORDER BY created_at DESC",
        COLUMNS
    ))
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(e) => {
            tracing::error!("Database error listing users: {}", e);
            internal_error().into_response()
        }
    }
}

/// Shared body for the status transitions. Each endpoint sets one fixed value;
/// clients cannot write arbitrary statuses.
async fn set_status(headers: HeaderMap, id: Uuid, status: &str) -> axum::response::Response {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, UserPublic>(&format!(
        "UPDATE users SET status = $1 WHERE id = $2 RETURNING {}",
        COLUMNS
    ))
    .bind(status)
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(user)) => {
            tracing::info!("User {} status set to {}", user.email, status);
            (StatusCode::OK, Json(user)).into_response()
        }
        Ok(None) => not_found().into_response(),
        Err(e) => {
            tracing::error!("Database error updating user status: {}", e);
            internal_error().into_response()
        }
    }
}

async fn set_role(headers: HeaderMap, id: Uuid, role: &str) -> axum::response::Response {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, UserPublic>(&format!(
        "UPDATE users SET role = $1 WHERE id = $2 RETURNING {}",
        COLUMNS
    ))
    .bind(role)
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(user)) => {
            tracing::info!("User {} role set to {}", user.email, role);
            (StatusCode::OK, Json(user)).into_response()
        }
        Ok(None) => not_found().into_response(),
        Err(e) => {
            tracing::error!("Database error updating user role: {}", e);
            internal_error().into_response()
        }
    }
}

/// PUT /api/users/{id}/approve (admin)
pub async fn approve_user(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    set_status(headers, id, "APPROVED").await
}

/// PUT /api/users/{id}/block (admin)
pub async fn block_user(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    set_status(headers, id, "BLOCKED").await
}

/// PUT /api/users/{id}/unblock (admin) - a blocked account returns to APPROVED.
pub async fn unblock_user(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    set_status(headers, id, "APPROVED").await
}

/// PUT /api/users/{id}/promote (admin)
pub async fn promote_user(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    set_role(headers, id, "ADMIN").await
}

/// PUT /api/users/{id}/demote (admin)
pub async fn demote_user(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    set_role(headers, id, "USER").await
}

/// DELETE /api/users/{id} (admin). Deleting your own account is always a 400.
pub async fn delete_user(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    let claims = match require_admin(&headers) {
        Ok(c) => c,
        Err(rejection) => return rejection.into_response(),
    };

    if claims.sub == id.to_string() {
        return (
            StatusCode::BAD_REQUEST,
            Json(crate::routes::ErrorResponse::new(
                "You cannot delete your own account",
            )),
        )
            .into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query("DELETE FROM users WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await
    {
        Ok(result) => {
            if result.rows_affected() == 0 {
                return not_found().into_response();
            }
            tracing::info!("User {} deleted by {}", id, claims.email);
            (StatusCode::OK, Json(SuccessResponse { success: true })).into_response()
        }
        Err(e) => {
            tracing::error!("Database error deleting user: {}", e);
            internal_error().into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::auth::create_access_token;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{delete, get, put};
    use axum::Router;
    use tower::ServiceExt;

    fn users_router() -> Router {
        Router::new()
            .route("/api/users", get(list_users))
            .route("/api/users/{id}/approve", put(approve_user))
            .route("/api/users/{id}/promote", put(promote_user))
            .route("/api/users/{id}", delete(delete_user))
    }

    fn admin_token() -> String {
        create_access_token(
            "33333333-3333-3333-3333-333333333333",
            "admin@x.com",
            "ADMIN",
            "APPROVED",
        )
        .unwrap()
    }

    fn user_token() -> String {
        create_access_token(
            "44444444-4444-4444-4444-444444444444",
            "user@x.com",
            "USER",
            "APPROVED",
        )
        .unwrap()
    }

    async fn send(app: Router, method: &str, uri: &str, token: Option<&str>) -> StatusCode {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            builder = builder.header("authorization", format!("Bearer {}", t));
        }
        let res = app.oneshot(builder.body(Body::empty()).unwrap()).await.unwrap();
        res.status()
    }

    #[tokio::test]
    async fn test_list_users_requires_token() {
        let status = send(users_router(), "GET", "/api/users", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_users_rejects_user_role() {
        let token = user_token();
        let status = send(users_router(), "GET", "/api/users", Some(&token)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_approve_rejects_user_role() {
        let token = user_token();
        let status = send(
            users_router(),
            "PUT",
            "/api/users/44444444-4444-4444-4444-444444444444/approve",
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_self_delete_returns_bad_request() {
        // Auth check comes before the pool check, so this holds without a DB.
        let token = admin_token();
        let status = send(
            users_router(),
            "DELETE",
            "/api/users/33333333-3333-3333-3333-333333333333",
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_delete_other_without_database_returns_unavailable() {
        let token = admin_token();
        let status = send(
            users_router(),
            "DELETE",
            "/api/users/44444444-4444-4444-4444-444444444444",
            Some(&token),
        )
        .await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_promote_requires_admin() {
        let status = send(
            users_router(),
            "PUT",
            "/api/users/44444444-4444-4444-4444-444444444444/promote",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
