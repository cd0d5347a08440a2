/**
 * Contact Message Routes
 * The one unauthenticated write in the API: anyone may submit the contact
 * form. Reading, triaging, and deleting messages is admin-only.
 */
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, models::ContactMessage};
use crate::routes::{
    bad_request, db_unavailable, internal_error, not_found, require_admin, SuccessResponse,
};

const VALID_STATUSES: &[&str] = &["NEW", "READ", "REPLIED"];

const COLUMNS: &str = "id, name, email, phone, event_type, message, status, created_at";

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMessageRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub event_type: Option<String>,
    pub message: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct CreateMessageResponse {
    pub success: bool,
    pub contact: ContactMessage,
}

/// POST /api/contact (public). New messages always start as NEW.
pub async fn create_message(Json(payload): Json<CreateMessageRequest>) -> impl IntoResponse {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.message.trim().is_empty()
    {
        return bad_request("Name, email, and message are required").into_response();
    }
    if !payload.email.contains('@') {
        return bad_request("A valid email address is required").into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, ContactMessage>(&format!(
        r#"
        INSERT INTO contact_messages (name, email, phone, event_type, message)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(payload.name.trim())
    .bind(payload.email.trim())
    .bind(payload.phone.filter(|p| !p.trim().is_empty()))
    .bind(payload.event_type.filter(|t| !t.trim().is_empty()))
    .bind(&payload.message)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(contact) => (
            StatusCode::CREATED,
            Json(CreateMessageResponse {
                success: true,
                contact,
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Database error creating contact message: {}", e);
            internal_error().into_response()
        }
    }
}

/// GET /api/contact - every message, newest first (admin).
pub async fn list_messages(headers: HeaderMap) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, ContactMessage>(&format!(
        "SELECT {} FROM contact_messages ORDER BY created_at DESC",
        COLUMNS
    ))
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(messages) => (StatusCode::OK, Json(messages)).into_response(),
        Err(e) => {
            tracing::error!("Database error listing contact messages: {}", e);
            internal_error().into_response()
        }
    }
}

/// PUT /api/contact/{id}/status (admin). Any of the three states may be set
/// directly; there is no forced NEW -> READ -> REPLIED progression.
pub async fn update_status(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    if !VALID_STATUSES.contains(&payload.status.as_str()) {
        return bad_request("Invalid status value").into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, ContactMessage>(&format!(
        "UPDATE contact_messages SET status = $1 WHERE id = $2 RETURNING {}",
        COLUMNS
    ))
    .bind(&payload.status)
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(message)) => (StatusCode::OK, Json(message)).into_response(),
        Ok(None) => not_found().into_response(),
        Err(e) => {
            tracing::error!("Database error updating message status: {}", e);
            internal_error().into_response()
        }
    }
}

/// DELETE /api/contact/{id} (admin)
pub async fn delete_message(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query("DELETE FROM contact_messages WHERE id = $1")
        .bind(id)
        .execute(pool.as_ref())
        .await
    {
        Ok(result) => {
            if result.rows_affected() == 0 {
                return not_found().into_response();
            }
            (StatusCode::OK, Json(SuccessResponse { success: true })).into_response()
        }
        Err(e) => {
            tracing::error!("Database error deleting contact message: {}", e);
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
    use axum::routing::{get, put};
    use axum::Router;
    use tower::ServiceExt;

    fn contact_router() -> Router {
        Router::new()
            .route("/api/contact", get(list_messages).post(create_message))
            .route("/api/contact/{id}/status", put(update_status))
            .route("/api/contact/{id}", axum::routing::delete(delete_message))
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

    #[tokio::test]
    async fn test_create_missing_fields_returns_bad_request() {
        let body = serde_json::json!({"name": "A", "email": "", "message": "hello"});
        let req = Request::post("/api/contact")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let res = contact_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_rejects_email_without_at_sign() {
        let body = serde_json::json!({"name": "A", "email": "not-an-email", "message": "hi"});
        let req = Request::post("/api/contact")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let res = contact_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_requires_token() {
        let req = Request::get("/api/contact").body(Body::empty()).unwrap();
        let res = contact_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_update_status_rejects_unknown_value() {
        let body = serde_json::json!({"status": "ARCHIVED"});
        let req = Request::put("/api/contact/55555555-5555-5555-5555-555555555555/status")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", admin_token()))
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let res = contact_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_without_database_returns_unavailable() {
        let body = serde_json::json!({"name": "A", "email": "a@x.com", "message": "hello"});
        let req = Request::post("/api/contact")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let res = contact_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
