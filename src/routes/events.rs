/**
 * Event Routes
 * CRUD endpoints for portfolio events plus the cover-image upload bridge.
 */
use axum::{
    extract::{Multipart, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::{
    self,
    models::{Event, GalleryImage},
};
use crate::media;
use crate::routes::{
    bad_request, db_unavailable, internal_error, not_found, require_admin, SuccessResponse,
};

const EVENT_COLUMNS: &str =
    "id, title, description, category, date, cover_image, client, featured, created_at, updated_at";

// ============================================================================
// Request/Response Types
// ============================================================================

/// Event with its gallery images attached, as the public site consumes it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    #[serde(flatten)]
    pub event: Event,
    pub gallery: Vec<GalleryImage>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub client: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub client: Option<String>,
    pub cover_image: Option<String>,
    pub featured: Option<bool>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/events - all events, newest first, gallery included (public).
pub async fn list_events() -> impl IntoResponse {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let events: Vec<Event> = match sqlx::query_as(&format!(
        "SELECT {} FROM events ORDER BY created_at DESC",
        EVENT_COLUMNS
    ))
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Database error listing events: {}", e);
            return internal_error().into_response();
        }
    };

    // One extra query instead of N+1: fetch every attached image and group.
    let images: Vec<GalleryImage> = match sqlx::query_as(
        "SELECT id, image_url, asset_id, event_id, created_at \
         FROM gallery_images WHERE event_id IS NOT NULL",
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(i) => i,
        Err(e) => {
            tracing::error!("Database error fetching gallery for events: {}", e);
            return internal_error().into_response();
        }
    };

    let mut by_event: HashMap<Uuid, Vec<GalleryImage>> = HashMap::new();
    for image in images {
        if let Some(event_id) = image.event_id {
            by_event.entry(event_id).or_default().push(image);
        }
    }

    let response: Vec<EventResponse> = events
        .into_iter()
        .map(|event| {
            let gallery = by_event.remove(&event.id).unwrap_or_default();
            EventResponse { event, gallery }
        })
        .collect();

    (StatusCode::OK, Json(response)).into_response()
}

/// GET /api/events/{id} (public)
pub async fn get_event(Path(id): Path<Uuid>) -> impl IntoResponse {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let event: Option<Event> = match sqlx::query_as(&format!(
        "SELECT {} FROM events WHERE id = $1",
        EVENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Database error fetching event: {}", e);
            return internal_error().into_response();
        }
    };

    let event = match event {
        Some(e) => e,
        None => return not_found().into_response(),
    };

    let gallery: Vec<GalleryImage> = match sqlx::query_as(
        "SELECT id, image_url, asset_id, event_id, created_at \
         FROM gallery_images WHERE event_id = $1 ORDER BY created_at",
    )
    .bind(id)
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(g) => g,
        Err(e) => {
            tracing::error!("Database error fetching event gallery: {}", e);
            return internal_error().into_response();
        }
    };

    (StatusCode::OK, Json(EventResponse { event, gallery })).into_response()
}

/// POST /api/events (admin)
pub async fn create_event(
    headers: HeaderMap,
    Json(payload): Json<CreateEventRequest>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    if payload.title.trim().is_empty() {
        return bad_request("Title is required").into_response();
    }
    if payload.description.trim().is_empty() {
        return bad_request("Description is required").into_response();
    }
    if payload.category.trim().is_empty() {
        return bad_request("Category is required").into_response();
    }
    if payload.client.trim().is_empty() {
        return bad_request("Client is required").into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, Event>(&format!(
        r#"
        INSERT INTO events (title, description, category, date, cover_image, client, featured)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {}
        "#,
        EVENT_COLUMNS
    ))
    .bind(&payload.title)
    .bind(&payload.description)
    .bind(&payload.category)
    .bind(payload.date)
    .bind(payload.cover_image.unwrap_or_default())
    .bind(&payload.client)
    .bind(payload.featured.unwrap_or(false))
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(event) => (
            StatusCode::CREATED,
            Json(EventResponse {
                event,
                gallery: vec![],
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Database error creating event: {}", e);
            internal_error().into_response()
        }
    }
}

/// PUT /api/events/{id} - partial overwrite (admin).
pub async fn update_event(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateEventRequest>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let existing: Option<Event> = match sqlx::query_as(&format!(
        "SELECT {} FROM events WHERE id = $1",
        EVENT_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(e) => e,
        Err(e) => {
            tracing::error!("Database error fetching event: {}", e);
            return internal_error().into_response();
        }
    };

    let existing = match existing {
        Some(e) => e,
        None => return not_found().into_response(),
    };

    let title = payload.title.unwrap_or(existing.title);
    let description = payload.description.unwrap_or(existing.description);
    let category = payload.category.unwrap_or(existing.category);
    let date = payload.date.unwrap_or(existing.date);
    let client = payload.client.unwrap_or(existing.client);
    let cover_image = payload.cover_image.unwrap_or(existing.cover_image);
    let featured = payload.featured.unwrap_or(existing.featured);

    match sqlx::query_as::<_, Event>(&format!(
        r#"
        UPDATE events
        SET title = $1, description = $2, category = $3, date = $4,
            cover_image = $5, client = $6, featured = $7, updated_at = now()
        WHERE id = $8
        RETURNING {}
        "#,
        EVENT_COLUMNS
    ))
    .bind(&title)
    .bind(&description)
    .bind(&category)
    .bind(date)
    .bind(&cover_image)
    .bind(&client)
    .bind(featured)
    .bind(id)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(event) => (
            StatusCode::OK,
            Json(EventResponse {
                event,
                gallery: vec![],
            }),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("Database error updating event: {}", e);
            internal_error().into_response()
        }
    }
}

/// DELETE /api/events/{id} (admin). Attached gallery rows keep their file but
/// lose the back-reference (weak reference, ON DELETE SET NULL).
pub async fn delete_event(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query("DELETE FROM events WHERE id = $1")
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
            tracing::error!("Database error deleting event: {}", e);
            internal_error().into_response()
        }
    }
}

/// POST /api/events/upload-cover (admin, multipart `image` field).
/// Stores the file and returns `{url, assetId}`; the admin console then
/// saves the URL onto the event via PUT.
pub async fn upload_cover(headers: HeaderMap, multipart: Multipart) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    match media::store_image("events", multipart).await {
        Ok(stored) => (StatusCode::CREATED, Json(stored)).into_response(),
        Err(e) => e.into_rejection().into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::auth::create_access_token;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    fn events_router() -> Router {
        Router::new()
            .route("/api/events", get(list_events).post(create_event))
            .route("/api/events/upload-cover", post(upload_cover))
            .route(
                "/api/events/{id}",
                get(get_event).put(update_event).delete(delete_event),
            )
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
    async fn test_create_event_requires_token() {
        let body = serde_json::json!({
            "title": "Gala", "description": "d", "category": "c",
            "date": "2026-01-01T00:00:00Z", "client": "Acme"
        });
        let req = Request::post("/api/events")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let res = events_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_event_empty_title_returns_bad_request() {
        let body = serde_json::json!({
            "title": "  ", "description": "d", "category": "c",
            "date": "2026-01-01T00:00:00Z", "client": "Acme"
        });
        let req = Request::post("/api/events")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", admin_token()))
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let res = events_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_list_events_without_database_returns_unavailable() {
        let req = Request::get("/api/events").body(Body::empty()).unwrap();
        let res = events_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_delete_event_user_role_forbidden() {
        let token = create_access_token(
            "44444444-4444-4444-4444-444444444444",
            "user@x.com",
            "USER",
            "APPROVED",
        )
        .unwrap();
        let req = Request::delete("/api/events/55555555-5555-5555-5555-555555555555")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        let res = events_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_upload_cover_requires_token() {
        let req = Request::post("/api/events/upload-cover")
            .header("content-type", "multipart/form-data; boundary=X")
            .body(Body::from("--X--\r\n"))
            .unwrap();
        let res = events_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
