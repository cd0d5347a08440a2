/**
 * Gallery Routes
 * Public gallery listing plus admin image upload/removal. Uploaded files go
 * through the media bridge; the database row keeps the explicit asset id so
 * deletion never parses the URL.
 */
use axum::{
    extract::{Multipart, Path},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::db::{self, models::GalleryImage};
use crate::media;
use crate::routes::{db_unavailable, internal_error, not_found, require_admin, SuccessResponse};

/// GET /api/gallery - every image, newest first (public).
pub async fn list_images() -> impl IntoResponse {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, GalleryImage>(
        "SELECT id, image_url, asset_id, event_id, created_at \
         FROM gallery_images ORDER BY created_at DESC",
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(images) => (StatusCode::OK, Json(images)).into_response(),
        Err(e) => {
            tracing::error!("Database error listing gallery: {}", e);
            internal_error().into_response()
        }
    }
}

/// POST /api/gallery/{eventId} - attach an uploaded image to an event
/// (admin, multipart `image` field).
pub async fn upload_image(
    headers: HeaderMap,
    Path(event_id): Path<Uuid>,
    multipart: Multipart,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    // Reject unknown events before touching the media store.
    let event_exists: Result<Option<(Uuid,)>, sqlx::Error> =
        sqlx::query_as("SELECT id FROM events WHERE id = $1")
            .bind(event_id)
            .fetch_optional(pool.as_ref())
            .await;
    match event_exists {
        Ok(Some(_)) => {}
        Ok(None) => return not_found().into_response(),
        Err(e) => {
            tracing::error!("Database error checking event: {}", e);
            return internal_error().into_response();
        }
    }

    let stored = match media::store_image("gallery", multipart).await {
        Ok(s) => s,
        Err(e) => return e.into_rejection().into_response(),
    };

    match sqlx::query_as::<_, GalleryImage>(
        r#"
        INSERT INTO gallery_images (image_url, asset_id, event_id)
        VALUES ($1, $2, $3)
        RETURNING id, image_url, asset_id, event_id, created_at
        "#,
    )
    .bind(&stored.url)
    .bind(&stored.asset_id)
    .bind(event_id)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(image) => (StatusCode::CREATED, Json(image)).into_response(),
        Err(e) => {
            // The row never landed; remove the stored file so the upload has
            // no partial effect.
            media::delete_asset(&stored.asset_id).await;
            tracing::error!("Database error creating gallery image: {}", e);
            internal_error().into_response()
        }
    }
}

/// DELETE /api/gallery/{id} (admin). The stored file is removed best-effort
/// after the row is gone.
pub async fn delete_image(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let deleted: Result<Option<(String,)>, sqlx::Error> =
        sqlx::query_as("DELETE FROM gallery_images WHERE id = $1 RETURNING asset_id")
            .bind(id)
            .fetch_optional(pool.as_ref())
            .await;

    match deleted {
        Ok(Some((asset_id,))) => {
            media::delete_asset(&asset_id).await;
            (StatusCode::OK, Json(SuccessResponse { success: true })).into_response()
        }
        Ok(None) => not_found().into_response(),
        Err(e) => {
            tracing::error!("Database error deleting gallery image: {}", e);
            internal_error().into_response()
        }
    }
}
