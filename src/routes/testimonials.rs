/**
 * Testimonial Routes
 * Public listing (optionally featured-only for the homepage) plus admin CRUD.
 */
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, models::Testimonial};
use crate::routes::{
    bad_request, db_unavailable, internal_error, not_found, require_admin, SuccessResponse,
};

const COLUMNS: &str = "id, name, role, message, rating, featured, created_at";

#[derive(Debug, Deserialize)]
pub struct TestimonialListQuery {
    pub featured: Option<bool>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialPayload {
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    pub message: String,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub featured: Option<bool>,
}

fn validate(payload: &TestimonialPayload) -> Result<(), &'static str> {
    if payload.name.trim().is_empty() {
        return Err("Name is required");
    }
    if payload.message.trim().is_empty() {
        return Err("Message is required");
    }
    if let Some(rating) = payload.rating {
        if !(1..=5).contains(&rating) {
            return Err("Rating must be between 1 and 5");
        }
    }
    Ok(())
}

/// GET /api/testimonials?featured=true (public)
pub async fn list_testimonials(Query(query): Query<TestimonialListQuery>) -> impl IntoResponse {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let result: Result<Vec<Testimonial>, sqlx::Error> = if query.featured == Some(true) {
        sqlx::query_as(&format!(
            "SELECT {} FROM testimonials WHERE featured = true ORDER BY created_at DESC",
            COLUMNS
        ))
        .fetch_all(pool.as_ref())
        .await
    } else {
        sqlx::query_as(&format!(
            "SELECT {} FROM testimonials ORDER BY created_at DESC",
            COLUMNS
        ))
        .fetch_all(pool.as_ref())
        .await
    };

    match result {
        Ok(testimonials) => (StatusCode::OK, Json(testimonials)).into_response(),
        Err(e) => {
            tracing::error!("Database error listing testimonials: {}", e);
            internal_error().into_response()
        }
    }
}

/// POST /api/testimonials (admin)
pub async fn create_testimonial(
    headers: HeaderMap,
    Json(payload): Json<TestimonialPayload>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    if let Err(msg) = validate(&payload) {
        return bad_request(msg).into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, Testimonial>(&format!(
        r#"
        INSERT INTO testimonials (name, role, message, rating, featured)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(&payload.name)
    .bind(payload.role.unwrap_or_default())
    .bind(&payload.message)
    .bind(payload.rating)
    .bind(payload.featured.unwrap_or(false))
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(testimonial) => (StatusCode::CREATED, Json(testimonial)).into_response(),
        Err(e) => {
            tracing::error!("Database error creating testimonial: {}", e);
            internal_error().into_response()
        }
    }
}

/// PUT /api/testimonials/{id} - full overwrite (admin).
pub async fn update_testimonial(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<TestimonialPayload>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    if let Err(msg) = validate(&payload) {
        return bad_request(msg).into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, Testimonial>(&format!(
        r#"
        UPDATE testimonials
        SET name = $1, role = $2, message = $3, rating = $4, featured = $5
        WHERE id = $6
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(&payload.name)
    .bind(payload.role.unwrap_or_default())
    .bind(&payload.message)
    .bind(payload.rating)
    .bind(payload.featured.unwrap_or(false))
    .bind(id)
    .fetch_optional(pool.as_ref())
    .await
    {
        Ok(Some(testimonial)) => (StatusCode::OK, Json(testimonial)).into_response(),
        Ok(None) => not_found().into_response(),
        Err(e) => {
            tracing::error!("Database error updating testimonial: {}", e);
            internal_error().into_response()
        }
    }
}

/// DELETE /api/testimonials/{id} (admin)
pub async fn delete_testimonial(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query("DELETE FROM testimonials WHERE id = $1")
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
            tracing::error!("Database error deleting testimonial: {}", e);
            internal_error().into_response()
        }
    }
}
