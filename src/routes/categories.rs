/**
 * Category Routes
 * Public listing ordered for the filter bar, admin CRUD. Slugs are always
 * derived from the name server-side; clients never supply one.
 */
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, models::Category};
use crate::routes::{
    bad_request, db_unavailable, internal_error, not_found, require_admin, ErrorResponse,
    SuccessResponse,
};

lazy_static::lazy_static! {
    /// Shape every derived slug must satisfy.
    static ref SLUG_REGEX: Regex = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").unwrap();
}

/// Derive a URL slug from a display name: lowercase, whitespace runs become a
/// single hyphen, everything else non-alphanumeric is dropped. Deterministic
/// for a given name.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut last_was_hyphen = true; // suppress a leading hyphen
    for c in name.trim().to_lowercase().chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c);
            last_was_hyphen = false;
        } else if (c.is_whitespace() || c == '-' || c == '_') && !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub order: Option<i32>,
}

/// GET /api/categories (public, ordered by sort_order)
pub async fn list_categories() -> impl IntoResponse {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, Category>(
        "SELECT id, name, slug, sort_order FROM categories ORDER BY sort_order ASC, name ASC",
    )
    .fetch_all(pool.as_ref())
    .await
    {
        Ok(categories) => (StatusCode::OK, Json(categories)).into_response(),
        Err(e) => {
            tracing::error!("Database error listing categories: {}", e);
            internal_error().into_response()
        }
    }
}

/// POST /api/categories (admin)
pub async fn create_category(
    headers: HeaderMap,
    Json(payload): Json<CreateCategoryRequest>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let slug = slugify(&payload.name);
    if slug.is_empty() || !SLUG_REGEX.is_match(&slug) {
        return bad_request("Category name is required").into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, Category>(
        r#"
        INSERT INTO categories (name, slug, sort_order)
        VALUES ($1, $2, $3)
        RETURNING id, name, slug, sort_order
        "#,
    )
    .bind(payload.name.trim())
    .bind(&slug)
    .bind(payload.order.unwrap_or(0))
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(category) => (StatusCode::CREATED, Json(category)).into_response(),
        Err(e) => {
            if e.to_string().contains("unique") || e.to_string().contains("duplicate key") {
                return (
                    StatusCode::CONFLICT,
                    Json(ErrorResponse::new("Category already exists")),
                )
                    .into_response();
            }
            tracing::error!("Database error creating category: {}", e);
            internal_error().into_response()
        }
    }
}

/// PUT /api/categories/{id} (admin). Renaming re-derives the slug.
pub async fn update_category(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCategoryRequest>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let existing: Option<Category> =
        match sqlx::query_as("SELECT id, name, slug, sort_order FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(pool.as_ref())
            .await
        {
            Ok(c) => c,
            Err(e) => {
                tracing::error!("Database error fetching category: {}", e);
                return internal_error().into_response();
            }
        };

    let existing = match existing {
        Some(c) => c,
        None => return not_found().into_response(),
    };

    let (name, slug) = match payload.name {
        Some(new_name) => {
            let slug = slugify(&new_name);
            if slug.is_empty() {
                return bad_request("Category name is required").into_response();
            }
            (new_name.trim().to_string(), slug)
        }
        None => (existing.name, existing.slug),
    };
    let sort_order = payload.order.unwrap_or(existing.sort_order);

    match sqlx::query_as::<_, Category>(
        r#"
        UPDATE categories
        SET name = $1, slug = $2, sort_order = $3
        WHERE id = $4
        RETURNING id, name, slug, sort_order
        "#,
    )
    .bind(&name)
    .bind(&slug)
    .bind(sort_order)
    .bind(id)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(category) => (StatusCode::OK, Json(category)).into_response(),
        Err(e) => {
            if e.to_string().contains("unique") || e.to_string().contains("duplicate key") {
                return (
                    StatusCode::CONFLICT,
                    Json(ErrorResponse::new("Category already exists")),
                )
                    .into_response();
            }
            tracing::error!("Database error updating category: {}", e);
            internal_error().into_response()
        }
    }
}

/// DELETE /api/categories/{id} (admin)
pub async fn delete_category(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query("DELETE FROM categories WHERE id = $1")
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
            tracing::error!("Database error deleting category: {}", e);
            internal_error().into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    #[test]
    fn test_slugify_basic() {
        assert_eq!(slugify("Corporate Events"), "corporate-events");
    }

    #[test]
    fn test_slugify_is_deterministic() {
        assert_eq!(slugify("Corporate Events"), slugify("Corporate Events"));
    }

    #[test]
    fn test_slugify_collapses_whitespace_and_punctuation() {
        assert_eq!(slugify("  Weddings & Galas  "), "weddings-galas");
        assert_eq!(slugify("Private_Parties"), "private-parties");
        assert_eq!(slugify("Launch---Day"), "launch-day");
    }

    #[test]
    fn test_slugify_empty_for_symbol_only_names() {
        assert_eq!(slugify("!!!"), "");
        assert_eq!(slugify("   "), "");
    }

    #[test]
    fn test_slugify_matches_slug_shape() {
        for name in ["Corporate Events", "Gala 2026", "A  B  C"] {
            assert!(SLUG_REGEX.is_match(&slugify(name)), "name: {}", name);
        }
    }

    #[tokio::test]
    async fn test_create_category_requires_token() {
        let app = Router::new().route(
            "/api/categories",
            get(list_categories).post(create_category),
        );
        let body = serde_json::json!({"name": "Corporate Events"});
        let req = Request::post("/api/categories")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_create_category_symbol_name_returns_bad_request() {
        use crate::routes::auth::create_access_token;
        let app = Router::new().route(
            "/api/categories",
            get(list_categories).post(create_category),
        );
        let token = create_access_token(
            "33333333-3333-3333-3333-333333333333",
            "admin@x.com",
            "ADMIN",
            "APPROVED",
        )
        .unwrap();
        let body = serde_json::json!({"name": "!!!"});
        let req = Request::post("/api/categories")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let res = app.oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
