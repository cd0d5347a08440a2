/**
 * Page Hero Routes
 * Per-page hero copy keyed by an uppercase page id (WORKS, GALLERY, ...).
 * Reads seed the row with portfolio defaults so the frontend never renders
 * an empty hero.
 */
use axum::{
    extract::Path,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::{self, models::PageHero};
use crate::routes::{bad_request, db_unavailable, internal_error, require_admin};

lazy_static::lazy_static! {
    /// Uppercase page keys only, so "works" and "WORKS" cannot become two rows.
    static ref PAGE_ID_REGEX: Regex = Regex::new(r"^[A-Z][A-Z0-9_-]*$").unwrap();
}

const COLUMNS: &str = "id, badge, title, subtitle, updated_at";

fn is_valid_page_id(id: &str) -> bool {
    id.len() <= 64 && PAGE_ID_REGEX.is_match(id)
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePageHeroRequest {
    pub badge: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
}

pub async fn fetch_or_seed(pool: &PgPool, page_id: &str) -> Result<PageHero, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO page_heroes (id, badge, title, subtitle)
        VALUES ($1, 'Our Portfolio', 'Events We''ve Crafted',
                'Explore our curated experiences')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(page_id)
    .execute(pool)
    .await?;

    sqlx::query_as(&format!("SELECT {} FROM page_heroes WHERE id = $1", COLUMNS))
        .bind(page_id)
        .fetch_one(pool)
        .await
}

/// GET /api/page-hero/{pageId} (public)
pub async fn get_page_hero(Path(page_id): Path<String>) -> impl IntoResponse {
    if !is_valid_page_id(&page_id) {
        return bad_request("Invalid page id").into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match fetch_or_seed(pool.as_ref(), &page_id).await {
        Ok(hero) => (StatusCode::OK, Json(hero)).into_response(),
        Err(e) => {
            tracing::error!("Database error loading page hero: {}", e);
            internal_error().into_response()
        }
    }
}

/// PUT /api/page-hero/{pageId} (admin). Upserts, so an admin can write the
/// hero for a page nobody has visited yet.
pub async fn update_page_hero(
    headers: HeaderMap,
    Path(page_id): Path<String>,
    Json(payload): Json<UpdatePageHeroRequest>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    if !is_valid_page_id(&page_id) {
        return bad_request("Invalid page id").into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let current = match fetch_or_seed(pool.as_ref(), &page_id).await {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Database error loading page hero: {}", e);
            return internal_error().into_response();
        }
    };

    match sqlx::query_as::<_, PageHero>(&format!(
        r#"
        UPDATE page_heroes
        SET badge = $1, title = $2, subtitle = $3, updated_at = now()
        WHERE id = $4
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(payload.badge.unwrap_or(current.badge))
    .bind(payload.title.unwrap_or(current.title))
    .bind(payload.subtitle.unwrap_or(current.subtitle))
    .bind(&page_id)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(hero) => (StatusCode::OK, Json(hero)).into_response(),
        Err(e) => {
            tracing::error!("Database error updating page hero: {}", e);
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

    fn page_hero_router() -> Router {
        Router::new().route(
            "/api/page-hero/{page_id}",
            get(get_page_hero).put(update_page_hero),
        )
    }

    #[test]
    fn test_page_id_validation() {
        assert!(is_valid_page_id("WORKS"));
        assert!(is_valid_page_id("GALLERY"));
        assert!(is_valid_page_id("PAGE_2"));
        assert!(!is_valid_page_id("works"));
        assert!(!is_valid_page_id("2PAGE"));
        assert!(!is_valid_page_id(""));
        assert!(!is_valid_page_id("../ETC"));
    }

    #[tokio::test]
    async fn test_get_lowercase_id_returns_bad_request() {
        let req = Request::get("/api/page-hero/works")
            .body(Body::empty())
            .unwrap();
        let res = page_hero_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_put_requires_token() {
        let req = Request::put("/api/page-hero/WORKS")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"title": "x"}"#))
            .unwrap();
        let res = page_hero_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_get_without_database_returns_unavailable() {
        let req = Request::get("/api/page-hero/WORKS")
            .body(Body::empty())
            .unwrap();
        let res = page_hero_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
