/**
 * About Page Routes
 * Singleton row (fixed id "about") backing the public About page, seeded with
 * defaults on first read.
 */
use axum::{
    extract::Multipart,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::{self, models::AboutPage};
use crate::media;
use crate::routes::{db_unavailable, internal_error, require_admin};

pub const ABOUT_ID: &str = "about";

const COLUMNS: &str = "id, hero_title, hero_subtitle, hero_image, hero_image_asset, story_title, \
    story_content, vision, mission, values_section_title, values_section_subtitle, core_values, \
    years_experience, updated_at";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAboutRequest {
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub hero_image: Option<String>,
    pub story_title: Option<String>,
    pub story_content: Option<String>,
    pub vision: Option<String>,
    pub mission: Option<String>,
    pub values_section_title: Option<String>,
    pub values_section_subtitle: Option<String>,
    #[serde(rename = "values")]
    pub core_values: Option<serde_json::Value>,
    pub years_experience: Option<i32>,
}

pub async fn fetch_or_seed(pool: &PgPool) -> Result<AboutPage, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO about_page
            (id, hero_title, hero_subtitle, story_title, values_section_title,
             values_section_subtitle)
        VALUES
            ($1, 'About Us', 'The people behind the events', 'Our Story',
             'Our Values', 'What guides every event we craft')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(ABOUT_ID)
    .execute(pool)
    .await?;

    sqlx::query_as(&format!("SELECT {} FROM about_page WHERE id = $1", COLUMNS))
        .bind(ABOUT_ID)
        .fetch_one(pool)
        .await
}

/// GET /api/about (public)
pub async fn get_about() -> impl IntoResponse {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match fetch_or_seed(pool.as_ref()).await {
        Ok(about) => (StatusCode::OK, Json(about)).into_response(),
        Err(e) => {
            tracing::error!("Database error loading about page: {}", e);
            internal_error().into_response()
        }
    }
}

/// PUT /api/about (admin). Omitted fields keep their current value.
pub async fn update_about(
    headers: HeaderMap,
    Json(payload): Json<UpdateAboutRequest>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let current = match fetch_or_seed(pool.as_ref()).await {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Database error loading about page: {}", e);
            return internal_error().into_response();
        }
    };

    match sqlx::query_as::<_, AboutPage>(&format!(
        r#"
        UPDATE about_page SET
            hero_title = $1, hero_subtitle = $2, hero_image = $3, story_title = $4,
            story_content = $5, vision = $6, mission = $7, values_section_title = $8,
            values_section_subtitle = $9, core_values = $10, years_experience = $11,
            updated_at = now()
        WHERE id = $12
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(payload.hero_title.unwrap_or(current.hero_title))
    .bind(payload.hero_subtitle.unwrap_or(current.hero_subtitle))
    .bind(payload.hero_image.unwrap_or(current.hero_image))
    .bind(payload.story_title.unwrap_or(current.story_title))
    .bind(payload.story_content.unwrap_or(current.story_content))
    .bind(payload.vision.unwrap_or(current.vision))
    .bind(payload.mission.unwrap_or(current.mission))
    .bind(
        payload
            .values_section_title
            .unwrap_or(current.values_section_title),
    )
    .bind(
        payload
            .values_section_subtitle
            .unwrap_or(current.values_section_subtitle),
    )
    .bind(payload.core_values.unwrap_or(current.core_values))
    .bind(payload.years_experience.unwrap_or(current.years_experience))
    .bind(ABOUT_ID)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(about) => (StatusCode::OK, Json(about)).into_response(),
        Err(e) => {
            tracing::error!("Database error updating about page: {}", e);
            internal_error().into_response()
        }
    }
}

/// POST /api/about/upload-hero (admin, multipart `image` field). Stores the
/// file, swaps the url/asset pair on the row, then drops the previous file.
pub async fn upload_hero(headers: HeaderMap, multipart: Multipart) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let current = match fetch_or_seed(pool.as_ref()).await {
        Ok(a) => a,
        Err(e) => {
            tracing::error!("Database error loading about page: {}", e);
            return internal_error().into_response();
        }
    };

    let stored = match media::store_image("about", multipart).await {
        Ok(s) => s,
        Err(e) => return e.into_rejection().into_response(),
    };

    if let Err(e) = sqlx::query(
        "UPDATE about_page SET hero_image = $1, hero_image_asset = $2, updated_at = now() \
         WHERE id = $3",
    )
    .bind(&stored.url)
    .bind(&stored.asset_id)
    .bind(ABOUT_ID)
    .execute(pool.as_ref())
    .await
    {
        media::delete_asset(&stored.asset_id).await;
        tracing::error!("Database error saving about hero image: {}", e);
        return internal_error().into_response();
    }

    media::delete_asset(&current.hero_image_asset).await;

    (StatusCode::CREATED, Json(stored)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    fn about_router() -> Router {
        Router::new()
            .route("/api/about", get(get_about).put(update_about))
            .route("/api/about/upload-hero", post(upload_hero))
    }

    #[test]
    fn test_update_body_accepts_values_alias() {
        let body: UpdateAboutRequest =
            serde_json::from_str(r#"{"values": [{"title": "Craft"}], "yearsExperience": 12}"#)
                .unwrap();
        assert!(body.core_values.is_some());
        assert_eq!(body.years_experience, Some(12));
    }

    #[tokio::test]
    async fn test_put_about_requires_token() {
        let req = Request::put("/api/about")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"heroTitle": "x"}"#))
            .unwrap();
        let res = about_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upload_hero_requires_token() {
        let req = Request::post("/api/about/upload-hero")
            .header("content-type", "multipart/form-data; boundary=X")
            .body(Body::from("--X--\r\n"))
            .unwrap();
        let res = about_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_get_about_without_database_returns_unavailable() {
        let req = Request::get("/api/about").body(Body::empty()).unwrap();
        let res = about_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
