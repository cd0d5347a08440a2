/**
 * Site Settings Routes
 * The singleton settings row (fixed id "settings") that drives the public
 * homepage, footer, and legal pages. A missing row is backfilled with
 * defaults on first read and the backfill is idempotent.
 */
use axum::{
    extract::Multipart,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::{self, models::SiteSettings};
use crate::media;
use crate::routes::{db_unavailable, internal_error, require_admin};

pub const SETTINGS_ID: &str = "settings";

const COLUMNS: &str = "id, brand_logo, brand_logo_asset, brand_subtitle, hero_badge, hero_title, \
    hero_subtitle, hero_image, hero_image_asset, about_heading, about_text, about_image1, \
    about_image1_asset, about_image2, about_image2_asset, portfolio_title, portfolio_subtitle, \
    portfolio_description, testimonial_title, testimonial_subtitle, cta_title, cta_subtitle, \
    privacy_policy_html, terms_html, contact_email, contact_phone, address, social_links, \
    created_at, updated_at";

/// Partial update body for PUT /api/settings. Asset columns are deliberately
/// absent: they are only written by the upload endpoints.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSettingsRequest {
    pub brand_logo: Option<String>,
    pub brand_subtitle: Option<String>,
    pub hero_badge: Option<String>,
    pub hero_title: Option<String>,
    pub hero_subtitle: Option<String>,
    pub hero_image: Option<String>,
    pub about_heading: Option<String>,
    pub about_text: Option<String>,
    pub about_image1: Option<String>,
    pub about_image2: Option<String>,
    pub portfolio_title: Option<String>,
    pub portfolio_subtitle: Option<String>,
    pub portfolio_description: Option<String>,
    pub testimonial_title: Option<String>,
    pub testimonial_subtitle: Option<String>,
    pub cta_title: Option<String>,
    pub cta_subtitle: Option<String>,
    pub privacy_policy_html: Option<String>,
    pub terms_html: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub social_links: Option<serde_json::Value>,
}

/// Seed the singleton row with the site's launch copy when absent, then read
/// it back. INSERT .. ON CONFLICT DO NOTHING keeps the backfill race-safe and
/// idempotent: a second read returns the exact same row.
pub async fn fetch_or_seed(pool: &PgPool) -> Result<SiteSettings, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO site_settings
            (id, hero_title, hero_subtitle, about_heading, portfolio_title,
             portfolio_subtitle, testimonial_title, testimonial_subtitle,
             cta_title, cta_subtitle)
        VALUES
            ($1, 'Your Event, Perfectly Planned', 'We design unforgettable experiences',
             'About Us', 'Our Portfolio', 'Featured Events', 'Testimonials',
             'What our clients say', 'Start Planning Your Event',
             'Let''s make something unforgettable')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(SETTINGS_ID)
    .execute(pool)
    .await?;

    sqlx::query_as(&format!(
        "SELECT {} FROM site_settings WHERE id = $1",
        COLUMNS
    ))
    .bind(SETTINGS_ID)
    .fetch_one(pool)
    .await
}

/// GET /api/settings (public)
pub async fn get_settings() -> impl IntoResponse {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match fetch_or_seed(pool.as_ref()).await {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => {
            tracing::error!("Database error loading settings: {}", e);
            internal_error().into_response()
        }
    }
}

/// PUT /api/settings (admin). Fields omitted from the body keep their current
/// value; the two legal-HTML fields are sanitized before they are stored.
pub async fn update_settings(
    headers: HeaderMap,
    Json(payload): Json<UpdateSettingsRequest>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let current = match fetch_or_seed(pool.as_ref()).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Database error loading settings: {}", e);
            return internal_error().into_response();
        }
    };

    let privacy_policy_html = payload
        .privacy_policy_html
        .map(|h| ammonia::clean(&h))
        .unwrap_or(current.privacy_policy_html);
    let terms_html = payload
        .terms_html
        .map(|h| ammonia::clean(&h))
        .unwrap_or(current.terms_html);

    match sqlx::query_as::<_, SiteSettings>(&format!(
        r#"
        UPDATE site_settings SET
            brand_logo = $1, brand_subtitle = $2, hero_badge = $3, hero_title = $4,
            hero_subtitle = $5, hero_image = $6, about_heading = $7, about_text = $8,
            about_image1 = $9, about_image2 = $10, portfolio_title = $11,
            portfolio_subtitle = $12, portfolio_description = $13, testimonial_title = $14,
            testimonial_subtitle = $15, cta_title = $16, cta_subtitle = $17,
            privacy_policy_html = $18, terms_html = $19, contact_email = $20,
            contact_phone = $21, address = $22, social_links = $23, updated_at = now()
        WHERE id = $24
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(payload.brand_logo.unwrap_or(current.brand_logo))
    .bind(payload.brand_subtitle.unwrap_or(current.brand_subtitle))
    .bind(payload.hero_badge.unwrap_or(current.hero_badge))
    .bind(payload.hero_title.unwrap_or(current.hero_title))
    .bind(payload.hero_subtitle.unwrap_or(current.hero_subtitle))
    .bind(payload.hero_image.unwrap_or(current.hero_image))
    .bind(payload.about_heading.unwrap_or(current.about_heading))
    .bind(payload.about_text.unwrap_or(current.about_text))
    .bind(payload.about_image1.unwrap_or(current.about_image1))
    .bind(payload.about_image2.unwrap_or(current.about_image2))
    .bind(payload.portfolio_title.unwrap_or(current.portfolio_title))
    .bind(payload.portfolio_subtitle.unwrap_or(current.portfolio_subtitle))
    .bind(
        payload
            .portfolio_description
            .unwrap_or(current.portfolio_description),
    )
    .bind(payload.testimonial_title.unwrap_or(current.testimonial_title))
    .bind(
        payload
            .testimonial_subtitle
            .unwrap_or(current.testimonial_subtitle),
    )
    .bind(payload.cta_title.unwrap_or(current.cta_title))
    .bind(payload.cta_subtitle.unwrap_or(current.cta_subtitle))
    .bind(privacy_policy_html)
    .bind(terms_html)
    .bind(payload.contact_email.unwrap_or(current.contact_email))
    .bind(payload.contact_phone.unwrap_or(current.contact_phone))
    .bind(payload.address.unwrap_or(current.address))
    .bind(payload.social_links.unwrap_or(current.social_links))
    .bind(SETTINGS_ID)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(settings) => (StatusCode::OK, Json(settings)).into_response(),
        Err(e) => {
            tracing::error!("Database error updating settings: {}", e);
            internal_error().into_response()
        }
    }
}

// ============================================================================
// Image upload endpoints
// ============================================================================

/// The four image slots on the settings row. Each knows the SQL for reading
/// its current asset and for writing the new url/asset pair; the identifiers
/// stay closed inside this enum.
#[derive(Debug, Clone, Copy)]
enum ImageSlot {
    Hero,
    BrandLogo,
    AboutImage1,
    AboutImage2,
}

impl ImageSlot {
    fn select_asset_sql(self) -> &'static str {
        match self {
            ImageSlot::Hero => "SELECT hero_image_asset FROM site_settings WHERE id = $1",
            ImageSlot::BrandLogo => "SELECT brand_logo_asset FROM site_settings WHERE id = $1",
            ImageSlot::AboutImage1 => "SELECT about_image1_asset FROM site_settings WHERE id = $1",
            ImageSlot::AboutImage2 => "SELECT about_image2_asset FROM site_settings WHERE id = $1",
        }
    }

    fn update_sql(self) -> &'static str {
        match self {
            ImageSlot::Hero => {
                "UPDATE site_settings SET hero_image = $1, hero_image_asset = $2, \
                 updated_at = now() WHERE id = $3"
            }
            ImageSlot::BrandLogo => {
                "UPDATE site_settings SET brand_logo = $1, brand_logo_asset = $2, \
                 updated_at = now() WHERE id = $3"
            }
            ImageSlot::AboutImage1 => {
                "UPDATE site_settings SET about_image1 = $1, about_image1_asset = $2, \
                 updated_at = now() WHERE id = $3"
            }
            ImageSlot::AboutImage2 => {
                "UPDATE site_settings SET about_image2 = $1, about_image2_asset = $2, \
                 updated_at = now() WHERE id = $3"
            }
        }
    }
}

async fn upload_into_slot(
    slot: ImageSlot,
    headers: HeaderMap,
    multipart: Multipart,
) -> axum::response::Response {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    // Make sure the row exists before reading the old asset off it.
    if let Err(e) = fetch_or_seed(pool.as_ref()).await {
        tracing::error!("Database error loading settings: {}", e);
        return internal_error().into_response();
    }

    let previous_asset: String = match sqlx::query_as::<_, (String,)>(slot.select_asset_sql())
        .bind(SETTINGS_ID)
        .fetch_one(pool.as_ref())
        .await
    {
        Ok((asset,)) => asset,
        Err(e) => {
            tracing::error!("Database error reading settings asset: {}", e);
            return internal_error().into_response();
        }
    };

    let stored = match media::store_image("settings", multipart).await {
        Ok(s) => s,
        Err(e) => return e.into_rejection().into_response(),
    };

    if let Err(e) = sqlx::query(slot.update_sql())
        .bind(&stored.url)
        .bind(&stored.asset_id)
        .bind(SETTINGS_ID)
        .execute(pool.as_ref())
        .await
    {
        // Keep the row untouched: drop the file we just wrote instead.
        media::delete_asset(&stored.asset_id).await;
        tracing::error!("Database error saving settings image: {}", e);
        return internal_error().into_response();
    }

    // The overwritten slot's previous file is now unreachable; remove it
    // best-effort using the asset id that was stored alongside its URL.
    media::delete_asset(&previous_asset).await;

    (StatusCode::CREATED, Json(stored)).into_response()
}

/// POST /api/settings/hero-image (admin, multipart `image` field)
pub async fn upload_hero_image(headers: HeaderMap, multipart: Multipart) -> impl IntoResponse {
    upload_into_slot(ImageSlot::Hero, headers, multipart).await
}

/// POST /api/settings/brand-logo (admin)
pub async fn upload_brand_logo(headers: HeaderMap, multipart: Multipart) -> impl IntoResponse {
    upload_into_slot(ImageSlot::BrandLogo, headers, multipart).await
}

/// POST /api/settings/about-image-1 (admin)
pub async fn upload_about_image_1(headers: HeaderMap, multipart: Multipart) -> impl IntoResponse {
    upload_into_slot(ImageSlot::AboutImage1, headers, multipart).await
}

/// POST /api/settings/about-image-2 (admin)
pub async fn upload_about_image_2(headers: HeaderMap, multipart: Multipart) -> impl IntoResponse {
    upload_into_slot(ImageSlot::AboutImage2, headers, multipart).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::{get, post};
    use axum::Router;
    use tower::ServiceExt;

    fn settings_router() -> Router {
        Router::new()
            .route("/api/settings", get(get_settings).put(update_settings))
            .route("/api/settings/hero-image", post(upload_hero_image))
    }

    #[test]
    fn test_update_request_accepts_partial_body() {
        let body: UpdateSettingsRequest =
            serde_json::from_str(r#"{"heroTitle": "New Title"}"#).unwrap();
        assert_eq!(body.hero_title.as_deref(), Some("New Title"));
        assert!(body.cta_title.is_none());
        assert!(body.social_links.is_none());
    }

    #[test]
    fn test_image_slot_sql_pairs_are_consistent() {
        for slot in [
            ImageSlot::Hero,
            ImageSlot::BrandLogo,
            ImageSlot::AboutImage1,
            ImageSlot::AboutImage2,
        ] {
            assert!(slot.select_asset_sql().contains("_asset"));
            assert!(slot.update_sql().contains("updated_at = now()"));
        }
    }

    #[tokio::test]
    async fn test_put_settings_requires_token() {
        let req = Request::put("/api/settings")
            .header("content-type", "application/json")
            .body(Body::from(r#"{"heroTitle": "x"}"#))
            .unwrap();
        let res = settings_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_upload_hero_requires_token() {
        let req = Request::post("/api/settings/hero-image")
            .header("content-type", "multipart/form-data; boundary=X")
            .body(Body::from("--X--\r\n"))
            .unwrap();
        let res = settings_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_get_settings_without_database_returns_unavailable() {
        let req = Request::get("/api/settings").body(Body::empty()).unwrap();
        let res = settings_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
