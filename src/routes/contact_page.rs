/**
 * Contact Page Routes
 * Singleton row (fixed id "contact") holding the copy and the selectable
 * event types shown on the public contact form.
 */
use axum::{
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::db::{self, models::ContactPage};
use crate::routes::{db_unavailable, internal_error, require_admin};

pub const CONTACT_PAGE_ID: &str = "contact";

const COLUMNS: &str = "id, badge, title, subtitle, email, phone, address, event_types, updated_at";

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateContactPageRequest {
    pub badge: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub event_types: Option<serde_json::Value>,
}

pub async fn fetch_or_seed(pool: &PgPool) -> Result<ContactPage, sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO contact_page (id, badge, title, subtitle)
        VALUES ($1, 'Get in Touch', 'Contact Us', 'Tell us about your event')
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(CONTACT_PAGE_ID)
    .execute(pool)
    .await?;

    sqlx::query_as(&format!(
        "SELECT {} FROM contact_page WHERE id = $1",
        COLUMNS
    ))
    .bind(CONTACT_PAGE_ID)
    .fetch_one(pool)
    .await
}

/// GET /api/contact-page (public)
pub async fn get_contact_page() -> impl IntoResponse {
    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match fetch_or_seed(pool.as_ref()).await {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => {
            tracing::error!("Database error loading contact page: {}", e);
            internal_error().into_response()
        }
    }
}

/// PUT /api/contact-page (admin). Omitted fields keep their current value.
pub async fn update_contact_page(
    headers: HeaderMap,
    Json(payload): Json<UpdateContactPageRequest>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let current = match fetch_or_seed(pool.as_ref()).await {
        Ok(p) => p,
        Err(e) => {
            tracing::error!("Database error loading contact page: {}", e);
            return internal_error().into_response();
        }
    };

    match sqlx::query_as::<_, ContactPage>(&format!(
        r#"
        UPDATE contact_page SET
            badge = $1, title = $2, subtitle = $3, email = $4, phone = $5,
            address = $6, event_types = $7, updated_at = now()
        WHERE id = $8
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(payload.badge.unwrap_or(current.badge))
    .bind(payload.title.unwrap_or(current.title))
    .bind(payload.subtitle.unwrap_or(current.subtitle))
    .bind(payload.email.unwrap_or(current.email))
    .bind(payload.phone.unwrap_or(current.phone))
    .bind(payload.address.unwrap_or(current.address))
    .bind(payload.event_types.unwrap_or(current.event_types))
    .bind(CONTACT_PAGE_ID)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(page) => (StatusCode::OK, Json(page)).into_response(),
        Err(e) => {
            tracing::error!("Database error updating contact page: {}", e);
            internal_error().into_response()
        }
    }
}
