//! Database models - structs representing database tables (used by sqlx/serde).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User account. The password hash never leaves this module boundary as JSON;
/// handlers project into [`UserPublic`] instead.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

/// Public-safe user projection returned by the API.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPublic {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub cover_image: String,
    pub client: String,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImage {
    pub id: Uuid,
    pub image_url: String,
    pub asset_id: String,
    pub event_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: Uuid,
    pub name: String,
    pub role: String,
    pub message: String,
    pub rating: Option<i32>,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub sort_order: i32,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stat {
    pub id: Uuid,
    pub label: String,
    pub value: String,
    pub page: String,
    pub sort_order: i32,
}

/// Singleton site settings row, always keyed by the fixed id `"settings"`.
/// The `*_asset` columns hold the media store identifier for each uploaded
/// image so cleanup never has to parse URLs.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub id: String,
    pub brand_logo: String,
    pub brand_logo_asset: String,
    pub brand_subtitle: String,
    pub hero_badge: String,
    pub hero_title: String,
    pub hero_subtitle: String,
    pub hero_image: String,
    pub hero_image_asset: String,
    pub about_heading: String,
    pub about_text: String,
    pub about_image1: String,
    pub about_image1_asset: String,
    pub about_image2: String,
    pub about_image2_asset: String,
    pub portfolio_title: String,
    pub portfolio_subtitle: String,
    pub portfolio_description: String,
    pub testimonial_title: String,
    pub testimonial_subtitle: String,
    pub cta_title: String,
    pub cta_subtitle: String,
    pub privacy_policy_html: String,
    pub terms_html: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub address: String,
    pub social_links: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Singleton about page row, fixed id `"about"`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AboutPage {
    pub id: String,
    pub hero_title: String,
    pub hero_subtitle: String,
    pub hero_image: String,
    pub hero_image_asset: String,
    pub story_title: String,
    pub story_content: String,
    pub vision: String,
    pub mission: String,
    pub values_section_title: String,
    pub values_section_subtitle: String,
    #[serde(rename = "values")]
    pub core_values: serde_json::Value,
    pub years_experience: i32,
    pub updated_at: DateTime<Utc>,
}

/// Singleton contact page row, fixed id `"contact"`.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPage {
    pub id: String,
    pub badge: String,
    pub title: String,
    pub subtitle: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub event_types: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Per-page hero copy, keyed by an uppercase page id (WORKS, GALLERY, ...).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageHero {
    pub id: String,
    pub badge: String,
    pub title: String,
    pub subtitle: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub event_type: Option<String>,
    pub message: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
