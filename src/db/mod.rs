pub mod models;

use bcrypt::{hash, DEFAULT_COST};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use tokio::sync::OnceCell;

static DB_POOL: OnceCell<Arc<PgPool>> = OnceCell::const_new();

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgresql://localhost/elegance".to_string()),
            max_connections: std::env::var("DB_POOL_MAX")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            min_connections: std::env::var("DB_POOL_MIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(2),
            connect_timeout_secs: std::env::var("DB_CONNECT_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            idle_timeout_secs: std::env::var("DB_IDLE_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(300),
        }
    }
}

pub async fn init_pool(config: Option<DbConfig>) -> Result<Arc<PgPool>, sqlx::Error> {
    let config = config.unwrap_or_default();

    tracing::info!("Initializing database connection pool...");
    tracing::debug!(
        "Database URL: {}",
        config.url.replace(
            |c: char| !c.is_ascii_alphanumeric() && c != ':' && c != '/' && c != '@' && c != '.',
            "*"
        )
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(std::time::Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    let pool = Arc::new(pool);
    let _ = DB_POOL.set(pool.clone());

    Ok(pool)
}

pub fn get_pool() -> Option<Arc<PgPool>> {
    DB_POOL.get().cloned()
}

pub async fn health_check() -> Result<std::time::Duration, sqlx::Error> {
    let pool = get_pool()
        .ok_or_else(|| sqlx::Error::Configuration("Database pool not initialized".into()))?;

    let start = std::time::Instant::now();
    sqlx::query("SELECT 1").fetch_one(pool.as_ref()).await?;

    Ok(start.elapsed())
}

/// Idempotent schema, one SQL command per entry. Each statement goes through
/// the extended query protocol, and a prepared statement cannot contain more
/// than one command, so these must never be batched with semicolons.
const MIGRATION_STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        email TEXT UNIQUE NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'USER',
        status TEXT NOT NULL DEFAULT 'PENDING',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)",
    "CREATE INDEX IF NOT EXISTS idx_users_status ON users(status)",
    r#"
    CREATE TABLE IF NOT EXISTS events (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        title TEXT NOT NULL,
        description TEXT NOT NULL,
        category TEXT NOT NULL,
        date TIMESTAMPTZ NOT NULL,
        cover_image TEXT NOT NULL DEFAULT '',
        client TEXT NOT NULL DEFAULT '',
        featured BOOLEAN NOT NULL DEFAULT false,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_events_created_at ON events(created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_events_featured ON events(featured)",
    r#"
    CREATE TABLE IF NOT EXISTS gallery_images (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        image_url TEXT NOT NULL,
        asset_id TEXT NOT NULL DEFAULT '',
        event_id UUID REFERENCES events(id) ON DELETE SET NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_gallery_images_event_id ON gallery_images(event_id)",
    r#"
    CREATE TABLE IF NOT EXISTS testimonials (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT '',
        message TEXT NOT NULL,
        rating INTEGER,
        featured BOOLEAN NOT NULL DEFAULT false,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS categories (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        slug TEXT UNIQUE NOT NULL,
        sort_order INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stats (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        label TEXT NOT NULL,
        value TEXT NOT NULL,
        page TEXT NOT NULL DEFAULT 'HOME',
        sort_order INTEGER NOT NULL DEFAULT 0
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_stats_page ON stats(page)",
    r#"
    CREATE TABLE IF NOT EXISTS site_settings (
        id TEXT PRIMARY KEY,
        brand_logo TEXT NOT NULL DEFAULT '',
        brand_logo_asset TEXT NOT NULL DEFAULT '',
        brand_subtitle TEXT NOT NULL DEFAULT '',
        hero_badge TEXT NOT NULL DEFAULT '',
        hero_title TEXT NOT NULL DEFAULT '',
        hero_subtitle TEXT NOT NULL DEFAULT '',
        hero_image TEXT NOT NULL DEFAULT '',
        hero_image_asset TEXT NOT NULL DEFAULT '',
        about_heading TEXT NOT NULL DEFAULT '',
        about_text TEXT NOT NULL DEFAULT '',
        about_image1 TEXT NOT NULL DEFAULT '',
        about_image1_asset TEXT NOT NULL DEFAULT '',
        about_image2 TEXT NOT NULL DEFAULT '',
        about_image2_asset TEXT NOT NULL DEFAULT '',
        portfolio_title TEXT NOT NULL DEFAULT '',
        portfolio_subtitle TEXT NOT NULL DEFAULT '',
        portfolio_description TEXT NOT NULL DEFAULT '',
        testimonial_title TEXT NOT NULL DEFAULT '',
        testimonial_subtitle TEXT NOT NULL DEFAULT '',
        cta_title TEXT NOT NULL DEFAULT '',
        cta_subtitle TEXT NOT NULL DEFAULT '',
        privacy_policy_html TEXT NOT NULL DEFAULT '',
        terms_html TEXT NOT NULL DEFAULT '',
        contact_email TEXT NOT NULL DEFAULT '',
        contact_phone TEXT NOT NULL DEFAULT '',
        address TEXT NOT NULL DEFAULT '',
        social_links JSONB NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS about_page (
        id TEXT PRIMARY KEY,
        hero_title TEXT NOT NULL DEFAULT '',
        hero_subtitle TEXT NOT NULL DEFAULT '',
        hero_image TEXT NOT NULL DEFAULT '',
        hero_image_asset TEXT NOT NULL DEFAULT '',
        story_title TEXT NOT NULL DEFAULT '',
        story_content TEXT NOT NULL DEFAULT '',
        vision TEXT NOT NULL DEFAULT '',
        mission TEXT NOT NULL DEFAULT '',
        values_section_title TEXT NOT NULL DEFAULT '',
        values_section_subtitle TEXT NOT NULL DEFAULT '',
        core_values JSONB NOT NULL DEFAULT '[]',
        years_experience INTEGER NOT NULL DEFAULT 0,
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contact_page (
        id TEXT PRIMARY KEY,
        badge TEXT NOT NULL DEFAULT '',
        title TEXT NOT NULL DEFAULT '',
        subtitle TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        address TEXT NOT NULL DEFAULT '',
        event_types JSONB NOT NULL DEFAULT '[]',
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS page_heroes (
        id TEXT PRIMARY KEY,
        badge TEXT NOT NULL DEFAULT '',
        title TEXT NOT NULL DEFAULT '',
        subtitle TEXT NOT NULL DEFAULT '',
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS contact_messages (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name TEXT NOT NULL,
        email TEXT NOT NULL,
        phone TEXT,
        event_type TEXT,
        message TEXT NOT NULL,
        status TEXT NOT NULL DEFAULT 'NEW',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_contact_messages_created_at \
     ON contact_messages(created_at DESC)",
    "CREATE INDEX IF NOT EXISTS idx_contact_messages_status ON contact_messages(status)",
];

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    for statement in MIGRATION_STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    tracing::info!("Database migrations completed successfully");

    Ok(())
}

/// Insert the bootstrap admin account when ADMIN_EMAIL is configured and no
/// user with that email exists yet. Replaces a separate seed script: the
/// account is created APPROVED/ADMIN so the console is reachable on first run.
pub async fn seed_admin(pool: &PgPool) -> Result<(), sqlx::Error> {
    let email = match std::env::var("ADMIN_EMAIL") {
        Ok(e) if !e.is_empty() => e,
        _ => {
            tracing::debug!("ADMIN_EMAIL not set; skipping admin seed");
            return Ok(());
        }
    };

    let existing: Option<(uuid::Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?;

    if existing.is_some() {
        tracing::debug!("Admin account already exists: {}", email);
        return Ok(());
    }

    let password_hash = if let Ok(h) = std::env::var("ADMIN_HASH_PASSWORD") {
        h
    } else if let Ok(plain) = std::env::var("ADMIN_PASSWORD") {
        match tokio::task::spawn_blocking(move || hash(&plain, DEFAULT_COST)).await {
            Ok(Ok(h)) => h,
            _ => {
                tracing::error!("Failed to hash ADMIN_PASSWORD; skipping admin seed");
                return Ok(());
            }
        }
    } else {
        tracing::warn!(
            "ADMIN_EMAIL is set but neither ADMIN_HASH_PASSWORD nor ADMIN_PASSWORD is. \
             Skipping admin seed."
        );
        return Ok(());
    };

    sqlx::query(
        r#"
        INSERT INTO users (email, password_hash, role, status)
        VALUES ($1, $2, 'ADMIN', 'APPROVED')
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .execute(pool)
    .await?;

    tracing::info!("Seeded admin account: {}", email);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_config_default_uses_env_or_fallback() {
        let config = DbConfig::default();
        assert!(config.max_connections >= 1);
        assert!(config.connect_timeout_secs >= 1);
        assert!(config.idle_timeout_secs >= 1);
        assert!(!config.url.is_empty());
    }

    #[test]
    fn test_migration_statements_are_single_commands() {
        // The extended query protocol prepares each statement and rejects
        // anything containing more than one command, so a semicolon anywhere
        // in an entry would abort the schema setup partway through.
        for statement in MIGRATION_STATEMENTS {
            assert!(
                !statement.contains(';'),
                "statement must be a single command: {}",
                statement
            );
            assert!(!statement.trim().is_empty());
        }
    }

    #[test]
    fn test_migration_statements_cover_every_table() {
        let joined = MIGRATION_STATEMENTS.join("\n");
        for table in [
            "users",
            "events",
            "gallery_images",
            "testimonials",
            "categories",
            "stats",
            "site_settings",
            "about_page",
            "contact_page",
            "page_heroes",
            "contact_messages",
        ] {
            assert!(
                joined.contains(&format!("CREATE TABLE IF NOT EXISTS {}", table)),
                "missing table: {}",
                table
            );
        }
    }

    #[test]
    fn test_get_pool_none_before_init() {
        let pool = get_pool();
        assert!(pool.is_none());
    }

    #[tokio::test]
    async fn test_health_check_fails_without_pool() {
        let result = health_check().await;
        assert!(result.is_err());
    }
}
