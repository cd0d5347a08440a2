//! Elegance Events backend - content API for the public site and admin console.

pub mod db;
pub mod logging;
pub mod media;
pub mod routes;

use axum::{
    http::{HeaderValue, Method},
    middleware,
    routing::{get, post, put},
    Router,
};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

/// Configure CORS from environment variables.
/// Uses ALLOWED_ORIGINS (comma-separated) or FRONTEND_ORIGIN.
/// Falls back to the local Vite dev server origins.
pub fn configure_cors() -> CorsLayer {
    let allowed_origins = std::env::var("ALLOWED_ORIGINS")
        .ok()
        .and_then(|s| {
            let origins: Vec<HeaderValue> = s
                .split(',')
                .filter_map(|origin| origin.trim().parse().ok())
                .collect();
            if origins.is_empty() {
                None
            } else {
                Some(origins)
            }
        })
        .or_else(|| {
            std::env::var("FRONTEND_ORIGIN")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(|origin| vec![origin])
        })
        .unwrap_or_else(|| {
            vec![
                "http://localhost:5173".parse().unwrap(),
                "http://127.0.0.1:5173".parse().unwrap(),
            ]
        });

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app() -> Router {
    let cors = configure_cors();
    tracing::info!("CORS configured");

    Router::new()
        .route("/api/auth/register", post(routes::auth::register))
        .route("/api/auth/login", post(routes::auth::login))
        .route("/api/users", get(routes::users::list_users))
        .route("/api/users/{id}/approve", put(routes::users::approve_user))
        .route("/api/users/{id}/block", put(routes::users::block_user))
        .route("/api/users/{id}/unblock", put(routes::users::unblock_user))
        .route("/api/users/{id}/promote", put(routes::users::promote_user))
        .route("/api/users/{id}/demote", put(routes::users::demote_user))
        .route(
            "/api/users/{id}",
            axum::routing::delete(routes::users::delete_user),
        )
        .route(
            "/api/events",
            get(routes::events::list_events).post(routes::events::create_event),
        )
        .route("/api/events/upload-cover", post(routes::events::upload_cover))
        .route(
            "/api/events/{id}",
            get(routes::events::get_event)
                .put(routes::events::update_event)
                .delete(routes::events::delete_event),
        )
        .route("/api/gallery", get(routes::gallery::list_images))
        .route(
            "/api/gallery/{id}",
            post(routes::gallery::upload_image).delete(routes::gallery::delete_image),
        )
        .route(
            "/api/testimonials",
            get(routes::testimonials::list_testimonials)
                .post(routes::testimonials::create_testimonial),
        )
        .route(
            "/api/testimonials/{id}",
            put(routes::testimonials::update_testimonial)
                .delete(routes::testimonials::delete_testimonial),
        )
        .route(
            "/api/categories",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/api/categories/{id}",
            put(routes::categories::update_category).delete(routes::categories::delete_category),
        )
        .route(
            "/api/stats",
            get(routes::stats::list_stats).post(routes::stats::create_stat),
        )
        .route(
            "/api/stats/{id}",
            put(routes::stats::update_stat).delete(routes::stats::delete_stat),
        )
        .route(
            "/api/settings",
            get(routes::settings::get_settings).put(routes::settings::update_settings),
        )
        .route(
            "/api/settings/hero-image",
            post(routes::settings::upload_hero_image),
        )
        .route(
            "/api/settings/brand-logo",
            post(routes::settings::upload_brand_logo),
        )
        .route(
            "/api/settings/about-image-1",
            post(routes::settings::upload_about_image_1),
        )
        .route(
            "/api/settings/about-image-2",
            post(routes::settings::upload_about_image_2),
        )
        .route(
            "/api/about",
            get(routes::about::get_about).put(routes::about::update_about),
        )
        .route("/api/about/upload-hero", post(routes::about::upload_hero))
        .route(
            "/api/contact-page",
            get(routes::contact_page::get_contact_page)
                .put(routes::contact_page::update_contact_page),
        )
        .route(
            "/api/contact",
            get(routes::contact::list_messages).post(routes::contact::create_message),
        )
        .route(
            "/api/contact/{id}/status",
            put(routes::contact::update_status),
        )
        .route(
            "/api/contact/{id}",
            axum::routing::delete(routes::contact::delete_message),
        )
        .route(
            "/api/page-hero/{page_id}",
            get(routes::page_hero::get_page_hero).put(routes::page_hero::update_page_hero),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/api/health", get(routes::health::health_ping))
        .route("/health/database", get(routes::health::health_database))
        .route("/health/ready", get(routes::health::health_ready))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        // Compress responses with gzip/br/zstd automatically
        .layer(CompressionLayer::new())
        // Global 8 MB request body cap; image uploads pass through this layer too
        .layer(RequestBodyLimitLayer::new(8 * 1024 * 1024))
        .layer(cors)
}

/// Run the server (used by main).
pub async fn run() {
    dotenvy::dotenv().ok();

    // Guards MUST be held for the programme's lifetime; dropping them early
    // shuts down background log-writer threads and loses buffered log lines.
    let _log_guards = logging::init();

    routes::health::init_start_time();

    // Refuse to start in production with the insecure default JWT secret.
    let environment = std::env::var("ENVIRONMENT").unwrap_or_default();
    if environment == "production" {
        let secret = std::env::var("JWT_SECRET").unwrap_or_default();
        if secret.is_empty() || secret == "default-jwt-secret-change-in-production" {
            panic!(
                "FATAL: JWT_SECRET must be set to a secure, unique value in production. \
                 Refusing to start with the default secret."
            );
        }
    }

    if std::env::var("DATABASE_URL").is_ok() {
        match db::init_pool(None).await {
            Ok(pool) => {
                if let Err(e) = db::run_migrations(&pool).await {
                    tracing::error!("Failed to run database migrations: {}", e);
                }
                if let Err(e) = db::seed_admin(&pool).await {
                    tracing::error!("Failed to seed admin account: {}", e);
                }
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to initialize database pool: {}. Continuing without database.",
                    e
                );
            }
        }
    } else {
        tracing::info!("DATABASE_URL not set. Running without database connection.");
    }

    let app = create_app();

    // Bind address is configurable via HOST / PORT env vars, defaulting to
    // 127.0.0.1:3001 so existing dev setups keep working unchanged.
    let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(3001);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Invalid HOST/PORT configuration");
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
