/**
 * Stat Routes
 * Small labelled figures ("500+", "4.9") shown on the home, about, and
 * testimonials pages. Values are free-form strings on purpose.
 */
use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, models::Stat};
use crate::routes::{
    bad_request, db_unavailable, internal_error, not_found, require_admin, SuccessResponse,
};

const VALID_PAGES: &[&str] = &["HOME", "ABOUT", "TESTIMONIALS"];

const COLUMNS: &str = "id, label, value, page, sort_order";

fn is_valid_page(page: &str) -> bool {
    VALID_PAGES.contains(&page)
}

#[derive(Debug, Deserialize)]
pub struct StatListQuery {
    pub page: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateStatRequest {
    pub label: String,
    pub value: String,
    pub page: String,
    #[serde(default)]
    pub order: Option<i32>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatRequest {
    pub label: Option<String>,
    pub value: Option<String>,
    pub page: Option<String>,
    pub order: Option<i32>,
}

/// GET /api/stats?page=HOME (public)
pub async fn list_stats(Query(query): Query<StatListQuery>) -> impl IntoResponse {
    if let Some(ref page) = query.page {
        if !is_valid_page(page) {
            return bad_request("Invalid page. Valid pages: HOME, ABOUT, TESTIMONIALS")
                .into_response();
        }
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let result: Result<Vec<Stat>, sqlx::Error> = if let Some(page) = query.page {
        sqlx::query_as(&format!(
            "SELECT {} FROM stats WHERE page = $1 ORDER BY sort_order ASC",
            COLUMNS
        ))
        .bind(page)
        .fetch_all(pool.as_ref())
        .await
    } else {
        sqlx::query_as(&format!(
            "SELECT {} FROM stats ORDER BY page ASC, sort_order ASC",
            COLUMNS
        ))
        .fetch_all(pool.as_ref())
        .await
    };

    match result {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => {
            tracing::error!("Database error listing stats: {}", e);
            internal_error().into_response()
        }
    }
}

/// POST /api/stats (admin)
pub async fn create_stat(
    headers: HeaderMap,
    Json(payload): Json<CreateStatRequest>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    if payload.label.trim().is_empty() {
        return bad_request("Label is required").into_response();
    }
    if payload.value.trim().is_empty() {
        return bad_request("Value is required").into_response();
    }
    if !is_valid_page(&payload.page) {
        return bad_request("Invalid page. Valid pages: HOME, ABOUT, TESTIMONIALS").into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query_as::<_, Stat>(&format!(
        r#"
        INSERT INTO stats (label, value, page, sort_order)
        VALUES ($1, $2, $3, $4)
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(&payload.label)
    .bind(&payload.value)
    .bind(&payload.page)
    .bind(payload.order.unwrap_or(0))
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(stat) => (StatusCode::CREATED, Json(stat)).into_response(),
        Err(e) => {
            tracing::error!("Database error creating stat: {}", e);
            internal_error().into_response()
        }
    }
}

/// PUT /api/stats/{id} - partial overwrite (admin).
pub async fn update_stat(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatRequest>,
) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    if let Some(ref page) = payload.page {
        if !is_valid_page(page) {
            return bad_request("Invalid page. Valid pages: HOME, ABOUT, TESTIMONIALS")
                .into_response();
        }
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    let existing: Option<Stat> =
        match sqlx::query_as(&format!("SELECT {} FROM stats WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(pool.as_ref())
            .await
        {
            Ok(s) => s,
            Err(e) => {
                tracing::error!("Database error fetching stat: {}", e);
                return internal_error().into_response();
            }
        };

    let existing = match existing {
        Some(s) => s,
        None => return not_found().into_response(),
    };

    let label = payload.label.unwrap_or(existing.label);
    let value = payload.value.unwrap_or(existing.value);
    let page = payload.page.unwrap_or(existing.page);
    let sort_order = payload.order.unwrap_or(existing.sort_order);

    match sqlx::query_as::<_, Stat>(&format!(
        r#"
        UPDATE stats
        SET label = $1, value = $2, page = $3, sort_order = $4
        WHERE id = $5
        RETURNING {}
        "#,
        COLUMNS
    ))
    .bind(&label)
    .bind(&value)
    .bind(&page)
    .bind(sort_order)
    .bind(id)
    .fetch_one(pool.as_ref())
    .await
    {
        Ok(stat) => (StatusCode::OK, Json(stat)).into_response(),
        Err(e) => {
            tracing::error!("Database error updating stat: {}", e);
            internal_error().into_response()
        }
    }
}

/// DELETE /api/stats/{id} (admin)
pub async fn delete_stat(headers: HeaderMap, Path(id): Path<Uuid>) -> impl IntoResponse {
    if let Err(rejection) = require_admin(&headers) {
        return rejection.into_response();
    }

    let pool = match db::get_pool() {
        Some(p) => p,
        None => return db_unavailable().into_response(),
    };

    match sqlx::query("DELETE FROM stats WHERE id = $1")
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
            tracing::error!("Database error deleting stat: {}", e);
            internal_error().into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::auth::create_access_token;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    fn stats_router() -> Router {
        Router::new().route("/api/stats", get(list_stats).post(create_stat))
    }

    #[test]
    fn test_page_validation() {
        assert!(is_valid_page("HOME"));
        assert!(is_valid_page("ABOUT"));
        assert!(is_valid_page("TESTIMONIALS"));
        assert!(!is_valid_page("home"));
        assert!(!is_valid_page("FOOTER"));
    }

    #[tokio::test]
    async fn test_list_invalid_page_returns_bad_request() {
        let req = Request::get("/api/stats?page=FOOTER")
            .body(Body::empty())
            .unwrap();
        let res = stats_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_invalid_page_returns_bad_request() {
        let token = create_access_token(
            "33333333-3333-3333-3333-333333333333",
            "admin@x.com",
            "ADMIN",
            "APPROVED",
        )
        .unwrap();
        let body = serde_json::json!({"label": "Events", "value": "500+", "page": "SIDEBAR"});
        let req = Request::post("/api/stats")
            .header("content-type", "application/json")
            .header("authorization", format!("Bearer {}", token))
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let res = stats_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_create_requires_token() {
        let body = serde_json::json!({"label": "Events", "value": "500+", "page": "HOME"});
        let req = Request::post("/api/stats")
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap();
        let res = stats_router().oneshot(req).await.unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
