use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::routes::AppState;

/// GET / - Service banner
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "data": {
            "name": "Research Portal API",
            "version": version,
            "description": "Analytics and reporting over departments, faculty, projects, publications and funding",
            "endpoints": {
                "health": "/health (public)",
                "analytics": "/api/analytics/dashboard, /api/analytics/department/:dept_id, /api/analytics/publications-by-department, /api/analytics/funding-trends (protected)",
                "reports": "/api/reports/publications, /api/reports/faculty, /api/reports/projects (protected)",
                "funding": "/api/funding-sources/summary, /api/funding-sources/:funding_id (protected)",
            }
        }
    }))
}

/// GET /health - Store connectivity probe
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": {
                        "status": "degraded",
                        "timestamp": now
                    }
                })),
            )
        }
    }
}
