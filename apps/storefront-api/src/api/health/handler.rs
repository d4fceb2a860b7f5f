//! Health check endpoint

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::AppState;

/// Liveness plus a `SELECT 1` against the database.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let database = state.db.health_check().await;
    let (status, label) = if database {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(serde_json::json!({
            "status": label,
            "service": "storefront-api",
            "database": database,
            "version": env!("CARGO_PKG_VERSION"),
        })),
    )
}
