//! Health API Module

mod handler;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(handler::health_check))
}
