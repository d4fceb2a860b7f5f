//! Shipping API Module
//!
//! The flat fee and the store-wide free shipping switch.

mod handler;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/shipping", get(handler::get).put(handler::update))
}
