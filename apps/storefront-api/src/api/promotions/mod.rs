//! Promotion API Module
//!
//! Coupon management plus a read-only resolver the cart page calls before
//! checkout. Resolving never counts a use; placing the order does.

mod handler;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/promotions",
            get(handler::get)
                .post(handler::create)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/api/promotions/validate", get(handler::validate))
}
