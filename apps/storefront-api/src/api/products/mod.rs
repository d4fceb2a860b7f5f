//! Product API Module
//!
//! Catalog management. Deleting a product only hides it; order history keeps
//! pointing at it.

mod handler;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/products",
        get(handler::get)
            .post(handler::create)
            .put(handler::update)
            .delete(handler::delete),
    )
}
