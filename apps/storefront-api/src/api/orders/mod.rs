//! Order API Module
//!
//! ```text
//! POST /api/orders            online checkout      ──► pending / pending
//! POST /api/orders/in-store   counter sale         ──► completed / paid
//! PUT  /api/orders?id=        status, payment status (validated transitions)
//! POST /api/orders/receipt    transfer receipt upload (multipart)
//! GET  /api/orders            list, filters, or ?id= detail
//! ```

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/orders",
            get(handler::get).post(handler::create).put(handler::update),
        )
        .route("/api/orders/in-store", post(handler::create_in_store))
        .route("/api/orders/receipt", post(handler::upload_receipt))
}
