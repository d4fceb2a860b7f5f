//! HTTP routes, one module per resource.
//!
//! Every resource module exposes `router()`; handlers live in its
//! `handler.rs`. Single records are addressed with a `?id=` query parameter.

pub mod admins;
pub mod bank_accounts;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod promotions;
pub mod shipping;

use axum::Router;
use serde::Deserialize;

use crate::error::ApiError;
use crate::AppState;
use storefront_core::validation::validate_id;

/// All API routes.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(products::router())
        .merge(admins::router())
        .merge(bank_accounts::router())
        .merge(promotions::router())
        .merge(shipping::router())
        .merge(cart::router())
        .merge(orders::router())
}

/// Required `?id=` parameter of PUT/DELETE routes.
#[derive(Debug, Deserialize)]
pub struct IdQuery {
    pub id: String,
}

impl IdQuery {
    /// The trimmed id, rejected unless it is a UUID.
    pub fn id(&self) -> Result<&str, ApiError> {
        let id = self.id.trim();
        validate_id(id)?;
        Ok(id)
    }
}
