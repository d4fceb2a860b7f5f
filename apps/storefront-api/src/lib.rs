//! # Storefront API
//!
//! REST server for the storefront and its admin back office.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Storefront API                                  │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  Router (axum)   CORS · TraceLayer · body limit                  │  │
//! │  │                                                                  │  │
//! │  │  /api/health          /api/products       /api/admins            │  │
//! │  │  /api/bank-accounts   /api/promotions     /api/shipping          │  │
//! │  │  /api/cart/quote      /api/orders         /api/orders/receipt    │  │
//! │  └───────────────────────────────┬──────────────────────────────────┘  │
//! │                                  │                                      │
//! │  ┌───────────────────────────────▼──────────────────────────────────┐  │
//! │  │  services::checkout  (cart pricing, order placement)             │  │
//! │  └───────────────────────────────┬──────────────────────────────────┘  │
//! │                                  │                                      │
//! │  ┌───────────────┐  ┌────────────▼─────────┐  ┌──────────────────────┐ │
//! │  │ storefront-   │  │  storefront-db       │  │  upload_dir          │ │
//! │  │ core (pricing,│  │  (SQLite, repos,     │  │  (receipt files)     │ │
//! │  │ rules)        │  │   transactions)      │  │                      │ │
//! │  └───────────────┘  └──────────────────────┘  └──────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::AppConfig`]; every key can be overridden with a
//! `STOREFRONT_*` environment variable.

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::AppConfig;
use storefront_db::Database;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db: Database, config: AppConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}

/// Builds the full router with middleware.
pub fn app(state: AppState) -> Router {
    // Room for multipart framing around the largest accepted receipt
    let body_limit = state.config.max_upload_bytes + 64 * 1024;

    Router::new()
        .merge(api::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
