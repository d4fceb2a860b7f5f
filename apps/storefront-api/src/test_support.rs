//! Fixtures for handler and service tests.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::{app, AppState};
use storefront_core::{BankAccount, DiscountType, Product, Promotion};
use storefront_db::{Database, DbConfig};

/// State backed by a fresh in-memory database and a private upload dir.
pub async fn test_state() -> AppState {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let config = AppConfig {
        database_path: ":memory:".to_string(),
        upload_dir: std::env::temp_dir().join(format!("storefront-test-{}", Uuid::new_v4())),
        ..AppConfig::default()
    };
    AppState::new(db, config)
}

pub async fn test_app() -> (Router, AppState) {
    let state = test_state().await;
    (app(state.clone()), state)
}

pub async fn seed_product(state: &AppState, sku: &str, price_cents: i64, stock: i64) -> Product {
    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        sku: sku.to_string(),
        name: format!("Product {}", sku),
        description: None,
        price_cents,
        stock,
        image_url: None,
        category: Some("home".to_string()),
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.products().insert(&product).await.unwrap();
    product
}

pub async fn seed_coupon(
    state: &AppState,
    code: &str,
    discount_type: DiscountType,
    value: i64,
) -> Promotion {
    let now = Utc::now();
    let promotion = Promotion {
        id: Uuid::new_v4().to_string(),
        code: code.to_string(),
        description: None,
        discount_type,
        discount_value: value,
        starts_at: None,
        ends_at: None,
        max_uses: None,
        uses: 0,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.promotions().insert(&promotion).await.unwrap();
    promotion
}

pub async fn seed_bank_account(state: &AppState) -> BankAccount {
    let now = Utc::now();
    let account = BankAccount {
        id: Uuid::new_v4().to_string(),
        bank_name: "BBVA".to_string(),
        account_holder: "Tienda Norte SA".to_string(),
        account_number: "0123 4567 8901".to_string(),
        routing_code: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.db.bank_accounts().insert(&account).await.unwrap();
    account
}

/// Sends one request through the router and decodes the JSON response.
///
/// An empty body decodes to `Value::Null`.
pub async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}
