//! Product API Handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::api::IdQuery;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Query};
use crate::AppState;
use storefront_core::validation::{
    validate_id, validate_optional_text, validate_price_cents, validate_product_name,
    validate_sku, validate_stock, ValidationResult,
};
use storefront_core::Product;

const RESOURCE: &str = "Product";

/// Query params for `GET /api/products`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductQuery {
    pub id: Option<String>,
    pub category: Option<String>,
    /// Back office listing, soft-deleted products included
    #[serde(default)]
    pub include_inactive: bool,
}

/// Body of create and update.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    pub sku: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price_cents: i64,
    pub stock: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ProductInput {
    fn validate(&self) -> ValidationResult<()> {
        validate_sku(self.sku.trim())?;
        validate_product_name(&self.name)?;
        validate_optional_text("description", self.description.as_deref(), 2000)?;
        validate_price_cents(self.price_cents)?;
        validate_stock(self.stock)?;
        validate_optional_text("imageUrl", self.image_url.as_deref(), 500)?;
        validate_optional_text("category", self.category.as_deref(), 80)?;
        Ok(())
    }
}

/// List products, or fetch one with `?id=`
pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<ProductQuery>,
) -> ApiResult<Response> {
    let repo = state.db.products();

    if let Some(id) = query.id.as_deref().map(str::trim) {
        validate_id(id)?;
        let product = repo
            .get_by_id(id)
            .await?
            .filter(|p| p.is_active || query.include_inactive)
            .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
        return Ok(Json(product).into_response());
    }

    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());
    let products = repo.list(query.include_inactive, category).await?;
    Ok(Json(products).into_response())
}

/// Create a product
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    input.validate()?;

    let now = Utc::now();
    let product = Product {
        id: Uuid::new_v4().to_string(),
        sku: input.sku.trim().to_string(),
        name: input.name.trim().to_string(),
        description: input.description,
        price_cents: input.price_cents,
        stock: input.stock,
        image_url: input.image_url,
        category: input.category,
        is_active: input.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    state.db.products().insert(&product).await?;
    info!(id = %product.id, sku = %product.sku, "Product created");

    Ok((StatusCode::CREATED, Json(product)))
}

/// Replace a product's fields
pub async fn update(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    Json(input): Json<ProductInput>,
) -> ApiResult<Json<Product>> {
    let id = query.id()?;
    input.validate()?;

    let repo = state.db.products();
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;

    let product = Product {
        sku: input.sku.trim().to_string(),
        name: input.name.trim().to_string(),
        description: input.description,
        price_cents: input.price_cents,
        stock: input.stock,
        image_url: input.image_url,
        category: input.category,
        is_active: input.is_active.unwrap_or(existing.is_active),
        updated_at: Utc::now(),
        ..existing
    };

    repo.update(&product).await?;
    info!(id = %product.id, "Product updated");

    Ok(Json(product))
}

/// Soft-delete a product
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<StatusCode> {
    let id = query.id()?;
    state.db.products().soft_delete(id).await?;
    info!(id = %id, "Product deactivated");

    Ok(StatusCode::NO_CONTENT)
}
