//! Shipping API Handlers

use axum::extract::State;

use crate::error::ApiResult;
use crate::extract::Json;
use crate::services::checkout;
use crate::AppState;
use storefront_core::validation::validate_shipping_fee_cents;
use storefront_core::ShippingConfig;

/// Current configuration; the configured default fee until one is saved
pub async fn get(State(state): State<AppState>) -> ApiResult<Json<ShippingConfig>> {
    Ok(Json(checkout::shipping_config(&state).await?))
}

pub async fn update(
    State(state): State<AppState>,
    Json(input): Json<ShippingConfig>,
) -> ApiResult<Json<ShippingConfig>> {
    validate_shipping_fee_cents(input.fee_cents)?;

    let saved = state.db.promotions().save_shipping_config(&input).await?;
    Ok(Json(saved))
}
