//! Cart API Handlers

use axum::extract::State;

use crate::error::ApiResult;
use crate::extract::Json;
use crate::services::checkout::{self, CartQuote, CartRequest};
use crate::AppState;

/// Price a cart with an optional coupon
pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<CartRequest>,
) -> ApiResult<Json<CartQuote>> {
    Ok(Json(checkout::quote(&state, &request).await?))
}
