//! Promotion API Handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::api::IdQuery;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Query};
use crate::AppState;
use storefront_core::promotion::{normalize_code, resolve};
use storefront_core::validation::{
    validate_coupon_code, validate_id, validate_optional_text, validate_promotion_rule,
};
use storefront_core::{AppliedDiscount, CoreError, DiscountType, Promotion};

const RESOURCE: &str = "Promotion";

#[derive(Debug, Deserialize)]
pub struct PromotionQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ValidateQuery {
    pub code: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromotionInput {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discount_type: DiscountType,
    /// bps for percentage, cents for fixed, 0 for free shipping
    #[serde(default)]
    pub discount_value: i64,
    #[serde(default)]
    pub starts_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_uses: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl PromotionInput {
    /// Validates and returns the normalized code.
    fn validate(&self) -> Result<String, ApiError> {
        let code = normalize_code(&self.code);
        validate_coupon_code(&code)?;
        validate_optional_text("description", self.description.as_deref(), 500)?;
        validate_promotion_rule(
            self.discount_type,
            self.discount_value,
            self.starts_at,
            self.ends_at,
            self.max_uses,
        )?;
        Ok(code)
    }
}

/// Response of a successful coupon check.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponCheck {
    pub valid: bool,
    pub code: String,
    pub description: Option<String>,
    pub discount: AppliedDiscount,
    pub remaining_uses: Option<i64>,
}

pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<PromotionQuery>,
) -> ApiResult<Response> {
    let repo = state.db.promotions();

    if let Some(id) = query.id.as_deref().map(str::trim) {
        validate_id(id)?;
        let promotion = repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
        return Ok(Json(promotion).into_response());
    }

    Ok(Json(repo.list().await?).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<PromotionInput>,
) -> ApiResult<(StatusCode, Json<Promotion>)> {
    let code = input.validate()?;

    let now = Utc::now();
    let promotion = Promotion {
        id: Uuid::new_v4().to_string(),
        code,
        description: input.description,
        discount_type: input.discount_type,
        discount_value: input.discount_value,
        starts_at: input.starts_at,
        ends_at: input.ends_at,
        max_uses: input.max_uses,
        uses: 0,
        is_active: input.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    state.db.promotions().insert(&promotion).await?;
    info!(
        id = %promotion.id,
        code = %promotion.code,
        discount_type = %promotion.discount_type,
        "Promotion created"
    );

    Ok((StatusCode::CREATED, Json(promotion)))
}

/// Replace a coupon's rule; its usage count is kept
pub async fn update(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    Json(input): Json<PromotionInput>,
) -> ApiResult<Json<Promotion>> {
    let id = query.id()?;
    let code = input.validate()?;

    let repo = state.db.promotions();
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;

    let promotion = Promotion {
        code,
        description: input.description,
        discount_type: input.discount_type,
        discount_value: input.discount_value,
        starts_at: input.starts_at,
        ends_at: input.ends_at,
        max_uses: input.max_uses,
        is_active: input.is_active.unwrap_or(existing.is_active),
        updated_at: Utc::now(),
        ..existing
    };

    repo.update(&promotion).await?;
    info!(id = %promotion.id, "Promotion updated");

    Ok(Json(promotion))
}

pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<StatusCode> {
    let id = query.id()?;
    state.db.promotions().delete(id).await?;
    info!(id = %id, "Promotion deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Resolve a coupon code; rejections come back as 422 with a distinct code
pub async fn validate(
    State(state): State<AppState>,
    Query(query): Query<ValidateQuery>,
) -> ApiResult<Json<CouponCheck>> {
    let code = normalize_code(&query.code);
    let found = state.db.promotions().get_by_code(&code).await?;
    let discount = resolve(found.as_ref(), Utc::now()).map_err(CoreError::from)?;

    // resolve() only succeeds on a found row
    let promotion = found.ok_or_else(|| ApiError::not_found(RESOURCE, &code))?;

    let remaining_uses = promotion.remaining_uses();
    Ok(Json(CouponCheck {
        valid: true,
        code: promotion.code,
        description: promotion.description,
        discount,
        remaining_uses,
    }))
}
