//! Order API Handlers

use std::path::Path;
use std::str::FromStr;

use axum::body::Bytes;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::api::IdQuery;
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Query};
use crate::services::checkout::{self, CheckoutRequest, InStoreSaleRequest};
use crate::AppState;
use storefront_core::validation::validate_id;
use storefront_core::{
    Order, OrderDetail, OrderStatus, PaymentStatus, ValidationError,
};
use storefront_db::{OrderFilter, StatusUpdate};

const RESOURCE: &str = "Order";

/// Receipt file types accepted for bank transfers.
const RECEIPT_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "pdf"];

/// Query params for `GET /api/orders`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderQuery {
    pub id: Option<String>,
    pub status: Option<String>,
    pub email: Option<String>,
    pub in_store: Option<bool>,
    pub limit: Option<i64>,
}

/// Body of `PUT /api/orders?id=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdateRequest {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

/// List orders, or fetch one order with items and pricing via `?id=`
pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Response> {
    let repo = state.db.orders();

    if let Some(id) = query.id.as_deref().map(str::trim) {
        validate_id(id)?;
        let detail = repo
            .get_detail(id)
            .await?
            .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
        return Ok(Json(detail).into_response());
    }

    let status = query
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(OrderStatus::from_str)
        .transpose()?;

    let filter = OrderFilter {
        status,
        email: query.email.filter(|e| !e.trim().is_empty()),
        is_in_store: query.in_store,
        limit: query.limit.map(|l| l.clamp(1, 1000)),
    };

    Ok(Json(repo.list(&filter).await?).into_response())
}

/// Online checkout
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CheckoutRequest>,
) -> ApiResult<(StatusCode, Json<OrderDetail>)> {
    let detail = checkout::place_order(&state, request).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Counter sale
pub async fn create_in_store(
    State(state): State<AppState>,
    Json(request): Json<InStoreSaleRequest>,
) -> ApiResult<(StatusCode, Json<OrderDetail>)> {
    let detail = checkout::register_in_store_sale(&state, request).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Change order status and/or payment status
pub async fn update(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    Json(request): Json<StatusUpdateRequest>,
) -> ApiResult<Json<OrderDetail>> {
    let id = query.id()?;

    if request.status.is_none() && request.payment_status.is_none() {
        return Err(ValidationError::required("status or paymentStatus").into());
    }

    let repo = state.db.orders();
    let order = repo
        .update_status(
            id,
            StatusUpdate {
                status: request.status,
                payment_status: request.payment_status,
            },
        )
        .await?;
    let items = repo.get_items(&order.id).await?;

    Ok(Json(OrderDetail::new(order, items)))
}

/// Attach a bank transfer receipt (image or PDF) to an order
///
/// Expects a multipart form with a `file` (or `receipt`) field.
pub async fn upload_receipt(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    mut multipart: Multipart,
) -> ApiResult<Json<Order>> {
    let id = query.id()?;
    let repo = state.db.orders();
    let order = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;

    if order.status == OrderStatus::Cancelled {
        return Err(ApiError::BusinessRule {
            code: "RECEIPT_NOT_ACCEPTED",
            message: "Cancelled orders do not accept receipts".to_string(),
        });
    }

    let mut upload: Option<(String, Bytes)> = None;
    while let Some(field) = multipart.next_field().await? {
        if !matches!(field.name(), Some("file") | Some("receipt")) {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::to_string)
            .ok_or_else(|| ApiError::Validation("Receipt file name is required".to_string()))?;
        let data = field.bytes().await?;
        upload = Some((file_name, data));
        break;
    }

    let (file_name, data) =
        upload.ok_or_else(|| ValidationError::required("file"))?;

    if data.is_empty() {
        return Err(ApiError::Validation("Receipt file is empty".to_string()));
    }
    if data.len() > state.config.max_upload_bytes {
        return Err(ApiError::TooLarge(format!(
            "Receipt exceeds {} bytes",
            state.config.max_upload_bytes
        )));
    }

    let extension = receipt_extension(&file_name)?;
    let stored_name = format!("{}-{}.{}", order.id, Uuid::new_v4(), extension);

    let upload_dir = &state.config.upload_dir;
    tokio::fs::create_dir_all(upload_dir)
        .await
        .map_err(|e| ApiError::Internal(format!("Failed to create upload dir: {}", e)))?;
    tokio::fs::write(upload_dir.join(&stored_name), &data)
        .await
        .map_err(|e| {
            error!(file = %stored_name, "Failed to store receipt");
            ApiError::Internal(format!("Failed to write receipt: {}", e))
        })?;

    let updated = repo.set_receipt(&order.id, &stored_name).await?;

    // The order now points at the new file; drop the one it replaced
    if let Some(previous) = order.receipt_path.as_deref() {
        remove_receipt(upload_dir, previous).await;
    }

    info!(
        order_number = %updated.order_number,
        file = %stored_name,
        bytes = data.len(),
        "Receipt uploaded"
    );

    Ok(Json(updated))
}

/// Best-effort removal of a stored receipt. Only bare file names inside
/// `upload_dir` are touched.
async fn remove_receipt(upload_dir: &Path, stored_name: &str) {
    let Some(file_name) = Path::new(stored_name).file_name() else {
        return;
    };
    if let Err(e) = tokio::fs::remove_file(upload_dir.join(file_name)).await {
        warn!(file = %stored_name, error = %e, "Failed to remove replaced receipt");
    }
}

/// Lower-cased extension of an accepted receipt file.
fn receipt_extension(file_name: &str) -> Result<String, ValidationError> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .filter(|ext| RECEIPT_EXTENSIONS.contains(&ext.as_str()))
        .ok_or_else(|| ValidationError::NotAllowed {
            field: "file".to_string(),
            allowed: RECEIPT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_receipt_extension() {
        assert_eq!(receipt_extension("transfer.PDF").unwrap(), "pdf");
        assert_eq!(receipt_extension("photo.final.jpeg").unwrap(), "jpeg");
        assert!(receipt_extension("receipt").is_err());
        assert!(receipt_extension("script.js").is_err());
    }
}
