//! API error type and its HTTP mapping.
//!
//! ```text
//! ValidationError ──► CoreError ──► DbError ──► ApiError ──► HTTP response
//!   (pure rules)      (domain)      (sqlx)       (status + JSON body)
//! ```
//!
//! | Variant       | Status | `error` code                          |
//! |---------------|--------|---------------------------------------|
//! | Validation    | 400    | VALIDATION_ERROR                      |
//! | Unauthorized  | 401    | UNAUTHORIZED                          |
//! | NotFound      | 404    | NOT_FOUND                             |
//! | Conflict      | 409    | CONFLICT                              |
//! | TooLarge      | 413    | PAYLOAD_TOO_LARGE                     |
//! | BusinessRule  | 422    | INSUFFICIENT_STOCK, COUPON_EXPIRED, … |
//! | Internal      | 500    | INTERNAL_ERROR                        |
//!
//! Body: `{ "status": 422, "message": "coupon has expired", "error": "COUPON_EXPIRED" }`

use axum::extract::multipart::MultipartError;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

use storefront_core::{CoreError, ValidationError};
use storefront_db::DbError;

/// Serialized error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: u16,
    pub message: String,
    pub error: &'static str,
}

/// Storefront API errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    TooLarge(String),

    /// A request that is well-formed but breaks a business rule.
    #[error("{message}")]
    BusinessRule { code: &'static str, message: String },

    /// Never shown to the client; logged instead.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result alias for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::TooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::BusinessRule { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::TooLarge(_) => "PAYLOAD_TOO_LARGE",
            ApiError::BusinessRule { code, .. } => *code,
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn not_found(entity: &str, id: &str) -> Self {
        ApiError::NotFound(format!("{} not found: {}", entity, id))
    }

    /// Same message for unknown email and wrong password.
    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized("Invalid email or password".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let message = match &self {
            ApiError::Internal(detail) => {
                error!(error = %detail, "Internal error occurred");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorBody {
            status: status.as_u16(),
            message,
            error: self.code(),
        };

        (status, Json(body)).into_response()
    }
}

// =============================================================================
// Conversions
// =============================================================================

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        ApiError::Validation(e.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        let message = e.to_string();
        match e {
            CoreError::Validation(_) | CoreError::EmptyCart | CoreError::CartTooLarge { .. } => {
                ApiError::Validation(message)
            }
            CoreError::ProductNotFound(_) | CoreError::OrderNotFound(_) => {
                ApiError::NotFound(message)
            }
            CoreError::InsufficientStock { .. } => ApiError::BusinessRule {
                code: "INSUFFICIENT_STOCK",
                message,
            },
            CoreError::InvalidStatusTransition { .. } => ApiError::BusinessRule {
                code: "INVALID_STATUS_TRANSITION",
                message,
            },
            CoreError::InvalidPaymentTransition { .. } => ApiError::BusinessRule {
                code: "INVALID_PAYMENT_TRANSITION",
                message,
            },
            CoreError::CouponRejected(rejection) => ApiError::BusinessRule {
                code: rejection.code(),
                message: rejection.to_string(),
            },
        }
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        let message = e.to_string();
        match e {
            DbError::NotFound { .. } => ApiError::NotFound(message),
            DbError::UniqueViolation { .. } | DbError::ForeignKeyViolation { .. } => {
                ApiError::Conflict(message)
            }
            DbError::Rule(core) => core.into(),
            _ => ApiError::Internal(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::TooLarge(e.body_text());
        }
        ApiError::Validation(format!("Multipart error: {}", e.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use storefront_core::{OrderStatus, PromotionRejection};

    async fn body_of(err: ApiError) -> (StatusCode, serde_json::Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_body_shape() {
        let (status, body) = body_of(ApiError::Validation("quantity must be positive".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["status"], 400);
        assert_eq!(body["message"], "quantity must be positive");
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_internal_detail_is_hidden() {
        let (status, body) = body_of(ApiError::Internal("disk I/O error at page 7".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Internal server error");
        assert_eq!(body["error"], "INTERNAL_ERROR");
    }

    #[test]
    fn test_coupon_rejection_keeps_reason() {
        let err: ApiError = CoreError::CouponRejected(PromotionRejection::Expired).into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "COUPON_EXPIRED");
    }

    #[test]
    fn test_db_error_mapping() {
        let err: ApiError = DbError::not_found("Order", "abc").into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let err: ApiError = DbError::duplicate("sku", "MUG-01").into();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        let err: ApiError = DbError::Rule(CoreError::InvalidStatusTransition {
            from: OrderStatus::Completed,
            to: OrderStatus::Pending,
        })
        .into();
        assert_eq!(err.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code(), "INVALID_STATUS_TRANSITION");

        let err: ApiError = DbError::PoolExhausted.into();
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_cart_errors_are_validation() {
        let err: ApiError = CoreError::EmptyCart.into();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }
}
