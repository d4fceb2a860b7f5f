//! Cart API Module
//!
//! Server-side pricing for the cart page. Nothing is reserved or written.

mod handler;

use axum::{routing::post, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/cart/quote", post(handler::quote))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use storefront_core::DiscountType;

    use crate::test_support::{seed_coupon, seed_product, send, test_app};

    #[tokio::test]
    async fn test_quote_breakdown() {
        let (app, state) = test_app().await;
        let tee = seed_product(&state, "TEE-01", 3_000, 10).await;

        let (status, quote) = send(
            &app,
            Method::POST,
            "/api/cart/quote",
            Some(json!({ "items": [{ "productId": tee.id, "quantity": 1 }] })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["pricing"]["subtotal"], 3_000);
        assert_eq!(quote["pricing"]["tax"], 480);
        assert_eq!(quote["pricing"]["shipping"], 9_900);
        assert_eq!(quote["pricing"]["total"], 3_000 + 480 + 9_900);
        assert_eq!(quote["items"][0]["sku"], "TEE-01");
        assert!(quote["couponCode"].is_null());
    }

    #[tokio::test]
    async fn test_free_shipping_coupon() {
        let (app, state) = test_app().await;
        let tee = seed_product(&state, "TEE-01", 3_000, 10).await;
        seed_coupon(&state, "SHIPFREE", DiscountType::FreeShipping, 0).await;

        let (status, quote) = send(
            &app,
            Method::POST,
            "/api/cart/quote",
            Some(json!({
                "items": [{ "productId": tee.id, "quantity": 2 }],
                "couponCode": "shipfree"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(quote["couponCode"], "SHIPFREE");
        assert_eq!(quote["discount"]["type"], "free_shipping");
        assert_eq!(quote["pricing"]["discount"], 0);
        assert_eq!(quote["pricing"]["shipping"], 0);
        assert_eq!(quote["pricing"]["total"], 6_000 + 960);
    }

    #[tokio::test]
    async fn test_rejections() {
        let (app, state) = test_app().await;
        let tee = seed_product(&state, "TEE-01", 3_000, 1).await;

        let (status, body) =
            send(&app, Method::POST, "/api/cart/quote", Some(json!({ "items": [] }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/cart/quote",
            Some(json!({ "items": [{ "productId": tee.id, "quantity": 2 }] })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "INSUFFICIENT_STOCK");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/cart/quote",
            Some(json!({
                "items": [{ "productId": tee.id, "quantity": 1 }],
                "couponCode": "MISSING"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"], "COUPON_NOT_FOUND");
    }
}
