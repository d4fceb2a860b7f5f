//! Bank Account API Module

mod handler;

use axum::{routing::get, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/bank-accounts",
        get(handler::get)
            .post(handler::create)
            .put(handler::update)
            .delete(handler::delete),
    )
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{send, test_app};

    fn account(bank: &str, is_active: bool) -> serde_json::Value {
        json!({
            "bankName": bank,
            "accountHolder": "Tienda Norte SA",
            "accountNumber": "0123 4567 8901",
            "routingCode": "012180001234567897",
            "isActive": is_active
        })
    }

    #[tokio::test]
    async fn test_crud_and_active_filter() {
        let (app, _) = test_app().await;

        let (status, bbva) =
            send(&app, Method::POST, "/api/bank-accounts", Some(account("BBVA", true))).await;
        assert_eq!(status, StatusCode::CREATED);
        send(&app, Method::POST, "/api/bank-accounts", Some(account("Banorte", false))).await;

        let (_, all) = send(&app, Method::GET, "/api/bank-accounts", None).await;
        assert_eq!(all.as_array().unwrap().len(), 2);

        let (_, active) = send(&app, Method::GET, "/api/bank-accounts?active=true", None).await;
        assert_eq!(active.as_array().unwrap().len(), 1);
        assert_eq!(active[0]["bankName"], "BBVA");

        let id = bbva["id"].as_str().unwrap();
        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/bank-accounts?id={id}"),
            Some(account("BBVA México", false)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["bankName"], "BBVA México");
        assert_eq!(updated["isActive"], false);

        let (status, _) =
            send(&app, Method::DELETE, &format!("/api/bank-accounts?id={id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, Method::GET, &format!("/api/bank-accounts?id={id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_rejects_bad_account_number() {
        let (app, _) = test_app().await;
        let mut bad = account("BBVA", true);
        bad["accountNumber"] = json!("ABC-123");

        let (status, body) = send(&app, Method::POST, "/api/bank-accounts", Some(bad)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}
