//! Admin API Module
//!
//! Back-office accounts and credential checks. There must always be at least
//! one active super admin.

mod handler;

use axum::{
    routing::{get, post},
    Router,
};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/admins",
            get(handler::get)
                .post(handler::create)
                .put(handler::update)
                .delete(handler::delete),
        )
        .route("/api/admins/login", post(handler::login))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::{json, Value};

    use crate::test_support::{send, test_app};

    async fn create_admin(app: &axum::Router, email: &str, role: &str) -> Value {
        let (status, body) = send(
            app,
            Method::POST,
            "/api/admins",
            Some(json!({
                "name": "Ana Torres",
                "email": email,
                "password": "correct horse",
                "role": role
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        body
    }

    #[tokio::test]
    async fn test_create_never_returns_hash() {
        let (app, state) = test_app().await;
        let admin = create_admin(&app, "Ana@Example.com", "super_admin").await;

        assert_eq!(admin["email"], "ana@example.com");
        assert_eq!(admin["role"], "super_admin");
        assert!(admin.get("passwordHash").is_none());

        let stored = state
            .db
            .admins()
            .get_by_email("ana@example.com")
            .await
            .unwrap()
            .unwrap();
        assert!(stored.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_login() {
        let (app, _) = test_app().await;
        create_admin(&app, "ana@example.com", "admin").await;

        let (status, profile) = send(
            &app,
            Method::POST,
            "/api/admins/login",
            Some(json!({ "email": "ANA@example.com", "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(profile["name"], "Ana Torres");

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/admins/login",
            Some(json!({ "email": "ana@example.com", "password": "wrong horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "UNAUTHORIZED");

        let (status, unknown) = send(
            &app,
            Method::POST,
            "/api/admins/login",
            Some(json!({ "email": "nobody@example.com", "password": "correct horse" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(unknown["message"], body["message"]);
    }

    #[tokio::test]
    async fn test_validation_and_duplicates() {
        let (app, _) = test_app().await;
        create_admin(&app, "ana@example.com", "admin").await;

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/admins",
            Some(json!({ "name": "Ana", "email": "ana@example.com", "password": "short" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/admins",
            Some(json!({ "name": "Ana", "email": "ana@example.com", "password": "long enough" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_last_super_admin_is_protected() {
        let (app, _) = test_app().await;
        let root = create_admin(&app, "root@example.com", "super_admin").await;
        let id = root["id"].as_str().unwrap().to_string();

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/admins?id={id}"),
            Some(json!({ "role": "admin" })),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(&app, Method::DELETE, &format!("/api/admins?id={id}"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);

        // With a second super admin the first one can step down
        create_admin(&app, "second@example.com", "super_admin").await;
        let (status, updated) = send(
            &app,
            Method::PUT,
            &format!("/api/admins?id={id}"),
            Some(json!({ "role": "admin", "name": "Former Root" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["role"], "admin");
        assert_eq!(updated["name"], "Former Root");

        let (status, _) = send(&app, Method::DELETE, &format!("/api/admins?id={id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (_, list) = send(&app, Method::GET, "/api/admins", None).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_password_change_takes_effect() {
        let (app, _) = test_app().await;
        let admin = create_admin(&app, "ana@example.com", "admin").await;
        let id = admin["id"].as_str().unwrap();

        let (status, _) = send(
            &app,
            Method::PUT,
            &format!("/api/admins?id={id}"),
            Some(json!({ "password": "brand new pass" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/admins/login",
            Some(json!({ "email": "ana@example.com", "password": "brand new pass" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
