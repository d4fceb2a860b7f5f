//! Admin API Handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::IdQuery;
use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::extract::{Json, Query};
use crate::AppState;
use storefront_core::validation::{validate_email, validate_id, validate_password, validate_person_name};
use storefront_core::{Admin, AdminRole};

const RESOURCE: &str = "Admin";

#[derive(Debug, Deserialize)]
pub struct AdminQuery {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: AdminRole,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Partial update; absent fields are left unchanged.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAdmin {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<AdminRole>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// List admins, or fetch one with `?id=`
pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<AdminQuery>,
) -> ApiResult<Response> {
    let repo = state.db.admins();

    if let Some(id) = query.id.as_deref().map(str::trim) {
        validate_id(id)?;
        let admin = repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
        return Ok(Json(admin).into_response());
    }

    Ok(Json(repo.list().await?).into_response())
}

/// Create an admin; the password is stored as an argon2 hash
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateAdmin>,
) -> ApiResult<(StatusCode, Json<Admin>)> {
    let email = input.email.trim().to_lowercase();
    validate_person_name(&input.name)?;
    validate_email(&email)?;
    validate_password(&input.password)?;

    let now = Utc::now();
    let admin = Admin {
        id: Uuid::new_v4().to_string(),
        name: input.name.trim().to_string(),
        email,
        password_hash: hash_password(&input.password)?,
        role: input.role,
        is_active: input.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    state.db.admins().insert(&admin).await?;
    info!(id = %admin.id, role = %admin.role, "Admin created");

    Ok((StatusCode::CREATED, Json(admin)))
}

/// Update an admin
pub async fn update(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    Json(input): Json<UpdateAdmin>,
) -> ApiResult<Json<Admin>> {
    let id = query.id()?;
    let repo = state.db.admins();
    let mut admin = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;

    let was_super_admin = is_active_super_admin(&admin);

    if let Some(name) = input.name {
        validate_person_name(&name)?;
        admin.name = name.trim().to_string();
    }
    if let Some(email) = input.email {
        let email = email.trim().to_lowercase();
        validate_email(&email)?;
        admin.email = email;
    }
    if let Some(password) = input.password {
        validate_password(&password)?;
        admin.password_hash = hash_password(&password)?;
    }
    if let Some(role) = input.role {
        admin.role = role;
    }
    if let Some(is_active) = input.is_active {
        admin.is_active = is_active;
    }

    if was_super_admin && !is_active_super_admin(&admin) {
        ensure_not_last_super_admin(&state).await?;
    }

    admin.updated_at = Utc::now();
    repo.update(&admin).await?;
    info!(id = %admin.id, "Admin updated");

    Ok(Json(admin))
}

/// Delete an admin
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<StatusCode> {
    let id = query.id()?;
    let repo = state.db.admins();
    let admin = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;

    if is_active_super_admin(&admin) {
        ensure_not_last_super_admin(&state).await?;
    }

    repo.delete(id).await?;
    info!(id = %id, "Admin deleted");

    Ok(StatusCode::NO_CONTENT)
}

/// Verify credentials and return the admin profile
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> ApiResult<Json<Admin>> {
    let admin = state
        .db
        .admins()
        .get_by_email(&input.email)
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    if !verify_password(&input.password, &admin.password_hash) {
        warn!(email = %admin.email, "Failed admin login");
        return Err(ApiError::invalid_credentials());
    }

    if !admin.is_active {
        return Err(ApiError::Unauthorized("Account is disabled".to_string()));
    }

    info!(id = %admin.id, "Admin logged in");
    Ok(Json(admin))
}

fn is_active_super_admin(admin: &Admin) -> bool {
    admin.is_active && admin.role == AdminRole::SuperAdmin
}

async fn ensure_not_last_super_admin(state: &AppState) -> ApiResult<()> {
    if state.db.admins().count_active_super_admins().await? <= 1 {
        return Err(ApiError::Conflict(
            "Cannot remove the last active super admin".to_string(),
        ));
    }
    Ok(())
}
