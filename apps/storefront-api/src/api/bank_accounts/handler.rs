//! Bank Account API Handlers

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
use storefront_core::validation::{validate_bank_account, validate_id, validate_optional_text};
use storefront_core::BankAccount;

const RESOURCE: &str = "Bank account";

#[derive(Debug, Deserialize)]
pub struct BankAccountQuery {
    pub id: Option<String>,
    /// Only accounts offered at checkout
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankAccountInput {
    pub bank_name: String,
    pub account_holder: String,
    pub account_number: String,
    #[serde(default)]
    pub routing_code: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl BankAccountInput {
    fn validate(&self) -> Result<(), ApiError> {
        validate_bank_account(&self.bank_name, &self.account_holder, &self.account_number)?;
        validate_optional_text("routingCode", self.routing_code.as_deref(), 40)?;
        Ok(())
    }
}

pub async fn get(
    State(state): State<AppState>,
    Query(query): Query<BankAccountQuery>,
) -> ApiResult<Response> {
    let repo = state.db.bank_accounts();

    if let Some(id) = query.id.as_deref().map(str::trim) {
        validate_id(id)?;
        let account = repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;
        return Ok(Json(account).into_response());
    }

    Ok(Json(repo.list(query.active).await?).into_response())
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<BankAccountInput>,
) -> ApiResult<(StatusCode, Json<BankAccount>)> {
    input.validate()?;

    let now = Utc::now();
    let account = BankAccount {
        id: Uuid::new_v4().to_string(),
        bank_name: input.bank_name.trim().to_string(),
        account_holder: input.account_holder.trim().to_string(),
        account_number: input.account_number.trim().to_string(),
        routing_code: input.routing_code,
        is_active: input.is_active.unwrap_or(true),
        created_at: now,
        updated_at: now,
    };

    state.db.bank_accounts().insert(&account).await?;
    info!(id = %account.id, bank = %account.bank_name, "Bank account created");

    Ok((StatusCode::CREATED, Json(account)))
}

pub async fn update(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
    Json(input): Json<BankAccountInput>,
) -> ApiResult<Json<BankAccount>> {
    let id = query.id()?;
    input.validate()?;

    let repo = state.db.bank_accounts();
    let existing = repo
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(RESOURCE, id))?;

    let account = BankAccount {
        bank_name: input.bank_name.trim().to_string(),
        account_holder: input.account_holder.trim().to_string(),
        account_number: input.account_number.trim().to_string(),
        routing_code: input.routing_code,
        is_active: input.is_active.unwrap_or(existing.is_active),
        updated_at: Utc::now(),
        ..existing
    };

    repo.update(&account).await?;
    info!(id = %account.id, "Bank account updated");

    Ok(Json(account))
}

/// Delete an account; fails with 409 while orders reference it
pub async fn delete(
    State(state): State<AppState>,
    Query(query): Query<IdQuery>,
) -> ApiResult<StatusCode> {
    let id = query.id()?;
    state.db.bank_accounts().delete(id).await?;
    info!(id = %id, "Bank account deleted");

    Ok(StatusCode::NO_CONTENT)
}
