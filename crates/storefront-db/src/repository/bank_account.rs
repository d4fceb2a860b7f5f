//! # Bank Account Repository
//!
//! Accounts customers transfer to. Checkout only offers active ones.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use storefront_core::BankAccount;

const COLUMNS: &str =
    "id, bank_name, account_holder, account_number, routing_code, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct BankAccountRepository {
    pool: SqlitePool,
}

impl BankAccountRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BankAccountRepository { pool }
    }

    /// Lists accounts by bank name; `active_only` for the checkout page.
    pub async fn list(&self, active_only: bool) -> DbResult<Vec<BankAccount>> {
        let filter = if active_only { "WHERE is_active = 1" } else { "" };
        let accounts = sqlx::query_as::<_, BankAccount>(&format!(
            "SELECT {COLUMNS} FROM bank_accounts {filter} ORDER BY bank_name, account_holder"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<BankAccount>> {
        let account = sqlx::query_as::<_, BankAccount>(&format!(
            "SELECT {COLUMNS} FROM bank_accounts WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    pub async fn insert(&self, account: &BankAccount) -> DbResult<()> {
        debug!(id = %account.id, bank = %account.bank_name, "Inserting bank account");

        sqlx::query(
            r#"
            INSERT INTO bank_accounts (
                id, bank_name, account_holder, account_number, routing_code,
                is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&account.id)
        .bind(&account.bank_name)
        .bind(&account.account_holder)
        .bind(&account.account_number)
        .bind(&account.routing_code)
        .bind(account.is_active)
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn update(&self, account: &BankAccount) -> DbResult<()> {
        debug!(id = %account.id, "Updating bank account");

        let result = sqlx::query(
            r#"
            UPDATE bank_accounts SET
                bank_name = ?2,
                account_holder = ?3,
                account_number = ?4,
                routing_code = ?5,
                is_active = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&account.id)
        .bind(&account.bank_name)
        .bind(&account.account_holder)
        .bind(&account.account_number)
        .bind(&account.routing_code)
        .bind(account.is_active)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bank account", &account.id));
        }

        Ok(())
    }

    /// Deletes an account.
    ///
    /// ## Errors
    /// `ForeignKeyViolation` while orders still reference it; deactivate it
    /// instead.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting bank account");

        let result = sqlx::query("DELETE FROM bank_accounts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Bank account", id));
        }

        Ok(())
    }
}
