//! # Admin Repository
//!
//! Back-office accounts. Emails are stored lower-cased so lookups are
//! case-insensitive; the password hash is produced by the API layer.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use storefront_core::{Admin, AdminRole};

const COLUMNS: &str = "id, name, email, password_hash, role, is_active, created_at, updated_at";

/// Repository for admin database operations.
#[derive(Debug, Clone)]
pub struct AdminRepository {
    pool: SqlitePool,
}

impl AdminRepository {
    pub fn new(pool: SqlitePool) -> Self {
        AdminRepository { pool }
    }

    pub async fn list(&self) -> DbResult<Vec<Admin>> {
        let admins = sqlx::query_as::<_, Admin>(&format!("SELECT {COLUMNS} FROM admins ORDER BY name"))
            .fetch_all(&self.pool)
            .await?;

        Ok(admins)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!("SELECT {COLUMNS} FROM admins WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(admin)
    }

    /// Finds an admin by email, ignoring case.
    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<Admin>> {
        let admin = sqlx::query_as::<_, Admin>(&format!("SELECT {COLUMNS} FROM admins WHERE email = ?1"))
            .bind(email.trim().to_lowercase())
            .fetch_optional(&self.pool)
            .await?;

        Ok(admin)
    }

    pub async fn insert(&self, admin: &Admin) -> DbResult<()> {
        debug!(id = %admin.id, email = %admin.email, "Inserting admin");

        sqlx::query(
            r#"
            INSERT INTO admins (
                id, name, email, password_hash, role, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&admin.id)
        .bind(&admin.name)
        .bind(admin.email.to_lowercase())
        .bind(&admin.password_hash)
        .bind(admin.role)
        .bind(admin.is_active)
        .bind(admin.created_at)
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&admin.email))?;

        Ok(())
    }

    /// Overwrites name, email, hash, role and active flag.
    pub async fn update(&self, admin: &Admin) -> DbResult<()> {
        debug!(id = %admin.id, "Updating admin");

        let result = sqlx::query(
            r#"
            UPDATE admins SET
                name = ?2,
                email = ?3,
                password_hash = ?4,
                role = ?5,
                is_active = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
        )
        .bind(&admin.id)
        .bind(&admin.name)
        .bind(admin.email.to_lowercase())
        .bind(&admin.password_hash)
        .bind(admin.role)
        .bind(admin.is_active)
        .bind(admin.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&admin.email))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Admin", &admin.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting admin");

        let result = sqlx::query("DELETE FROM admins WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Admin", id));
        }

        Ok(())
    }

    /// Counts active super admins. The API refuses to remove the last one.
    pub async fn count_active_super_admins(&self) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admins WHERE role = ?1 AND is_active = 1")
                .bind(AdminRole::SuperAdmin)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}
