//! # Promotion Repository
//!
//! Coupons and the shipping configuration row share the `promotions` table.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  promotions                                                             │
//! │  ┌──────────────┬──────────────┬────────────────┬───────────┐           │
//! │  │ code         │ type         │ discount_value │ is_active │           │
//! │  ├──────────────┼──────────────┼────────────────┼───────────┤           │
//! │  │ SUMMER10     │ percentage   │ 1000 (bps)     │ 1         │ ◄ coupon  │
//! │  │ TENOFF       │ fixed        │ 1000 (cents)   │ 1         │ ◄ coupon  │
//! │  │ __SHIPPING__ │ free_shipping│ 9900 (fee)     │ 0         │ ◄ config  │
//! │  └──────────────┴──────────────┴────────────────┴───────────┘           │
//! │                                                                         │
//! │  Every coupon query excludes the reserved row.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage counting happens in [`OrderRepository::create`](super::order::OrderRepository::create).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use storefront_core::promotion::normalize_code;
use storefront_core::{DiscountType, Promotion, ShippingConfig, SHIPPING_CONFIG_CODE};

const COLUMNS: &str = "id, code, description, discount_type, discount_value, starts_at, ends_at, \
                       max_uses, uses, is_active, created_at, updated_at";

/// Repository for promotion database operations.
#[derive(Debug, Clone)]
pub struct PromotionRepository {
    pool: SqlitePool,
}

impl PromotionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        PromotionRepository { pool }
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Lists all coupons, newest first. The shipping row is never listed.
    pub async fn list(&self) -> DbResult<Vec<Promotion>> {
        let promotions = sqlx::query_as::<_, Promotion>(&format!(
            "SELECT {COLUMNS} FROM promotions WHERE code != ?1 ORDER BY created_at DESC"
        ))
        .bind(SHIPPING_CONFIG_CODE)
        .fetch_all(&self.pool)
        .await?;

        Ok(promotions)
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Promotion>> {
        let promotion = sqlx::query_as::<_, Promotion>(&format!(
            "SELECT {COLUMNS} FROM promotions WHERE id = ?1 AND code != ?2"
        ))
        .bind(id)
        .bind(SHIPPING_CONFIG_CODE)
        .fetch_optional(&self.pool)
        .await?;

        Ok(promotion)
    }

    /// Looks a coupon up by code, case-insensitively.
    ///
    /// Read-only: resolving the same code twice returns the same row.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<Promotion>> {
        let code = normalize_code(code);
        if code == SHIPPING_CONFIG_CODE {
            return Ok(None);
        }

        let promotion = sqlx::query_as::<_, Promotion>(&format!(
            "SELECT {COLUMNS} FROM promotions WHERE code = ?1"
        ))
        .bind(&code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(promotion)
    }

    /// Inserts a coupon. The code must already be normalized.
    pub async fn insert(&self, promotion: &Promotion) -> DbResult<()> {
        debug!(id = %promotion.id, code = %promotion.code, "Inserting promotion");

        sqlx::query(
            r#"
            INSERT INTO promotions (
                id, code, description, discount_type, discount_value,
                starts_at, ends_at, max_uses, uses, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.code)
        .bind(&promotion.description)
        .bind(promotion.discount_type)
        .bind(promotion.discount_value)
        .bind(promotion.starts_at)
        .bind(promotion.ends_at)
        .bind(promotion.max_uses)
        .bind(promotion.uses)
        .bind(promotion.is_active)
        .bind(promotion.created_at)
        .bind(promotion.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&promotion.code))?;

        Ok(())
    }

    /// Updates a coupon's editable fields. The `uses` counter is left alone.
    pub async fn update(&self, promotion: &Promotion) -> DbResult<()> {
        debug!(id = %promotion.id, "Updating promotion");

        let result = sqlx::query(
            r#"
            UPDATE promotions SET
                code = ?2,
                description = ?3,
                discount_type = ?4,
                discount_value = ?5,
                starts_at = ?6,
                ends_at = ?7,
                max_uses = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1 AND code != ?11
            "#,
        )
        .bind(&promotion.id)
        .bind(&promotion.code)
        .bind(&promotion.description)
        .bind(promotion.discount_type)
        .bind(promotion.discount_value)
        .bind(promotion.starts_at)
        .bind(promotion.ends_at)
        .bind(promotion.max_uses)
        .bind(promotion.is_active)
        .bind(promotion.updated_at)
        .bind(SHIPPING_CONFIG_CODE)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&promotion.code))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", &promotion.id));
        }

        Ok(())
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting promotion");

        let result = sqlx::query("DELETE FROM promotions WHERE id = ?1 AND code != ?2")
            .bind(id)
            .bind(SHIPPING_CONFIG_CODE)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Promotion", id));
        }

        Ok(())
    }

    // =========================================================================
    // Shipping Configuration
    // =========================================================================

    /// Reads the shipping configuration, if an administrator ever saved one.
    pub async fn shipping_config(&self) -> DbResult<Option<ShippingConfig>> {
        let row = sqlx::query_as::<_, Promotion>(&format!(
            "SELECT {COLUMNS} FROM promotions WHERE code = ?1"
        ))
        .bind(SHIPPING_CONFIG_CODE)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(ShippingConfig::from_promotion))
    }

    /// Creates or replaces the shipping configuration row.
    pub async fn save_shipping_config(&self, config: &ShippingConfig) -> DbResult<ShippingConfig> {
        let now = Utc::now();

        info!(
            fee_cents = config.fee_cents,
            free_shipping = config.free_shipping_active,
            "Saving shipping configuration"
        );

        sqlx::query(
            r#"
            INSERT INTO promotions (
                id, code, description, discount_type, discount_value,
                starts_at, ends_at, max_uses, uses, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, 'Shipping configuration', ?3, ?4, NULL, NULL, NULL, 0, ?5, ?6, ?6)
            ON CONFLICT (code) DO UPDATE SET
                discount_value = excluded.discount_value,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(SHIPPING_CONFIG_CODE)
        .bind(DiscountType::FreeShipping)
        .bind(config.fee_cents)
        .bind(config.free_shipping_active)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(*config)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::test_db;

    pub(crate) fn coupon(code: &str, discount_type: DiscountType, value: i64) -> Promotion {
        let now = Utc::now();
        Promotion {
            id: Uuid::new_v4().to_string(),
            code: code.to_string(),
            description: Some("test coupon".to_string()),
            discount_type,
            discount_value: value,
            starts_at: None,
            ends_at: None,
            max_uses: None,
            uses: 0,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let db = test_db().await;
        let repo = db.promotions();
        repo.insert(&coupon("SUMMER10", DiscountType::Percentage, 1000))
            .await
            .unwrap();

        let found = repo.get_by_code("  summer10 ").await.unwrap().unwrap();
        assert_eq!(found.discount_type, DiscountType::Percentage);
        assert_eq!(found.discount_value, 1000);

        assert!(repo.get_by_code("WINTER").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code() {
        let db = test_db().await;
        let repo = db.promotions();
        repo.insert(&coupon("TENOFF", DiscountType::Fixed, 1000)).await.unwrap();

        let err = repo
            .insert(&coupon("TENOFF", DiscountType::Fixed, 500))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_shipping_config_round_trip_and_hidden() {
        let db = test_db().await;
        let repo = db.promotions();

        assert!(repo.shipping_config().await.unwrap().is_none());

        repo.save_shipping_config(&ShippingConfig::with_default_fee(9900))
            .await
            .unwrap();
        repo.save_shipping_config(&ShippingConfig {
            fee_cents: 7500,
            free_shipping_active: true,
        })
        .await
        .unwrap();

        let config = repo.shipping_config().await.unwrap().unwrap();
        assert_eq!(config.fee_cents, 7500);
        assert!(config.free_shipping_active);

        // The configuration row never shows up as a coupon
        assert!(repo.list().await.unwrap().is_empty());
        assert!(repo.get_by_code("__shipping__").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let db = test_db().await;
        let repo = db.promotions();
        let mut promo = coupon("TENOFF", DiscountType::Fixed, 1000);
        repo.insert(&promo).await.unwrap();

        promo.is_active = false;
        promo.max_uses = Some(5);
        repo.update(&promo).await.unwrap();

        let stored = repo.get_by_id(&promo.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
        assert_eq!(stored.max_uses, Some(5));

        repo.delete(&promo.id).await.unwrap();
        assert!(matches!(repo.delete(&promo.id).await, Err(DbError::NotFound { .. })));
    }
}
