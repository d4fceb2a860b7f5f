//! # Product Repository
//!
//! Database operations for the catalog.
//!
//! ## Key Operations
//! - Catalog listing (active only, optional category)
//! - CRUD with SKU uniqueness
//! - Soft delete (`is_active = 0`); orders keep pointing at the row
//!
//! Stock is decremented by [`OrderRepository::create`](super::order::OrderRepository::create)
//! inside the order transaction, never from here.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use storefront_core::Product;

const COLUMNS: &str = "id, sku, name, description, price_cents, stock, image_url, category, \
                       is_active, created_at, updated_at";

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists products ordered by name.
    ///
    /// ## Arguments
    /// * `include_inactive` - Back-office view also shows soft-deleted rows
    /// * `category` - Optional exact category filter
    pub async fn list(&self, include_inactive: bool, category: Option<&str>) -> DbResult<Vec<Product>> {
        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM products WHERE 1 = 1"));

        if !include_inactive {
            query.push(" AND is_active = 1");
        }
        if let Some(category) = category {
            query.push(" AND category = ").push_bind(category);
        }
        query.push(" ORDER BY name");

        let products = query.build_query_as::<Product>().fetch_all(&self.pool).await?;

        debug!(count = products.len(), "Listed products");
        Ok(products)
    }

    /// Gets a product by ID, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("SELECT {COLUMNS} FROM products WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Gets several products at once. Missing IDs are simply absent from the
    /// result.
    pub async fn get_by_ids(&self, ids: &[String]) -> DbResult<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {COLUMNS} FROM products WHERE id IN ("));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(id);
        }
        separated.push_unseparated(")");

        let products = query.build_query_as::<Product>().fetch_all(&self.pool).await?;
        Ok(products)
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(&format!("SELECT {COLUMNS} FROM products WHERE sku = ?1"))
            .bind(sku)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    /// Inserts a new product.
    ///
    /// ## Errors
    /// `UniqueViolation` when the SKU is taken.
    pub async fn insert(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, sku = %product.sku, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, sku, name, description, price_cents, stock,
                image_url, category, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(&product.category)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&product.sku))?;

        Ok(())
    }

    /// Overwrites every editable column of an existing product.
    pub async fn update(&self, product: &Product) -> DbResult<()> {
        debug!(id = %product.id, "Updating product");

        let result = sqlx::query(
            r#"
            UPDATE products SET
                sku = ?2,
                name = ?3,
                description = ?4,
                price_cents = ?5,
                stock = ?6,
                image_url = ?7,
                category = ?8,
                is_active = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.sku)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.image_url)
        .bind(&product.category)
        .bind(product.is_active)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&product.sku))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", &product.id));
        }

        Ok(())
    }

    /// Hides a product from the catalog. Past orders still resolve it.
    pub async fn soft_delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Soft-deleting product");

        let result = sqlx::query("UPDATE products SET is_active = 0, updated_at = ?2 WHERE id = ?1")
            .bind(id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts active products.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE is_active = 1")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::test_db;
    use uuid::Uuid;

    pub(crate) fn product(sku: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: Uuid::new_v4().to_string(),
            sku: sku.to_string(),
            name: format!("Product {sku}"),
            description: None,
            price_cents,
            stock,
            image_url: None,
            category: Some("home".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let repo = db.products();
        let mug = product("MUG-01", 1299, 10);

        repo.insert(&mug).await.unwrap();

        let found = repo.get_by_id(&mug.id).await.unwrap().unwrap();
        assert_eq!(found.sku, "MUG-01");
        assert_eq!(found.price_cents, 1299);
        assert!(found.is_active);

        let by_sku = repo.get_by_sku("MUG-01").await.unwrap().unwrap();
        assert_eq!(by_sku.id, mug.id);
    }

    #[tokio::test]
    async fn test_duplicate_sku() {
        let db = test_db().await;
        let repo = db.products();

        repo.insert(&product("MUG-01", 1299, 10)).await.unwrap();
        let err = repo.insert(&product("MUG-01", 999, 1)).await.unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "sku");
                assert_eq!(value, "MUG-01");
            }
            other => panic!("expected unique violation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_soft_delete_hides_from_catalog() {
        let db = test_db().await;
        let repo = db.products();
        let mug = product("MUG-01", 1299, 10);
        repo.insert(&mug).await.unwrap();
        repo.insert(&product("TEE-01", 2500, 5)).await.unwrap();

        repo.soft_delete(&mug.id).await.unwrap();

        assert_eq!(repo.list(false, None).await.unwrap().len(), 1);
        assert_eq!(repo.list(true, None).await.unwrap().len(), 2);
        assert_eq!(repo.count().await.unwrap(), 1);
        assert!(!repo.get_by_id(&mug.id).await.unwrap().unwrap().is_active);
    }

    #[tokio::test]
    async fn test_update_and_missing() {
        let db = test_db().await;
        let repo = db.products();
        let mut mug = product("MUG-01", 1299, 10);
        repo.insert(&mug).await.unwrap();

        mug.price_cents = 1499;
        mug.category = Some("kitchen".to_string());
        repo.update(&mug).await.unwrap();

        let kitchen = repo.list(false, Some("kitchen")).await.unwrap();
        assert_eq!(kitchen.len(), 1);
        assert_eq!(kitchen[0].price_cents, 1499);

        let ghost = product("GHOST", 100, 1);
        assert!(matches!(repo.update(&ghost).await, Err(DbError::NotFound { .. })));
        assert!(matches!(repo.soft_delete(&ghost.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_get_by_ids() {
        let db = test_db().await;
        let repo = db.products();
        let a = product("A-1", 100, 1);
        let b = product("B-1", 200, 1);
        repo.insert(&a).await.unwrap();
        repo.insert(&b).await.unwrap();

        let found = repo
            .get_by_ids(&[a.id.clone(), b.id.clone(), "missing".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 2);
        assert!(repo.get_by_ids(&[]).await.unwrap().is_empty());
    }
}
