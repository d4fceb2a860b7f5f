//! # Order Repository
//!
//! Database operations for orders and order items.
//!
//! ## Order Creation Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    INSERT orders                                                        │
//! │    for each item:                                                       │
//! │      UPDATE products SET stock = stock - qty                            │
//! │        WHERE id = ? AND is_active = 1 AND stock >= qty                  │
//! │        └── 0 rows ──► ROLLBACK, InsufficientStock / ProductNotFound     │
//! │      INSERT order_items                                                 │
//! │    if coupon:                                                           │
//! │      UPDATE promotions SET uses = uses + 1                              │
//! │        WHERE code = ? AND is_active = 1                                 │
//! │          AND (max_uses IS NULL OR uses < max_uses)                      │
//! │        └── 0 rows ──► ROLLBACK, CouponRejected                          │
//! │  COMMIT                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The guards live in the UPDATE statements, so two concurrent checkouts can
//! neither oversell a product nor push a coupon past its cap.
//!
//! ## Status Updates
//! Read, validate against the status machine in storefront-core, write, all
//! inside one transaction. Cancelling an order puts its items back in stock.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use storefront_core::{
    CoreError, Order, OrderDetail, OrderItem, OrderStatus, PaymentStatus, Promotion,
    PromotionRejection, SHIPPING_CONFIG_CODE,
};

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, customer_phone, \
                             shipping_address, subtotal_cents, discount_cents, tax_cents, \
                             shipping_cents, total_cents, coupon_code, status, payment_status, \
                             is_in_store, payment_method, bank_account_id, receipt_path, notes, \
                             created_at, updated_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, sku, name, unit_price_cents, quantity, \
                            discount_cents, line_total_cents, created_at";

const PROMOTION_COLUMNS: &str = "id, code, description, discount_type, discount_value, starts_at, \
                                 ends_at, max_uses, uses, is_active, created_at, updated_at";

// =============================================================================
// Query Types
// =============================================================================

/// Filters for the order list.
#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Case-insensitive customer email match.
    pub email: Option<String>,
    pub is_in_store: Option<bool>,
    /// Default: 200
    pub limit: Option<i64>,
}

/// Requested status changes. `None` leaves the field as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusUpdate {
    pub status: Option<OrderStatus>,
    pub payment_status: Option<PaymentStatus>,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Persists an order with its items in one transaction.
    ///
    /// ## Errors
    /// - `Rule(InsufficientStock)` when a product has less stock than ordered
    /// - `Rule(ProductNotFound)` when a product is missing or inactive
    /// - `Rule(CouponRejected)` when the coupon was used up or switched off
    ///   since it was resolved
    ///
    /// Nothing is written when any of these occur.
    pub async fn create(&self, order: &Order, items: &[OrderItem]) -> DbResult<()> {
        debug!(
            id = %order.id,
            order_number = %order.order_number,
            items = items.len(),
            "Creating order"
        );

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        insert_order(&mut tx, order).await?;

        for item in items {
            let result = sqlx::query(
                r#"
                UPDATE products SET stock = stock - ?2, updated_at = ?3
                WHERE id = ?1 AND is_active = 1 AND stock >= ?2
                "#,
            )
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(now)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let current: Option<(i64, bool)> =
                    sqlx::query_as("SELECT stock, is_active FROM products WHERE id = ?1")
                        .bind(&item.product_id)
                        .fetch_optional(&mut *tx)
                        .await?;

                let err = match current {
                    Some((available, true)) => CoreError::InsufficientStock {
                        sku: item.sku.clone(),
                        available,
                        requested: item.quantity,
                    },
                    _ => CoreError::ProductNotFound(item.product_id.clone()),
                };
                return Err(err.into());
            }

            insert_item(&mut tx, item).await?;
        }

        if let Some(code) = &order.coupon_code {
            let result = sqlx::query(
                r#"
                UPDATE promotions SET uses = uses + 1, updated_at = ?2
                WHERE code = ?1 AND code != ?3 AND is_active = 1
                  AND (max_uses IS NULL OR uses < max_uses)
                "#,
            )
            .bind(code)
            .bind(now)
            .bind(SHIPPING_CONFIG_CODE)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                let promotion = sqlx::query_as::<_, Promotion>(&format!(
                    "SELECT {PROMOTION_COLUMNS} FROM promotions WHERE code = ?1"
                ))
                .bind(code)
                .fetch_optional(&mut *tx)
                .await?;

                let rejection = match promotion {
                    Some(p) => p
                        .check_applicable(now)
                        .err()
                        .unwrap_or(PromotionRejection::Exhausted),
                    None => PromotionRejection::NotFound,
                };
                return Err(CoreError::CouponRejected(rejection).into());
            }
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_number = %order.order_number,
            total_cents = order.total_cents,
            in_store = order.is_in_store,
            "Order created"
        );
        Ok(())
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(order)
    }

    /// Gets all items for an order, in insertion order.
    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY rowid"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Order with items and price breakdown.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<OrderDetail>> {
        let Some(order) = self.get_by_id(id).await? else {
            return Ok(None);
        };
        let items = self.get_items(&order.id).await?;

        Ok(Some(OrderDetail::new(order, items)))
    }

    /// Lists orders, newest first.
    pub async fn list(&self, filter: &OrderFilter) -> DbResult<Vec<Order>> {
        let mut query =
            QueryBuilder::<Sqlite>::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));

        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        if let Some(email) = &filter.email {
            query
                .push(" AND lower(customer_email) = ")
                .push_bind(email.trim().to_lowercase());
        }
        if let Some(in_store) = filter.is_in_store {
            query.push(" AND is_in_store = ").push_bind(in_store);
        }
        query
            .push(" ORDER BY created_at DESC LIMIT ")
            .push_bind(filter.limit.unwrap_or(200));

        let orders = query.build_query_as::<Order>().fetch_all(&self.pool).await?;

        debug!(count = orders.len(), "Listed orders");
        Ok(orders)
    }

    /// Applies a status and/or payment status change.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown order
    /// - `Rule(InvalidStatusTransition | InvalidPaymentTransition)` when the
    ///   change is not allowed from the current state
    pub async fn update_status(&self, id: &str, update: StatusUpdate) -> DbResult<Order> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let mut order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| DbError::not_found("Order", id))?;

        let mut changed = false;
        let mut cancelled = false;

        if let Some(next) = update.status {
            if order.status.transition(next)? {
                cancelled = next == OrderStatus::Cancelled;
                order.status = next;
                changed = true;
            }
        }
        if let Some(next) = update.payment_status {
            if order.payment_status.transition(next)? {
                order.payment_status = next;
                changed = true;
            }
        }

        if !changed {
            tx.commit().await?;
            return Ok(order);
        }

        order.updated_at = now;
        sqlx::query(
            "UPDATE orders SET status = ?2, payment_status = ?3, updated_at = ?4 WHERE id = ?1",
        )
        .bind(&order.id)
        .bind(order.status)
        .bind(order.payment_status)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        if cancelled {
            restock(&mut tx, &order.id).await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_number = %order.order_number,
            status = %order.status,
            payment_status = %order.payment_status,
            "Order status updated"
        );
        Ok(order)
    }

    /// Records the stored file name of an uploaded payment receipt.
    pub async fn set_receipt(&self, id: &str, receipt_path: &str) -> DbResult<Order> {
        let result =
            sqlx::query("UPDATE orders SET receipt_path = ?2, updated_at = ?3 WHERE id = ?1")
                .bind(id)
                .bind(receipt_path)
                .bind(Utc::now())
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, customer_name, customer_email, customer_phone,
            shipping_address, subtotal_cents, discount_cents, tax_cents,
            shipping_cents, total_cents, coupon_code, status, payment_status,
            is_in_store, payment_method, bank_account_id, receipt_path, notes,
            created_at, updated_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9,
            ?10, ?11, ?12, ?13, ?14,
            ?15, ?16, ?17, ?18, ?19,
            ?20, ?21
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(&order.shipping_address)
    .bind(order.subtotal_cents)
    .bind(order.discount_cents)
    .bind(order.tax_cents)
    .bind(order.shipping_cents)
    .bind(order.total_cents)
    .bind(&order.coupon_code)
    .bind(order.status)
    .bind(order.payment_status)
    .bind(order.is_in_store)
    .bind(order.payment_method)
    .bind(&order.bank_account_id)
    .bind(&order.receipt_path)
    .bind(&order.notes)
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Snapshot pattern: sku, name and unit price are copied onto the item so the
/// order reads the same after the product changes.
async fn insert_item(conn: &mut SqliteConnection, item: &OrderItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, sku, name, unit_price_cents,
            quantity, discount_cents, line_total_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(&item.sku)
    .bind(&item.name)
    .bind(item.unit_price_cents)
    .bind(item.quantity)
    .bind(item.discount_cents)
    .bind(item.line_total_cents)
    .bind(item.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

async fn restock(conn: &mut SqliteConnection, order_id: &str) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE products SET
            stock = stock + (
                SELECT SUM(quantity) FROM order_items
                WHERE order_items.order_id = ?1 AND order_items.product_id = products.id
            ),
            updated_at = ?2
        WHERE id IN (SELECT product_id FROM order_items WHERE order_id = ?1)
        "#,
    )
    .bind(order_id)
    .bind(Utc::now())
    .execute(conn)
    .await?;

    debug!(order_id = %order_id, products = result.rows_affected(), "Restocked cancelled order");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product::tests::product;
    use crate::repository::promotion::tests::coupon;
    use crate::repository::test_db;
    use crate::Database;
    use storefront_core::order::{build_items, generate_order_number, OrderLine};
    use storefront_core::{DiscountType, Money, PaymentMethod, Product};
    use uuid::Uuid;

    fn order(coupon_code: Option<&str>) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4().to_string(),
            order_number: generate_order_number(now),
            customer_name: "Luis Pérez".to_string(),
            customer_email: "Luis@Example.com".to_string(),
            customer_phone: None,
            shipping_address: Some("Av. Reforma 100, CDMX".to_string()),
            subtotal_cents: 3000,
            discount_cents: 0,
            tax_cents: 480,
            shipping_cents: 9900,
            total_cents: 13380,
            coupon_code: coupon_code.map(str::to_string),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            is_in_store: false,
            payment_method: PaymentMethod::BankTransfer,
            bank_account_id: None,
            receipt_path: None,
            notes: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn items_for(order: &Order, product: &Product, quantity: i64) -> Vec<OrderItem> {
        let line = OrderLine {
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price: product.price(),
            quantity,
        };
        build_items(&order.id, &[line], Money::zero(), order.created_at)
    }

    async fn stock_of(db: &Database, id: &str) -> i64 {
        db.products().get_by_id(id).await.unwrap().unwrap().stock
    }

    #[tokio::test]
    async fn test_create_decrements_stock_and_reads_back() {
        let db = test_db().await;
        let mug = product("MUG-01", 1500, 5);
        db.products().insert(&mug).await.unwrap();

        let o = order(None);
        db.orders().create(&o, &items_for(&o, &mug, 2)).await.unwrap();

        assert_eq!(stock_of(&db, &mug.id).await, 3);

        let detail = db.orders().get_detail(&o.id).await.unwrap().unwrap();
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].quantity, 2);
        assert_eq!(detail.items[0].sku, "MUG-01");
        assert_eq!(detail.pricing.total.cents(), 13380);
    }

    #[tokio::test]
    async fn test_insufficient_stock_rolls_back() {
        let db = test_db().await;
        let mug = product("MUG-01", 1500, 1);
        db.products().insert(&mug).await.unwrap();

        let o = order(None);
        let err = db.orders().create(&o, &items_for(&o, &mug, 2)).await.unwrap_err();

        assert!(matches!(
            err,
            DbError::Rule(CoreError::InsufficientStock {
                available: 1,
                requested: 2,
                ..
            })
        ));
        assert_eq!(stock_of(&db, &mug.id).await, 1);
        assert!(db.orders().get_by_id(&o.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_coupon_cap_enforced_at_creation() {
        let db = test_db().await;
        let mug = product("MUG-01", 1500, 10);
        db.products().insert(&mug).await.unwrap();

        let mut once = coupon("ONCE", DiscountType::Fixed, 100);
        once.max_uses = Some(1);
        db.promotions().insert(&once).await.unwrap();

        let first = order(Some("ONCE"));
        db.orders().create(&first, &items_for(&first, &mug, 1)).await.unwrap();

        let second = order(Some("ONCE"));
        let err = db
            .orders()
            .create(&second, &items_for(&second, &mug, 1))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            DbError::Rule(CoreError::CouponRejected(PromotionRejection::Exhausted))
        ));

        let stored = db.promotions().get_by_code("ONCE").await.unwrap().unwrap();
        assert_eq!(stored.uses, 1);
        // Second order rolled back entirely, stock included
        assert_eq!(stock_of(&db, &mug.id).await, 9);
    }

    #[tokio::test]
    async fn test_list_filters() {
        let db = test_db().await;
        let mug = product("MUG-01", 1500, 10);
        db.products().insert(&mug).await.unwrap();

        let a = order(None);
        db.orders().create(&a, &items_for(&a, &mug, 1)).await.unwrap();
        let mut b = order(None);
        b.customer_email = "other@example.com".to_string();
        db.orders().create(&b, &items_for(&b, &mug, 1)).await.unwrap();

        let all = db.orders().list(&OrderFilter::default()).await.unwrap();
        assert_eq!(all.len(), 2);

        let luis = db
            .orders()
            .list(&OrderFilter {
                email: Some("luis@example.com".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(luis.len(), 1);
        assert_eq!(luis[0].id, a.id);

        let shipped = db
            .orders()
            .list(&OrderFilter {
                status: Some(OrderStatus::Shipped),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(shipped.is_empty());
    }

    #[tokio::test]
    async fn test_status_updates() {
        let db = test_db().await;
        let mug = product("MUG-01", 1500, 10);
        db.products().insert(&mug).await.unwrap();
        let o = order(None);
        db.orders().create(&o, &items_for(&o, &mug, 4)).await.unwrap();

        let updated = db
            .orders()
            .update_status(
                &o.id,
                StatusUpdate {
                    status: Some(OrderStatus::Processing),
                    payment_status: Some(PaymentStatus::Paid),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, OrderStatus::Processing);
        assert_eq!(updated.payment_status, PaymentStatus::Paid);

        let err = db
            .orders()
            .update_status(
                &o.id,
                StatusUpdate {
                    status: Some(OrderStatus::Pending),
                    payment_status: None,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::Rule(CoreError::InvalidStatusTransition { .. })
        ));

        assert!(matches!(
            db.orders()
                .update_status("missing", StatusUpdate::default())
                .await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_cancel_restocks() {
        let db = test_db().await;
        let mug = product("MUG-01", 1500, 10);
        db.products().insert(&mug).await.unwrap();
        let o = order(None);
        db.orders().create(&o, &items_for(&o, &mug, 4)).await.unwrap();
        assert_eq!(stock_of(&db, &mug.id).await, 6);

        db.orders()
            .update_status(
                &o.id,
                StatusUpdate {
                    status: Some(OrderStatus::Cancelled),
                    payment_status: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &mug.id).await, 10);

        // Cancelling again is a no-op and does not restock twice
        db.orders()
            .update_status(
                &o.id,
                StatusUpdate {
                    status: Some(OrderStatus::Cancelled),
                    payment_status: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(stock_of(&db, &mug.id).await, 10);
    }

    #[tokio::test]
    async fn test_set_receipt() {
        let db = test_db().await;
        let mug = product("MUG-01", 1500, 10);
        db.products().insert(&mug).await.unwrap();
        let o = order(None);
        db.orders().create(&o, &items_for(&o, &mug, 1)).await.unwrap();

        let updated = db.orders().set_receipt(&o.id, "receipt.png").await.unwrap();
        assert_eq!(updated.receipt_path.as_deref(), Some("receipt.png"));

        assert!(matches!(
            db.orders().set_receipt("missing", "x.png").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
