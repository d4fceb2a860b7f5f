//! # Repository Module
//!
//! Database repository implementations for the storefront.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  axum handler                                                           │
//! │       │                                                                 │
//! │       │  state.db.orders().create(&order, &items)                       │
//! │       ▼                                                                 │
//! │  OrderRepository                                                        │
//! │  ├── create(&self, order, items)   ← one transaction                    │
//! │  ├── get_detail(&self, id)                                              │
//! │  ├── list(&self, filter)                                                │
//! │  └── update_status(&self, id, update)                                   │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Catalog CRUD, soft delete
//! - [`OrderRepository`](order::OrderRepository) - Orders, items, status updates
//! - [`PromotionRepository`](promotion::PromotionRepository) - Coupons and shipping config
//! - [`AdminRepository`](admin::AdminRepository) - Back-office accounts
//! - [`BankAccountRepository`](bank_account::BankAccountRepository) - Transfer accounts

pub mod admin;
pub mod bank_account;
pub mod order;
pub mod product;
pub mod promotion;

/// In-memory database with migrations applied, shared by repository tests.
#[cfg(test)]
pub(crate) async fn test_db() -> crate::Database {
    crate::Database::new(crate::DbConfig::in_memory())
        .await
        .expect("in-memory database")
}
