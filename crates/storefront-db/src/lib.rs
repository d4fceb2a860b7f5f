//! # storefront-db: Database Layer for the Storefront
//!
//! SQLite persistence through sqlx for products, orders, promotions, admins
//! and bank accounts.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Data Flow                             │
//! │                                                                         │
//! │  axum handler (POST /api/orders)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  storefront-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories   │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │                 │   │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo     │   │              │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo       │   │ 001_initial  │  │   │
//! │  │   │ WAL + FKs     │    │ PromotionRepo   │   │ _schema.sql  │  │   │
//! │  │   │               │    │ AdminRepo       │   │              │  │   │
//! │  │   │               │    │ BankAccountRepo │   │              │  │   │
//! │  │   └───────────────┘    └─────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (STOREFRONT_DATABASE_PATH, default ./data/storefront.db)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use storefront_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./data/storefront.db")).await?;
//! let products = db.products().list(false, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::admin::AdminRepository;
pub use repository::bank_account::BankAccountRepository;
pub use repository::order::{OrderFilter, OrderRepository, StatusUpdate};
pub use repository::product::ProductRepository;
pub use repository::promotion::PromotionRepository;
