//! # storefront-core: Pure Business Logic for the Storefront
//!
//! This crate contains the storefront's business rules as pure functions with
//! zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Storefront Architecture                          │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Storefront / Back-office pages                 │   │
//! │  │     Cart ──► Checkout ──► Order detail ──► Admin order detail   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    storefront-api (axum)                        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ storefront-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌───────────┐ ┌──────────────────┐ │   │
//! │  │   │  money   │ │ pricing  │ │ promotion │ │ order/validation │ │   │
//! │  │   └──────────┘ └──────────┘ └───────────┘ └──────────────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              storefront-db (SQLite repositories)                │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic
//! - [`types`] - Catalog and back-office records (Product, Admin, BankAccount)
//! - [`pricing`] - The single pricing calculator (subtotal → total)
//! - [`promotion`] - Coupons, applicability rules, shipping configuration
//! - [`order`] - Orders, line items, status transitions
//! - [`validation`] - Input validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use storefront_core::money::Money;
//! use storefront_core::pricing::{calculate, AppliedDiscount, LineItem, ShippingPolicy};
//!
//! let items = [LineItem::new(Money::from_cents(10000), 1)];
//! let discount = AppliedDiscount::Percentage { bps: 1000 }; // 10% off
//! let shipping = ShippingPolicy::flat_fee(Money::from_cents(9900));
//!
//! let quote = calculate(&items, Some(&discount), &shipping).unwrap();
//! assert_eq!(quote.discount.cents(), 1000);
//! assert_eq!(quote.tax.cents(), 1440); // 16% of $90.00
//! assert_eq!(quote.total.cents(), 9000 + 1440 + 9900);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod promotion;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{Order, OrderDetail, OrderItem, OrderStatus, PaymentMethod, PaymentStatus};
pub use pricing::{AppliedDiscount, LineItem, PriceBreakdown, ShippingPolicy};
pub use promotion::{DiscountType, Promotion, PromotionRejection, ShippingConfig};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Sales tax applied to the post-discount subtotal, in basis points (16%).
pub const TAX_RATE_BPS: u32 = 1600;

/// Maximum distinct products in a single cart or order.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in a cart or order.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Upper bound for a unit price or shipping fee, in cents ($10 billion).
///
/// With [`MAX_CART_ITEMS`] and [`MAX_ITEM_QUANTITY`] this keeps every order
/// total well inside `i64`.
pub const MAX_PRICE_CENTS: i64 = 1_000_000_000_000;

/// Reserved promotion code of the row that stores the shipping configuration.
///
/// The row lives in the promotions table but is never resolvable as a coupon.
pub const SHIPPING_CONFIG_CODE: &str = "__SHIPPING__";
