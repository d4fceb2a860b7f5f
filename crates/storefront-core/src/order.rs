//! # Order Module
//!
//! Orders, their line items and the two status machines.
//!
//! ## Fulfilment Status
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   pending ──► processing ──► shipped ──► completed (terminal)           │
//! │      │            │             │                                       │
//! │      └────────────┴─────────────┴──────► cancelled (terminal)           │
//! │                                                                         │
//! │   Setting the current status again is a no-op.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Payment Status
//! ```text
//!   pending ──► paid (terminal)
//!      │
//!      └──► failed ──► pending (retry)
//! ```
//!
//! In-store sales skip both machines: they are created `completed` + `paid`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::pricing::{allocate_discount, LineItem, PriceBreakdown};

// =============================================================================
// Order Status
// =============================================================================

/// Fulfilment status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum OrderStatus {
    Pending,
    Processing,
    Shipped,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Whether the status may change from `self` to `next`.
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;

        if *self == next {
            return true;
        }
        match (self, next) {
            (Pending, Processing) | (Processing, Shipped) | (Shipped, Completed) => true,
            (from, Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Validates a transition. `Ok(false)` means the status is unchanged.
    pub fn transition(&self, next: OrderStatus) -> CoreResult<bool> {
        if !self.can_transition_to(next) {
            return Err(CoreError::InvalidStatusTransition {
                from: *self,
                to: next,
            });
        }
        Ok(*self != next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "processing" => Ok(OrderStatus::Processing),
            "shipped" => Ok(OrderStatus::Shipped),
            "completed" => Ok(OrderStatus::Completed),
            "cancelled" => Ok(OrderStatus::Cancelled),
            _ => Err(ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: ["pending", "processing", "shipped", "completed", "cancelled"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            }),
        }
    }
}

// =============================================================================
// Payment Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn can_transition_to(&self, next: PaymentStatus) -> bool {
        use PaymentStatus::*;

        matches!(
            (self, next),
            (Pending, Pending)
                | (Paid, Paid)
                | (Failed, Failed)
                | (Pending, Paid)
                | (Pending, Failed)
                | (Failed, Pending)
        )
    }

    /// Validates a transition. `Ok(false)` means the status is unchanged.
    pub fn transition(&self, next: PaymentStatus) -> CoreResult<bool> {
        if !self.can_transition_to(next) {
            return Err(CoreError::InvalidPaymentTransition {
                from: *self,
                to: next,
            });
        }
        Ok(*self != next)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
            PaymentStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PaymentMethod {
    /// Customer transfers to one of the storefront's bank accounts and
    /// uploads a receipt.
    BankTransfer,
    Cash,
    Card,
}

impl Default for PaymentMethod {
    fn default() -> Self {
        PaymentMethod::BankTransfer
    }
}

// =============================================================================
// Order
// =============================================================================

/// A placed order. Amounts are stored exactly as the pricing calculator
/// produced them.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Order {
    pub id: String,

    /// Human-readable number, e.g. `ORD-20260114-3F9A1C`.
    pub order_number: String,

    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: Option<String>,
    pub shipping_address: Option<String>,

    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub shipping_cents: i64,
    pub total_cents: i64,

    /// Normalized code of the coupon applied, if any.
    pub coupon_code: Option<String>,

    pub status: OrderStatus,
    pub payment_status: PaymentStatus,

    /// Registered at the counter rather than through online checkout.
    pub is_in_store: bool,

    pub payment_method: PaymentMethod,
    pub bank_account_id: Option<String>,

    /// Stored file name of the uploaded transfer receipt.
    pub receipt_path: Option<String>,

    pub notes: Option<String>,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// The stored amounts as a breakdown.
    pub fn breakdown(&self) -> PriceBreakdown {
        let subtotal = Money::from_cents(self.subtotal_cents);
        let discount = Money::from_cents(self.discount_cents);
        PriceBreakdown {
            subtotal,
            discount,
            taxable_base: subtotal - discount,
            tax: Money::from_cents(self.tax_cents),
            shipping: Money::from_cents(self.shipping_cents),
            total: Money::from_cents(self.total_cents),
        }
    }

    /// Copies a breakdown into the amount columns.
    pub fn apply_breakdown(&mut self, breakdown: &PriceBreakdown) {
        self.subtotal_cents = breakdown.subtotal.cents();
        self.discount_cents = breakdown.discount.cents();
        self.tax_cents = breakdown.tax.cents();
        self.shipping_cents = breakdown.shipping.cents();
        self.total_cents = breakdown.total.cents();
    }
}

/// Generates a human-readable order number: `ORD-YYYYMMDD-XXXXXX`.
pub fn generate_order_number(now: DateTime<Utc>) -> String {
    let suffix = Uuid::new_v4().simple().to_string()[..6].to_uppercase();
    format!("ORD-{}-{}", now.format("%Y%m%d"), suffix)
}

// =============================================================================
// Order Item
// =============================================================================

/// One product line of an order, with price and name snapshots.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,

    pub sku: String,
    pub name: String,

    pub unit_price_cents: i64,
    pub quantity: i64,

    /// This line's share of the order discount.
    pub discount_cents: i64,

    /// unit_price × quantity, before discount.
    pub line_total_cents: i64,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product line before the order exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price: Money,
    pub quantity: i64,
}

impl OrderLine {
    pub fn as_line_item(&self) -> LineItem {
        LineItem::new(self.unit_price, self.quantity)
    }
}

/// Turns priced lines into order items, spreading `discount` across them.
pub fn build_items(
    order_id: &str,
    lines: &[OrderLine],
    discount: Money,
    now: DateTime<Utc>,
) -> Vec<OrderItem> {
    let line_items: Vec<LineItem> = lines.iter().map(OrderLine::as_line_item).collect();
    let shares = allocate_discount(&line_items, discount);

    lines
        .iter()
        .zip(line_items.iter().zip(shares))
        .map(|(line, (item, share))| OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            product_id: line.product_id.clone(),
            sku: line.sku.clone(),
            name: line.name.clone(),
            unit_price_cents: line.unit_price.cents(),
            quantity: line.quantity,
            discount_cents: share.cents(),
            line_total_cents: item.line_total().cents(),
            created_at: now,
        })
        .collect()
}

// =============================================================================
// Order Detail
// =============================================================================

/// An order with its items and price breakdown, as shown on the admin and
/// customer order pages.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderDetail {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    pub pricing: PriceBreakdown,
}

impl OrderDetail {
    pub fn new(order: Order, items: Vec<OrderItem>) -> Self {
        let pricing = order.breakdown();
        OrderDetail {
            order,
            items,
            pricing,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions() {
        assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Processing));
        assert!(OrderStatus::Processing.can_transition_to(OrderStatus::Shipped));
        assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Completed));
    }

    #[test]
    fn test_no_skipping_or_going_back() {
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Shipped));
        assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Completed));
        assert!(!OrderStatus::Shipped.can_transition_to(OrderStatus::Processing));
    }

    #[test]
    fn test_cancel_from_non_terminal_only() {
        for from in [
            OrderStatus::Pending,
            OrderStatus::Processing,
            OrderStatus::Shipped,
        ] {
            assert!(from.can_transition_to(OrderStatus::Cancelled));
        }
        assert!(!OrderStatus::Completed.can_transition_to(OrderStatus::Cancelled));
        assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn test_same_status_is_noop() {
        assert!(!OrderStatus::Completed.transition(OrderStatus::Completed).unwrap());
        assert!(OrderStatus::Pending.transition(OrderStatus::Processing).unwrap());
        assert!(matches!(
            OrderStatus::Completed.transition(OrderStatus::Pending),
            Err(CoreError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_payment_transitions() {
        use PaymentStatus::*;

        assert!(Pending.can_transition_to(Paid));
        assert!(Pending.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Pending));
        assert!(!Failed.can_transition_to(Paid));
        assert!(!Paid.can_transition_to(Pending));
        assert!(!Paid.can_transition_to(Failed));
        assert!(matches!(
            Paid.transition(Failed),
            Err(CoreError::InvalidPaymentTransition { .. })
        ));
    }

    #[test]
    fn test_status_parse_and_display() {
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("lost".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::Cancelled.to_string(), "cancelled");
        assert_eq!(PaymentStatus::Paid.to_string(), "paid");
    }

    #[test]
    fn test_order_number_format() {
        let number = generate_order_number(Utc::now());
        assert!(number.starts_with("ORD-"));
        assert_eq!(number.len(), "ORD-20260101-ABCDEF".len());
    }

    #[test]
    fn test_build_items_spreads_discount() {
        let lines = vec![
            OrderLine {
                product_id: "p-1".to_string(),
                sku: "MUG".to_string(),
                name: "Mug".to_string(),
                unit_price: Money::from_cents(3000),
                quantity: 2,
            },
            OrderLine {
                product_id: "p-2".to_string(),
                sku: "TEE".to_string(),
                name: "Tee".to_string(),
                unit_price: Money::from_cents(4000),
                quantity: 1,
            },
        ];

        let items = build_items("order-1", &lines, Money::from_cents(1000), Utc::now());

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].line_total_cents, 6000);
        assert_eq!(items[0].discount_cents, 600);
        assert_eq!(items[1].discount_cents, 400);
        assert!(items.iter().all(|i| i.order_id == "order-1"));
    }
}
