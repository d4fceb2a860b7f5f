//! # Pricing Module
//!
//! The one place where an order's money is computed.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  line items ──► subtotal = Σ(unit_price × quantity)                     │
//! │                    │                                                    │
//! │   coupon ──────────┼──► discount   percentage: subtotal × pct           │
//! │                    │                fixed:      min(value, subtotal)    │
//! │                    │                free ship:  0                       │
//! │                    ▼                                                    │
//! │             taxable_base = subtotal − discount                          │
//! │                    │                                                    │
//! │                    ├──► tax = taxable_base × 16%                        │
//! │                    │                                                    │
//! │   shipping policy ─┼──► shipping = 0 if free shipping (config/coupon)   │
//! │                    │               else flat fee                        │
//! │                    ▼                                                    │
//! │             total = taxable_base + tax + shipping                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Cart, checkout, in-store sale and both order-detail views call
//! [`calculate`]; nothing else adds up prices.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::TaxRate;
use crate::validation::{
    validate_percentage_bps, validate_price_cents, validate_quantity, validate_shipping_fee_cents,
};
use crate::MAX_CART_ITEMS;

// =============================================================================
// Inputs
// =============================================================================

/// A priced line: unit price snapshot and quantity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineItem {
    pub unit_price: Money,
    pub quantity: i64,
}

impl LineItem {
    pub fn new(unit_price: Money, quantity: i64) -> Self {
        LineItem {
            unit_price,
            quantity,
        }
    }

    #[inline]
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// A discount resolved from an applicable coupon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(tag = "type", rename_all = "snake_case")]
#[ts(export)]
pub enum AppliedDiscount {
    /// Percentage off the subtotal, in basis points (1000 = 10%).
    Percentage { bps: u32 },
    /// Fixed amount off the subtotal, capped at the subtotal.
    Fixed {
        #[ts(as = "i64")]
        amount: Money,
    },
    /// No monetary reduction; waives shipping.
    FreeShipping,
}

impl AppliedDiscount {
    /// Monetary reduction this discount applies to `subtotal`.
    pub fn amount_off(&self, subtotal: Money) -> Money {
        match *self {
            AppliedDiscount::Percentage { bps } => subtotal.percentage(bps).min(subtotal),
            AppliedDiscount::Fixed { amount } => amount.min(subtotal),
            AppliedDiscount::FreeShipping => Money::zero(),
        }
    }

    #[inline]
    pub fn waives_shipping(&self) -> bool {
        matches!(self, AppliedDiscount::FreeShipping)
    }

    fn validate(&self) -> CoreResult<()> {
        match *self {
            AppliedDiscount::Percentage { bps } => validate_percentage_bps(bps)?,
            AppliedDiscount::Fixed { amount } => {
                if amount.is_negative() {
                    return Err(ValidationError::OutOfRange {
                        field: "discount value".to_string(),
                        min: 0,
                        max: i64::MAX,
                    }
                    .into());
                }
            }
            AppliedDiscount::FreeShipping => {}
        }
        Ok(())
    }
}

/// How shipping is charged for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingPolicy {
    /// Fee charged when shipping is not waived.
    pub fee: Money,
    /// Global free-shipping switch; waives the fee for every cart.
    pub free_shipping_active: bool,
}

impl ShippingPolicy {
    pub fn flat_fee(fee: Money) -> Self {
        ShippingPolicy {
            fee,
            free_shipping_active: false,
        }
    }

    pub fn free() -> Self {
        ShippingPolicy {
            fee: Money::zero(),
            free_shipping_active: true,
        }
    }

    /// Pickup at the counter: nothing to ship.
    pub fn in_store() -> Self {
        ShippingPolicy::free()
    }

    fn cost(&self, discount: Option<&AppliedDiscount>) -> Money {
        if self.free_shipping_active || discount.is_some_and(AppliedDiscount::waives_shipping) {
            Money::zero()
        } else {
            self.fee
        }
    }
}

// =============================================================================
// Output
// =============================================================================

/// Every amount shown on a cart, checkout or order page.
///
/// Invariant: `total = subtotal - discount + tax + shipping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PriceBreakdown {
    #[ts(as = "i64")]
    pub subtotal: Money,
    #[ts(as = "i64")]
    pub discount: Money,
    #[ts(as = "i64")]
    pub taxable_base: Money,
    #[ts(as = "i64")]
    pub tax: Money,
    #[ts(as = "i64")]
    pub shipping: Money,
    #[ts(as = "i64")]
    pub total: Money,
}

// =============================================================================
// Calculator
// =============================================================================

/// Prices a list of line items.
///
/// ## Errors
/// - `EmptyCart` when `items` is empty
/// - `CartTooLarge` above [`MAX_CART_ITEMS`] lines
/// - `Validation` for quantities outside 1-999, prices or a shipping fee
///   outside 0 to [`MAX_PRICE_CENTS`](crate::MAX_PRICE_CENTS), a percentage
///   outside 0-100% or a negative fixed amount
///
/// ## Example
/// ```rust
/// use storefront_core::money::Money;
/// use storefront_core::pricing::{calculate, LineItem, ShippingPolicy};
///
/// let items = [LineItem::new(Money::from_cents(3000), 1)];
/// let fee = Money::from_cents(9900);
/// let quote = calculate(&items, None, &ShippingPolicy::flat_fee(fee)).unwrap();
///
/// assert_eq!(quote.tax.cents(), 480);
/// assert_eq!(quote.shipping, fee);
/// assert_eq!(quote.total.cents(), 3000 + 480 + 9900);
/// ```
pub fn calculate(
    items: &[LineItem],
    discount: Option<&AppliedDiscount>,
    shipping: &ShippingPolicy,
) -> CoreResult<PriceBreakdown> {
    if items.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    if items.len() > MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }
    for item in items {
        validate_quantity(item.quantity)?;
        validate_price_cents(item.unit_price.cents())?;
    }
    validate_shipping_fee_cents(shipping.fee.cents())?;
    if let Some(d) = discount {
        d.validate()?;
    }

    let subtotal: Money = items.iter().map(LineItem::line_total).sum();
    let discount_amount = discount.map_or(Money::zero(), |d| d.amount_off(subtotal));
    let taxable_base = subtotal - discount_amount;
    let tax = taxable_base.calculate_tax(TaxRate::standard());
    let shipping_amount = shipping.cost(discount);

    Ok(PriceBreakdown {
        subtotal,
        discount: discount_amount,
        taxable_base,
        tax,
        shipping: shipping_amount,
        total: taxable_base + tax + shipping_amount,
    })
}

/// Splits an order-level discount across lines, proportionally to each
/// line's total.
///
/// Shares are floored; the rounding remainder goes to the last line so the
/// shares always add up to `discount` exactly.
pub fn allocate_discount(items: &[LineItem], discount: Money) -> Vec<Money> {
    let subtotal: Money = items.iter().map(LineItem::line_total).sum();
    if items.is_empty() || !subtotal.is_positive() || discount.is_zero() {
        return vec![Money::zero(); items.len()];
    }

    let mut shares: Vec<Money> = items
        .iter()
        .map(|item| {
            let share = item.line_total().cents() as i128 * discount.cents() as i128
                / subtotal.cents() as i128;
            Money::from_cents(share as i64)
        })
        .collect();

    let allocated: Money = shares.iter().copied().sum();
    if let Some(last) = shares.last_mut() {
        *last += discount - allocated;
    }
    shares
}

// =============================================================================
// Unit Tests
// =============================================================================
