//! # Promotion Module
//!
//! Coupons and the shipping configuration row.
//!
//! ## Coupon Resolution
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  " summer10 " ──► normalize_code ──► "SUMMER10" ──► lookup (db)         │
//! │                                                        │                │
//! │                 ┌──────────────────────────────────────┘                │
//! │                 ▼                                                       │
//! │   missing / reserved code ──────────────► NotFound                      │
//! │   is_active = false ────────────────────► Inactive                      │
//! │   now < starts_at ──────────────────────► NotStarted                    │
//! │   now > ends_at ────────────────────────► Expired                       │
//! │   uses >= max_uses ─────────────────────► Exhausted                     │
//! │   otherwise ────────────────────────────► AppliedDiscount               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Resolution is read-only. Usage is counted when an order is created, in
//! the same transaction as the order insert.
//!
//! ## Shipping Configuration
//! The storefront stores its shipping setup as a promotion row with the
//! reserved code [`SHIPPING_CONFIG_CODE`]. Its `discount_value` is the flat
//! shipping fee in cents and `is_active` turns on free shipping for every
//! cart.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use ts_rs::TS;

use crate::money::Money;
use crate::pricing::{AppliedDiscount, ShippingPolicy};
use crate::SHIPPING_CONFIG_CODE;

// =============================================================================
// Discount Type
// =============================================================================

/// How a coupon's `discount_value` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum DiscountType {
    /// `discount_value` in basis points (1000 = 10%).
    Percentage,
    /// `discount_value` in cents.
    Fixed,
    /// `discount_value` is ignored; shipping is waived.
    FreeShipping,
}

impl fmt::Display for DiscountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountType::Percentage => write!(f, "percentage"),
            DiscountType::Fixed => write!(f, "fixed"),
            DiscountType::FreeShipping => write!(f, "free_shipping"),
        }
    }
}

// =============================================================================
// Promotion
// =============================================================================

/// A coupon code customers can enter at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Promotion {
    pub id: String,

    /// Normalized (trimmed, upper-case) code. Unique.
    pub code: String,

    pub description: Option<String>,
    pub discount_type: DiscountType,

    /// Basis points for percentage, cents for fixed, 0 for free shipping.
    pub discount_value: i64,

    #[ts(as = "Option<String>")]
    pub starts_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub ends_at: Option<DateTime<Utc>>,

    /// Usage cap. `None` means unlimited.
    pub max_uses: Option<i64>,

    /// Orders created with this coupon so far.
    pub uses: i64,

    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Promotion {
    /// Checks the coupon against the clock and its usage cap.
    ///
    /// Rejections are checked in a fixed order (active, window, cap) so the
    /// customer always sees the same reason for the same coupon.
    pub fn check_applicable(&self, now: DateTime<Utc>) -> Result<AppliedDiscount, PromotionRejection> {
        if is_reserved_code(&self.code) {
            return Err(PromotionRejection::NotFound);
        }
        if !self.is_active {
            return Err(PromotionRejection::Inactive);
        }
        if self.starts_at.is_some_and(|starts| now < starts) {
            return Err(PromotionRejection::NotStarted);
        }
        if self.ends_at.is_some_and(|ends| now > ends) {
            return Err(PromotionRejection::Expired);
        }
        if self.max_uses.is_some_and(|max| self.uses >= max) {
            return Err(PromotionRejection::Exhausted);
        }
        Ok(self.discount())
    }

    /// The discount this coupon grants, ignoring applicability.
    pub fn discount(&self) -> AppliedDiscount {
        match self.discount_type {
            DiscountType::Percentage => AppliedDiscount::Percentage {
                bps: self.discount_value.clamp(0, 10_000) as u32,
            },
            DiscountType::Fixed => AppliedDiscount::Fixed {
                amount: Money::from_cents(self.discount_value),
            },
            DiscountType::FreeShipping => AppliedDiscount::FreeShipping,
        }
    }

    /// Remaining uses, `None` when unlimited.
    pub fn remaining_uses(&self) -> Option<i64> {
        self.max_uses.map(|max| (max - self.uses).max(0))
    }
}

/// Resolves an optional lookup result into a discount or a rejection.
pub fn resolve(
    found: Option<&Promotion>,
    now: DateTime<Utc>,
) -> Result<AppliedDiscount, PromotionRejection> {
    match found {
        Some(promotion) => promotion.check_applicable(now),
        None => Err(PromotionRejection::NotFound),
    }
}

/// Normalizes a customer-entered code: trimmed, upper-case.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Whether `code` is the reserved shipping configuration code.
pub fn is_reserved_code(code: &str) -> bool {
    normalize_code(code) == SHIPPING_CONFIG_CODE
}

// =============================================================================
// Promotion Rejection
// =============================================================================

/// Why a coupon could not be applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum PromotionRejection {
    #[error("coupon code not found")]
    NotFound,

    #[error("coupon is not active")]
    Inactive,

    #[error("coupon is not valid yet")]
    NotStarted,

    #[error("coupon has expired")]
    Expired,

    #[error("coupon usage limit reached")]
    Exhausted,

    /// Valid coupon that has nothing to take off this kind of order.
    #[error("coupon does not apply to this order")]
    NotApplicable,
}

impl PromotionRejection {
    /// Machine-readable code for API error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            PromotionRejection::NotFound => "COUPON_NOT_FOUND",
            PromotionRejection::Inactive => "COUPON_INACTIVE",
            PromotionRejection::NotStarted => "COUPON_NOT_STARTED",
            PromotionRejection::Expired => "COUPON_EXPIRED",
            PromotionRejection::Exhausted => "COUPON_EXHAUSTED",
            PromotionRejection::NotApplicable => "COUPON_NOT_APPLICABLE",
        }
    }
}

// =============================================================================
// Shipping Configuration
// =============================================================================

/// The storefront-wide shipping setup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ShippingConfig {
    /// Flat fee charged per order, in cents.
    pub fee_cents: i64,
    /// When on, every cart ships free.
    pub free_shipping_active: bool,
}

impl ShippingConfig {
    /// Fallback used until an administrator saves a configuration.
    pub fn with_default_fee(fee_cents: i64) -> Self {
        ShippingConfig {
            fee_cents,
            free_shipping_active: false,
        }
    }

    /// Reads the configuration from the reserved promotion row.
    pub fn from_promotion(row: &Promotion) -> Self {
        ShippingConfig {
            fee_cents: row.discount_value.max(0),
            free_shipping_active: row.is_active,
        }
    }

    pub fn policy(&self) -> ShippingPolicy {
        ShippingPolicy {
            fee: Money::from_cents(self.fee_cents),
            free_shipping_active: self.free_shipping_active,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(discount_type: DiscountType, value: i64) -> Promotion {
        Promotion {
            id: "promo-1".to_string(),
            code: "SUMMER10".to_string(),
            description: None,
            discount_type,
            discount_value: value,
            starts_at: None,
            ends_at: None,
            max_uses: None,
            uses: 0,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_code() {
        assert_eq!(normalize_code("  summer10 "), "SUMMER10");
        assert_eq!(normalize_code("Free-Ship"), "FREE-SHIP");
    }

    #[test]
    fn test_applicable_coupon() {
        let promo = coupon(DiscountType::Percentage, 1000);
        assert_eq!(
            promo.check_applicable(Utc::now()),
            Ok(AppliedDiscount::Percentage { bps: 1000 })
        );
    }

    #[test]
    fn test_rejection_reasons() {
        let now = Utc::now();

        assert_eq!(resolve(None, now), Err(PromotionRejection::NotFound));

        let mut promo = coupon(DiscountType::Fixed, 500);
        promo.is_active = false;
        assert_eq!(promo.check_applicable(now), Err(PromotionRejection::Inactive));

        let mut promo = coupon(DiscountType::Fixed, 500);
        promo.starts_at = Some(now + Duration::days(1));
        assert_eq!(promo.check_applicable(now), Err(PromotionRejection::NotStarted));

        let mut promo = coupon(DiscountType::Fixed, 500);
        promo.ends_at = Some(now - Duration::days(1));
        assert_eq!(promo.check_applicable(now), Err(PromotionRejection::Expired));

        let mut promo = coupon(DiscountType::Fixed, 500);
        promo.max_uses = Some(3);
        promo.uses = 3;
        assert_eq!(promo.check_applicable(now), Err(PromotionRejection::Exhausted));
        assert_eq!(promo.remaining_uses(), Some(0));
    }

    #[test]
    fn test_window_bounds_inclusive() {
        let now = Utc::now();
        let mut promo = coupon(DiscountType::FreeShipping, 0);
        promo.starts_at = Some(now);
        promo.ends_at = Some(now);
        assert_eq!(promo.check_applicable(now), Ok(AppliedDiscount::FreeShipping));
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let now = Utc::now();
        let promo = coupon(DiscountType::Percentage, 2500);
        assert_eq!(resolve(Some(&promo), now), resolve(Some(&promo), now));
    }

    #[test]
    fn test_reserved_row_is_never_a_coupon() {
        let mut row = coupon(DiscountType::FreeShipping, 9900);
        row.code = SHIPPING_CONFIG_CODE.to_string();
        assert_eq!(row.check_applicable(Utc::now()), Err(PromotionRejection::NotFound));
    }

    #[test]
    fn test_shipping_config_from_row() {
        let mut row = coupon(DiscountType::FreeShipping, 9900);
        row.code = SHIPPING_CONFIG_CODE.to_string();
        row.is_active = false;

        let config = ShippingConfig::from_promotion(&row);
        assert_eq!(config.fee_cents, 9900);
        assert!(!config.free_shipping_active);
        assert_eq!(config.policy(), ShippingPolicy::flat_fee(Money::from_cents(9900)));
    }
}
