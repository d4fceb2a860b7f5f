//! # Validation Module
//!
//! Input validation for everything the REST handlers accept.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront pages (TypeScript)                                 │
//! │  └── Immediate user feedback                                            │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: axum handler                                                  │
//! │  ├── Type validation (JSON deserialization)                             │
//! │  └── THIS MODULE: Business rule validation                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── NOT NULL / CHECK constraints                                       │
//! │  └── UNIQUE constraints (sku, email, coupon code)                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::promotion::{is_reserved_code, DiscountType};
use crate::{MAX_ITEM_QUANTITY, MAX_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

fn required_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates an optional free-text field against a maximum length.
pub fn validate_optional_text(field: &str, value: Option<&str>, max: usize) -> ValidationResult<()> {
    match value {
        Some(v) if v.chars().count() > max => Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        }),
        _ => Ok(()),
    }
}

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU (Stock Keeping Unit).
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only letters, numbers, hyphens and underscores
///
/// ## Example
/// ```rust
/// use storefront_core::validation::validate_sku;
///
/// assert!(validate_sku("MUG-01").is_ok());
/// assert!(validate_sku("").is_err());
/// assert!(validate_sku("MUG 01").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    required_text("sku", sku, 50)?;

    if !sku
        .trim()
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "sku",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, 200)
}

pub fn validate_person_name(name: &str) -> ValidationResult<()> {
    required_text("name", name, 120)
}

/// Validates an email address.
///
/// Deliberately loose: one `@`, something on each side, a dot in the domain.
pub fn validate_email(email: &str) -> ValidationResult<()> {
    required_text("email", email, 254)?;

    let email = email.trim();
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    };

    if !valid {
        return Err(ValidationError::invalid_format("email", "must be a valid email address"));
    }

    Ok(())
}

/// Admin passwords: 8 to 128 characters.
pub fn validate_password(password: &str) -> ValidationResult<()> {
    let len = password.chars().count();

    if len < 8 {
        return Err(ValidationError::TooShort {
            field: "password".to_string(),
            min: 8,
        });
    }

    if len > 128 {
        return Err(ValidationError::TooLong {
            field: "password".to_string(),
            max: 128,
        });
    }

    Ok(())
}

/// Validates an optional phone number: digits, spaces, `+`, `-`, parentheses.
pub fn validate_phone(phone: Option<&str>) -> ValidationResult<()> {
    let Some(phone) = phone.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(());
    };

    if phone.len() > 30
        || !phone
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '+' | '-' | '(' | ')'))
    {
        return Err(ValidationError::invalid_format("phone", "must be a phone number"));
    }

    Ok(())
}

/// Validates an already-normalized coupon code.
///
/// ## Rules
/// - 3 to 32 characters
/// - Letters, numbers, hyphens and underscores
/// - Not the reserved shipping configuration code
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    let len = code.chars().count();

    if len == 0 {
        return Err(ValidationError::required("code"));
    }
    if len < 3 {
        return Err(ValidationError::TooShort {
            field: "code".to_string(),
            min: 3,
        });
    }
    if len > 32 {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: 32,
        });
    }
    if is_reserved_code(code) {
        return Err(ValidationError::invalid_format("code", "is reserved"));
    }
    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::invalid_format(
            "code",
            "must contain only letters, numbers, hyphens, and underscores",
        ));
    }

    Ok(())
}

/// Validates a record id passed as `?id=`.
pub fn validate_id(id: &str) -> ValidationResult<()> {
    Uuid::parse_str(id.trim())
        .map(|_| ())
        .map_err(|_| ValidationError::invalid_format("id", "must be a UUID"))
}

pub fn validate_bank_account(
    bank_name: &str,
    account_holder: &str,
    account_number: &str,
) -> ValidationResult<()> {
    required_text("bankName", bank_name, 120)?;
    required_text("accountHolder", account_holder, 120)?;
    required_text("accountNumber", account_number, 40)?;

    if !account_number
        .trim()
        .chars()
        .all(|c| c.is_ascii_digit() || c == '-' || c == ' ')
    {
        return Err(ValidationError::invalid_format(
            "accountNumber",
            "must contain only digits, spaces, and hyphens",
        ));
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

fn amount_in_range(field: &str, cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: MAX_PRICE_CENTS,
        });
    }
    Ok(())
}

/// Validates a price in cents. Zero is allowed.
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    amount_in_range("price", cents)
}

/// Validates a flat shipping fee in cents. Zero is allowed.
pub fn validate_shipping_fee_cents(cents: i64) -> ValidationResult<()> {
    amount_in_range("shipping fee", cents)
}

pub fn validate_stock(stock: i64) -> ValidationResult<()> {
    if stock < 0 {
        return Err(ValidationError::OutOfRange {
            field: "stock".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }
    Ok(())
}

/// Percentage in basis points: 0 to 10000 (0% to 100%).
pub fn validate_percentage_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "discount value".to_string(),
            min: 0,
            max: 10_000,
        });
    }
    Ok(())
}

/// Validates the rule fields of a promotion.
///
/// ## Rules
/// - percentage: 0 to 10000 bps
/// - fixed: non-negative cents
/// - free shipping: value must be 0
/// - `starts_at` not after `ends_at`
/// - `max_uses`, when set, at least 1
pub fn validate_promotion_rule(
    discount_type: DiscountType,
    discount_value: i64,
    starts_at: Option<DateTime<Utc>>,
    ends_at: Option<DateTime<Utc>>,
    max_uses: Option<i64>,
) -> ValidationResult<()> {
    match discount_type {
        DiscountType::Percentage => {
            if !(0..=10_000).contains(&discount_value) {
                return Err(ValidationError::OutOfRange {
                    field: "discountValue".to_string(),
                    min: 0,
                    max: 10_000,
                });
            }
        }
        DiscountType::Fixed => {
            if discount_value < 0 {
                return Err(ValidationError::OutOfRange {
                    field: "discountValue".to_string(),
                    min: 0,
                    max: i64::MAX,
                });
            }
        }
        DiscountType::FreeShipping => {
            if discount_value != 0 {
                return Err(ValidationError::invalid_format(
                    "discountValue",
                    "must be 0 for free shipping coupons",
                ));
            }
        }
    }

    if let (Some(starts), Some(ends)) = (starts_at, ends_at) {
        if starts > ends {
            return Err(ValidationError::invalid_format(
                "endsAt",
                "must not be before startsAt",
            ));
        }
    }

    if max_uses.is_some_and(|max| max < 1) {
        return Err(ValidationError::OutOfRange {
            field: "maxUses".to_string(),
            min: 1,
            max: i64::MAX,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
