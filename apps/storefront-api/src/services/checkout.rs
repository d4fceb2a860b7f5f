//! # Checkout Service
//!
//! Prices carts and turns them into orders.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Checkout Flow                                 │
//! │                                                                         │
//! │  cart lines ──► merge duplicates ──► load products ──► stock check      │
//! │                                                           │             │
//! │  coupon code ──► get_by_code ──► check_applicable(now) ───┤             │
//! │                                                           │             │
//! │  shipping row (or default fee) ──► ShippingPolicy ────────┤             │
//! │                                                           ▼             │
//! │                                               pricing::calculate        │
//! │                                                           │             │
//! │         quote ◄───────────────────────────────────────────┤             │
//! │                                                           ▼             │
//! │                             Order + build_items ──► orders().create     │
//! │                             (stock, coupon usage: one transaction)      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The stock check here only gives the customer an early, friendly error.
//! The guarded decrement inside `create` is what prevents overselling.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::AppState;
use storefront_core::order::{build_items, generate_order_number, OrderLine};
use storefront_core::pricing::{allocate_discount, calculate};
use storefront_core::promotion::{normalize_code, resolve};
use storefront_core::validation::{
    validate_email, validate_id, validate_optional_text, validate_person_name, validate_phone,
    validate_quantity,
};
use storefront_core::{
    AppliedDiscount, CoreError, CoreResult, LineItem, Order, OrderDetail, OrderStatus,
    PaymentMethod, PaymentStatus, PriceBreakdown, PromotionRejection, ShippingConfig,
    ShippingPolicy, ValidationError, MAX_CART_ITEMS,
};

/// Name recorded on counter sales when the customer gives none.
pub const WALK_IN_CUSTOMER: &str = "Walk-in customer";

const MAX_ADDRESS_LEN: usize = 500;
const MAX_NOTES_LEN: usize = 1000;

// =============================================================================
// Requests
// =============================================================================

/// One cart line as sent by the client.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

/// `POST /api/cart/quote`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartRequest {
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// `POST /api/orders`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
    pub customer_name: String,
    pub customer_email: String,
    #[serde(default)]
    pub customer_phone: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<String>,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub bank_account_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

/// `POST /api/orders/in-store`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InStoreSaleRequest {
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_phone: Option<String>,
    /// Default: cash
    #[serde(default)]
    pub payment_method: Option<PaymentMethod>,
    #[serde(default)]
    pub bank_account_id: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub items: Vec<CartLine>,
    #[serde(default)]
    pub coupon_code: Option<String>,
}

// =============================================================================
// Quote
// =============================================================================

/// A priced cart line.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteLine {
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub unit_price_cents: i64,
    pub quantity: i64,
    pub line_total_cents: i64,
    pub discount_cents: i64,
}

/// Response of `POST /api/cart/quote`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartQuote {
    pub items: Vec<QuoteLine>,
    pub coupon_code: Option<String>,
    pub discount: Option<AppliedDiscount>,
    pub pricing: PriceBreakdown,
    pub shipping: ShippingConfig,
}

/// A cart after lookup and pricing, ready to be shown or ordered.
#[derive(Debug, Clone)]
pub struct PricedCart {
    pub lines: Vec<OrderLine>,
    pub coupon_code: Option<String>,
    pub discount: Option<AppliedDiscount>,
    pub breakdown: PriceBreakdown,
}

impl PricedCart {
    fn quote_lines(&self) -> Vec<QuoteLine> {
        let line_items: Vec<LineItem> = self.lines.iter().map(OrderLine::as_line_item).collect();
        let shares = allocate_discount(&line_items, self.breakdown.discount);

        self.lines
            .iter()
            .zip(line_items.iter().zip(shares))
            .map(|(line, (item, share))| QuoteLine {
                product_id: line.product_id.clone(),
                sku: line.sku.clone(),
                name: line.name.clone(),
                unit_price_cents: line.unit_price.cents(),
                quantity: line.quantity,
                line_total_cents: item.line_total().cents(),
                discount_cents: share.cents(),
            })
            .collect()
    }
}

// =============================================================================
// Building Blocks
// =============================================================================

/// Combines lines for the same product, keeping first-seen order.
///
/// ## Errors
/// `EmptyCart`, `CartTooLarge`, or a validation error for a bad product id
/// or a (combined) quantity outside 1-999.
pub fn merge_lines(items: &[CartLine]) -> CoreResult<Vec<(String, i64)>> {
    if items.is_empty() {
        return Err(CoreError::EmptyCart);
    }
    if items.len() > MAX_CART_ITEMS {
        return Err(CoreError::CartTooLarge {
            max: MAX_CART_ITEMS,
        });
    }

    let mut merged: Vec<(String, i64)> = Vec::with_capacity(items.len());
    for line in items {
        let product_id = line.product_id.trim();
        validate_id(product_id)?;
        validate_quantity(line.quantity)?;

        match merged.iter().position(|(id, _)| id == product_id) {
            Some(pos) => merged[pos].1 += line.quantity,
            None => merged.push((product_id.to_string(), line.quantity)),
        }
    }

    for (_, qty) in &merged {
        validate_quantity(*qty)?;
    }

    Ok(merged)
}

/// The stored shipping configuration, or the configured default fee.
pub async fn shipping_config(state: &AppState) -> ApiResult<ShippingConfig> {
    let stored = state.db.promotions().shipping_config().await?;
    Ok(stored.unwrap_or_else(|| {
        ShippingConfig::with_default_fee(state.config.default_shipping_fee_cents)
    }))
}

/// Resolves a customer-entered coupon code. Blank codes mean no coupon.
pub async fn resolve_coupon(
    state: &AppState,
    code: Option<&str>,
    now: DateTime<Utc>,
) -> ApiResult<Option<(String, AppliedDiscount)>> {
    let Some(raw) = code.map(str::trim).filter(|c| !c.is_empty()) else {
        return Ok(None);
    };

    let code = normalize_code(raw);
    let found = state.db.promotions().get_by_code(&code).await?;
    let discount = resolve(found.as_ref(), now).map_err(CoreError::from)?;

    Ok(Some((code, discount)))
}

/// Looks up products, checks availability and prices the cart.
pub async fn price_cart(
    state: &AppState,
    items: &[CartLine],
    coupon_code: Option<&str>,
    shipping: ShippingPolicy,
    now: DateTime<Utc>,
) -> ApiResult<PricedCart> {
    let merged = merge_lines(items)?;

    let ids: Vec<String> = merged.iter().map(|(id, _)| id.clone()).collect();
    let products: HashMap<String, _> = state
        .db
        .products()
        .get_by_ids(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id.clone(), p))
        .collect();

    let mut lines = Vec::with_capacity(merged.len());
    for (product_id, quantity) in merged {
        let product = products
            .get(&product_id)
            .filter(|p| p.is_active)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.clone()))?;

        if !product.can_sell(quantity) {
            return Err(CoreError::InsufficientStock {
                sku: product.sku.clone(),
                available: product.stock,
                requested: quantity,
            }
            .into());
        }

        lines.push(OrderLine {
            product_id,
            sku: product.sku.clone(),
            name: product.name.clone(),
            unit_price: product.price(),
            quantity,
        });
    }

    let coupon = resolve_coupon(state, coupon_code, now).await?;
    let (coupon_code, discount) = match coupon {
        Some((code, discount)) => (Some(code), Some(discount)),
        None => (None, None),
    };

    let line_items: Vec<LineItem> = lines.iter().map(OrderLine::as_line_item).collect();
    let breakdown = calculate(&line_items, discount.as_ref(), &shipping)?;

    Ok(PricedCart {
        lines,
        coupon_code,
        discount,
        breakdown,
    })
}

// =============================================================================
// Operations
// =============================================================================

/// Prices a cart without writing anything.
pub async fn quote(state: &AppState, request: &CartRequest) -> ApiResult<CartQuote> {
    let shipping = shipping_config(state).await?;
    let priced = price_cart(
        state,
        &request.items,
        request.coupon_code.as_deref(),
        shipping.policy(),
        Utc::now(),
    )
    .await?;

    Ok(CartQuote {
        items: priced.quote_lines(),
        coupon_code: priced.coupon_code,
        discount: priced.discount,
        pricing: priced.breakdown,
        shipping,
    })
}

/// Places an online order: `pending` / `pending`, flat shipping.
pub async fn place_order(state: &AppState, request: CheckoutRequest) -> ApiResult<OrderDetail> {
    let customer_name = request.customer_name.trim().to_string();
    validate_person_name(&customer_name)?;

    let customer_email = request.customer_email.trim().to_lowercase();
    validate_email(&customer_email)?;

    let customer_phone = non_blank(request.customer_phone);
    validate_phone(customer_phone.as_deref())?;

    let shipping_address = non_blank(request.shipping_address)
        .ok_or_else(|| ValidationError::required("shippingAddress"))?;
    validate_optional_text(
        "shippingAddress",
        Some(shipping_address.as_str()),
        MAX_ADDRESS_LEN,
    )?;

    let notes = non_blank(request.notes);
    validate_optional_text("notes", notes.as_deref(), MAX_NOTES_LEN)?;

    let bank_account_id = match request.payment_method {
        PaymentMethod::BankTransfer => {
            let id = non_blank(request.bank_account_id)
                .ok_or_else(|| ValidationError::required("bankAccountId"))?;
            Some(active_bank_account(state, &id).await?)
        }
        PaymentMethod::Card => None,
        PaymentMethod::Cash => {
            return Err(ValidationError::NotAllowed {
                field: "paymentMethod".to_string(),
                allowed: vec!["bank_transfer".to_string(), "card".to_string()],
            }
            .into())
        }
    };

    let now = Utc::now();
    let shipping = shipping_config(state).await?;
    let priced = price_cart(
        state,
        &request.items,
        request.coupon_code.as_deref(),
        shipping.policy(),
        now,
    )
    .await?;

    let order = new_order(
        &priced,
        NewOrder {
            customer_name,
            customer_email,
            customer_phone,
            shipping_address: Some(shipping_address),
            status: OrderStatus::Pending,
            payment_status: PaymentStatus::Pending,
            is_in_store: false,
            payment_method: request.payment_method,
            bank_account_id,
            notes,
        },
        now,
    );

    persist(state, order, &priced, now).await
}

/// Registers a counter sale: `completed` / `paid`, no shipping.
pub async fn register_in_store_sale(
    state: &AppState,
    request: InStoreSaleRequest,
) -> ApiResult<OrderDetail> {
    let customer_name =
        non_blank(request.customer_name).unwrap_or_else(|| WALK_IN_CUSTOMER.to_string());
    validate_person_name(&customer_name)?;

    let customer_email = match non_blank(request.customer_email) {
        Some(email) => {
            let email = email.to_lowercase();
            validate_email(&email)?;
            email
        }
        None => String::new(),
    };

    let customer_phone = non_blank(request.customer_phone);
    validate_phone(customer_phone.as_deref())?;

    let notes = non_blank(request.notes);
    validate_optional_text("notes", notes.as_deref(), MAX_NOTES_LEN)?;

    let payment_method = request.payment_method.unwrap_or(PaymentMethod::Cash);
    let bank_account_id = match non_blank(request.bank_account_id) {
        Some(id) if payment_method == PaymentMethod::BankTransfer => {
            Some(active_bank_account(state, &id).await?)
        }
        _ => None,
    };

    let now = Utc::now();
    let priced = price_cart(
        state,
        &request.items,
        request.coupon_code.as_deref(),
        ShippingPolicy::in_store(),
        now,
    )
    .await?;

    // Counter sales never ship, so a free-shipping coupon would only burn a use
    if priced.discount.is_some_and(|d| d.waives_shipping()) {
        return Err(CoreError::CouponRejected(PromotionRejection::NotApplicable).into());
    }

    let order = new_order(
        &priced,
        NewOrder {
            customer_name,
            customer_email,
            customer_phone,
            shipping_address: None,
            status: OrderStatus::Completed,
            payment_status: PaymentStatus::Paid,
            is_in_store: true,
            payment_method,
            bank_account_id,
            notes,
        },
        now,
    );

    persist(state, order, &priced, now).await
}

// =============================================================================
// Helpers
// =============================================================================

struct NewOrder {
    customer_name: String,
    customer_email: String,
    customer_phone: Option<String>,
    shipping_address: Option<String>,
    status: OrderStatus,
    payment_status: PaymentStatus,
    is_in_store: bool,
    payment_method: PaymentMethod,
    bank_account_id: Option<String>,
    notes: Option<String>,
}

fn new_order(priced: &PricedCart, fields: NewOrder, now: DateTime<Utc>) -> Order {
    let mut order = Order {
        id: Uuid::new_v4().to_string(),
        order_number: generate_order_number(now),
        customer_name: fields.customer_name,
        customer_email: fields.customer_email,
        customer_phone: fields.customer_phone,
        shipping_address: fields.shipping_address,
        subtotal_cents: 0,
        discount_cents: 0,
        tax_cents: 0,
        shipping_cents: 0,
        total_cents: 0,
        coupon_code: priced.coupon_code.clone(),
        status: fields.status,
        payment_status: fields.payment_status,
        is_in_store: fields.is_in_store,
        payment_method: fields.payment_method,
        bank_account_id: fields.bank_account_id,
        receipt_path: None,
        notes: fields.notes,
        created_at: now,
        updated_at: now,
    };
    order.apply_breakdown(&priced.breakdown);
    order
}

async fn persist(
    state: &AppState,
    order: Order,
    priced: &PricedCart,
    now: DateTime<Utc>,
) -> ApiResult<OrderDetail> {
    let items = build_items(&order.id, &priced.lines, priced.breakdown.discount, now);
    state.db.orders().create(&order, &items).await?;

    info!(
        order_number = %order.order_number,
        total_cents = order.total_cents,
        in_store = order.is_in_store,
        coupon = ?order.coupon_code,
        "Order placed"
    );

    Ok(OrderDetail::new(order, items))
}

async fn active_bank_account(state: &AppState, id: &str) -> ApiResult<String> {
    validate_id(id)?;

    match state.db.bank_accounts().get_by_id(id).await? {
        Some(account) if account.is_active => Ok(account.id),
        _ => Err(ApiError::Validation(format!(
            "Bank account is not available: {}",
            id
        ))),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_bank_account, seed_coupon, seed_product, test_state};
    use storefront_core::DiscountType;

    fn line(product_id: &str, quantity: i64) -> CartLine {
        CartLine {
            product_id: product_id.to_string(),
            quantity,
        }
    }

    fn cart(items: Vec<CartLine>, coupon: Option<&str>) -> CartRequest {
        CartRequest {
            items,
            coupon_code: coupon.map(str::to_string),
        }
    }

    fn checkout(items: Vec<CartLine>, bank_account_id: &str) -> CheckoutRequest {
        CheckoutRequest {
            customer_name: "Lucía Méndez".to_string(),
            customer_email: "Lucia@Example.com".to_string(),
            customer_phone: Some("+52 55 1234 5678".to_string()),
            shipping_address: Some("Av. Reforma 222, CDMX".to_string()),
            payment_method: PaymentMethod::BankTransfer,
            bank_account_id: Some(bank_account_id.to_string()),
            notes: None,
            items,
            coupon_code: None,
        }
    }

    #[test]
    fn test_merge_lines_combines_duplicates() {
        let id = Uuid::new_v4().to_string();
        let other = Uuid::new_v4().to_string();
        let merged = merge_lines(&[line(&id, 2), line(&other, 1), line(&id, 3)]).unwrap();
        assert_eq!(merged, vec![(id, 5), (other, 1)]);
    }

    #[test]
    fn test_merge_lines_rejects_bad_input() {
        assert!(matches!(merge_lines(&[]), Err(CoreError::EmptyCart)));

        let id = Uuid::new_v4().to_string();
        assert!(matches!(
            merge_lines(&[line(&id, 0)]),
            Err(CoreError::Validation(_))
        ));
        // Each line is fine, the combined quantity is not
        assert!(matches!(
            merge_lines(&[line(&id, 600), line(&id, 600)]),
            Err(CoreError::Validation(_))
        ));
        assert!(matches!(
            merge_lines(&[line("not-a-uuid", 1)]),
            Err(CoreError::Validation(_))
        ));

        let too_many: Vec<CartLine> = (0..=MAX_CART_ITEMS)
            .map(|_| line(&Uuid::new_v4().to_string(), 1))
            .collect();
        assert!(matches!(
            merge_lines(&too_many),
            Err(CoreError::CartTooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_quote_with_percentage_coupon() {
        let state = test_state().await;
        let mug = seed_product(&state, "MUG-01", 10_000, 10).await;
        seed_coupon(&state, "SUMMER10", DiscountType::Percentage, 1000).await;

        let quote = quote(&state, &cart(vec![line(&mug.id, 1)], Some(" summer10 ")))
            .await
            .unwrap();

        assert_eq!(quote.coupon_code.as_deref(), Some("SUMMER10"));
        assert_eq!(quote.pricing.subtotal.cents(), 10_000);
        assert_eq!(quote.pricing.discount.cents(), 1_000);
        assert_eq!(quote.pricing.tax.cents(), 1_440);
        // No stored config yet: default fee applies
        assert_eq!(quote.pricing.shipping.cents(), 9_900);
        assert_eq!(quote.pricing.total.cents(), 9_000 + 1_440 + 9_900);
        assert_eq!(quote.items[0].discount_cents, 1_000);
    }

    #[tokio::test]
    async fn test_quote_uses_stored_free_shipping() {
        let state = test_state().await;
        let pen = seed_product(&state, "PEN-01", 500, 10).await;
        state
            .db
            .promotions()
            .save_shipping_config(&ShippingConfig {
                fee_cents: 9_900,
                free_shipping_active: true,
            })
            .await
            .unwrap();

        let quote = quote(&state, &cart(vec![line(&pen.id, 1)], None)).await.unwrap();
        assert_eq!(quote.pricing.shipping.cents(), 0);
        assert_eq!(quote.pricing.total.cents(), 500 + 80);
        assert!(quote.shipping.free_shipping_active);
    }

    #[tokio::test]
    async fn test_quote_rejects_unknown_coupon_and_short_stock() {
        let state = test_state().await;
        let mug = seed_product(&state, "MUG-01", 1_000, 2).await;

        let err = quote(&state, &cart(vec![line(&mug.id, 1)], Some("NOPE")))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "COUPON_NOT_FOUND");

        let err = quote(&state, &cart(vec![line(&mug.id, 3)], None))
            .await
            .unwrap_err();
        assert_eq!(err.code(), "INSUFFICIENT_STOCK");

        let missing = Uuid::new_v4().to_string();
        let err = quote(&state, &cart(vec![line(&missing, 1)], None))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_place_order_persists_and_decrements_stock() {
        let state = test_state().await;
        let mug = seed_product(&state, "MUG-01", 3_000, 5).await;
        let account = seed_bank_account(&state).await;

        let detail = place_order(&state, checkout(vec![line(&mug.id, 2)], &account.id))
            .await
            .unwrap();

        assert_eq!(detail.order.status, OrderStatus::Pending);
        assert_eq!(detail.order.payment_status, PaymentStatus::Pending);
        assert_eq!(detail.order.customer_email, "lucia@example.com");
        assert_eq!(detail.order.subtotal_cents, 6_000);
        assert_eq!(detail.order.tax_cents, 960);
        assert_eq!(detail.order.shipping_cents, 9_900);
        assert_eq!(detail.items.len(), 1);
        assert!(detail.order.order_number.starts_with("ORD-"));

        let stored = state.db.products().get_by_id(&mug.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 3);
    }

    #[tokio::test]
    async fn test_place_order_counts_coupon_use() {
        let state = test_state().await;
        let mug = seed_product(&state, "MUG-01", 3_000, 5).await;
        let account = seed_bank_account(&state).await;
        let coupon = seed_coupon(&state, "TENOFF", DiscountType::Fixed, 1_000).await;

        let mut request = checkout(vec![line(&mug.id, 1)], &account.id);
        request.coupon_code = Some("tenoff".to_string());
        let detail = place_order(&state, request).await.unwrap();

        assert_eq!(detail.order.coupon_code.as_deref(), Some("TENOFF"));
        assert_eq!(detail.order.discount_cents, 1_000);

        let stored = state.db.promotions().get_by_id(&coupon.id).await.unwrap().unwrap();
        assert_eq!(stored.uses, 1);
    }

    #[tokio::test]
    async fn test_place_order_requires_address_and_account() {
        let state = test_state().await;
        let mug = seed_product(&state, "MUG-01", 3_000, 5).await;
        let account = seed_bank_account(&state).await;

        let mut request = checkout(vec![line(&mug.id, 1)], &account.id);
        request.shipping_address = Some("   ".to_string());
        assert!(matches!(
            place_order(&state, request).await,
            Err(ApiError::Validation(_))
        ));

        let request = checkout(vec![line(&mug.id, 1)], &Uuid::new_v4().to_string());
        assert!(matches!(
            place_order(&state, request).await,
            Err(ApiError::Validation(_))
        ));

        let mut request = checkout(vec![line(&mug.id, 1)], &account.id);
        request.payment_method = PaymentMethod::Cash;
        assert!(matches!(
            place_order(&state, request).await,
            Err(ApiError::Validation(_))
        ));

        // Nothing was sold
        let stored = state.db.products().get_by_id(&mug.id).await.unwrap().unwrap();
        assert_eq!(stored.stock, 5);
    }

    #[tokio::test]
    async fn test_in_store_sale_is_completed_paid_without_shipping() {
        let state = test_state().await;
        let mug = seed_product(&state, "MUG-01", 3_000, 5).await;

        let detail = register_in_store_sale(
            &state,
            InStoreSaleRequest {
                customer_name: None,
                customer_email: None,
                customer_phone: None,
                payment_method: None,
                bank_account_id: None,
                notes: None,
                items: vec![line(&mug.id, 1)],
                coupon_code: None,
            },
        )
        .await
        .unwrap();

        assert_eq!(detail.order.status, OrderStatus::Completed);
        assert_eq!(detail.order.payment_status, PaymentStatus::Paid);
        assert!(detail.order.is_in_store);
        assert_eq!(detail.order.payment_method, PaymentMethod::Cash);
        assert_eq!(detail.order.customer_name, WALK_IN_CUSTOMER);
        assert_eq!(detail.order.shipping_cents, 0);
        assert_eq!(detail.order.total_cents, 3_000 + 480);
    }

    #[tokio::test]
    async fn test_in_store_sale_refuses_free_shipping_coupon() {
        let state = test_state().await;
        let mug = seed_product(&state, "MUG-01", 3_000, 5).await;
        seed_coupon(&state, "SHIPFREE", DiscountType::FreeShipping, 0).await;

        let err = register_in_store_sale(
            &state,
            InStoreSaleRequest {
                customer_name: None,
                customer_email: None,
                customer_phone: None,
                payment_method: None,
                bank_account_id: None,
                notes: None,
                items: vec![line(&mug.id, 1)],
                coupon_code: Some("shipfree".to_string()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code(), "COUPON_NOT_APPLICABLE");

        // Nothing written: no use counted, stock untouched
        let coupon = state.db.promotions().get_by_code("SHIPFREE").await.unwrap().unwrap();
        assert_eq!(coupon.uses, 0);
        let product = state.db.products().get_by_id(&mug.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 5);
        assert!(state
            .db
            .orders()
            .list(&Default::default())
            .await
            .unwrap()
            .is_empty());
    }
}
