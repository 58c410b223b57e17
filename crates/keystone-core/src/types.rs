//! # Domain Types
//!
//! Entities and inputs of the order / inventory / payment workflow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │◄──│   OrderItem     │──►│     Order       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  sku            │   │  unit_price     │   │  order_number   │       │
//! │  │  price_cents    │   │  (snapshot)     │   │  status         │       │
//! │  │  quantity       │   │  quantity       │   │  subtotal/tax   │       │
//! │  │  min_stock      │   │  subtotal       │   │  total          │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │ order_id       │
//! │                              ┌────────────────────────┼──────────┐     │
//! │                              ▼                        ▼          │     │
//! │                   ┌─────────────────┐      ┌─────────────────┐   │     │
//! │                   │ DiscountRequest │      │    Payment      │   │     │
//! │                   │  amount, reason │      │  amount (snap)  │   │     │
//! │                   │  pending/appr/  │      │  pending/conf/  │   │     │
//! │                   │  rejected       │      │  refunded       │   │     │
//! │                   └─────────────────┘      └────────┬────────┘   │     │
//! │                                                     ▼            │     │
//! │                                            ┌─────────────────┐   │     │
//! │                                            │    Receipt      │◄──┘     │
//! │                                            │  document_ref   │         │
//! │                                            └─────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An Order owns its items (cascade delete). Products are shared references.
//! Payments and discount requests point back at their order by id.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Product
// =============================================================================

/// A catalog product with its on-hand stock.
///
/// `quantity` is signed and may go negative: orders are accepted against
/// insufficient stock. It changes only through the inventory ledger's
/// delta adjustment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    pub id: String,
    pub sku: String,
    pub name: String,
    pub price_cents: i64,
    /// On-hand units.
    pub quantity: i64,
    /// Reorder threshold used by the low-stock report.
    pub min_stock_level: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// At or below the reorder threshold (including overdrawn stock).
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock_level
    }
}

// =============================================================================
// Order Status
// =============================================================================

/// Order lifecycle.
///
/// ```text
/// pending ──submit──► submitted ──confirm payment──► paid
///    │
///    └──delete──► cancelled (implicit: the row is removed)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Submitted,
    Paid,
    Cancelled,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Submitted => "submitted",
            OrderStatus::Paid => "paid",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Whether `self → next` is one of the forward edges of the lifecycle.
    pub const fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Pending, OrderStatus::Submitted)
                | (OrderStatus::Submitted, OrderStatus::Paid)
                | (OrderStatus::Pending, OrderStatus::Cancelled)
        )
    }

    /// Items, header and totals may only change while pending.
    #[inline]
    pub const fn is_mutable(&self) -> bool {
        matches!(self, OrderStatus::Pending)
    }
}

impl Default for OrderStatus {
    fn default() -> Self {
        OrderStatus::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Order
// =============================================================================

/// Order header.
///
/// Before a discount: `total = subtotal + tax`. An approved discount lowers
/// `total` by `discount_cents` and leaves `subtotal` and `tax` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    /// Human-readable identifier printed on documents.
    pub order_number: String,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub customer_phone: Option<String>,
    pub status: OrderStatus,
    pub subtotal_cents: i64,
    pub tax_cents: i64,
    /// Amount of the single applied discount, zero when none.
    pub discount_cents: i64,
    pub total_cents: i64,
    pub notes: Option<String>,
    /// The sales rep who created the order (ownership for authorization).
    pub sales_rep_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[ts(as = "Option<String>")]
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn has_discount(&self) -> bool {
        self.discount_cents != 0
    }
}

// =============================================================================
// Order Item
// =============================================================================

/// A line item. Product data is frozen at the time the line was priced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub product_id: String,
    /// Position within the order, starting at 1.
    pub line_no: i64,
    pub sku_snapshot: String,
    pub name_snapshot: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    /// quantity × unit_price.
    pub subtotal_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// An order together with its items, in line order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

// =============================================================================
// Order Inputs
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CustomerInfo {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl CustomerInfo {
    pub fn named(name: impl Into<String>) -> Self {
        CustomerInfo {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Requested line: which product, how many.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItemInput {
    pub product_id: String,
    pub quantity: i64,
}

impl OrderItemInput {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        OrderItemInput {
            product_id: product_id.into(),
            quantity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewOrder {
    pub customer: CustomerInfo,
    pub items: Vec<OrderItemInput>,
    pub notes: Option<String>,
}

/// Partial update of a pending order. `None` leaves the field unchanged;
/// `items: Some(..)` replaces every line and re-reserves stock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderUpdate {
    pub customer: Option<CustomerInfo>,
    pub items: Option<Vec<OrderItemInput>>,
    pub notes: Option<String>,
}

/// Filters for listing orders. Every field narrows the result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub owner_id: Option<String>,
    /// Inclusive lower bound on `created_at`.
    #[ts(as = "Option<String>")]
    pub created_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `created_at`.
    #[ts(as = "Option<String>")]
    pub created_to: Option<DateTime<Utc>>,
}

// =============================================================================
// Discount Request
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DiscountStatus {
    Pending,
    Approved,
    Rejected,
}

impl DiscountStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            DiscountStatus::Pending => "pending",
            DiscountStatus::Approved => "approved",
            DiscountStatus::Rejected => "rejected",
        }
    }
}

impl fmt::Display for DiscountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed reduction of a pending order's total, awaiting review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DiscountRequest {
    pub id: String,
    pub order_id: String,
    pub discount_amount_cents: i64,
    pub reason: String,
    pub status: DiscountStatus,
    pub requested_by: String,
    pub reviewed_by: Option<String>,
    pub review_notes: Option<String>,
    #[ts(as = "Option<String>")]
    pub reviewed_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl DiscountRequest {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.discount_amount_cents)
    }
}

// =============================================================================
// Payment
// =============================================================================

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    BankTransfer,
    Other,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::BankTransfer => "bank_transfer",
            PaymentMethod::Other => "other",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Confirmed,
    Refunded,
}

impl PaymentStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Confirmed => "confirmed",
            PaymentStatus::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The single payment recorded against a submitted order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Payment {
    pub id: String,
    pub order_id: String,
    /// Snapshot of the order total when the payment was created.
    pub amount_cents: i64,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    /// External reference (card auth code, transfer id, ...).
    pub reference: Option<String>,
    pub notes: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub confirmed_at: Option<DateTime<Utc>>,
}

impl Payment {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

/// Caller-supplied payment details.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PaymentMeta {
    pub reference: Option<String>,
    pub notes: Option<String>,
}

// =============================================================================
// Receipt
// =============================================================================

/// Document reference returned by the receipt issuer for a confirmed payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Receipt {
    pub payment_id: String,
    pub order_id: String,
    pub document_ref: String,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
