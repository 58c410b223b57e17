//! # keystone-core: Pure Business Logic for the Back Office
//!
//! Everything here is deterministic and free of I/O. The database crate
//! persists these types; the engine crate sequences them inside
//! transactions.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Keystone Back Office Architecture                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │            Transport layer (HTTP routes, not in this repo)      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ Caller { id, role }                    │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    keystone-engine                              │   │
//! │  │   OrderLedger  InventoryLedger  DiscountQueue  PaymentLedger    │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ keystone-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────────┐ ┌──────┐ │   │
//! │  │   │  types   │ │  money   │ │ pricing  │ │validation│ │policy│ │   │
//! │  │   │  Order   │ │  Money   │ │ PricedLn │ │  rules   │ │ RBAC │ │   │
//! │  │   │ Payment  │ │ TaxRate  │ │ Totals   │ │  checks  │ │      │ │   │
//! │  │   └──────────┘ └──────────┘ └──────────┘ └──────────┘ └──────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 keystone-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities (Product, Order, DiscountRequest, Payment)
//! - [`money`] - Money type with integer arithmetic, plus [`TaxRate`]
//! - [`pricing`] - Line snapshots and order totals
//! - [`policy`] - Role / ownership authorization
//! - [`validation`] - Input validation
//! - [`error`] - Domain error taxonomy
//!
//! ## Example Usage
//!
//! ```rust
//! use keystone_core::money::{Money, TaxRate};
//!
//! let subtotal = Money::from_cents(300);
//! let tax = subtotal.calculate_tax(TaxRate::from_bps(1000)); // 10%
//! assert_eq!(tax.cents(), 30);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod policy;
pub mod pricing;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, TaxRate};
pub use policy::{authorize, Action, Caller, Role};
pub use pricing::{price_lines, OrderTotals, PricedLine};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Flat tax rate applied when configuration does not override it (10%).
pub const DEFAULT_TAX_RATE_BPS: u32 = 1000;

/// Maximum line items allowed on a single order.
pub const MAX_ORDER_ITEMS: usize = 200;

/// Maximum quantity of a single line item.
///
/// Guards against typos such as 1000 instead of 10; not a stock check.
pub const MAX_ITEM_QUANTITY: i64 = 9_999;
