//! # Validation Module
//!
//! Input validation for engine operations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Transport (deserialization, not in this repo)                │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE - pure checks before any storage access          │
//! │  ├── customer / notes / reason fields                                  │
//! │  ├── item list shape and quantities                                    │
//! │  └── discount bounds                                                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── CHECK constraints                                                 │
//! │  ├── UNIQUE (sku, order_number, payments.order_id)                     │
//! │  └── Foreign keys                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{CustomerInfo, OrderItemInput, PaymentMeta};
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NAME_LEN: usize = 200;
const MAX_NOTES_LEN: usize = 2000;
const MAX_REASON_LEN: usize = 500;
const MAX_REFERENCE_LEN: usize = 100;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Only alphanumeric characters, hyphens, underscores
///
/// ## Example
/// ```rust
/// use keystone_core::validation::validate_sku;
///
/// assert!(validate_sku("P1-RED").is_ok());
/// assert!(validate_sku("has space").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.len() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    if !sku
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "sku".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

fn require_text(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    require_text("name", name, MAX_NAME_LEN)
}

/// Validates customer fields of an order.
///
/// ## Rules
/// - Name required, at most 200 characters
/// - Email, when given, must look like `local@domain`
pub fn validate_customer(customer: &CustomerInfo) -> ValidationResult<()> {
    require_text("customer name", &customer.name, MAX_NAME_LEN)?;

    if let Some(email) = customer.email.as_deref() {
        let email = email.trim();
        let well_formed = email
            .split_once('@')
            .map(|(local, domain)| !local.is_empty() && domain.contains('.'))
            .unwrap_or(false);
        if !well_formed {
            return Err(ValidationError::InvalidFormat {
                field: "customer email".to_string(),
                reason: "must be an email address".to_string(),
            });
        }
    }

    if let Some(phone) = customer.phone.as_deref() {
        if phone.trim().chars().count() > 40 {
            return Err(ValidationError::TooLong {
                field: "customer phone".to_string(),
                max: 40,
            });
        }
    }

    Ok(())
}

pub fn validate_notes(notes: Option<&str>) -> ValidationResult<()> {
    match notes {
        Some(n) if n.chars().count() > MAX_NOTES_LEN => Err(ValidationError::TooLong {
            field: "notes".to_string(),
            max: MAX_NOTES_LEN,
        }),
        _ => Ok(()),
    }
}

pub fn validate_reason(reason: &str) -> ValidationResult<()> {
    require_text("reason", reason, MAX_REASON_LEN)
}

/// Reference at most 100 characters, notes as [`validate_notes`].
pub fn validate_payment_meta(meta: &PaymentMeta) -> ValidationResult<()> {
    if let Some(reference) = meta.reference.as_deref() {
        if reference.trim().chars().count() > MAX_REFERENCE_LEN {
            return Err(ValidationError::TooLong {
                field: "payment reference".to_string(),
                max: MAX_REFERENCE_LEN,
            });
        }
    }
    validate_notes(meta.notes.as_deref())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY
///
/// Stock on hand is deliberately not consulted.
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

/// Validates a price in cents. Zero is allowed (free items).
///
/// ## Example
/// ```rust
/// use keystone_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a tax rate in basis points (0% to 100%).
pub fn validate_tax_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10000 {
        return Err(ValidationError::OutOfRange {
            field: "tax_rate".to_string(),
            min: 0,
            max: 10000,
        });
    }

    Ok(())
}

/// Validates a discount against the order total it targets.
///
/// ## Rules
/// - `0 < amount`
/// - `amount ≤ total`
pub fn validate_discount_amount(amount: Money, total: Money) -> ValidationResult<()> {
    if !amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "discount amount".to_string(),
        });
    }

    if amount > total {
        return Err(ValidationError::DiscountExceedsTotal {
            amount_cents: amount.cents(),
            total_cents: total.cents(),
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates the shape of an item list before any product lookup.
pub fn validate_order_items(items: &[OrderItemInput]) -> ValidationResult<()> {
    if items.is_empty() {
        return Err(ValidationError::EmptyItems);
    }

    if items.len() > MAX_ORDER_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "order items".to_string(),
            min: 1,
            max: MAX_ORDER_ITEMS as i64,
        });
    }

    for item in items {
        if item.product_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "product_id".to_string(),
            });
        }
        validate_quantity(item.quantity)?;
    }

    Ok(())
}

pub fn validate_date_range(
    from: Option<DateTime<Utc>>,
    to: Option<DateTime<Utc>>,
) -> ValidationResult<()> {
    match (from, to) {
        (Some(from), Some(to)) if from > to => Err(ValidationError::InvertedDateRange),
        _ => Ok(()),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("P1").is_ok());
        assert!(validate_sku("widget_blue-2").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku("a b").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_customer() {
        assert!(validate_customer(&CustomerInfo::named("Ada")).is_ok());
        assert!(validate_customer(&CustomerInfo::named("   ")).is_err());

        let mut customer = CustomerInfo::named("Ada");
        customer.email = Some("ada@example.com".to_string());
        assert!(validate_customer(&customer).is_ok());

        customer.email = Some("ada.example.com".to_string());
        assert!(matches!(
            validate_customer(&customer),
            Err(ValidationError::InvalidFormat { .. })
        ));
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(MAX_ITEM_QUANTITY).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
        assert!(validate_quantity(MAX_ITEM_QUANTITY + 1).is_err());
    }

    #[test]
    fn test_validate_order_items() {
        assert!(matches!(
            validate_order_items(&[]),
            Err(ValidationError::EmptyItems)
        ));
        assert!(validate_order_items(&[OrderItemInput::new("p1", 2)]).is_ok());
        assert!(validate_order_items(&[OrderItemInput::new(" ", 2)]).is_err());
        assert!(validate_order_items(&[OrderItemInput::new("p1", 0)]).is_err());
    }

    #[test]
    fn test_validate_discount_amount() {
        let total = Money::from_cents(330);
        assert!(validate_discount_amount(Money::from_cents(30), total).is_ok());
        assert!(validate_discount_amount(total, total).is_ok());
        assert!(matches!(
            validate_discount_amount(Money::zero(), total),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_discount_amount(Money::from_cents(-5), total),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(matches!(
            validate_discount_amount(Money::from_cents(331), total),
            Err(ValidationError::DiscountExceedsTotal { .. })
        ));
    }

    #[test]
    fn test_validate_date_range() {
        let now = Utc::now();
        assert!(validate_date_range(Some(now), Some(now)).is_ok());
        assert!(validate_date_range(None, Some(now)).is_ok());
        assert!(validate_date_range(Some(now + Duration::days(1)), Some(now)).is_err());
    }

    #[test]
    fn test_validate_reason_and_notes() {
        assert!(validate_reason("loyal customer").is_ok());
        assert!(validate_reason("").is_err());
        assert!(validate_notes(None).is_ok());
        assert!(validate_notes(Some(&"x".repeat(2001))).is_err());
    }

    #[test]
    fn test_validate_payment_meta() {
        assert!(validate_payment_meta(&PaymentMeta::default()).is_ok());
        let long = PaymentMeta {
            reference: Some("x".repeat(101)),
            notes: None,
        };
        assert!(matches!(
            validate_payment_meta(&long),
            Err(ValidationError::TooLong { max: 100, .. })
        ));
    }

    #[test]
    fn test_validate_tax_rate_bps() {
        assert!(validate_tax_rate_bps(0).is_ok());
        assert!(validate_tax_rate_bps(10000).is_ok());
        assert!(validate_tax_rate_bps(10001).is_err());
    }
}
