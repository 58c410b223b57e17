//! # Order Pricing
//!
//! Turns requested lines into priced snapshots and order totals without
//! touching storage.
//!
//! ## Where This Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create / update order                                                  │
//! │                                                                         │
//! │  1. validate input            (validation.rs, pure)                     │
//! │  2. load products             (inside the transaction)                  │
//! │  3. price_lines()  ◄── THIS MODULE: snapshot every line, pure           │
//! │  4. OrderTotals::from_lines()  ◄── subtotal, tax, total                 │
//! │  5. insert order + items, adjust stock  (same transaction)              │
//! │  6. commit                                                              │
//! │                                                                         │
//! │  Any error in 1-4 happens before a single stock adjustment is issued.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::money::{Money, TaxRate};
use crate::types::{OrderItemInput, Product};
use crate::validation::validate_quantity;

/// One requested line resolved against its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedLine {
    pub line_no: i64,
    pub product_id: String,
    pub sku: String,
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

/// Resolves and prices every requested line.
///
/// `lookup` returns the product for an id, or `None` when it is unknown.
/// The first unknown product or bad quantity aborts the whole batch.
pub fn price_lines<'p, F>(
    items: &[OrderItemInput],
    mut lookup: F,
) -> Result<Vec<PricedLine>, ValidationError>
where
    F: FnMut(&str) -> Option<&'p Product>,
{
    if items.is_empty() {
        return Err(ValidationError::EmptyItems);
    }

    let mut lines = Vec::with_capacity(items.len());

    for (idx, item) in items.iter().enumerate() {
        validate_quantity(item.quantity)?;

        let product = lookup(&item.product_id).ok_or_else(|| ValidationError::UnknownProduct {
            product_id: item.product_id.clone(),
        })?;

        let unit_price = product.price();
        let subtotal = unit_price
            .checked_multiply_quantity(item.quantity)
            .ok_or_else(|| out_of_range("line total"))?;

        lines.push(PricedLine {
            line_no: idx as i64 + 1,
            product_id: product.id.clone(),
            sku: product.sku.clone(),
            name: product.name.clone(),
            quantity: item.quantity,
            unit_price,
            subtotal,
        });
    }

    Ok(lines)
}

/// Monetary header of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub discount: Money,
    pub total: Money,
}

impl OrderTotals {
    /// `subtotal = Σ line subtotals`, `tax = round(subtotal × rate)`,
    /// `total = subtotal + tax`.
    ///
    /// Fails with `OutOfRange` when the subtotal or total does not fit in
    /// an i64.
    pub fn from_lines(lines: &[PricedLine], rate: TaxRate) -> Result<Self, ValidationError> {
        let subtotal = lines
            .iter()
            .try_fold(Money::zero(), |acc, l| acc.checked_add(l.subtotal))
            .ok_or_else(|| out_of_range("order subtotal"))?;
        let tax = subtotal.calculate_tax(rate);
        let total = subtotal
            .checked_add(tax)
            .ok_or_else(|| out_of_range("order total"))?;

        Ok(OrderTotals {
            subtotal,
            tax,
            discount: Money::zero(),
            total,
        })
    }

    /// Re-applies an already approved discount after the lines changed.
    pub fn with_discount(self, discount: Money) -> Result<Self, ValidationError> {
        let gross = self.subtotal + self.tax;
        if discount > gross {
            return Err(ValidationError::DiscountExceedsTotal {
                amount_cents: discount.cents(),
                total_cents: gross.cents(),
            });
        }
        Ok(OrderTotals {
            discount,
            total: gross - discount,
            ..self
        })
    }
}

fn out_of_range(field: &str) -> ValidationError {
    ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;

    fn product(id: &str, price_cents: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            sku: format!("SKU-{}", id),
            name: format!("Product {}", id),
            price_cents,
            quantity: 10,
            min_stock_level: 0,
            created_at: now,
            updated_at: now,
        }
    }

    fn catalog() -> HashMap<String, Product> {
        [product("p1", 100), product("p2", 250)]
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect()
    }

    #[test]
    fn test_single_line_scenario() {
        let catalog = catalog();
        let lines = price_lines(&[OrderItemInput::new("p1", 3)], |id| catalog.get(id)).unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].unit_price.cents(), 100);
        assert_eq!(lines[0].subtotal.cents(), 300);
        assert_eq!(lines[0].sku, "SKU-p1");

        let totals = OrderTotals::from_lines(&lines, TaxRate::from_bps(1000)).unwrap();
        assert_eq!(totals.subtotal.cents(), 300);
        assert_eq!(totals.tax.cents(), 30);
        assert_eq!(totals.total.cents(), 330);
        assert!(totals.discount.is_zero());
    }

    #[test]
    fn test_line_numbers_follow_input_order() {
        let catalog = catalog();
        let items = [OrderItemInput::new("p2", 1), OrderItemInput::new("p1", 2)];
        let lines = price_lines(&items, |id| catalog.get(id)).unwrap();

        assert_eq!(lines[0].line_no, 1);
        assert_eq!(lines[0].product_id, "p2");
        assert_eq!(lines[1].line_no, 2);

        let totals = OrderTotals::from_lines(&lines, TaxRate::from_bps(1000)).unwrap();
        assert_eq!(totals.subtotal.cents(), 450);
        assert_eq!(totals.tax.cents(), 45);
    }

    #[test]
    fn test_empty_items_rejected() {
        let catalog = catalog();
        let err = price_lines(&[], |id| catalog.get(id)).unwrap_err();
        assert!(matches!(err, ValidationError::EmptyItems));
    }

    #[test]
    fn test_unknown_product_rejected() {
        let catalog = catalog();
        let items = [OrderItemInput::new("p1", 1), OrderItemInput::new("nope", 1)];
        let err = price_lines(&items, |id| catalog.get(id)).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownProduct { ref product_id } if product_id == "nope"));
    }

    #[test]
    fn test_non_positive_quantity_rejected() {
        let catalog = catalog();
        let err = price_lines(&[OrderItemInput::new("p1", 0)], |id| catalog.get(id)).unwrap_err();
        assert!(matches!(err, ValidationError::MustBePositive { .. }));
    }

    #[test]
    fn test_reapply_discount() {
        let catalog = catalog();
        let lines = price_lines(&[OrderItemInput::new("p1", 3)], |id| catalog.get(id)).unwrap();
        let totals = OrderTotals::from_lines(&lines, TaxRate::from_bps(1000))
            .unwrap()
            .with_discount(Money::from_cents(30))
            .unwrap();

        assert_eq!(totals.subtotal.cents(), 300);
        assert_eq!(totals.tax.cents(), 30);
        assert_eq!(totals.total.cents(), 300);

        let err = OrderTotals::from_lines(&lines, TaxRate::from_bps(1000))
            .unwrap()
            .with_discount(Money::from_cents(331))
            .unwrap_err();
        assert!(matches!(err, ValidationError::DiscountExceedsTotal { .. }));
    }

    #[test]
    fn test_overflowing_subtotal_rejected() {
        let catalog: HashMap<String, Product> = [product("big1", i64::MAX / 2), product("big2", i64::MAX / 2)]
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let items = [OrderItemInput::new("big1", 1), OrderItemInput::new("big2", 1)];
        let lines = price_lines(&items, |id| catalog.get(id)).unwrap();

        // Subtotal fits; adding tax does not.
        let err = OrderTotals::from_lines(&lines, TaxRate::from_bps(1000)).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "order total"));

        let items = [
            OrderItemInput::new("big1", 1),
            OrderItemInput::new("big2", 1),
            OrderItemInput::new("big1", 1),
        ];
        let lines = price_lines(&items, |id| catalog.get(id)).unwrap();
        let err = OrderTotals::from_lines(&lines, TaxRate::from_bps(0)).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { ref field, .. } if field == "order subtotal"));
    }
}
