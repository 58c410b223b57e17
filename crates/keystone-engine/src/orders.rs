//! # Order Ledger
//!
//! Order lifecycle and the stock it reserves.
//!
//! ## Create Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         create_order                                    │
//! │                                                                         │
//! │  1. Pure validation (customer, notes, item shape)   ── no I/O           │
//! │  2. BEGIN                                                               │
//! │  3.   load every product        unknown id → ValidationError, ROLLBACK  │
//! │  4.   price lines, totals       subtotal, tax (configured rate), total  │
//! │  5.   INSERT order (pending)                                            │
//! │  6.   INSERT items + adjust(product, -quantity) per line                │
//! │  7. COMMIT                                                              │
//! │                                                                         │
//! │  Any failure between 2 and 7 leaves no order, no items, no stock moved. │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## State Machine
//! ```text
//! pending ──submit──► submitted ──confirm payment──► paid
//!    │
//!    └──delete──► (removed)
//! ```
//! Items, header and totals change only while `pending`.

use chrono::Utc;
use std::collections::HashMap;
use tracing::{debug, info};

use keystone_core::validation::{
    validate_customer, validate_date_range, validate_notes, validate_order_items,
};
use keystone_core::{
    authorize, price_lines, Action, Caller, CoreError, Money, NewOrder, Order, OrderDetail,
    OrderFilter, OrderItem, OrderItemInput, OrderStatus, OrderTotals, OrderUpdate, Product,
    TaxRate,
};
use keystone_db::repository::{order, product};
use keystone_db::{Database, UnitOfWork};

use crate::error::{EngineError, EngineResult};
use crate::inventory::InventoryLedger;

/// Creates, edits, submits and removes orders.
#[derive(Debug, Clone)]
pub struct OrderLedger {
    db: Database,
    tax_rate: TaxRate,
    order_prefix: String,
}

impl OrderLedger {
    pub fn new(db: Database, tax_rate: TaxRate, order_prefix: impl Into<String>) -> Self {
        OrderLedger {
            db,
            tax_rate,
            order_prefix: order_prefix.into(),
        }
    }

    /// Creates a pending order owned by `caller` and reserves its stock.
    pub async fn create_order(&self, caller: &Caller, input: NewOrder) -> EngineResult<OrderDetail> {
        authorize(caller, Action::CreateOrder, None)?;
        validate_customer(&input.customer)?;
        validate_notes(input.notes.as_deref())?;
        validate_order_items(&input.items)?;

        let mut uow = self.db.begin().await?;

        let now = Utc::now();
        let order_id = order::generate_order_id();
        let (items, totals) = self
            .reserve_lines(&mut uow, &order_id, &input.items, Money::zero())
            .await?;

        let header = Order {
            id: order_id,
            order_number: order::generate_order_number(&self.order_prefix),
            customer_name: input.customer.name.trim().to_string(),
            customer_email: trimmed(input.customer.email),
            customer_phone: trimmed(input.customer.phone),
            status: OrderStatus::Pending,
            subtotal_cents: totals.subtotal.cents(),
            tax_cents: totals.tax.cents(),
            discount_cents: 0,
            total_cents: totals.total.cents(),
            notes: input.notes,
            sales_rep_id: caller.id.clone(),
            created_at: now,
            updated_at: now,
            submitted_at: None,
            paid_at: None,
        };

        // Header first: items reference it.
        order::insert(uow.conn(), &header).await?;
        for item in &items {
            order::insert_item(uow.conn(), item).await?;
            InventoryLedger::apply(&mut uow, &item.product_id, -item.quantity).await?;
        }

        uow.commit().await?;

        info!(
            order_id = %header.id,
            order_number = %header.order_number,
            lines = items.len(),
            total = %header.total(),
            sales_rep = %caller.id,
            "Order created"
        );

        Ok(OrderDetail {
            order: header,
            items,
        })
    }

    /// Edits a pending order.
    ///
    /// With `items`, every existing line is released back to stock and the
    /// new list is priced and reserved from scratch; an applied discount is
    /// carried over. Without `items`, only header fields change.
    pub async fn update_order(
        &self,
        caller: &Caller,
        order_id: &str,
        update: OrderUpdate,
    ) -> EngineResult<OrderDetail> {
        if let Some(customer) = &update.customer {
            validate_customer(customer)?;
        }
        validate_notes(update.notes.as_deref())?;
        if let Some(items) = &update.items {
            validate_order_items(items)?;
        }

        let mut uow = self.db.begin().await?;

        let current = load_order(&mut uow, order_id).await?;
        authorize(caller, Action::UpdateOrder, Some(&current.sales_rep_id))?;
        if !current.status.is_mutable() {
            return Err(CoreError::invalid_state("Order", order_id, current.status, "update").into());
        }

        let mut next = current.clone();
        if let Some(customer) = update.customer {
            next.customer_name = customer.name.trim().to_string();
            next.customer_email = trimmed(customer.email);
            next.customer_phone = trimmed(customer.phone);
        }
        if update.notes.is_some() {
            next.notes = update.notes;
        }
        next.updated_at = Utc::now();

        let items = match update.items {
            Some(new_items) => {
                let released = order::get_items(uow.conn(), order_id).await?;
                for item in &released {
                    InventoryLedger::apply(&mut uow, &item.product_id, item.quantity).await?;
                }
                order::delete_items(uow.conn(), order_id).await?;

                let (items, totals) = self
                    .reserve_lines(&mut uow, order_id, &new_items, Money::from_cents(current.discount_cents))
                    .await?;
                for item in &items {
                    order::insert_item(uow.conn(), item).await?;
                    InventoryLedger::apply(&mut uow, &item.product_id, -item.quantity).await?;
                }

                next.subtotal_cents = totals.subtotal.cents();
                next.tax_cents = totals.tax.cents();
                next.discount_cents = totals.discount.cents();
                next.total_cents = totals.total.cents();

                debug!(
                    order_id = %order_id,
                    released = released.len(),
                    reserved = items.len(),
                    "Order lines replaced"
                );
                items
            }
            None => order::get_items(uow.conn(), order_id).await?,
        };

        if !order::update_pending(uow.conn(), &next).await? {
            return Err(state_error(&mut uow, order_id, "update").await);
        }

        uow.commit().await?;

        info!(order_id = %order_id, total = %next.total(), by = %caller.id, "Order updated");

        Ok(OrderDetail { order: next, items })
    }

    /// `pending → submitted`.
    pub async fn submit_order(&self, caller: &Caller, order_id: &str) -> EngineResult<Order> {
        let current = self.load(order_id).await?;
        authorize(caller, Action::SubmitOrder, Some(&current.sales_rep_id))?;

        let moved = order::transition_status(
            self.db.pool(),
            order_id,
            OrderStatus::Pending,
            OrderStatus::Submitted,
            Utc::now(),
        )
        .await?;

        let after = self.load(order_id).await?;
        if !moved {
            return Err(CoreError::invalid_state("Order", order_id, after.status, "submit").into());
        }

        info!(order_id = %order_id, order_number = %after.order_number, "Order submitted");
        Ok(after)
    }

    /// Removes a pending order, releasing its stock. Items and discount
    /// requests go with it.
    pub async fn delete_order(&self, caller: &Caller, order_id: &str) -> EngineResult<()> {
        let mut uow = self.db.begin().await?;

        let current = load_order(&mut uow, order_id).await?;
        authorize(caller, Action::DeleteOrder, Some(&current.sales_rep_id))?;
        if !current.status.is_mutable() {
            return Err(CoreError::invalid_state("Order", order_id, current.status, "delete").into());
        }

        let items = order::get_items(uow.conn(), order_id).await?;
        for item in &items {
            InventoryLedger::apply(&mut uow, &item.product_id, item.quantity).await?;
        }

        if !order::delete_pending(uow.conn(), order_id).await? {
            return Err(state_error(&mut uow, order_id, "delete").await);
        }

        uow.commit().await?;

        info!(
            order_id = %order_id,
            order_number = %current.order_number,
            released_lines = items.len(),
            by = %caller.id,
            "Order deleted"
        );
        Ok(())
    }

    pub async fn get_order(&self, caller: &Caller, order_id: &str) -> EngineResult<OrderDetail> {
        let header = self.load(order_id).await?;
        authorize(caller, Action::ViewOrder, Some(&header.sales_rep_id))?;

        let items = order::get_items(self.db.pool(), order_id).await?;
        Ok(OrderDetail { order: header, items })
    }

    /// Orders matching `filter`, newest first.
    ///
    /// Sales reps see only their own orders; asking for someone else's is
    /// `Forbidden`.
    pub async fn find_all(&self, caller: &Caller, filter: OrderFilter) -> EngineResult<Vec<Order>> {
        validate_date_range(filter.created_from, filter.created_to)?;

        let mut filter = filter;
        if !caller.role.is_privileged() {
            match filter.owner_id.as_deref() {
                Some(owner) if owner != caller.id => {
                    authorize(caller, Action::ListAllOrders, None)?;
                }
                _ => filter.owner_id = Some(caller.id.clone()),
            }
        }

        Ok(order::list(self.db.pool(), &filter).await?)
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    /// Loads products, prices `requested` and builds the stored items.
    ///
    /// `discount` is an already applied discount to carry into the totals.
    async fn reserve_lines(
        &self,
        uow: &mut UnitOfWork,
        order_id: &str,
        requested: &[OrderItemInput],
        discount: Money,
    ) -> EngineResult<(Vec<OrderItem>, OrderTotals)> {
        let mut catalog: HashMap<String, Product> = HashMap::with_capacity(requested.len());
        for item in requested {
            if catalog.contains_key(&item.product_id) {
                continue;
            }
            if let Some(p) = product::get_by_id(uow.conn(), &item.product_id).await? {
                catalog.insert(p.id.clone(), p);
            }
        }

        let lines = price_lines(requested, |id| catalog.get(id))?;
        let mut totals = OrderTotals::from_lines(&lines, self.tax_rate)?;
        if discount.is_positive() {
            totals = totals.with_discount(discount)?;
        }

        let now = Utc::now();
        let items = lines
            .iter()
            .map(|line| order::item_from_line(order_id, line, now))
            .collect();

        Ok((items, totals))
    }

    async fn load(&self, order_id: &str) -> EngineResult<Order> {
        order::get_by_id(self.db.pool(), order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id).into())
    }
}

/// Loads an order inside a unit of work.
pub(crate) async fn load_order(uow: &mut UnitOfWork, order_id: &str) -> EngineResult<Order> {
    order::get_by_id(uow.conn(), order_id)
        .await?
        .ok_or_else(|| CoreError::not_found("Order", order_id).into())
}

/// Explains a check-and-set that matched no row: gone, or in another state.
async fn state_error(
    uow: &mut UnitOfWork,
    order_id: &str,
    operation: &'static str,
) -> EngineError {
    match order::get_by_id(uow.conn(), order_id).await {
        Ok(Some(o)) => CoreError::invalid_state("Order", order_id, o.status, operation).into(),
        Ok(None) => CoreError::not_found("Order", order_id).into(),
        Err(e) => e.into(),
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
