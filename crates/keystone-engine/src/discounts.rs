//! # Discount Approval Queue
//!
//! Sales reps request a discount on a pending order; a manager or admin
//! approves or rejects it. Approval lowers the order total in the same
//! transaction that marks the request approved.
//!
//! ```text
//!            request (sales rep, own pending order, 0 < amount ≤ total)
//!                │
//!                ▼
//!            pending ──approve──► approved   order.total -= amount
//!                │                           order.discount = amount
//!                └────reject────► rejected   order untouched
//! ```
//!
//! An order carries at most one applied discount.

use chrono::Utc;
use tracing::info;

use keystone_core::validation::{validate_discount_amount, validate_notes, validate_reason};
use keystone_core::{
    authorize, Action, Caller, CoreError, DiscountRequest, DiscountStatus, Money, OrderStatus,
};
use keystone_db::repository::{discount, order};
use keystone_db::Database;

use crate::error::{EngineError, EngineResult};
use crate::orders::load_order;

#[derive(Debug, Clone)]
pub struct DiscountQueue {
    db: Database,
}

impl DiscountQueue {
    pub fn new(db: Database) -> Self {
        DiscountQueue { db }
    }

    /// Files a pending request against a pending order.
    pub async fn create_request(
        &self,
        caller: &Caller,
        order_id: &str,
        amount: Money,
        reason: &str,
    ) -> EngineResult<DiscountRequest> {
        validate_reason(reason)?;

        let target = order::get_by_id(self.db.pool(), order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;
        authorize(caller, Action::RequestDiscount, Some(&target.sales_rep_id))?;

        if target.status != OrderStatus::Pending {
            return Err(CoreError::invalid_state("Order", order_id, target.status, "request a discount").into());
        }
        validate_discount_amount(amount, target.total())?;

        let request = discount::new_request(order_id, amount.cents(), reason, &caller.id);
        discount::insert(self.db.pool(), &request).await?;

        info!(
            request_id = %request.id,
            order_id = %order_id,
            amount = %amount,
            by = %caller.id,
            "Discount requested"
        );
        Ok(request)
    }

    /// Approves a pending request and applies it to its order.
    ///
    /// The order must still be pending, carry no other applied discount and
    /// have a total of at least the requested amount.
    pub async fn approve(
        &self,
        caller: &Caller,
        request_id: &str,
        notes: Option<&str>,
    ) -> EngineResult<DiscountRequest> {
        authorize(caller, Action::ResolveDiscount, None)?;
        validate_notes(notes)?;

        let mut uow = self.db.begin().await?;
        let now = Utc::now();

        let request = discount::get_by_id(uow.conn(), request_id)
            .await?
            .ok_or_else(|| CoreError::not_found("DiscountRequest", request_id))?;

        if request.status != DiscountStatus::Pending {
            return Err(already_resolved(request_id, request.status));
        }
        if !discount::resolve(uow.conn(), request_id, DiscountStatus::Approved, &caller.id, notes, now).await? {
            let status = discount::get_by_id(uow.conn(), request_id)
                .await?
                .map(|r| r.status)
                .unwrap_or(request.status);
            return Err(already_resolved(request_id, status));
        }

        let target = load_order(&mut uow, &request.order_id).await?;
        if !order::apply_discount(uow.conn(), &target.id, request.discount_amount_cents, now).await? {
            let state = if target.status != OrderStatus::Pending {
                target.status.to_string()
            } else if target.has_discount() {
                format!("already discounted by {}", Money::from_cents(target.discount_cents))
            } else {
                format!("totalled {}", target.total())
            };
            return Err(CoreError::invalid_state("Order", &target.id, state, "apply this discount").into());
        }

        uow.commit().await?;

        info!(
            request_id = %request_id,
            order_id = %target.id,
            amount = %request.amount(),
            reviewer = %caller.id,
            "Discount approved"
        );
        self.load(request_id).await
    }

    /// Rejects a pending request. The order is not touched.
    pub async fn reject(
        &self,
        caller: &Caller,
        request_id: &str,
        notes: Option<&str>,
    ) -> EngineResult<DiscountRequest> {
        authorize(caller, Action::ResolveDiscount, None)?;
        validate_notes(notes)?;

        let resolved = discount::resolve(
            self.db.pool(),
            request_id,
            DiscountStatus::Rejected,
            &caller.id,
            notes,
            Utc::now(),
        )
        .await?;

        let request = self.load(request_id).await?;
        if !resolved {
            return Err(already_resolved(request_id, request.status));
        }

        info!(request_id = %request_id, reviewer = %caller.id, "Discount rejected");
        Ok(request)
    }

    pub async fn get(&self, caller: &Caller, request_id: &str) -> EngineResult<DiscountRequest> {
        let request = self.load(request_id).await?;
        let owner = order::get_by_id(self.db.pool(), &request.order_id)
            .await?
            .map(|o| o.sales_rep_id);
        authorize(caller, Action::ViewOrder, owner.as_deref())?;
        Ok(request)
    }

    /// Requests, newest first.
    ///
    /// Sales reps must name an order they own; managers and admins may list
    /// across orders.
    pub async fn list(
        &self,
        caller: &Caller,
        status: Option<DiscountStatus>,
        order_id: Option<&str>,
    ) -> EngineResult<Vec<DiscountRequest>> {
        if !caller.role.is_privileged() {
            let Some(order_id) = order_id else {
                return Err(CoreError::Forbidden {
                    caller_id: caller.id.clone(),
                    action: Action::ListAllOrders.to_string(),
                }
                .into());
            };
            let target = order::get_by_id(self.db.pool(), order_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Order", order_id))?;
            authorize(caller, Action::ViewOrder, Some(&target.sales_rep_id))?;
        }

        Ok(discount::list(self.db.pool(), status, order_id).await?)
    }

    async fn load(&self, request_id: &str) -> EngineResult<DiscountRequest> {
        discount::get_by_id(self.db.pool(), request_id)
            .await?
            .ok_or_else(|| CoreError::not_found("DiscountRequest", request_id).into())
    }
}

fn already_resolved(request_id: &str, status: DiscountStatus) -> EngineError {
    CoreError::invalid_state("DiscountRequest", request_id, status, "resolve").into()
}
