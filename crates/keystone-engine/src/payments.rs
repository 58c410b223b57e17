//! # Payment Ledger
//!
//! One payment per submitted order; confirming it pays the order and
//! issues the receipt.
//!
//! ## Confirm Payment
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        confirm_payment                                  │
//! │                                                                         │
//! │  BEGIN                                                                  │
//! │    payment  pending → confirmed     (check-and-set, stamps confirmed_at)│
//! │    order    submitted → paid        (check-and-set, stamps paid_at)     │
//! │    issuer.issue(order, payment)     exactly once                        │
//! │    INSERT receipt (payment_id, document_ref)                            │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Already confirmed → InvalidState before the issuer is called.          │
//! │  Issuer error      → ROLLBACK: payment pending, order submitted.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use keystone_core::validation::validate_payment_meta;
use keystone_core::{
    authorize, Action, Caller, CoreError, OrderDetail, OrderStatus, Payment, PaymentMeta,
    PaymentMethod, PaymentStatus, Receipt,
};
use keystone_db::repository::{order, payment, receipt};
use keystone_db::Database;

use crate::error::{EngineError, EngineResult};
use crate::orders::load_order;
use crate::receipt::ReceiptIssuer;

#[derive(Clone)]
pub struct PaymentLedger {
    db: Database,
    issuer: Arc<dyn ReceiptIssuer>,
}

impl std::fmt::Debug for PaymentLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentLedger").field("db", &self.db).finish_non_exhaustive()
    }
}

impl PaymentLedger {
    pub fn new(db: Database, issuer: Arc<dyn ReceiptIssuer>) -> Self {
        PaymentLedger { db, issuer }
    }

    /// Records a pending payment for a submitted order.
    ///
    /// The amount is the order total at this moment.
    pub async fn create_payment(
        &self,
        caller: &Caller,
        order_id: &str,
        method: PaymentMethod,
        meta: PaymentMeta,
    ) -> EngineResult<Payment> {
        validate_payment_meta(&meta)?;

        let target = order::get_by_id(self.db.pool(), order_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Order", order_id))?;
        authorize(caller, Action::CreatePayment, Some(&target.sales_rep_id))?;

        if target.status != OrderStatus::Submitted {
            return Err(CoreError::invalid_state("Order", order_id, target.status, "take a payment").into());
        }
        if payment::get_by_order(self.db.pool(), order_id).await?.is_some() {
            return Err(duplicate_payment(order_id));
        }

        let record = payment::new_payment(&target, method, meta, &caller.id);

        // The pre-check above can race a concurrent create; the UNIQUE index
        // on order_id settles it.
        payment::insert(self.db.pool(), &record).await.map_err(|e| {
            if e.is_unique_violation_on(payment::ORDER_UNIQUE_COLUMN) {
                duplicate_payment(order_id)
            } else {
                EngineError::from(e)
            }
        })?;

        info!(
            payment_id = %record.id,
            order_id = %order_id,
            amount = %record.amount(),
            method = %method,
            by = %caller.id,
            "Payment created"
        );
        Ok(record)
    }

    /// Confirms a pending payment, pays its order and issues the receipt.
    pub async fn confirm_payment(&self, caller: &Caller, payment_id: &str) -> EngineResult<Payment> {
        let mut uow = self.db.begin().await?;
        let now = Utc::now();

        let pending = payment::get_by_id(uow.conn(), payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id))?;
        let target = load_order(&mut uow, &pending.order_id).await?;
        authorize(caller, Action::ConfirmPayment, Some(&target.sales_rep_id))?;

        if pending.payment_status != PaymentStatus::Pending {
            return Err(CoreError::invalid_state("Payment", payment_id, pending.payment_status, "confirm").into());
        }

        if !payment::confirm(uow.conn(), payment_id, now).await? {
            let status = payment::get_by_id(uow.conn(), payment_id)
                .await?
                .map(|p| p.payment_status)
                .unwrap_or(pending.payment_status);
            return Err(CoreError::invalid_state("Payment", payment_id, status, "confirm").into());
        }

        if !order::transition_status(uow.conn(), &target.id, OrderStatus::Submitted, OrderStatus::Paid, now)
            .await?
        {
            let current = load_order(&mut uow, &target.id).await?;
            return Err(CoreError::invalid_state("Order", &target.id, current.status, "be paid").into());
        }

        // Snapshots as they will be committed.
        let confirmed = payment::get_by_id(uow.conn(), payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id))?;
        let paid = OrderDetail {
            order: load_order(&mut uow, &target.id).await?,
            items: order::get_items(uow.conn(), &target.id).await?,
        };

        let document_ref = match self.issuer.issue(&paid, &confirmed).await {
            Ok(reference) => reference,
            Err(e) => {
                warn!(payment_id = %payment_id, error = %e, "Receipt issuer failed, rolling back");
                uow.rollback().await?;
                return Err(e.into());
            }
        };

        receipt::insert(
            uow.conn(),
            &Receipt {
                payment_id: payment_id.to_string(),
                order_id: target.id.clone(),
                document_ref: document_ref.clone(),
                issued_at: now,
            },
        )
        .await?;

        uow.commit().await?;

        info!(
            payment_id = %payment_id,
            order_id = %target.id,
            order_number = %target.order_number,
            amount = %confirmed.amount(),
            receipt = %document_ref,
            "Payment confirmed, order paid"
        );
        Ok(confirmed)
    }

    pub async fn get(&self, caller: &Caller, payment_id: &str) -> EngineResult<Payment> {
        let record = self.load(payment_id).await?;
        self.authorize_view(caller, &record).await?;
        Ok(record)
    }

    /// The stored receipt reference of a confirmed payment.
    pub async fn receipt(&self, caller: &Caller, payment_id: &str) -> EngineResult<Receipt> {
        let record = self.load(payment_id).await?;
        self.authorize_view(caller, &record).await?;

        receipt::get_by_payment(self.db.pool(), payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Receipt", payment_id).into())
    }

    async fn load(&self, payment_id: &str) -> EngineResult<Payment> {
        payment::get_by_id(self.db.pool(), payment_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Payment", payment_id).into())
    }

    async fn authorize_view(&self, caller: &Caller, record: &Payment) -> EngineResult<()> {
        let owner = order::get_by_id(self.db.pool(), &record.order_id)
            .await?
            .map(|o| o.sales_rep_id);
        authorize(caller, Action::ViewOrder, owner.as_deref())?;
        Ok(())
    }
}

fn duplicate_payment(order_id: &str) -> EngineError {
    CoreError::Conflict(format!("order {} already has a payment", order_id)).into()
}
