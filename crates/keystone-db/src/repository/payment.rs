//! # Payment Repository
//!
//! One payment per order (`payments.order_id` is UNIQUE). A second insert
//! for the same order fails with
//! `DbError::UniqueViolation { field: "payments.order_id", .. }`.

use chrono::{DateTime, Utc};
use sqlx::SqliteExecutor;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use keystone_core::{Order, Payment, PaymentMeta, PaymentMethod, PaymentStatus};

const PAYMENT_COLUMNS: &str = "id, order_id, amount_cents, payment_method, payment_status, \
     reference, notes, created_by, created_at, confirmed_at";

/// Column named in the UNIQUE violation for a duplicate payment.
pub const ORDER_UNIQUE_COLUMN: &str = "payments.order_id";

pub async fn insert<'e, E>(exec: E, payment: &Payment) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(
        order_id = %payment.order_id,
        amount_cents = payment.amount_cents,
        method = %payment.payment_method,
        "Inserting payment"
    );

    sqlx::query(
        r#"
        INSERT INTO payments (
            id, order_id, amount_cents, payment_method, payment_status,
            reference, notes, created_by, created_at, confirmed_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&payment.id)
    .bind(&payment.order_id)
    .bind(payment.amount_cents)
    .bind(payment.payment_method)
    .bind(payment.payment_status)
    .bind(&payment.reference)
    .bind(&payment.notes)
    .bind(&payment.created_by)
    .bind(payment.created_at)
    .bind(payment.confirmed_at)
    .execute(exec)
    .await?;

    Ok(())
}

pub async fn get_by_id<'e, E>(exec: E, id: &str) -> DbResult<Option<Payment>>
where
    E: SqliteExecutor<'e>,
{
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?;

    Ok(payment)
}

pub async fn get_by_order<'e, E>(exec: E, order_id: &str) -> DbResult<Option<Payment>>
where
    E: SqliteExecutor<'e>,
{
    let payment = sqlx::query_as::<_, Payment>(&format!(
        "SELECT {PAYMENT_COLUMNS} FROM payments WHERE order_id = ?1"
    ))
    .bind(order_id)
    .fetch_optional(exec)
    .await?;

    Ok(payment)
}

/// Moves a payment `pending → confirmed` and stamps `confirmed_at`.
///
/// Returns `false` when the payment is missing or no longer pending.
pub async fn confirm<'e, E>(exec: E, id: &str, now: DateTime<Utc>) -> DbResult<bool>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %id, "Confirming payment");

    let result = sqlx::query(
        r#"
        UPDATE payments
        SET
            payment_status = 'confirmed',
            confirmed_at = ?2
        WHERE id = ?1 AND payment_status = 'pending'
        "#,
    )
    .bind(id)
    .bind(now)
    .execute(exec)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Builds a pending payment for `order`, snapshotting its total.
pub fn new_payment(
    order: &Order,
    method: PaymentMethod,
    meta: PaymentMeta,
    created_by: &str,
) -> Payment {
    Payment {
        id: Uuid::new_v4().to_string(),
        order_id: order.id.clone(),
        amount_cents: order.total_cents,
        payment_method: method,
        payment_status: PaymentStatus::Pending,
        reference: meta.reference,
        notes: meta.notes,
        created_by: created_by.to_string(),
        created_at: Utc::now(),
        confirmed_at: None,
    }
}
