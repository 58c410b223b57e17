//! # Receipt Repository
//!
//! Stores the document reference the receipt issuer returned, keyed by
//! payment id.

use sqlx::SqliteExecutor;
use tracing::debug;

use crate::error::DbResult;
use keystone_core::Receipt;

pub async fn insert<'e, E>(exec: E, receipt: &Receipt) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(
        payment_id = %receipt.payment_id,
        document_ref = %receipt.document_ref,
        "Storing receipt reference"
    );

    sqlx::query(
        r#"
        INSERT INTO receipts (payment_id, order_id, document_ref, issued_at)
        VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&receipt.payment_id)
    .bind(&receipt.order_id)
    .bind(&receipt.document_ref)
    .bind(receipt.issued_at)
    .execute(exec)
    .await?;

    Ok(())
}

pub async fn get_by_payment<'e, E>(exec: E, payment_id: &str) -> DbResult<Option<Receipt>>
where
    E: SqliteExecutor<'e>,
{
    let receipt = sqlx::query_as::<_, Receipt>(
        "SELECT payment_id, order_id, document_ref, issued_at FROM receipts WHERE payment_id = ?1",
    )
    .bind(payment_id)
    .fetch_optional(exec)
    .await?;

    Ok(receipt)
}

/// Counts stored receipts (for diagnostics).
pub async fn count<'e, E>(exec: E) -> DbResult<i64>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM receipts")
        .fetch_one(exec)
        .await?;

    Ok(count)
}
