//! # Discount Request Repository
//!
//! Requests move `pending → approved | rejected` exactly once; `resolve`
//! only matches a row that is still pending.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use keystone_core::{DiscountRequest, DiscountStatus};

const DISCOUNT_COLUMNS: &str = "id, order_id, discount_amount_cents, reason, status, \
     requested_by, reviewed_by, review_notes, reviewed_at, created_at";

pub async fn insert<'e, E>(exec: E, request: &DiscountRequest) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(
        order_id = %request.order_id,
        amount_cents = request.discount_amount_cents,
        "Inserting discount request"
    );

    sqlx::query(
        r#"
        INSERT INTO discount_requests (
            id, order_id, discount_amount_cents, reason, status,
            requested_by, reviewed_by, review_notes, reviewed_at, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&request.id)
    .bind(&request.order_id)
    .bind(request.discount_amount_cents)
    .bind(&request.reason)
    .bind(request.status)
    .bind(&request.requested_by)
    .bind(&request.reviewed_by)
    .bind(&request.review_notes)
    .bind(request.reviewed_at)
    .bind(request.created_at)
    .execute(exec)
    .await?;

    Ok(())
}

pub async fn get_by_id<'e, E>(exec: E, id: &str) -> DbResult<Option<DiscountRequest>>
where
    E: SqliteExecutor<'e>,
{
    let request = sqlx::query_as::<_, DiscountRequest>(&format!(
        "SELECT {DISCOUNT_COLUMNS} FROM discount_requests WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?;

    Ok(request)
}

/// Resolves a pending request, stamping reviewer and time.
///
/// Returns `false` when the request is missing or already resolved.
pub async fn resolve<'e, E>(
    exec: E,
    id: &str,
    status: DiscountStatus,
    reviewer_id: &str,
    notes: Option<&str>,
    now: DateTime<Utc>,
) -> DbResult<bool>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %id, status = %status, reviewer = %reviewer_id, "Resolving discount request");

    let result = sqlx::query(
        r#"
        UPDATE discount_requests
        SET
            status = ?2,
            reviewed_by = ?3,
            review_notes = ?4,
            reviewed_at = ?5
        WHERE id = ?1 AND status = 'pending'
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(reviewer_id)
    .bind(notes)
    .bind(now)
    .execute(exec)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Lists requests, newest first, optionally narrowed by status and order.
pub async fn list<'e, E>(
    exec: E,
    status: Option<DiscountStatus>,
    order_id: Option<&str>,
) -> DbResult<Vec<DiscountRequest>>
where
    E: SqliteExecutor<'e>,
{
    let mut qb: QueryBuilder<'_, Sqlite> = QueryBuilder::new(format!(
        "SELECT {DISCOUNT_COLUMNS} FROM discount_requests WHERE 1 = 1"
    ));

    if let Some(status) = status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(order_id) = order_id {
        qb.push(" AND order_id = ").push_bind(order_id.to_string());
    }
    qb.push(" ORDER BY created_at DESC, rowid DESC");

    let requests = qb
        .build_query_as::<DiscountRequest>()
        .fetch_all(exec)
        .await?;

    Ok(requests)
}

/// Builds a new pending request.
pub fn new_request(
    order_id: &str,
    amount_cents: i64,
    reason: &str,
    requested_by: &str,
) -> DiscountRequest {
    DiscountRequest {
        id: Uuid::new_v4().to_string(),
        order_id: order_id.to_string(),
        discount_amount_cents: amount_cents,
        reason: reason.trim().to_string(),
        status: DiscountStatus::Pending,
        requested_by: requested_by.to_string(),
        reviewed_by: None,
        review_notes: None,
        reviewed_at: None,
        created_at: Utc::now(),
    }
}
