//! # Order Repository
//!
//! Order headers and their line items.
//!
//! ## Check-and-Set Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every state-dependent write carries its precondition in the WHERE:    │
//! │                                                                         │
//! │    UPDATE orders SET status = 'submitted', ...                          │
//! │    WHERE id = ?1 AND status = 'pending'                                 │
//! │                                                                         │
//! │  rows_affected = 1  → we won; the row was pending                       │
//! │  rows_affected = 0  → row missing OR another caller moved it first     │
//! │                       (the caller re-reads to tell which)               │
//! │                                                                         │
//! │  Two concurrent submits: exactly one sees 1 row.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Functions returning `bool` report whether the check-and-set matched.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use keystone_core::{Order, OrderFilter, OrderItem, OrderStatus, PricedLine};

const ORDER_COLUMNS: &str = "id, order_number, customer_name, customer_email, customer_phone, \
     status, subtotal_cents, tax_cents, discount_cents, total_cents, notes, sales_rep_id, \
     created_at, updated_at, submitted_at, paid_at";

const ITEM_COLUMNS: &str = "id, order_id, product_id, line_no, sku_snapshot, name_snapshot, \
     quantity, unit_price_cents, subtotal_cents, created_at";

// =============================================================================
// Orders
// =============================================================================

/// Inserts an order header.
///
/// ## Returns
/// * `Err(DbError::UniqueViolation)` - order number collision
pub async fn insert<'e, E>(exec: E, order: &Order) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(
        order_number = %order.order_number,
        total_cents = order.total_cents,
        "Inserting order"
    );

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, order_number, customer_name, customer_email, customer_phone,
            status, subtotal_cents, tax_cents, discount_cents, total_cents,
            notes, sales_rep_id, created_at, updated_at, submitted_at, paid_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9, ?10,
            ?11, ?12, ?13, ?14, ?15, ?16
        )
        "#,
    )
    .bind(&order.id)
    .bind(&order.order_number)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(order.status)
    .bind(order.subtotal_cents)
    .bind(order.tax_cents)
    .bind(order.discount_cents)
    .bind(order.total_cents)
    .bind(&order.notes)
    .bind(&order.sales_rep_id)
    .bind(order.created_at)
    .bind(order.updated_at)
    .bind(order.submitted_at)
    .bind(order.paid_at)
    .execute(exec)
    .await?;

    Ok(())
}

pub async fn get_by_id<'e, E>(exec: E, id: &str) -> DbResult<Option<Order>>
where
    E: SqliteExecutor<'e>,
{
    let order = sqlx::query_as::<_, Order>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?;

    Ok(order)
}

/// Rewrites the mutable header fields of a pending order.
///
/// Status, owner and timestamps other than `updated_at` are left alone.
pub async fn update_pending<'e, E>(exec: E, order: &Order) -> DbResult<bool>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %order.id, total_cents = order.total_cents, "Updating pending order");

    let result = sqlx::query(
        r#"
        UPDATE orders
        SET
            customer_name = ?2,
            customer_email = ?3,
            customer_phone = ?4,
            notes = ?5,
            subtotal_cents = ?6,
            tax_cents = ?7,
            discount_cents = ?8,
            total_cents = ?9,
            updated_at = ?10
        WHERE id = ?1 AND status = 'pending'
        "#,
    )
    .bind(&order.id)
    .bind(&order.customer_name)
    .bind(&order.customer_email)
    .bind(&order.customer_phone)
    .bind(&order.notes)
    .bind(order.subtotal_cents)
    .bind(order.tax_cents)
    .bind(order.discount_cents)
    .bind(order.total_cents)
    .bind(order.updated_at)
    .execute(exec)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Moves an order `from → to` if it is still in `from`.
///
/// Stamps `submitted_at` when entering `submitted` and `paid_at` when
/// entering `paid`.
pub async fn transition_status<'e, E>(
    exec: E,
    id: &str,
    from: OrderStatus,
    to: OrderStatus,
    now: DateTime<Utc>,
) -> DbResult<bool>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %id, from = %from, to = %to, "Order status transition");

    let result = sqlx::query(
        r#"
        UPDATE orders
        SET
            status = ?3,
            updated_at = ?4,
            submitted_at = CASE WHEN ?3 = 'submitted' THEN ?4 ELSE submitted_at END,
            paid_at = CASE WHEN ?3 = 'paid' THEN ?4 ELSE paid_at END
        WHERE id = ?1 AND status = ?2
        "#,
    )
    .bind(id)
    .bind(from)
    .bind(to)
    .bind(now)
    .execute(exec)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Applies a discount to a pending order that has none yet.
///
/// `total` drops by `amount`; `subtotal` and `tax` are untouched. Does not
/// match if the order left `pending`, already carries a discount, or its
/// total is below `amount`.
pub async fn apply_discount<'e, E>(
    exec: E,
    id: &str,
    amount_cents: i64,
    now: DateTime<Utc>,
) -> DbResult<bool>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %id, amount_cents = amount_cents, "Applying discount");

    let result = sqlx::query(
        r#"
        UPDATE orders
        SET
            discount_cents = ?2,
            total_cents = total_cents - ?2,
            updated_at = ?3
        WHERE id = ?1
          AND status = 'pending'
          AND discount_cents = 0
          AND total_cents >= ?2
        "#,
    )
    .bind(id)
    .bind(amount_cents)
    .bind(now)
    .execute(exec)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Deletes a pending order. Items and discount requests cascade.
pub async fn delete_pending<'e, E>(exec: E, id: &str) -> DbResult<bool>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %id, "Deleting pending order");

    let result = sqlx::query("DELETE FROM orders WHERE id = ?1 AND status = 'pending'")
        .bind(id)
        .execute(exec)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Lists orders matching `filter`, newest first.
///
/// Date bounds are inclusive on both ends.
pub async fn list<'e, E>(exec: E, filter: &OrderFilter) -> DbResult<Vec<Order>>
where
    E: SqliteExecutor<'e>,
{
    let mut qb: QueryBuilder<'_, Sqlite> =
        QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders WHERE 1 = 1"));

    if let Some(status) = filter.status {
        qb.push(" AND status = ").push_bind(status);
    }
    if let Some(owner) = &filter.owner_id {
        qb.push(" AND sales_rep_id = ").push_bind(owner.clone());
    }
    if let Some(from) = filter.created_from {
        qb.push(" AND created_at >= ").push_bind(from);
    }
    if let Some(to) = filter.created_to {
        qb.push(" AND created_at <= ").push_bind(to);
    }

    // rowid breaks ties between orders created within the same instant.
    qb.push(" ORDER BY created_at DESC, rowid DESC");

    let orders = qb.build_query_as::<Order>().fetch_all(exec).await?;

    debug!(count = orders.len(), "Listed orders");
    Ok(orders)
}

/// Counts orders (for diagnostics).
pub async fn count<'e, E>(exec: E) -> DbResult<i64>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
        .fetch_one(exec)
        .await?;

    Ok(count)
}

// =============================================================================
// Order Items
// =============================================================================

pub async fn insert_item<'e, E>(exec: E, item: &OrderItem) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO order_items (
            id, order_id, product_id, line_no, sku_snapshot, name_snapshot,
            quantity, unit_price_cents, subtotal_cents, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&item.id)
    .bind(&item.order_id)
    .bind(&item.product_id)
    .bind(item.line_no)
    .bind(&item.sku_snapshot)
    .bind(&item.name_snapshot)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.subtotal_cents)
    .bind(item.created_at)
    .execute(exec)
    .await?;

    Ok(())
}

/// Items of an order in line order.
pub async fn get_items<'e, E>(exec: E, order_id: &str) -> DbResult<Vec<OrderItem>>
where
    E: SqliteExecutor<'e>,
{
    let items = sqlx::query_as::<_, OrderItem>(&format!(
        "SELECT {ITEM_COLUMNS} FROM order_items WHERE order_id = ?1 ORDER BY line_no"
    ))
    .bind(order_id)
    .fetch_all(exec)
    .await?;

    Ok(items)
}

/// Removes every item of an order. Returns the number removed.
pub async fn delete_items<'e, E>(exec: E, order_id: &str) -> DbResult<u64>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("DELETE FROM order_items WHERE order_id = ?1")
        .bind(order_id)
        .execute(exec)
        .await?;

    debug!(order_id = %order_id, removed = result.rows_affected(), "Deleted order items");
    Ok(result.rows_affected())
}

// =============================================================================
// Helpers
// =============================================================================

/// Generates a human-readable order number.
///
/// ## Format
/// `{PREFIX}-{YYYYMMDD}-{8 hex chars}`
///
/// ## Example
/// `ORD-20240115-3F9A1C07`
pub fn generate_order_number(prefix: &str) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}-{}", prefix, date, suffix[..8].to_uppercase())
}

pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builds the stored item for a priced line, snapshotting sku, name and
/// unit price.
pub fn item_from_line(order_id: &str, line: &PricedLine, now: DateTime<Utc>) -> OrderItem {
    OrderItem {
        id: Uuid::new_v4().to_string(),
        order_id: order_id.to_string(),
        product_id: line.product_id.clone(),
        line_no: line.line_no,
        sku_snapshot: line.sku.clone(),
        name_snapshot: line.name.clone(),
        quantity: line.quantity,
        unit_price_cents: line.unit_price.cents(),
        subtotal_cents: line.subtotal.cents(),
        created_at: now,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::product;
    use crate::{Database, DbConfig};
    use chrono::Duration;

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn order(owner: &str, created_at: DateTime<Utc>) -> Order {
        Order {
            id: generate_order_id(),
            order_number: generate_order_number("ORD"),
            customer_name: "Ada".to_string(),
            customer_email: None,
            customer_phone: None,
            status: OrderStatus::Pending,
            subtotal_cents: 300,
            tax_cents: 30,
            discount_cents: 0,
            total_cents: 330,
            notes: None,
            sales_rep_id: owner.to_string(),
            created_at,
            updated_at: created_at,
            submitted_at: None,
            paid_at: None,
        }
    }

    #[test]
    fn test_order_number_format() {
        let n = generate_order_number("ORD");
        let parts: Vec<_> = n.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert_eq!(parts[1].len(), 8);
        assert_eq!(parts[2].len(), 8);
    }

    #[tokio::test]
    async fn test_transition_is_check_and_set() {
        let db = db().await;
        let o = order("rep-1", Utc::now());
        insert(db.pool(), &o).await.unwrap();

        let now = Utc::now();
        assert!(
            transition_status(db.pool(), &o.id, OrderStatus::Pending, OrderStatus::Submitted, now)
                .await
                .unwrap()
        );
        // Second attempt no longer matches.
        assert!(
            !transition_status(db.pool(), &o.id, OrderStatus::Pending, OrderStatus::Submitted, now)
                .await
                .unwrap()
        );

        let stored = get_by_id(db.pool(), &o.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Submitted);
        assert!(stored.submitted_at.is_some());
        assert!(stored.paid_at.is_none());
    }

    #[tokio::test]
    async fn test_apply_discount_once() {
        let db = db().await;
        let o = order("rep-1", Utc::now());
        insert(db.pool(), &o).await.unwrap();

        assert!(apply_discount(db.pool(), &o.id, 30, Utc::now()).await.unwrap());
        assert!(!apply_discount(db.pool(), &o.id, 10, Utc::now()).await.unwrap());

        let stored = get_by_id(db.pool(), &o.id).await.unwrap().unwrap();
        assert_eq!(stored.total_cents, 300);
        assert_eq!(stored.discount_cents, 30);
        assert_eq!(stored.subtotal_cents, 300);
        assert_eq!(stored.tax_cents, 30);
    }

    #[tokio::test]
    async fn test_items_cascade_on_delete() {
        let db = db().await;
        let p = product::new_product("SKU-001", "Lamp", 100, 10, 0);
        product::insert(db.pool(), &p).await.unwrap();

        let o = order("rep-1", Utc::now());
        insert(db.pool(), &o).await.unwrap();
        let line = PricedLine {
            line_no: 1,
            product_id: p.id.clone(),
            sku: p.sku.clone(),
            name: p.name.clone(),
            quantity: 3,
            unit_price: p.price(),
            subtotal: p.price().multiply_quantity(3),
        };
        insert_item(db.pool(), &item_from_line(&o.id, &line, Utc::now()))
            .await
            .unwrap();
        assert_eq!(get_items(db.pool(), &o.id).await.unwrap().len(), 1);

        assert!(delete_pending(db.pool(), &o.id).await.unwrap());
        assert!(get_by_id(db.pool(), &o.id).await.unwrap().is_none());
        assert!(get_items(db.pool(), &o.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_filters_newest_first() {
        let db = db().await;
        let base = Utc::now();
        let old = order("rep-1", base - Duration::days(2));
        let mid = order("rep-2", base - Duration::days(1));
        let new = order("rep-1", base);
        for o in [&old, &mid, &new] {
            insert(db.pool(), o).await.unwrap();
        }

        let all = list(db.pool(), &OrderFilter::default()).await.unwrap();
        let ids: Vec<_> = all.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec![new.id.as_str(), mid.id.as_str(), old.id.as_str()]);

        let mine = list(
            db.pool(),
            &OrderFilter {
                owner_id: Some("rep-1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(mine.len(), 2);

        let recent = list(
            db.pool(),
            &OrderFilter {
                created_from: Some(base - Duration::hours(36)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(recent.len(), 2);
    }
}
