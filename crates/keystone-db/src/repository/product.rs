//! # Product Repository
//!
//! Catalog rows and the stock counter.
//!
//! ## Stock Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                            │
//! │                                                                     │
//! │  ❌ WRONG: read, compute, write back (lost update under races)     │
//! │     SELECT quantity ...  → 7                                       │
//! │     UPDATE products SET quantity = 4 WHERE id = ?                  │
//! │                                                                     │
//! │  ✅ CORRECT: one delta statement                                   │
//! │     UPDATE products SET quantity = quantity - 3 WHERE id = ?       │
//! │                                                                     │
//! │  Order A: -3, Order B: -2, restock: +10                            │
//! │  Any interleaving ends at the same value: start - 3 - 2 + 10       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function takes an executor, so it runs the same against the pool
//! or inside a [`UnitOfWork`](crate::UnitOfWork) via `uow.conn()`.

use chrono::Utc;
use sqlx::SqliteExecutor;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use keystone_core::Product;

const PRODUCT_COLUMNS: &str =
    "id, sku, name, price_cents, quantity, min_stock_level, created_at, updated_at";

/// Inserts a new product.
///
/// ## Returns
/// * `Err(DbError::UniqueViolation)` - SKU already exists
pub async fn insert<'e, E>(exec: E, product: &Product) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(sku = %product.sku, "Inserting product");

    sqlx::query(
        r#"
        INSERT INTO products (
            id, sku, name, price_cents, quantity, min_stock_level,
            created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&product.id)
    .bind(&product.sku)
    .bind(&product.name)
    .bind(product.price_cents)
    .bind(product.quantity)
    .bind(product.min_stock_level)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(exec)
    .await?;

    Ok(())
}

/// Gets a product by its ID.
///
/// ## Returns
/// * `Ok(Some(Product))` - Product found
/// * `Ok(None)` - Product not found
pub async fn get_by_id<'e, E>(exec: E, id: &str) -> DbResult<Option<Product>>
where
    E: SqliteExecutor<'e>,
{
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(exec)
    .await?;

    Ok(product)
}

/// Gets a product by its SKU (e.g. "SKU-001").
pub async fn get_by_sku<'e, E>(exec: E, sku: &str) -> DbResult<Option<Product>>
where
    E: SqliteExecutor<'e>,
{
    let product = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1"
    ))
    .bind(sku)
    .fetch_optional(exec)
    .await?;

    Ok(product)
}

/// Applies `quantity = quantity + delta` in a single statement.
///
/// No lower bound: stock may go negative.
///
/// ## Returns
/// * `Err(DbError::NotFound)` - no product with this id
pub async fn adjust_stock<'e, E>(exec: E, id: &str, delta: i64) -> DbResult<()>
where
    E: SqliteExecutor<'e>,
{
    debug!(id = %id, delta = %delta, "Adjusting stock");

    let result = sqlx::query(
        r#"
        UPDATE products
        SET
            quantity = quantity + ?2,
            updated_at = ?3
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .bind(delta)
    .bind(Utc::now())
    .execute(exec)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Product", id));
    }

    Ok(())
}

/// Products at or below their reorder threshold, lowest stock first.
pub async fn list_low_stock<'e, E>(exec: E) -> DbResult<Vec<Product>>
where
    E: SqliteExecutor<'e>,
{
    let products = sqlx::query_as::<_, Product>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products \
         WHERE quantity <= min_stock_level \
         ORDER BY quantity ASC, sku ASC"
    ))
    .fetch_all(exec)
    .await?;

    debug!(count = products.len(), "Low stock products");
    Ok(products)
}

/// Counts products (for diagnostics and the seeder).
pub async fn count<'e, E>(exec: E) -> DbResult<i64>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(exec)
        .await?;

    Ok(count)
}

/// Helper to generate a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

/// Builds a product with a fresh id and timestamps.
///
/// ## Usage
/// ```rust,ignore
/// let p = new_product("SKU-001", "Desk Lamp", 100, 10, 2);
/// product::insert(db.pool(), &p).await?;
/// ```
pub fn new_product(
    sku: impl Into<String>,
    name: impl Into<String>,
    price_cents: i64,
    quantity: i64,
    min_stock_level: i64,
) -> Product {
    let now = Utc::now();
    Product {
        id: generate_product_id(),
        sku: sku.into(),
        name: name.into(),
        price_cents,
        quantity,
        min_stock_level,
        created_at: now,
        updated_at: now,
    }
}
