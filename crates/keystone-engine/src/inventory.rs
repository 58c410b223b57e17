//! # Inventory Ledger
//!
//! The only writer of `products.quantity`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Stock Movements                                │
//! │                                                                         │
//! │  create order      ── -q per line ──┐                                   │
//! │  update items      ── +old, -new ───┤                                   │
//! │  delete order      ── +q per line ──┼──► quantity = quantity + delta    │
//! │  restock / correct ── ±n ───────────┘    (one statement, no lower bound)│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Stock may go negative. Orders are never refused for shortage;
//! [`InventoryLedger::low_stock`] reports it instead.

use tracing::{info, warn};

use keystone_core::validation::{validate_price_cents, validate_product_name, validate_sku};
use keystone_core::{authorize, Action, Caller, CoreError, Product};
use keystone_db::repository::product;
use keystone_db::{Database, DbError, UnitOfWork};

use crate::error::{EngineError, EngineResult};

/// Stock adjustments and catalog reads.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    db: Database,
}

impl InventoryLedger {
    pub fn new(db: Database) -> Self {
        InventoryLedger { db }
    }

    /// Standalone adjustment (restocking, corrections). Privileged only.
    ///
    /// `delta` may be any value; the resulting quantity is not bounded.
    pub async fn adjust(&self, caller: &Caller, product_id: &str, delta: i64) -> EngineResult<Product> {
        authorize(caller, Action::AdjustStock, None)?;

        product::adjust_stock(self.db.pool(), product_id, delta)
            .await
            .map_err(|e| product_error(e, product_id))?;

        let updated = self.load(product_id).await?;

        info!(
            product_id = %product_id,
            sku = %updated.sku,
            delta = delta,
            quantity = updated.quantity,
            by = %caller.id,
            "Stock adjusted"
        );
        if updated.quantity < 0 {
            warn!(sku = %updated.sku, quantity = updated.quantity, "Stock is overdrawn");
        }

        Ok(updated)
    }

    pub async fn get(&self, caller: &Caller, product_id: &str) -> EngineResult<Product> {
        authorize(caller, Action::ViewInventory, None)?;
        self.load(product_id).await
    }

    /// Products at or below their reorder threshold, lowest stock first.
    pub async fn low_stock(&self, caller: &Caller) -> EngineResult<Vec<Product>> {
        authorize(caller, Action::ViewInventory, None)?;
        Ok(product::list_low_stock(self.db.pool()).await?)
    }

    /// Adds a catalog product with its opening stock. Privileged only.
    pub async fn add_product(
        &self,
        caller: &Caller,
        sku: &str,
        name: &str,
        price_cents: i64,
        quantity: i64,
        min_stock_level: i64,
    ) -> EngineResult<Product> {
        authorize(caller, Action::AdjustStock, None)?;
        validate_sku(sku)?;
        validate_product_name(name)?;
        validate_price_cents(price_cents)?;

        let p = product::new_product(sku.trim(), name.trim(), price_cents, quantity, min_stock_level);
        product::insert(self.db.pool(), &p).await.map_err(|e| match e {
            DbError::UniqueViolation { .. } => {
                EngineError::from(CoreError::Conflict(format!("sku {} already exists", p.sku)))
            }
            other => other.into(),
        })?;

        info!(sku = %p.sku, quantity = p.quantity, "Product added");
        Ok(p)
    }

    /// Applies a delta inside an open unit of work.
    pub(crate) async fn apply(uow: &mut UnitOfWork, product_id: &str, delta: i64) -> EngineResult<()> {
        product::adjust_stock(uow.conn(), product_id, delta)
            .await
            .map_err(|e| product_error(e, product_id))
    }

    async fn load(&self, product_id: &str) -> EngineResult<Product> {
        product::get_by_id(self.db.pool(), product_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", product_id).into())
    }
}

fn product_error(err: DbError, product_id: &str) -> EngineError {
    match err {
        DbError::NotFound { .. } => CoreError::not_found("Product", product_id).into(),
        other => other.into(),
    }
}
