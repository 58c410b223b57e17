//! # keystone-engine: Order–Inventory–Payment Consistency Engine
//!
//! Keeps orders, stock, discounts and payments in agreement.
//!
//! ## Module Organization
//! ```text
//! keystone_engine/
//! ├── lib.rs          ◄─── You are here (Engine wiring, tracing init)
//! ├── config.rs       ◄─── EngineConfig from KEYSTONE_* env vars
//! ├── error.rs        ◄─── EngineError, ErrorKind, ErrorBody
//! ├── inventory.rs    ◄─── InventoryLedger (stock deltas)
//! ├── orders.rs       ◄─── OrderLedger (create/update/submit/delete)
//! ├── discounts.rs    ◄─── DiscountQueue (request/approve/reject)
//! ├── payments.rs     ◄─── PaymentLedger (create/confirm, receipts)
//! └── receipt.rs      ◄─── ReceiptIssuer seam
//! ```
//!
//! ## Invariants Held Across Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  • subtotal = Σ item subtotals, tax = round(subtotal × rate),           │
//! │    total = subtotal + tax − applied discount                            │
//! │  • stock moves only with order lines (or explicit restock), never       │
//! │    half-applied                                                         │
//! │  • status only moves forward: pending → submitted → paid                │
//! │  • at most one payment per order, confirmed at most once                │
//! │  • every multi-step write commits or rolls back as one unit             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust,ignore
//! let engine = Engine::open(EngineConfig::from_env()?, Arc::new(SequentialReceiptIssuer::new())).await?;
//!
//! let rep = Caller::sales_rep("rep-1");
//! let order = engine.orders().create_order(&rep, new_order).await?;
//! engine.orders().submit_order(&rep, &order.order.id).await?;
//! ```

pub mod config;
pub mod discounts;
pub mod error;
pub mod inventory;
pub mod orders;
pub mod payments;
pub mod receipt;

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use keystone_db::Database;

pub use config::{ConfigError, EngineConfig};
pub use discounts::DiscountQueue;
pub use error::{EngineError, EngineResult, ErrorBody, ErrorKind};
pub use inventory::InventoryLedger;
pub use orders::OrderLedger;
pub use payments::PaymentLedger;
pub use receipt::{ReceiptError, ReceiptIssuer, SequentialReceiptIssuer};

/// The four ledgers over one database.
#[derive(Debug, Clone)]
pub struct Engine {
    db: Database,
    config: EngineConfig,
    inventory: InventoryLedger,
    orders: OrderLedger,
    discounts: DiscountQueue,
    payments: PaymentLedger,
}

impl Engine {
    /// Opens the configured database (running migrations) and wires the
    /// ledgers.
    pub async fn open(config: EngineConfig, issuer: Arc<dyn ReceiptIssuer>) -> EngineResult<Self> {
        let db = Database::new(config.db_config()).await?;
        Ok(Self::with_database(db, config, issuer))
    }

    /// Wires the ledgers over an existing database.
    pub fn with_database(db: Database, config: EngineConfig, issuer: Arc<dyn ReceiptIssuer>) -> Self {
        info!(
            tax_rate_bps = config.tax_rate.bps(),
            order_prefix = %config.order_prefix,
            "Engine ready"
        );

        Engine {
            inventory: InventoryLedger::new(db.clone()),
            orders: OrderLedger::new(db.clone(), config.tax_rate, config.order_prefix.clone()),
            discounts: DiscountQueue::new(db.clone()),
            payments: PaymentLedger::new(db.clone(), issuer),
            db,
            config,
        }
    }

    pub fn inventory(&self) -> &InventoryLedger {
        &self.inventory
    }

    pub fn orders(&self) -> &OrderLedger {
        &self.orders
    }

    pub fn discounts(&self) -> &DiscountQueue {
        &self.discounts
    }

    pub fn payments(&self) -> &PaymentLedger {
        &self.payments
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,keystone=debug,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}
