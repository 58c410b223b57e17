//! # keystone-db: Database Layer for the Back Office
//!
//! SQLite storage for products, orders, discount requests, payments and
//! receipts, via sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Back Office Data Flow                            │
//! │                                                                         │
//! │  keystone-engine (OrderLedger::create_order)                           │
//! │       │                                                                 │
//! │       │  let mut uow = db.begin().await?;                              │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     keystone-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │ product, order│    │  (embedded)  │  │   │
//! │  │   │ SqlitePool    │◄───│ discount,     │    │ 001_init.sql │  │   │
//! │  │   │ UnitOfWork    │    │ payment, ...  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (WAL mode, foreign keys on)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Repositories Run Anywhere
//! Every repository function is generic over [`sqlx::SqliteExecutor`], so the
//! same query runs against the pool for reads or against a
//! [`UnitOfWork`] connection inside a multi-step write.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use keystone_db::{repository::product, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./keystone.db")).await?;
//!
//! let mut uow = db.begin().await?;
//! product::adjust_stock(uow.conn(), &product_id, -3).await?;
//! uow.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;
