//! # Repository Module
//!
//! Database access for the back office, one module per table family.
//!
//! ## Repository Functions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Free functions generic over the executor                   │
//! │                                                                         │
//! │  Single statement (reads, standalone stock adjust):                     │
//! │       product::get_by_id(db.pool(), id)                                 │
//! │                                                                         │
//! │  Inside a unit of work:                                                 │
//! │       let mut uow = db.begin().await?;                                  │
//! │       order::insert(uow.conn(), &order).await?;                         │
//! │       product::adjust_stock(uow.conn(), pid, -qty).await?;              │
//! │       uow.commit().await?;                                              │
//! │                                                                         │
//! │  Same SQL, same function; only the executor differs.                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`product`] - Catalog rows and delta stock adjustment
//! - [`order`] - Order headers, line items, check-and-set transitions
//! - [`discount`] - Discount approval requests
//! - [`payment`] - One payment per order
//! - [`receipt`] - Issued receipt references

pub mod discount;
pub mod order;
pub mod payment;
pub mod product;
pub mod receipt;
