//! # Receipt Issuer
//!
//! External collaborator that produces a receipt document for a confirmed
//! payment and returns its reference. Rendering is its business; the
//! engine stores only the reference.
//!
//! The issuer runs inside the confirmation transaction: if it fails, the
//! payment and order statuses roll back with it.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};

use keystone_core::{OrderDetail, Payment};

/// Issues receipt documents.
///
/// Called exactly once per successful payment confirmation, with the order
/// and payment as they will be committed (order `paid`, payment
/// `confirmed`).
#[async_trait]
pub trait ReceiptIssuer: Send + Sync {
    /// Returns the document reference for the receipt.
    async fn issue(&self, order: &OrderDetail, payment: &Payment) -> Result<String, ReceiptError>;
}

/// Issuer failure, surfaced as an infrastructure error.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct ReceiptError(pub String);

impl ReceiptError {
    pub fn new(message: impl Into<String>) -> Self {
        ReceiptError(message.into())
    }
}

/// In-process issuer producing `RCPT-{YYYYMMDD}-{NNNNNN}` references.
///
/// The counter is per instance and starts at 1; it is not persisted.
#[derive(Debug)]
pub struct SequentialReceiptIssuer {
    first: u64,
    next: AtomicU64,
}

impl SequentialReceiptIssuer {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    pub fn starting_at(first: u64) -> Self {
        SequentialReceiptIssuer {
            first,
            next: AtomicU64::new(first),
        }
    }

    /// Number of references issued so far.
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::SeqCst) - self.first
    }
}

impl Default for SequentialReceiptIssuer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReceiptIssuer for SequentialReceiptIssuer {
    async fn issue(&self, order: &OrderDetail, payment: &Payment) -> Result<String, ReceiptError> {
        let seq = self.next.fetch_add(1, Ordering::SeqCst);
        let reference = format!("RCPT-{}-{:06}", Utc::now().format("%Y%m%d"), seq);

        tracing::info!(
            receipt = %reference,
            order_number = %order.order.order_number,
            payment_id = %payment.id,
            amount_cents = payment.amount_cents,
            "Receipt issued"
        );

        Ok(reference)
    }
}
