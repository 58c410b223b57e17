//! Shared fixtures for engine integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

use keystone_core::{
    Caller, CustomerInfo, NewOrder, OrderDetail, OrderItemInput, Payment, Product,
};
use keystone_db::{Database, DbConfig};
use keystone_engine::{Engine, EngineConfig, ReceiptError, ReceiptIssuer};

/// Issuer that counts calls and can be told to fail.
#[derive(Debug, Default)]
pub struct CountingIssuer {
    calls: AtomicUsize,
    fail: AtomicBool,
}

impl CountingIssuer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl ReceiptIssuer for CountingIssuer {
    async fn issue(&self, order: &OrderDetail, payment: &Payment) -> Result<String, ReceiptError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(ReceiptError::new("printer offline"));
        }
        assert_eq!(order.order.id, payment.order_id);
        Ok(format!("TEST-RCPT-{}", n))
    }
}

pub struct Harness {
    pub engine: Engine,
    pub issuer: Arc<CountingIssuer>,
    pub admin: Caller,
    pub manager: Caller,
    pub rep: Caller,
    pub other_rep: Caller,
    // Keeps a file database alive for the harness' lifetime.
    _dir: Option<TempDir>,
}

impl Harness {
    /// Single-connection in-memory database.
    pub async fn new() -> Self {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        Self::with_database(db, None)
    }

    /// File database in a temp dir, with a real pool of `connections`.
    pub async fn on_file(connections: u32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let config = DbConfig::new(dir.path().join("keystone.db")).max_connections(connections);
        let db = Database::new(config).await.unwrap();
        Self::with_database(db, Some(dir))
    }

    fn with_database(db: Database, dir: Option<TempDir>) -> Self {
        let issuer = Arc::new(CountingIssuer::default());
        let engine = Engine::with_database(db, EngineConfig::default(), issuer.clone());

        Harness {
            engine,
            issuer,
            admin: Caller::admin("admin-1"),
            manager: Caller::manager("manager-1"),
            rep: Caller::sales_rep("rep-1"),
            other_rep: Caller::sales_rep("rep-2"),
            _dir: dir,
        }
    }

    pub async fn product(&self, sku: &str, price_cents: i64, quantity: i64) -> Product {
        self.engine
            .inventory()
            .add_product(&self.admin, sku, &format!("Product {}", sku), price_cents, quantity, 0)
            .await
            .unwrap()
    }

    pub async fn quantity(&self, product_id: &str) -> i64 {
        self.engine
            .inventory()
            .get(&self.admin, product_id)
            .await
            .unwrap()
            .quantity
    }

    /// Pending order owned by `self.rep`.
    pub async fn order(&self, lines: &[(&Product, i64)]) -> OrderDetail {
        self.engine
            .orders()
            .create_order(&self.rep, new_order(lines))
            .await
            .unwrap()
    }
}

pub fn new_order(lines: &[(&Product, i64)]) -> NewOrder {
    NewOrder {
        customer: CustomerInfo::named("Ada Lovelace"),
        items: lines
            .iter()
            .map(|(p, q)| OrderItemInput::new(&p.id, *q))
            .collect(),
        notes: None,
    }
}
