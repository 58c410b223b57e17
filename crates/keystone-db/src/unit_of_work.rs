//! # Unit of Work
//!
//! The transaction boundary for multi-step writes.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   create_order inside one UnitOfWork                    │
//! │                                                                         │
//! │  BEGIN IMMEDIATE                                                        │
//! │    SELECT products ...            (price snapshot)                      │
//! │    INSERT orders ...                                                    │
//! │    INSERT order_items × N                                               │
//! │    UPDATE products SET quantity = quantity - q   × N                    │
//! │  COMMIT  ← all of it, or (error / drop) ROLLBACK ← none of it           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};
use std::time::Instant;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// An open transaction. Rolls back when dropped uncommitted.
pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
    started: Instant,
}

impl UnitOfWork {
    /// Opens the transaction with `BEGIN IMMEDIATE`.
    ///
    /// Every unit of work writes, so the write lock is taken up front and a
    /// concurrent writer waits out `busy_timeout`.
    pub(crate) async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin_with("BEGIN IMMEDIATE")
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Unit of work started");

        Ok(UnitOfWork {
            tx,
            started: Instant::now(),
        })
    }

    /// The transaction's connection; pass it to repository functions.
    pub fn conn(&mut self) -> &mut SqliteConnection {
        &mut self.tx
    }

    pub async fn commit(self) -> DbResult<()> {
        let elapsed = self.started.elapsed();
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!(elapsed_ms = elapsed.as_millis() as u64, "Unit of work committed");
        Ok(())
    }

    /// Explicit rollback. Dropping has the same effect.
    pub async fn rollback(self) -> DbResult<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Unit of work rolled back");
        Ok(())
    }
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork")
            .field("open_for", &self.started.elapsed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::product;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_commit_persists() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut uow = db.begin().await.unwrap();
        product::insert(uow.conn(), &product::new_product("SKU-1", "One", 100, 5, 0))
            .await
            .unwrap();
        uow.commit().await.unwrap();

        assert_eq!(product::count(db.pool()).await.unwrap(), 1);
    }

    /// Read-then-write transactions on a shared file database: every
    /// writer waits its turn instead of failing with "database is locked".
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_on_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::new(DbConfig::new(dir.path().join("uow.db")).max_connections(8))
            .await
            .unwrap();

        let p = product::new_product("SKU-1", "One", 100, 1000, 0);
        product::insert(db.pool(), &p).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let db = db.clone();
            let id = p.id.clone();
            tasks.push(tokio::spawn(async move {
                let mut uow = db.begin().await?;
                product::get_by_id(uow.conn(), &id).await?;
                tokio::task::yield_now().await;
                product::adjust_stock(uow.conn(), &id, -1).await?;
                uow.commit().await
            }));
        }

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let stored = product::get_by_id(db.pool(), &p.id).await.unwrap().unwrap();
        assert_eq!(stored.quantity, 984);
        db.close().await;
    }

    #[tokio::test]
    async fn test_drop_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        {
            let mut uow = db.begin().await.unwrap();
            product::insert(uow.conn(), &product::new_product("SKU-1", "One", 100, 5, 0))
                .await
                .unwrap();
        }

        let mut uow = db.begin().await.unwrap();
        product::insert(uow.conn(), &product::new_product("SKU-2", "Two", 100, 5, 0))
            .await
            .unwrap();
        uow.rollback().await.unwrap();

        assert_eq!(product::count(db.pool()).await.unwrap(), 0);
    }
}
