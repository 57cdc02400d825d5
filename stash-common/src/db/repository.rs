//! Read-transactional store access
//!
//! [`Repository::with_read_txn`] is the single concurrency primitive of the
//! identification pipeline: the closure sees one consistent snapshot, and
//! the underlying transaction is released on every exit path. The closure
//! form is deliberate; a begin/commit pair invites forgetting the release
//! on error paths.

use futures::future::BoxFuture;
use sqlx::{Sqlite, SqliteConnection, SqlitePool, Transaction};

use crate::Result;

/// Handle to the local store
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

/// A read transaction over the local store.
///
/// Only obtainable through [`Repository::with_read_txn`]; the query modules
/// in [`crate::db`] take one of these so every read is snapshot-scoped.
pub struct ReadTxn {
    tx: Transaction<'static, Sqlite>,
}

impl ReadTxn {
    pub(crate) fn conn(&mut self) -> &mut SqliteConnection {
        &mut *self.tx
    }
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run `f` inside a read transaction.
    ///
    /// Reads performed through the supplied [`ReadTxn`] observe a single
    /// consistent snapshot. The transaction holds no writes and is rolled
    /// back when `f` returns, whether it succeeded or not.
    pub async fn with_read_txn<T, F>(&self, f: F) -> Result<T>
    where
        F: for<'t> FnOnce(&'t mut ReadTxn) -> BoxFuture<'t, Result<T>>,
    {
        let tx = self.pool.begin().await?;
        let mut txn = ReadTxn { tx };

        let result = f(&mut txn).await;

        // Release the snapshot before surfacing the closure's outcome.
        let released = txn.tx.rollback().await;
        let value = result?;
        released?;

        Ok(value)
    }
}
