//! Execution capability surface shared by connections and transactions.

use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use std::future::Future;

/// A trait that unifies database connections and transactions.
///
/// SQL uses `?` positional placeholders; drivers translate them as needed.
pub trait GenericClient: Send + Sync {
    /// Execute a statement and return the number of affected rows.
    fn execute(&self, sql: &str, params: &[Value]) -> impl Future<Output = OrmResult<u64>> + Send;

    /// Execute a query and return all rows.
    fn query(&self, sql: &str, params: &[Value])
    -> impl Future<Output = OrmResult<Vec<Row>>> + Send;

    /// Execute a query and return the first row, if any.
    ///
    /// Extra rows are ignored.
    fn query_opt(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl Future<Output = OrmResult<Option<Row>>> + Send {
        async move {
            let rows = self.query(sql, params).await?;
            Ok(rows.into_iter().next())
        }
    }

    /// Execute a query and return the **first** row.
    ///
    /// Returns `OrmError::NotFound` if no rows are returned.
    fn query_one(&self, sql: &str, params: &[Value]) -> impl Future<Output = OrmResult<Row>> + Send {
        async move {
            self.query_opt(sql, params)
                .await?
                .ok_or_else(|| OrmError::not_found("Expected one row, got none"))
        }
    }
}

/// A database connection that can open transactions.
pub trait Connection: GenericClient + 'static {
    type Transaction: Transaction;

    /// Start a transaction on this connection.
    fn begin(&self) -> impl Future<Output = OrmResult<Self::Transaction>> + Send;
}

/// An open transaction.
///
/// A transaction stays active until [`commit`](Transaction::commit) or
/// [`rollback`](Transaction::rollback) ends it. If the server refuses to end it (for
/// example a COMMIT rejected by a deferred constraint) it remains active and the caller
/// decides what happens next. Dropping an active transaction rolls it back.
pub trait Transaction: GenericClient + Sized + 'static {
    fn commit(&mut self) -> impl Future<Output = OrmResult<()>> + Send;

    fn rollback(&mut self) -> impl Future<Output = OrmResult<()>> + Send;

    /// Whether the transaction is still open on the server.
    fn is_active(&self) -> bool;
}

/// Where a statement runs: the base connection or its open transaction.
pub(crate) enum DbHandle<'a, C: Connection> {
    Conn(&'a C),
    Tx(&'a C::Transaction),
}

impl<C: Connection> GenericClient for DbHandle<'_, C> {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        match self {
            Self::Conn(conn) => conn.execute(sql, params).await,
            Self::Tx(tx) => tx.execute(sql, params).await,
        }
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        match self {
            Self::Conn(conn) => conn.query(sql, params).await,
            Self::Tx(tx) => tx.query(sql, params).await,
        }
    }
}
