//! The session: one unit of work against a shared connection.
//!
//! A [`Session`] accumulates a pending statement, either raw SQL through
//! [`raw`](Session::raw) or clause fragments set by the chain methods
//! ([`where_`](Session::where_), [`order_by`](Session::order_by), [`limit`](Session::limit)),
//! and runs it with one of the terminal methods. Every terminal method takes the pending
//! statement out of the session before running it, so the session is clean again
//! whether the statement succeeds or fails.
//!
//! ```ignore
//! use tinyorm::{Engine, Model, params};
//!
//! #[derive(Debug, Default, Model)]
//! pub struct User {
//!     #[orm(constraint = "PRIMARY KEY")]
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! let engine = Engine::open_sqlite(&Default::default(), &Default::default())?;
//! let mut s = engine.new_session();
//! s.model::<User>()?.create_table().await?;
//! s.insert(&[User { name: "Tom".into(), age: 18 }]).await?;
//!
//! let mut tom = User::default();
//! s.where_("name = ?", params!["Tom"]).first(&mut tom).await?;
//! ```

mod record;
mod table;
mod transaction;

use crate::client::{Connection, DbHandle, GenericClient};
use crate::clause::Clause;
use crate::dialect::Dialect;
use crate::error::OrmResult;
use crate::monitor::SqlLogger;
use crate::row::Row;
use crate::schema::TableDef;
use crate::value::Value;
use std::sync::Arc;

/// A unit of work: pending statement, bound model and optional open transaction.
pub struct Session<C: Connection> {
    conn: Arc<C>,
    tx: Option<C::Transaction>,
    dialect: Arc<dyn Dialect>,
    ref_table: Option<Arc<TableDef>>,
    sql: String,
    sql_vars: Vec<Value>,
    clause: Clause,
    logger: SqlLogger,
}

impl<C: Connection> Session<C> {
    pub fn new(conn: Arc<C>, dialect: Arc<dyn Dialect>) -> Self {
        Self::with_logger(conn, dialect, SqlLogger::default())
    }

    pub fn with_logger(conn: Arc<C>, dialect: Arc<dyn Dialect>, logger: SqlLogger) -> Self {
        Self {
            conn,
            tx: None,
            dialect,
            ref_table: None,
            sql: String::new(),
            sql_vars: Vec::new(),
            clause: Clause::new(),
            logger,
        }
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Discard the pending SQL, parameters and clause fragments.
    ///
    /// The bound model and any open transaction are kept.
    pub fn clear(&mut self) {
        self.sql.clear();
        self.sql_vars.clear();
        self.clause.reset();
    }

    /// Append `sql` and its parameters to the pending statement.
    ///
    /// Successive calls are joined with a space.
    pub fn raw(
        &mut self,
        sql: impl AsRef<str>,
        params: impl IntoIterator<Item = Value>,
    ) -> &mut Self {
        self.sql.push_str(sql.as_ref());
        self.sql.push(' ');
        self.sql_vars.extend(params);
        self
    }

    /// Pending SQL as it would run now.
    pub fn pending_sql(&self) -> &str {
        self.sql.trim_end()
    }

    pub fn pending_params(&self) -> &[Value] {
        &self.sql_vars
    }

    /// Run the pending statement and return the number of affected rows.
    pub async fn exec(&mut self) -> OrmResult<u64> {
        let (sql, vars) = self.take_statement();
        self.logger.log_statement(&sql, &vars);
        let result = self.db().execute(&sql, &vars).await;
        if let Err(err) = &result {
            self.logger.log_error(&sql, err);
        }
        result
    }

    /// Run the pending query and return its first row, if any.
    pub async fn query_row(&mut self) -> OrmResult<Option<Row>> {
        let (sql, vars) = self.take_statement();
        self.logger.log_statement(&sql, &vars);
        let result = self.db().query_opt(&sql, &vars).await;
        if let Err(err) = &result {
            self.logger.log_error(&sql, err);
        }
        result
    }

    /// Run the pending query and return every row.
    pub async fn query_rows(&mut self) -> OrmResult<Vec<Row>> {
        let (sql, vars) = self.take_statement();
        self.logger.log_statement(&sql, &vars);
        let result = self.db().query(&sql, &vars).await;
        if let Err(err) = &result {
            self.logger.log_error(&sql, err);
        }
        result
    }

    fn take_statement(&mut self) -> (String, Vec<Value>) {
        self.clause.reset();
        let mut sql = std::mem::take(&mut self.sql);
        sql.truncate(sql.trim_end().len());
        (sql, std::mem::take(&mut self.sql_vars))
    }

    /// The open transaction if there is one, otherwise the base connection.
    fn db(&self) -> DbHandle<'_, C> {
        match &self.tx {
            Some(tx) => DbHandle::Tx(tx),
            None => DbHandle::Conn(self.conn.as_ref()),
        }
    }
}

impl<C: Connection> std::fmt::Debug for Session<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("dialect", &self.dialect.name())
            .field("table", &self.ref_table.as_ref().map(|t| t.name().to_string()))
            .field("sql", &self.sql)
            .field("sql_vars", &self.sql_vars)
            .field("in_transaction", &self.tx.is_some())
            .finish()
    }
}
