//! SQLite driver backed by `rusqlite`.
//!
//! The `rusqlite::Connection` lives behind a `std::sync::Mutex`; statements run
//! synchronously while the lock is held and never across an `.await`.

use crate::client::{Connection, GenericClient, Transaction};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::{DATETIME_FORMAT, Value};
use rusqlite::types::Value as SqliteValue;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

type Shared = Arc<Mutex<rusqlite::Connection>>;

fn lock(conn: &Shared) -> OrmResult<MutexGuard<'_, rusqlite::Connection>> {
    conn.lock()
        .map_err(|_| OrmError::Connection("SQLite connection mutex poisoned".to_string()))
}

/// Convert a bound parameter into a rusqlite value.
fn to_sqlite_value(value: &Value) -> OrmResult<SqliteValue> {
    Ok(match value {
        Value::Null => SqliteValue::Null,
        Value::Bool(b) => SqliteValue::Integer(i64::from(*b)),
        Value::I8(v) => SqliteValue::Integer((*v).into()),
        Value::I16(v) => SqliteValue::Integer((*v).into()),
        Value::I32(v) => SqliteValue::Integer((*v).into()),
        Value::I64(v) => SqliteValue::Integer(*v),
        Value::U8(v) => SqliteValue::Integer((*v).into()),
        Value::U16(v) => SqliteValue::Integer((*v).into()),
        Value::U32(v) => SqliteValue::Integer((*v).into()),
        Value::U64(v) => SqliteValue::Integer(i64::try_from(*v).map_err(|_| {
            OrmError::Conversion(format!("u64 value {v} exceeds SQLite integer range"))
        })?),
        Value::F32(v) => SqliteValue::Real((*v).into()),
        Value::F64(v) => SqliteValue::Real(*v),
        Value::Text(s) => SqliteValue::Text(s.clone()),
        Value::Bytes(b) => SqliteValue::Blob(b.clone()),
        Value::DateTime(dt) => SqliteValue::Text(dt.format(DATETIME_FORMAT).to_string()),
    })
}

fn from_sqlite_value(value: SqliteValue) -> Value {
    match value {
        SqliteValue::Null => Value::Null,
        SqliteValue::Integer(i) => Value::I64(i),
        SqliteValue::Real(f) => Value::F64(f),
        SqliteValue::Text(s) => Value::Text(s),
        SqliteValue::Blob(b) => Value::Bytes(b),
    }
}

fn convert_params(params: &[Value]) -> OrmResult<Vec<SqliteValue>> {
    params.iter().map(to_sqlite_value).collect()
}

fn execute_sync(conn: &Shared, sql: &str, params: &[Value]) -> OrmResult<u64> {
    let values = convert_params(params)?;
    let guard = lock(conn)?;
    let mut stmt = guard.prepare(sql)?;
    let affected = stmt.execute(rusqlite::params_from_iter(values.iter()))?;
    Ok(affected as u64)
}

fn query_sync(conn: &Shared, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
    let values = convert_params(params)?;
    let guard = lock(conn)?;
    let mut stmt = guard.prepare(sql)?;
    let columns: Arc<[String]> = stmt
        .column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut rows = stmt.query(rusqlite::params_from_iter(values.iter()))?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut row_values = Vec::with_capacity(columns.len());
        for idx in 0..columns.len() {
            let value: SqliteValue = row.get(idx)?;
            row_values.push(from_sqlite_value(value));
        }
        out.push(Row::new(Arc::clone(&columns), row_values));
    }
    Ok(out)
}

/// A shared SQLite connection.
///
/// Cloning is cheap; clones use the same underlying connection.
#[derive(Clone)]
pub struct SqliteConnection {
    inner: Shared,
}

impl SqliteConnection {
    /// Open (or create) the database file at `path`. `":memory:"` opens an in-memory database.
    pub fn open(path: impl AsRef<Path>) -> OrmResult<Self> {
        let conn = rusqlite::Connection::open(path)?;
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> OrmResult<Self> {
        let conn = rusqlite::Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already opened connection.
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self {
            inner: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run a `;`-separated batch of statements without parameters.
    pub fn execute_batch(&self, sql: &str) -> OrmResult<()> {
        lock(&self.inner)?.execute_batch(sql)?;
        Ok(())
    }
}

impl std::fmt::Debug for SqliteConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteConnection").finish_non_exhaustive()
    }
}

impl GenericClient for SqliteConnection {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        execute_sync(&self.inner, sql, params)
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        query_sync(&self.inner, sql, params)
    }
}

impl Connection for SqliteConnection {
    type Transaction = SqliteTransaction;

    async fn begin(&self) -> OrmResult<SqliteTransaction> {
        lock(&self.inner)?.execute_batch("BEGIN")?;
        Ok(SqliteTransaction {
            conn: Some(Arc::clone(&self.inner)),
        })
    }
}

/// An open SQLite transaction on a [`SqliteConnection`].
///
/// Rolled back on drop if neither committed nor rolled back.
pub struct SqliteTransaction {
    conn: Option<Shared>,
}

impl SqliteTransaction {
    fn conn(&self) -> OrmResult<&Shared> {
        self.conn
            .as_ref()
            .ok_or_else(|| OrmError::Transaction("SQLite transaction already completed".into()))
    }

    /// Run `COMMIT` or `ROLLBACK`. The handle is released once the connection is back in
    /// autocommit mode; a refused statement leaves the transaction open.
    fn finish(&mut self, sql: &str) -> OrmResult<()> {
        let conn = self.conn()?;
        let guard = lock(conn)?;
        let result = guard.execute_batch(sql);
        let ended = guard.is_autocommit();
        drop(guard);
        if ended {
            self.conn = None;
        }
        Ok(result?)
    }
}

impl GenericClient for SqliteTransaction {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        execute_sync(self.conn()?, sql, params)
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        query_sync(self.conn()?, sql, params)
    }
}

impl Transaction for SqliteTransaction {
    async fn commit(&mut self) -> OrmResult<()> {
        self.finish("COMMIT")
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        self.finish("ROLLBACK")
    }

    fn is_active(&self) -> bool {
        self.conn.is_some()
    }
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            tracing::warn!(target: "tinyorm.tx", "SQLite transaction dropped without commit; rolling back");
            let result = lock(&conn).and_then(|guard| Ok(guard.execute_batch("ROLLBACK")?));
            if let Err(err) = result {
                tracing::error!(target: "tinyorm.tx", error = %err, "rollback on drop failed");
            }
        }
    }
}
