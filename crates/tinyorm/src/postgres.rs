//! PostgreSQL driver backed by `tokio-postgres`.
//!
//! Statements are written with `?` placeholders and rewritten to `$1..$n` before
//! they reach the server.

use crate::client::{Connection, GenericClient, Transaction};
use crate::error::{OrmError, OrmResult};
use crate::row::Row;
use crate::value::Value;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::borrow::Cow;
use std::error::Error;
use std::sync::Arc;
use tokio_postgres::NoTls;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// Rewrite `?` placeholders to `$1..$n`.
///
/// Quoted identifiers, string literals (including `E'..'` escape strings and `$tag$`
/// dollar quoting) and comments are copied unchanged. Returns a borrowed `Cow` when
/// there is nothing to rewrite.
pub fn rewrite_placeholders(sql: &str) -> Cow<'_, str> {
    if !sql.contains('?') {
        return Cow::Borrowed(sql);
    }

    let bytes = sql.as_bytes();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut next = 1;
    let mut copied = 0;
    let mut i = 0;

    while i < bytes.len() {
        i = match bytes[i] {
            b'?' => {
                out.push_str(&sql[copied..i]);
                out.push('$');
                out.push_str(&next.to_string());
                next += 1;
                copied = i + 1;
                i + 1
            }
            b'\'' => skip_string(bytes, i, is_escape_string(bytes, i)),
            b'"' => skip_past(bytes, i + 1, b'"'),
            b'-' if bytes.get(i + 1) == Some(&b'-') => skip_past(bytes, i + 2, b'\n'),
            b'/' if bytes.get(i + 1) == Some(&b'*') => skip_block_comment(bytes, i),
            b'$' => skip_dollar_quoted(sql, i).unwrap_or(i + 1),
            _ => i + 1,
        };
    }
    out.push_str(&sql[copied..]);
    Cow::Owned(out)
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$' || !b.is_ascii()
}

/// `E'...'` (or `e'...'`) where the `E` is not the tail of a longer word.
fn is_escape_string(bytes: &[u8], quote: usize) -> bool {
    quote > 0
        && matches!(bytes[quote - 1], b'E' | b'e')
        && (quote < 2 || !is_ident_byte(bytes[quote - 2]))
}

/// Index just past the first `end` at or after `from`.
fn skip_past(bytes: &[u8], from: usize, end: u8) -> usize {
    bytes[from.min(bytes.len())..]
        .iter()
        .position(|&b| b == end)
        .map_or(bytes.len(), |pos| from + pos + 1)
}

/// Index just past the string literal opening at `quote`. `''` is an escaped quote;
/// with `backslash_escapes` so is `\'`.
fn skip_string(bytes: &[u8], quote: usize, backslash_escapes: bool) -> usize {
    let mut j = quote + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' if backslash_escapes => j += 2,
            b'\'' if bytes.get(j + 1) == Some(&b'\'') => j += 2,
            b'\'' => return j + 1,
            _ => j += 1,
        }
    }
    bytes.len()
}

/// Block comments nest in PostgreSQL.
fn skip_block_comment(bytes: &[u8], open: usize) -> usize {
    let mut depth = 0usize;
    let mut j = open;
    while j + 1 < bytes.len() {
        match (bytes[j], bytes[j + 1]) {
            (b'/', b'*') => {
                depth += 1;
                j += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                j += 2;
                if depth == 0 {
                    return j;
                }
            }
            _ => j += 1,
        }
    }
    bytes.len()
}

/// Index just past a `$tag$ ... $tag$` body opening at `dollar`, or `None` when the
/// `$` does not open one (a `$1` parameter or part of an identifier).
fn skip_dollar_quoted(sql: &str, dollar: usize) -> Option<usize> {
    let bytes = sql.as_bytes();
    if dollar > 0 && is_ident_byte(bytes[dollar - 1]) {
        return None;
    }
    if bytes.get(dollar + 1).is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let mut j = dollar + 1;
    while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
        j += 1;
    }
    if bytes.get(j) != Some(&b'$') {
        return None;
    }
    let tag = &sql[dollar..=j];
    let body = j + 1;
    Some(
        sql[body..]
            .find(tag)
            .map_or(bytes.len(), |pos| body + pos + tag.len()),
    )
}

fn narrow<T: TryFrom<i128>>(wide: i128, ty: &Type) -> Result<T, Box<dyn Error + Sync + Send>> {
    T::try_from(wide).map_err(|_| format!("value {wide} out of range for {ty}").into())
}

const INTEGER_TARGETS: [Type; 7] = [
    Type::INT2,
    Type::INT4,
    Type::INT8,
    Type::CHAR,
    Type::FLOAT4,
    Type::FLOAT8,
    Type::BOOL,
];

/// Whether `value` has a binary encoding for a parameter of type `ty`.
fn binds_as(value: &Value, ty: &Type) -> bool {
    match value {
        Value::Null => true,
        Value::Text(_) => <&str as ToSql>::accepts(ty),
        Value::Bytes(_) => <&[u8] as ToSql>::accepts(ty),
        Value::F32(_) | Value::F64(_) => *ty == Type::FLOAT4 || *ty == Type::FLOAT8,
        Value::DateTime(_) => *ty == Type::TIMESTAMP || *ty == Type::TIMESTAMPTZ,
        _ => INTEGER_TARGETS.contains(ty),
    }
}

impl ToSql for Value {
    fn to_sql(&self, ty: &Type, out: &mut BytesMut) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        if !binds_as(self, ty) {
            return Err(format!("cannot bind {} as {ty}", self.kind_name()).into());
        }
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(b) if *ty == Type::BOOL => b.to_sql(ty, out),
            Value::F32(v) if *ty == Type::FLOAT8 => f64::from(*v).to_sql(ty, out),
            Value::F32(v) => v.to_sql(ty, out),
            Value::F64(v) if *ty == Type::FLOAT4 => (*v as f32).to_sql(ty, out),
            Value::F64(v) => v.to_sql(ty, out),
            Value::Text(s) => s.as_str().to_sql(ty, out),
            Value::Bytes(b) => b.as_slice().to_sql(ty, out),
            Value::DateTime(dt) if *ty == Type::TIMESTAMPTZ => dt.and_utc().to_sql(ty, out),
            Value::DateTime(dt) => dt.to_sql(ty, out),
            integer => {
                let wide = integer
                    .as_i128()
                    .ok_or_else(|| format!("cannot bind {} as {ty}", integer.kind_name()))?;
                if *ty == Type::INT2 {
                    narrow::<i16>(wide, ty)?.to_sql(ty, out)
                } else if *ty == Type::INT4 {
                    narrow::<i32>(wide, ty)?.to_sql(ty, out)
                } else if *ty == Type::CHAR {
                    narrow::<i8>(wide, ty)?.to_sql(ty, out)
                } else if *ty == Type::BOOL {
                    (wide != 0).to_sql(ty, out)
                } else if *ty == Type::FLOAT4 {
                    (wide as f32).to_sql(ty, out)
                } else if *ty == Type::FLOAT8 {
                    (wide as f64).to_sql(ty, out)
                } else {
                    narrow::<i64>(wide, ty)?.to_sql(ty, out)
                }
            }
        }
    }

    // The variant is only known per value, so compatibility is checked in `to_sql`.
    fn accepts(_ty: &Type) -> bool {
        true
    }

    to_sql_checked!();
}

fn decode_column(row: &tokio_postgres::Row, idx: usize) -> OrmResult<Value> {
    let ty = row.columns()[idx].type_();
    let name = row.columns()[idx].name();

    fn get<'a, T>(row: &'a tokio_postgres::Row, idx: usize, name: &str) -> OrmResult<Option<T>>
    where
        T: tokio_postgres::types::FromSql<'a>,
    {
        row.try_get::<_, Option<T>>(idx)
            .map_err(|e| OrmError::decode(name, e.to_string()))
    }

    let value = if *ty == Type::BOOL {
        get::<bool>(row, idx, name)?.map(Value::Bool)
    } else if *ty == Type::INT2 {
        get::<i16>(row, idx, name)?.map(Value::I16)
    } else if *ty == Type::INT4 {
        get::<i32>(row, idx, name)?.map(Value::I32)
    } else if *ty == Type::INT8 {
        get::<i64>(row, idx, name)?.map(Value::I64)
    } else if *ty == Type::FLOAT4 {
        get::<f32>(row, idx, name)?.map(Value::F32)
    } else if *ty == Type::FLOAT8 {
        get::<f64>(row, idx, name)?.map(Value::F64)
    } else if *ty == Type::BYTEA {
        get::<Vec<u8>>(row, idx, name)?.map(Value::Bytes)
    } else if *ty == Type::TIMESTAMP {
        get::<NaiveDateTime>(row, idx, name)?.map(Value::DateTime)
    } else if *ty == Type::TIMESTAMPTZ {
        get::<DateTime<Utc>>(row, idx, name)?.map(|dt| Value::DateTime(dt.naive_utc()))
    } else {
        get::<String>(row, idx, name)?.map(Value::Text)
    };
    Ok(value.unwrap_or(Value::Null))
}

fn convert_rows(rows: Vec<tokio_postgres::Row>) -> OrmResult<Vec<Row>> {
    let Some(first) = rows.first() else {
        return Ok(Vec::new());
    };
    let columns: Arc<[String]> = first
        .columns()
        .iter()
        .map(|col| col.name().to_string())
        .collect();

    rows.iter()
        .map(|row| {
            let values = (0..columns.len())
                .map(|idx| decode_column(row, idx))
                .collect::<OrmResult<Vec<_>>>()?;
            Ok(Row::new(Arc::clone(&columns), values))
        })
        .collect()
}

fn bind(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

async fn execute_on(client: &tokio_postgres::Client, sql: &str, params: &[Value]) -> OrmResult<u64> {
    let sql = rewrite_placeholders(sql);
    client
        .execute(sql.as_ref(), &bind(params))
        .await
        .map_err(OrmError::from_db_error)
}

async fn query_on(
    client: &tokio_postgres::Client,
    sql: &str,
    params: &[Value],
) -> OrmResult<Vec<Row>> {
    let sql = rewrite_placeholders(sql);
    let rows = client
        .query(sql.as_ref(), &bind(params))
        .await
        .map_err(OrmError::from_db_error)?;
    convert_rows(rows)
}

/// A shared PostgreSQL connection.
#[derive(Clone)]
pub struct PostgresConnection {
    client: Arc<tokio_postgres::Client>,
}

impl PostgresConnection {
    /// Connect with a libpq-style connection string (no TLS) and drive the connection
    /// on the current tokio runtime.
    pub async fn connect(dsn: &str) -> OrmResult<Self> {
        let (client, connection) = tokio_postgres::connect(dsn, NoTls)
            .await
            .map_err(|e| OrmError::Connection(e.to_string()))?;
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!(target: "tinyorm.sql", error = %e, "postgres connection error");
            }
        });
        Ok(Self::from_client(client))
    }

    /// Wrap a client whose connection task is already running.
    pub fn from_client(client: tokio_postgres::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    pub fn client(&self) -> &tokio_postgres::Client {
        &self.client
    }
}

impl std::fmt::Debug for PostgresConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostgresConnection")
            .field("closed", &self.client.is_closed())
            .finish()
    }
}

impl GenericClient for PostgresConnection {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        execute_on(&self.client, sql, params).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        query_on(&self.client, sql, params).await
    }
}

impl Connection for PostgresConnection {
    type Transaction = PostgresTransaction;

    async fn begin(&self) -> OrmResult<PostgresTransaction> {
        self.client
            .batch_execute("BEGIN")
            .await
            .map_err(OrmError::from_db_error)?;
        Ok(PostgresTransaction {
            client: Some(Arc::clone(&self.client)),
        })
    }
}

/// An open PostgreSQL transaction on a [`PostgresConnection`].
///
/// Rolled back on drop (on the current tokio runtime) if neither committed nor rolled back.
pub struct PostgresTransaction {
    client: Option<Arc<tokio_postgres::Client>>,
}

impl PostgresTransaction {
    fn client(&self) -> OrmResult<&tokio_postgres::Client> {
        self.client
            .as_deref()
            .ok_or_else(|| OrmError::Transaction("PostgreSQL transaction already completed".into()))
    }

    /// Run `COMMIT` or `ROLLBACK`. The server ends the transaction either way (a failed
    /// COMMIT is rolled back), so the handle is always released.
    async fn finish(&mut self, sql: &str) -> OrmResult<()> {
        let client = self.client.take().ok_or_else(|| {
            OrmError::Transaction("PostgreSQL transaction already completed".into())
        })?;
        client
            .batch_execute(sql)
            .await
            .map_err(OrmError::from_db_error)
    }
}

impl GenericClient for PostgresTransaction {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        execute_on(self.client()?, sql, params).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<Row>> {
        query_on(self.client()?, sql, params).await
    }
}

impl Transaction for PostgresTransaction {
    async fn commit(&mut self) -> OrmResult<()> {
        self.finish("COMMIT").await
    }

    async fn rollback(&mut self) -> OrmResult<()> {
        self.finish("ROLLBACK").await
    }

    fn is_active(&self) -> bool {
        self.client.is_some()
    }
}

impl Drop for PostgresTransaction {
    fn drop(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        tracing::warn!(target: "tinyorm.tx", "PostgreSQL transaction dropped without commit; rolling back");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = client.batch_execute("ROLLBACK").await {
                        tracing::error!(target: "tinyorm.tx", error = %e, "rollback on drop failed");
                    }
                });
            }
            Err(_) => {
                tracing::error!(target: "tinyorm.tx", "no tokio runtime to roll back dropped transaction");
            }
        }
    }
}
