use super::Dialect;
use crate::error::OrmResult;
use crate::value::Value;

/// PostgreSQL.
///
/// `u64` has no lossless column type and is rejected. Unquoted identifiers are folded
/// to lower case by the server, so the existence check compares names case-insensitively.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn data_type_of(&self, sample: &Value) -> OrmResult<&'static str> {
        let ty = match sample {
            Value::Bool(_) => "boolean",
            Value::I8(_) | Value::I16(_) | Value::U8(_) => "smallint",
            Value::I32(_) | Value::U16(_) => "integer",
            Value::I64(_) | Value::U32(_) => "bigint",
            Value::F32(_) => "real",
            Value::F64(_) => "double precision",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytea",
            Value::DateTime(_) => "timestamp",
            Value::U64(_) | Value::Null => return Err(self.unsupported(sample)),
        };
        Ok(ty)
    }

    fn table_exist_sql(&self, table: &str) -> (String, Vec<Value>) {
        (
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = current_schema() AND lower(table_name) = lower(?)"
                .to_string(),
            vec![Value::from(table)],
        )
    }
}
