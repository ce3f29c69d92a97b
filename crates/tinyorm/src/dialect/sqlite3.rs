use super::Dialect;
use crate::error::OrmResult;
use crate::value::Value;

/// SQLite 3.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite3;

impl Dialect for Sqlite3 {
    fn name(&self) -> &'static str {
        "sqlite3"
    }

    fn data_type_of(&self, sample: &Value) -> OrmResult<&'static str> {
        let ty = match sample {
            Value::Bool(_) => "bool",
            Value::I8(_)
            | Value::I16(_)
            | Value::I32(_)
            | Value::U8(_)
            | Value::U16(_)
            | Value::U32(_) => "integer",
            Value::I64(_) | Value::U64(_) => "bigint",
            Value::F32(_) | Value::F64(_) => "real",
            Value::Text(_) => "text",
            Value::Bytes(_) => "blob",
            Value::DateTime(_) => "datetime",
            Value::Null => return Err(self.unsupported(sample)),
        };
        Ok(ty)
    }

    fn table_exist_sql(&self, table: &str) -> (String, Vec<Value>) {
        (
            "SELECT name FROM sqlite_master WHERE type='table' and name = ?".to_string(),
            vec![Value::from(table)],
        )
    }
}
