//! Driver-independent result rows

use crate::error::{OrmError, OrmResult};
use crate::value::{FromValue, Value};
use std::sync::Arc;

/// One result row: column names shared across the result set plus positional values.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Arc<[String]>,
    values: Vec<Value>,
}

impl Row {
    pub fn new(columns: Arc<[String]>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|col| col == name)
            .and_then(|idx| self.values.get(idx))
    }

    /// Decode the value at `idx`.
    pub fn try_get<T: FromValue>(&self, idx: usize) -> OrmResult<T> {
        let column = self
            .columns
            .get(idx)
            .map_or_else(|| idx.to_string(), Clone::clone);
        let value = self
            .values
            .get(idx)
            .cloned()
            .ok_or_else(|| OrmError::decode(&column, "column index out of range"))?;
        T::from_value(value).map_err(|e| e.in_column(&column))
    }

    /// Decode the value of the column named `name`.
    pub fn try_get_column<T: FromValue>(&self, name: &str) -> OrmResult<T> {
        let value = self
            .get_by_name(name)
            .cloned()
            .ok_or_else(|| OrmError::decode(name, "no such column"))?;
        T::from_value(value).map_err(|e| e.in_column(name))
    }

    /// Values in select order.
    pub fn into_values(self) -> Vec<Value> {
        self.values
    }
}
