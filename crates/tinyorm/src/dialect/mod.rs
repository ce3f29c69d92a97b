//! SQL dialects.
//!
//! A dialect is a pure description of one database flavour: which column type a value
//! kind maps to, and how to ask whether a table exists. Dialects are looked up by name
//! through a [`DialectRegistry`] owned by the caller (usually an [`Engine`](crate::Engine)).

mod postgres;
mod sqlite3;

pub use postgres::Postgres;
pub use sqlite3::Sqlite3;

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Database-specific type mapping and catalog queries.
pub trait Dialect: Send + Sync + fmt::Debug {
    /// Registry name of this dialect (e.g. `"sqlite3"`).
    fn name(&self) -> &'static str;

    /// Column type for the kind of `sample`.
    ///
    /// Returns [`OrmError::UnsupportedType`] when the kind has no mapping.
    fn data_type_of(&self, sample: &Value) -> OrmResult<&'static str>;

    /// Statement and arguments returning one row holding the table name if `table` exists.
    fn table_exist_sql(&self, table: &str) -> (String, Vec<Value>);

    /// Build the unsupported-type error for `sample`.
    fn unsupported(&self, sample: &Value) -> OrmError {
        OrmError::UnsupportedType {
            dialect: self.name(),
            value: sample.kind_name(),
        }
    }
}

/// Name → dialect lookup.
///
/// `DialectRegistry::default()` knows `sqlite3` and `postgres`; `new()` starts empty.
#[derive(Clone)]
pub struct DialectRegistry {
    dialects: HashMap<String, Arc<dyn Dialect>>,
}

impl DialectRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            dialects: HashMap::new(),
        }
    }

    /// Register `dialect` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, dialect: Arc<dyn Dialect>) -> &mut Self {
        self.dialects.insert(name.into(), dialect);
        self
    }

    /// Look up a dialect by name.
    pub fn get(&self, name: &str) -> OrmResult<Arc<dyn Dialect>> {
        self.dialects
            .get(name)
            .cloned()
            .ok_or_else(|| OrmError::UnknownDialect(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.dialects.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.dialects.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for DialectRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("sqlite3", Arc::new(Sqlite3));
        registry.register("postgres", Arc::new(Postgres));
        registry
    }
}

impl fmt::Debug for DialectRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectRegistry")
            .field("dialects", &self.names())
            .finish()
    }
}
