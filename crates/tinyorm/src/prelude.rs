//! Convenient imports for typical `tinyorm` usage.
//!
//! ```ignore
//! use tinyorm::prelude::*;
//! ```

pub use crate::{
    Connection, DialectRegistry, Engine, EngineConfig, FieldMap, GenericClient, Model, OrmError,
    OrmResult, Row, Session, Transaction, Value, params, transaction,
};

#[cfg(feature = "sqlite")]
pub use crate::SqliteConnection;

#[cfg(feature = "postgres")]
pub use crate::PostgresConnection;
