//! # tinyorm
//!
//! A small ORM that maps plain Rust structs to tables and back.
//!
//! ## Features
//!
//! - **Derived schemas**: `#[derive(Model)]` describes a struct's table; the dialect picks column types
//! - **Clause composition**: statements are assembled from per-kind fragments with aligned parameters
//! - **Sessions**: raw SQL, chainable `where_` / `order_by` / `limit`, record CRUD and table DDL
//! - **Transactions**: explicit `begin` / `commit` / `rollback`, or the [`transaction!`] macro
//! - **Dialects**: `sqlite3` (rusqlite) and `postgres` (tokio-postgres), resolved through a [`DialectRegistry`]
//!
//! ## Example
//!
//! ```ignore
//! use tinyorm::{DialectRegistry, Engine, EngineConfig, Model, params};
//!
//! #[derive(Debug, Default, Model)]
//! pub struct User {
//!     #[orm(constraint = "PRIMARY KEY")]
//!     pub name: String,
//!     pub age: i32,
//! }
//!
//! let engine = Engine::open_sqlite(&EngineConfig::default(), &DialectRegistry::default())?;
//! let mut s = engine.new_session();
//! s.model::<User>()?.create_table().await?;
//! s.insert(&[User { name: "Tom".into(), age: 18 }]).await?;
//!
//! let mut users = Vec::<User>::new();
//! s.where_("age > ?", params![10])
//!     .order_by("age DESC")
//!     .limit(5)
//!     .find(&mut users)
//!     .await?;
//! ```

pub mod clause;
pub mod client;
pub mod config;
pub mod dialect;
pub mod engine;
pub mod error;
pub mod field_map;
pub mod monitor;
pub mod prelude;
pub mod row;
pub mod schema;
pub mod session;
pub mod value;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "postgres")]
pub mod postgres;

pub use client::{Connection, GenericClient, Transaction};
pub use config::EngineConfig;
pub use dialect::{Dialect, DialectRegistry};
pub use engine::Engine;
pub use error::{OrmError, OrmResult};
pub use field_map::FieldMap;
pub use monitor::{LogLevel, QueryType, SqlLogger};
pub use row::Row;
pub use schema::{Column, FieldDescriptor, Model, TableDef};
pub use session::Session;
pub use value::{FromValue, SqlField, ToValue, Value};

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteConnection, SqliteTransaction};

#[cfg(feature = "postgres")]
pub use postgres::{PostgresConnection, PostgresTransaction};

#[cfg(feature = "derive")]
pub use tinyorm_derive::Model;
