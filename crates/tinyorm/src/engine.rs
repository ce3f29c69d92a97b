//! Entry point: owns the shared connection and dialect, hands out sessions.

use crate::client::Connection;
use crate::config::EngineConfig;
use crate::dialect::{Dialect, DialectRegistry};
use crate::error::OrmResult;
use crate::monitor::SqlLogger;
use crate::session::Session;
use std::sync::Arc;

/// A connection plus the dialect spoken over it.
///
/// Sessions created by one engine share its connection.
pub struct Engine<C: Connection> {
    conn: Arc<C>,
    dialect: Arc<dyn Dialect>,
    logger: SqlLogger,
}

impl<C: Connection> Engine<C> {
    pub fn new(conn: C, dialect: Arc<dyn Dialect>) -> Self {
        Self {
            conn: Arc::new(conn),
            dialect,
            logger: SqlLogger::default(),
        }
    }

    /// Resolve `dialect` by name through `registry`.
    pub fn with_registry(conn: C, registry: &DialectRegistry, dialect: &str) -> OrmResult<Self> {
        let dialect = registry.get(dialect)?;
        Ok(Self::new(conn, dialect))
    }

    /// Statement logging for sessions created from now on.
    pub fn logger(mut self, logger: SqlLogger) -> Self {
        self.logger = logger;
        self
    }

    pub fn new_session(&self) -> Session<C> {
        Session::with_logger(
            Arc::clone(&self.conn),
            Arc::clone(&self.dialect),
            self.logger.clone(),
        )
    }

    pub fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Release the engine's handle on the connection.
    ///
    /// The connection closes once every session created from this engine is dropped too.
    pub fn close(self) {
        tracing::info!(target: "tinyorm.sql", dialect = self.dialect.name(), "close database success");
    }
}

impl<C: Connection> std::fmt::Debug for Engine<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("dialect", &self.dialect.name())
            .field("logger", &self.logger)
            .finish_non_exhaustive()
    }
}

#[cfg(feature = "sqlite")]
impl Engine<crate::sqlite::SqliteConnection> {
    /// Open the SQLite database named by `config.dsn`.
    pub fn open_sqlite(config: &EngineConfig, registry: &DialectRegistry) -> OrmResult<Self> {
        let dialect = registry.get(&config.dialect)?;
        let conn = crate::sqlite::SqliteConnection::open(&config.dsn)?;
        tracing::info!(target: "tinyorm.sql", dialect = dialect.name(), dsn = %config.dsn, "connect database success");
        Ok(Self::new(conn, dialect).logger(config.log.clone()))
    }
}

#[cfg(feature = "postgres")]
impl Engine<crate::postgres::PostgresConnection> {
    /// Connect to the PostgreSQL server named by `config.dsn`.
    pub async fn connect_postgres(
        config: &EngineConfig,
        registry: &DialectRegistry,
    ) -> OrmResult<Self> {
        let dialect = registry.get(&config.dialect)?;
        let conn = crate::postgres::PostgresConnection::connect(&config.dsn).await?;
        tracing::info!(target: "tinyorm.sql", dialect = dialect.name(), "connect database success");
        Ok(Self::new(conn, dialect).logger(config.log.clone()))
    }
}
