//! Error types for tinyorm

use thiserror::Error;

/// Result type alias for tinyorm operations
pub type OrmResult<T> = Result<T, OrmError>;

/// Error types for schema parsing and database operations
#[derive(Debug, Error)]
pub enum OrmError {
    /// A dialect has no column type for this kind of value.
    ///
    /// This is a configuration error: schema parsing stops at the first
    /// field that cannot be mapped.
    #[error("Unsupported type for dialect '{dialect}': {value}")]
    UnsupportedType {
        dialect: &'static str,
        value: &'static str,
    },

    /// No dialect is registered under this name
    #[error("Unknown dialect: {0}")]
    UnknownDialect(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// SQLite driver error
    #[cfg(feature = "sqlite")]
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    /// PostgreSQL driver error
    #[cfg(feature = "postgres")]
    #[error("Query error: {0}")]
    Postgres(tokio_postgres::Error),

    /// Row not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// A table operation ran before any model was bound to the session
    #[error("Model is not set")]
    ModelNotSet,

    /// Transaction state violation (begin twice, commit while idle, ...)
    #[error("Transaction error: {0}")]
    Transaction(String),

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Row decode/mapping error
    #[error("Decode error on column '{column}': {message}")]
    Decode { column: String, message: String },

    /// A value could not be converted for the driver
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl OrmError {
    /// Create a decode error for a specific column
    pub fn decode(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Attach a column name to a conversion failure raised while scanning a row.
    ///
    /// Errors that are not conversion failures are returned unchanged.
    pub fn in_column(self, column: &str) -> Self {
        match self {
            Self::Conversion(message) => Self::decode(column, message),
            Self::Decode { message, .. } => Self::decode(column, message),
            other => other,
        }
    }

    /// Check if this is a not found error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is a configuration error (unsupported type, unknown dialect, bad config)
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedType { .. } | Self::UnknownDialect(_) | Self::Config(_)
        )
    }

    /// Parse a tokio_postgres error into a more specific OrmError
    #[cfg(feature = "postgres")]
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Postgres(err)
    }

    /// Parse a rusqlite error into a more specific OrmError
    #[cfg(feature = "sqlite")]
    pub fn from_sqlite_error(err: rusqlite::Error) -> Self {
        // Extended result codes, see https://www.sqlite.org/rescode.html
        const CONSTRAINT_CHECK: i32 = 275;
        const CONSTRAINT_FOREIGNKEY: i32 = 787;
        const CONSTRAINT_PRIMARYKEY: i32 = 1555;
        const CONSTRAINT_UNIQUE: i32 = 2067;

        if let rusqlite::Error::SqliteFailure(code, message) = &err {
            let message = message.clone().unwrap_or_else(|| code.to_string());
            match code.extended_code {
                CONSTRAINT_UNIQUE | CONSTRAINT_PRIMARYKEY => {
                    return Self::UniqueViolation(message);
                }
                CONSTRAINT_FOREIGNKEY => return Self::ForeignKeyViolation(message),
                CONSTRAINT_CHECK => return Self::CheckViolation(message),
                _ => {}
            }
        }
        Self::Sqlite(err)
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for OrmError {
    fn from(err: rusqlite::Error) -> Self {
        Self::from_sqlite_error(err)
    }
}

#[cfg(feature = "postgres")]
impl From<tokio_postgres::Error> for OrmError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::from_db_error(err)
    }
}
