//! Engine configuration.
//!
//! ```
//! use tinyorm::EngineConfig;
//!
//! let config = EngineConfig::from_toml_str(
//!     r#"
//!     dialect = "sqlite3"
//!     dsn = "app.db"
//!
//!     [log]
//!     level = "debug"
//!     max_sql_length = 500
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(config.dsn, "app.db");
//! ```

use crate::error::{OrmError, OrmResult};
use crate::monitor::{LogLevel, SqlLogger};
use serde::Deserialize;

/// Environment variable holding the dialect name.
pub const ENV_DIALECT: &str = "TINYORM_DIALECT";
/// Environment variable holding the data source name.
pub const ENV_DSN: &str = "TINYORM_DSN";
/// Environment variable toggling statement logging (`true`/`false`/`1`/`0`).
pub const ENV_LOG_SQL: &str = "TINYORM_LOG_SQL";

/// How to reach the database and which dialect to speak.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Registered dialect name.
    pub dialect: String,
    /// SQLite path (or `:memory:`) or a PostgreSQL connection string.
    pub dsn: String,
    /// Statement logging.
    pub log: SqlLogger,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dialect: "sqlite3".to_string(),
            dsn: ":memory:".to_string(),
            log: SqlLogger::default(),
        }
    }
}

impl EngineConfig {
    pub fn new(dialect: impl Into<String>, dsn: impl Into<String>) -> Self {
        Self {
            dialect: dialect.into(),
            dsn: dsn.into(),
            ..Self::default()
        }
    }

    pub fn dialect(mut self, dialect: impl Into<String>) -> Self {
        self.dialect = dialect.into();
        self
    }

    pub fn dsn(mut self, dsn: impl Into<String>) -> Self {
        self.dsn = dsn.into();
        self
    }

    pub fn log(mut self, log: SqlLogger) -> Self {
        self.log = log;
        self
    }

    /// Set the level statements are logged at.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.log.level = level;
        self
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> OrmResult<Self> {
        toml::from_str(source).map_err(|e| OrmError::Config(e.to_string()))
    }

    /// Read `TINYORM_DIALECT`, `TINYORM_DSN` and `TINYORM_LOG_SQL`, loading a `.env`
    /// file first if one exists. Unset variables keep their defaults.
    pub fn from_env() -> OrmResult<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::default();
        if let Ok(dialect) = std::env::var(ENV_DIALECT) {
            config.dialect = dialect;
        }
        if let Ok(dsn) = std::env::var(ENV_DSN) {
            config.dsn = dsn;
        }
        if let Ok(flag) = std::env::var(ENV_LOG_SQL) {
            config.log.enabled = parse_flag(&flag)
                .ok_or_else(|| OrmError::Config(format!("{ENV_LOG_SQL}: invalid flag {flag:?}")))?;
        }
        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_in_memory_sqlite() {
        let config = EngineConfig::default();
        assert_eq!(config.dialect, "sqlite3");
        assert_eq!(config.dsn, ":memory:");
        assert!(config.log.enabled);
    }

    #[test]
    fn toml_overrides_and_defaults() {
        let config = EngineConfig::from_toml_str(
            r#"
            dialect = "postgres"
            dsn = "host=localhost user=postgres"

            [log]
            enabled = false
            level = "trace"
            "#,
        )
        .unwrap();
        assert_eq!(config.dialect, "postgres");
        assert!(!config.log.enabled);
        assert_eq!(config.log.level, LogLevel::Trace);
        assert_eq!(config.log.max_sql_length, Some(200));

        let empty = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(empty, EngineConfig::default());
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let err = EngineConfig::from_toml_str("dialect = 3").unwrap_err();
        assert!(err.is_config());
        let err = EngineConfig::from_toml_str("[log]\nlevel = \"loud\"").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn builder_methods() {
        let config = EngineConfig::new("sqlite3", "gee.db")
            .log_level(LogLevel::Debug)
            .dsn("other.db");
        assert_eq!(config.dsn, "other.db");
        assert_eq!(config.log.level, LogLevel::Debug);
    }

    #[test]
    fn flags() {
        assert_eq!(parse_flag("TRUE"), Some(true));
        assert_eq!(parse_flag(" 0 "), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
