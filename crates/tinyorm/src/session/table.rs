use super::Session;
use crate::client::Connection;
use crate::error::{OrmError, OrmResult};
use crate::schema::{Model, TableDef};
use std::sync::Arc;

impl<C: Connection> Session<C> {
    /// Bind `T` as the session's model.
    ///
    /// The table definition is parsed again only when a different type is bound.
    pub fn model<T: Model>(&mut self) -> OrmResult<&mut Self> {
        let cached = self.ref_table.as_ref().is_some_and(|t| t.is_for::<T>());
        if !cached {
            match TableDef::parse::<T>(self.dialect.as_ref()) {
                Ok(table) => self.ref_table = Some(Arc::new(table)),
                Err(err) => {
                    self.clear();
                    return Err(err);
                }
            }
        }
        Ok(self)
    }

    /// The bound table definition.
    ///
    /// Logs an error and returns `None` if no model has been bound.
    pub fn ref_table(&self) -> Option<&TableDef> {
        if self.ref_table.is_none() {
            tracing::error!(target: "tinyorm.sql", "Model is not set");
        }
        self.ref_table.as_deref()
    }

    /// Bound table for an operation that needs one; clears the pending state otherwise.
    pub(super) fn require_table(&mut self) -> OrmResult<Arc<TableDef>> {
        match &self.ref_table {
            Some(table) => Ok(Arc::clone(table)),
            None => {
                tracing::error!(target: "tinyorm.sql", "Model is not set");
                self.clear();
                Err(OrmError::ModelNotSet)
            }
        }
    }

    /// `CREATE TABLE` for the bound model.
    pub async fn create_table(&mut self) -> OrmResult<()> {
        let table = self.require_table()?;
        let sql = format!("CREATE TABLE {} ({})", table.name(), table.column_defs());
        self.raw(sql, []).exec().await?;
        Ok(())
    }

    /// `DROP TABLE IF EXISTS` for the bound model.
    pub async fn drop_table(&mut self) -> OrmResult<()> {
        let table = self.require_table()?;
        let sql = format!("DROP TABLE IF EXISTS {}", table.name());
        self.raw(sql, []).exec().await?;
        Ok(())
    }

    /// Whether the bound model's table exists.
    pub async fn has_table(&mut self) -> OrmResult<bool> {
        let table = self.require_table()?;
        let (sql, args) = self.dialect.table_exist_sql(table.name());
        let row = self.raw(sql, args).query_row().await?;
        let name = match row {
            Some(row) => row.try_get::<String>(0)?,
            None => return Ok(false),
        };
        Ok(name.eq_ignore_ascii_case(table.name()))
    }
}

#[cfg(all(test, feature = "sqlite"))]
mod tests {
    use super::*;
    use crate::dialect::Sqlite3;
    use crate::schema::FieldDescriptor;
    use crate::sqlite::SqliteConnection;
    use crate::value::{FromValue, SqlField, ToValue, Value};

    #[derive(Debug, Default)]
    struct User {
        name: String,
        age: i32,
    }

    impl Model for User {
        const TYPE_NAME: &'static str = "User";

        fn fields() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::new("Name", String::zero_value(), "PRIMARY KEY"),
                FieldDescriptor::new("Age", i32::zero_value(), ""),
            ]
        }

        fn record_values(&self) -> Vec<Value> {
            vec![self.name.to_value(), self.age.to_value()]
        }

        fn set_column(&mut self, column: &str, value: Value) -> OrmResult<()> {
            match column {
                "Name" => self.name = FromValue::from_value(value)?,
                "Age" => self.age = FromValue::from_value(value)?,
                other => return Err(OrmError::decode(other, "no such field")),
            }
            Ok(())
        }
    }

    fn session() -> Session<SqliteConnection> {
        let conn = SqliteConnection::open_in_memory().unwrap();
        Session::new(Arc::new(conn), Arc::new(Sqlite3))
    }

    #[tokio::test]
    async fn create_has_drop() {
        let mut s = session();
        let s = s.model::<User>().unwrap();
        s.drop_table().await.unwrap();
        assert!(!s.has_table().await.unwrap());
        s.create_table().await.unwrap();
        assert!(s.has_table().await.unwrap());
        s.drop_table().await.unwrap();
        s.drop_table().await.unwrap();
        assert!(!s.has_table().await.unwrap());
    }

    #[tokio::test]
    async fn model_is_cached_per_type() {
        let mut s = session();
        s.model::<User>().unwrap();
        let first = Arc::clone(s.ref_table.as_ref().unwrap());
        s.model::<User>().unwrap();
        assert!(Arc::ptr_eq(&first, s.ref_table.as_ref().unwrap()));
        assert_eq!(s.ref_table().unwrap().name(), "User");
    }

    #[tokio::test]
    async fn table_ops_need_a_model() {
        let mut s = session();
        assert!(s.ref_table().is_none());
        assert!(matches!(s.create_table().await, Err(OrmError::ModelNotSet)));
        assert!(matches!(s.has_table().await, Err(OrmError::ModelNotSet)));
    }
}
