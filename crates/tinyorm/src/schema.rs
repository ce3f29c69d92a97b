//! Table definitions derived from record types.

use crate::dialect::Dialect;
use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::any::TypeId;
use std::collections::HashMap;

/// One persisted field of a model, as described by `#[derive(Model)]`.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Column name (the field name).
    pub name: &'static str,
    /// Zero value of the field type; the dialect picks the column type from it.
    pub sample: Value,
    /// Free-form constraint text, e.g. `PRIMARY KEY`. Empty when absent.
    pub constraint: &'static str,
}

impl FieldDescriptor {
    pub fn new(name: &'static str, sample: Value, constraint: &'static str) -> Self {
        Self {
            name,
            sample,
            constraint,
        }
    }
}

/// A record type that maps to one table.
///
/// Usually derived:
///
/// ```ignore
/// use tinyorm::Model;
///
/// #[derive(Debug, Default, Model)]
/// pub struct User {
///     #[orm(constraint = "PRIMARY KEY")]
///     pub name: String,
///     pub age: i32,
/// }
/// ```
///
/// The table is named after the type, columns after the public fields in declaration
/// order. Fields marked `#[orm(skip)]` are not persisted.
pub trait Model: Default + Send + Sync + 'static {
    /// Table name.
    const TYPE_NAME: &'static str;

    /// Persisted fields in declaration order.
    fn fields() -> Vec<FieldDescriptor>;

    /// Current values of the persisted fields, aligned with [`fields`](Model::fields).
    fn record_values(&self) -> Vec<Value>;

    /// Assign the value read from `column` to the field of the same name.
    fn set_column(&mut self, column: &str, value: Value) -> OrmResult<()>;
}

/// A column of a [`TableDef`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub sql_type: String,
    pub constraint: String,
}

/// Table definition for a model type under one dialect.
#[derive(Debug, Clone)]
pub struct TableDef {
    source_type: TypeId,
    name: String,
    columns: Vec<Column>,
    column_names: Vec<String>,
    columns_by_name: HashMap<String, usize>,
}

impl TableDef {
    /// Derive the table definition of `T`.
    ///
    /// Fails on the first field whose type the dialect cannot map.
    pub fn parse<T: Model>(dialect: &dyn Dialect) -> OrmResult<Self> {
        let fields = T::fields();
        let mut columns = Vec::with_capacity(fields.len());
        let mut column_names = Vec::with_capacity(fields.len());
        let mut columns_by_name = HashMap::with_capacity(fields.len());

        for field in fields {
            let sql_type = dialect.data_type_of(&field.sample)?;
            columns_by_name.insert(field.name.to_string(), columns.len());
            column_names.push(field.name.to_string());
            columns.push(Column {
                name: field.name.to_string(),
                sql_type: sql_type.to_string(),
                constraint: field.constraint.to_string(),
            });
        }

        Ok(Self {
            source_type: TypeId::of::<T>(),
            name: T::TYPE_NAME.to_string(),
            columns,
            column_names,
            columns_by_name,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> &[String] {
        &self.column_names
    }

    pub fn get_column(&self, name: &str) -> Option<&Column> {
        self.columns_by_name.get(name).map(|&idx| &self.columns[idx])
    }

    /// Whether this definition was parsed from `T`.
    pub fn is_for<T: Model>(&self) -> bool {
        self.source_type == TypeId::of::<T>()
    }

    pub fn source_type(&self) -> TypeId {
        self.source_type
    }

    /// Field values of `record` in column order.
    pub fn record_values<T: Model>(&self, record: &T) -> OrmResult<Vec<Value>> {
        if !self.is_for::<T>() {
            return Err(OrmError::validation(format!(
                "record of type {} does not belong to table {}",
                T::TYPE_NAME,
                self.name
            )));
        }
        Ok(record.record_values())
    }

    /// Column list of a `CREATE TABLE` statement: `name type constraint, ...`.
    pub(crate) fn column_defs(&self) -> String {
        self.columns
            .iter()
            .map(|col| {
                format!("{} {} {}", col.name, col.sql_type, col.constraint)
                    .trim_end()
                    .to_string()
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Sqlite3;
    use crate::value::{FromValue, SqlField, ToValue};

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
                other => return Err(OrmError::decode(other, "no such field on User")),
            }
            Ok(())
        }
    }

    #[derive(Debug, Default)]
    struct Blank {
        _missing: Option<()>,
    }

    impl Model for Blank {
        const TYPE_NAME: &'static str = "Blank";

        fn fields() -> Vec<FieldDescriptor> {
            vec![
                FieldDescriptor::new("Id", i64::zero_value(), ""),
                FieldDescriptor::new("Nothing", Value::Null, ""),
            ]
        }

        fn record_values(&self) -> Vec<Value> {
            vec![Value::I64(0), Value::Null]
        }

        fn set_column(&mut self, _column: &str, _value: Value) -> OrmResult<()> {
            Ok(())
        }
    }

    #[test]
    fn parse_user() {
        let table = TableDef::parse::<User>(&Sqlite3).unwrap();
        assert_eq!(table.name(), "User");
        assert_eq!(table.column_names(), ["Name", "Age"]);
        assert_eq!(table.columns().len(), 2);

        let name = table.get_column("Name").unwrap();
        assert_eq!(name.sql_type, "text");
        assert_eq!(name.constraint, "PRIMARY KEY");
        assert_eq!(table.get_column("Age").unwrap().sql_type, "integer");
        assert!(table.get_column("Email").is_none());
        assert!(table.is_for::<User>());
        assert!(!table.is_for::<Blank>());
    }

    #[test]
    fn columns_and_index_agree() {
        let table = TableDef::parse::<User>(&Sqlite3).unwrap();
        for (idx, name) in table.column_names().iter().enumerate() {
            assert_eq!(&table.columns()[idx].name, name);
            assert_eq!(table.get_column(name), Some(&table.columns()[idx]));
        }
    }

    #[test]
    fn unsupported_field_aborts_parse() {
        let err = TableDef::parse::<Blank>(&Sqlite3).unwrap_err();
        assert!(matches!(err, OrmError::UnsupportedType { .. }));
    }

    #[test]
    fn record_values_checks_type() {
        let table = TableDef::parse::<User>(&Sqlite3).unwrap();
        let user = User {
            name: "Tom".into(),
            age: 18,
        };
        assert_eq!(
            table.record_values(&user).unwrap(),
            vec![Value::Text("Tom".into()), Value::I32(18)]
        );
        assert!(matches!(
            table.record_values(&Blank::default()),
            Err(OrmError::Validation(_))
        ));
    }

    #[test]
    fn column_defs_trim_missing_constraints() {
        let table = TableDef::parse::<User>(&Sqlite3).unwrap();
        assert_eq!(table.column_defs(), "Name text PRIMARY KEY, Age integer");
    }
}
