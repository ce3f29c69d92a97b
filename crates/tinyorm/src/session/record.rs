use super::Session;
use crate::clause::{ClauseArgs, ClauseType};
use crate::client::Connection;
use crate::error::{OrmError, OrmResult};
use crate::field_map::FieldMap;
use crate::schema::{Model, TableDef};
use crate::value::Value;
use std::sync::Arc;

impl<C: Connection> Session<C> {
    fn bind<T: Model>(&mut self) -> OrmResult<Arc<TableDef>> {
        self.model::<T>()?;
        self.require_table()
    }

    /// Insert `records` in one statement and return the number of rows inserted.
    ///
    /// An empty slice inserts nothing and does not touch the database.
    pub async fn insert<T: Model>(&mut self, records: &[T]) -> OrmResult<u64> {
        if records.is_empty() {
            self.clear();
            return Ok(0);
        }
        let table = self.bind::<T>()?;

        let mut rows = Vec::with_capacity(records.len());
        for record in records {
            match table.record_values(record) {
                Ok(values) => rows.push(values),
                Err(err) => {
                    self.clear();
                    return Err(err);
                }
            }
        }

        self.clause.set(ClauseArgs::Insert {
            table: table.name().to_string(),
            fields: table.column_names().to_vec(),
        });
        self.clause.set(ClauseArgs::Values(rows));
        let (sql, vars) = self
            .clause
            .build(&[ClauseType::Insert, ClauseType::Values]);
        self.raw(sql, vars).exec().await
    }

    /// Append every record matching the pending Where / OrderBy / Limit to `out`.
    ///
    /// `out` is left untouched if any row fails to decode.
    pub async fn find<T: Model>(&mut self, out: &mut Vec<T>) -> OrmResult<()> {
        let table = self.bind::<T>()?;
        self.clause.set(ClauseArgs::Select {
            table: table.name().to_string(),
            fields: table.column_names().to_vec(),
        });
        let (sql, vars) = self.clause.build(&[
            ClauseType::Select,
            ClauseType::Where,
            ClauseType::OrderBy,
            ClauseType::Limit,
        ]);
        let rows = self.raw(sql, vars).query_rows().await?;

        let mut decoded = Vec::with_capacity(rows.len());
        for row in rows {
            let mut record = T::default();
            // Columns come back in select order, which is the table's column order.
            for (column, value) in table.column_names().iter().zip(row.into_values()) {
                record
                    .set_column(column, value)
                    .map_err(|e| e.in_column(column))?;
            }
            decoded.push(record);
        }
        out.extend(decoded);
        Ok(())
    }

    /// Load the first matching record into `record`.
    ///
    /// Returns [`OrmError::NotFound`] when nothing matches.
    pub async fn first<T: Model>(&mut self, record: &mut T) -> OrmResult<()> {
        let mut found = Vec::with_capacity(1);
        self.limit(1).find(&mut found).await?;
        match found.pop() {
            Some(first) => {
                *record = first;
                Ok(())
            }
            None => Err(OrmError::not_found(format!("no {} record found", T::TYPE_NAME))),
        }
    }

    /// Update the bound table and return the number of rows changed.
    ///
    /// Without a Where clause every row is updated.
    pub async fn update(&mut self, fields: impl Into<FieldMap>) -> OrmResult<u64> {
        let fields = fields.into();
        let table = self.require_table()?;
        if fields.is_empty() {
            self.clear();
            return Err(OrmError::validation("UPDATE requires at least one column"));
        }
        self.clause.set(ClauseArgs::Update {
            table: table.name().to_string(),
            fields,
        });
        let (sql, vars) = self.clause.build(&[ClauseType::Update, ClauseType::Where]);
        self.raw(sql, vars).exec().await
    }

    /// [`update`](Self::update) from a flat `[column, value, column, value, ...]` list.
    pub async fn update_pairs(&mut self, pairs: Vec<Value>) -> OrmResult<u64> {
        match FieldMap::from_pairs(pairs) {
            Ok(fields) => self.update(fields).await,
            Err(err) => {
                self.clear();
                Err(err)
            }
        }
    }

    /// Delete from the bound table and return the number of rows removed.
    ///
    /// Without a Where clause every row is deleted.
    pub async fn delete(&mut self) -> OrmResult<u64> {
        let table = self.require_table()?;
        self.clause.set(ClauseArgs::Delete {
            table: table.name().to_string(),
        });
        let (sql, vars) = self.clause.build(&[ClauseType::Delete, ClauseType::Where]);
        self.raw(sql, vars).exec().await
    }

    /// Count the rows matching the pending Where clause.
    pub async fn count(&mut self) -> OrmResult<i64> {
        let table = self.require_table()?;
        self.clause.set(ClauseArgs::Count {
            table: table.name().to_string(),
        });
        let (sql, vars) = self.clause.build(&[ClauseType::Count, ClauseType::Where]);
        match self.raw(sql, vars).query_row().await? {
            Some(row) => row.try_get(0),
            None => Ok(0),
        }
    }

    /// Set the Limit clause.
    pub fn limit(&mut self, n: i64) -> &mut Self {
        self.clause.set(ClauseArgs::Limit(n));
        self
    }

    /// Set the Where clause; `args` bind to the `?` placeholders in `desc`.
    pub fn where_(
        &mut self,
        desc: impl Into<String>,
        args: impl IntoIterator<Item = Value>,
    ) -> &mut Self {
        self.clause.set(ClauseArgs::Where {
            desc: desc.into(),
            vars: args.into_iter().collect(),
        });
        self
    }

    /// Set the OrderBy clause.
    pub fn order_by(&mut self, expr: impl Into<String>) -> &mut Self {
        self.clause.set(ClauseArgs::OrderBy(expr.into()));
        self
    }
}
