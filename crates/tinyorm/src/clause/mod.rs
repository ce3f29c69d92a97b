//! SQL clause fragments and their composition into statements.
//!
//! Each [`ClauseType`] has a generator producing `(sql, params)`. A [`Clause`] keeps at
//! most one fragment per kind and [`Clause::build`] stitches the set fragments together
//! in the order the caller asks for, concatenating their parameters in the same order
//! so placeholders and values stay aligned.
//!
//! ```
//! use tinyorm::clause::{Clause, ClauseArgs, ClauseType};
//!
//! let mut clause = Clause::new();
//! clause.set(ClauseArgs::Limit(3));
//! clause.set(ClauseArgs::Select {
//!     table: "User".into(),
//!     fields: vec!["*".into()],
//! });
//! clause.set(ClauseArgs::Where {
//!     desc: "Name = ?".into(),
//!     vars: vec!["Tom".into()],
//! });
//!
//! let (sql, params) = clause.build(&[ClauseType::Select, ClauseType::Where, ClauseType::Limit]);
//! assert_eq!(sql, "SELECT * FROM User WHERE Name = ? LIMIT ?");
//! assert_eq!(params.len(), 2);
//! ```

mod generator;


use crate::field_map::FieldMap;
use crate::value::Value;
use std::collections::HashMap;

/// Kind of a clause fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClauseType {
    Insert,
    Values,
    Select,
    Limit,
    Where,
    OrderBy,
    Update,
    Delete,
    Count,
}

/// Arguments of one clause fragment.
#[derive(Debug, Clone)]
pub enum ClauseArgs {
    /// `INSERT INTO table (fields...)`
    Insert { table: String, fields: Vec<String> },
    /// `VALUES (?, ...), ...`; one inner vector per row.
    Values(Vec<Vec<Value>>),
    /// `SELECT fields... FROM table`
    Select { table: String, fields: Vec<String> },
    /// `LIMIT ?`
    Limit(i64),
    /// `WHERE desc`, with `vars` bound to the placeholders in `desc`.
    Where { desc: String, vars: Vec<Value> },
    /// `ORDER BY expr`
    OrderBy(String),
    /// `UPDATE table SET col = ?, ...`
    Update { table: String, fields: FieldMap },
    /// `DELETE FROM table`
    Delete { table: String },
    /// `SELECT count(*) FROM table`
    Count { table: String },
}

impl ClauseArgs {
    pub fn kind(&self) -> ClauseType {
        match self {
            Self::Insert { .. } => ClauseType::Insert,
            Self::Values(_) => ClauseType::Values,
            Self::Select { .. } => ClauseType::Select,
            Self::Limit(_) => ClauseType::Limit,
            Self::Where { .. } => ClauseType::Where,
            Self::OrderBy(_) => ClauseType::OrderBy,
            Self::Update { .. } => ClauseType::Update,
            Self::Delete { .. } => ClauseType::Delete,
            Self::Count { .. } => ClauseType::Count,
        }
    }

    /// Render this fragment.
    pub fn generate(&self) -> (String, Vec<Value>) {
        match self {
            Self::Insert { table, fields } => generator::insert(table, fields),
            Self::Values(rows) => generator::values(rows),
            Self::Select { table, fields } => generator::select(table, fields),
            Self::Limit(n) => generator::limit(*n),
            Self::Where { desc, vars } => generator::where_(desc, vars),
            Self::OrderBy(expr) => generator::order_by(expr),
            Self::Update { table, fields } => generator::update(table, fields),
            Self::Delete { table } => generator::delete(table),
            Self::Count { table } => generator::count(table),
        }
    }
}

/// Accumulated clause fragments, at most one per kind.
#[derive(Debug, Clone, Default)]
pub struct Clause {
    fragments: HashMap<ClauseType, (String, Vec<Value>)>,
}

impl Clause {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the fragment for `args`, replacing any fragment of the same kind.
    pub fn set(&mut self, args: ClauseArgs) -> &mut Self {
        let fragment = args.generate();
        self.fragments.insert(args.kind(), fragment);
        self
    }

    /// Join the set fragments of `order` with single spaces; unset kinds are skipped.
    pub fn build(&self, order: &[ClauseType]) -> (String, Vec<Value>) {
        let mut sqls = Vec::with_capacity(order.len());
        let mut params = Vec::new();
        for kind in order {
            if let Some((sql, vars)) = self.fragments.get(kind) {
                sqls.push(sql.as_str());
                params.extend(vars.iter().cloned());
            }
        }
        (sqls.join(" "), params)
    }

    pub fn is_set(&self, kind: ClauseType) -> bool {
        self.fragments.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Drop every fragment.
    pub fn reset(&mut self) {
        self.fragments.clear();
    }
}
