use crate::field_map::FieldMap;
use crate::value::Value;

/// Comma-separated `?` placeholders.
pub(crate) fn bind_vars(num: usize) -> String {
    vec!["?"; num].join(", ")
}

pub(crate) fn insert(table: &str, fields: &[String]) -> (String, Vec<Value>) {
    (
        format!("INSERT INTO {} ({})", table, fields.join(", ")),
        Vec::new(),
    )
}

/// One `(?, ...)` group per row. The group size comes from the first row.
pub(crate) fn values(rows: &[Vec<Value>]) -> (String, Vec<Value>) {
    let group = format!("({})", bind_vars(rows.first().map_or(0, Vec::len)));
    let groups = vec![group.as_str(); rows.len()].join(", ");
    let params = rows.iter().flatten().cloned().collect();
    (format!("VALUES {groups}"), params)
}

pub(crate) fn select(table: &str, fields: &[String]) -> (String, Vec<Value>) {
    (
        format!("SELECT {} FROM {}", fields.join(", "), table),
        Vec::new(),
    )
}

pub(crate) fn limit(n: i64) -> (String, Vec<Value>) {
    ("LIMIT ?".to_string(), vec![Value::I64(n)])
}

pub(crate) fn where_(desc: &str, vars: &[Value]) -> (String, Vec<Value>) {
    (format!("WHERE {desc}"), vars.to_vec())
}

pub(crate) fn order_by(expr: &str) -> (String, Vec<Value>) {
    (format!("ORDER BY {expr}"), Vec::new())
}

pub(crate) fn update(table: &str, fields: &FieldMap) -> (String, Vec<Value>) {
    let mut sets = Vec::with_capacity(fields.len());
    let mut params = Vec::with_capacity(fields.len());
    for (column, value) in fields.iter() {
        sets.push(format!("{column} = ?"));
        params.push(value.clone());
    }
    (format!("UPDATE {} SET {}", table, sets.join(", ")), params)
}

pub(crate) fn delete(table: &str) -> (String, Vec<Value>) {
    (format!("DELETE FROM {table}"), Vec::new())
}

pub(crate) fn count(table: &str) -> (String, Vec<Value>) {
    select(table, &["count(*)".to_string()])
}
