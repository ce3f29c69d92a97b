use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::collections::{BTreeMap, HashMap};

/// Insertion-ordered column → value assignments, as used by `UPDATE ... SET`.
///
/// The order of entries is the order the SET list is emitted in, so conversions from
/// unordered maps sort by column name to keep generated SQL deterministic.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldMap {
    entries: Vec<(String, Value)>,
}

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `column` to `value`. An existing entry keeps its position.
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        let column = column.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(name, _)| *name == column) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((column, value)),
        }
        self
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn set(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Build from a flat alternating list: `[name, value, name, value, ...]`.
    ///
    /// Names must be text and the list must have even length.
    pub fn from_pairs(pairs: Vec<Value>) -> OrmResult<Self> {
        if pairs.len() % 2 != 0 {
            return Err(OrmError::validation(format!(
                "expected column/value pairs, got {} items",
                pairs.len()
            )));
        }
        let mut map = Self::new();
        let mut iter = pairs.into_iter();
        while let (Some(name), Some(value)) = (iter.next(), iter.next()) {
            match name {
                Value::Text(name) => {
                    map.insert(name, value);
                }
                other => {
                    return Err(OrmError::validation(format!(
                        "column name must be text, got {}",
                        other.kind_name()
                    )));
                }
            }
        }
        Ok(map)
    }
}

impl IntoIterator for FieldMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (column, value) in iter {
            map.insert(column, value);
        }
        map
    }
}

impl<K: Into<String>, V: Into<Value>> From<BTreeMap<K, V>> for FieldMap {
    fn from(map: BTreeMap<K, V>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> From<HashMap<K, V>> for FieldMap {
    fn from(map: HashMap<K, V>) -> Self {
        let mut entries: Vec<(String, Value)> = map
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Self { entries }
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for FieldMap {
    fn from(pairs: [(K, V); N]) -> Self {
        pairs.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for FieldMap {
    fn from(pairs: Vec<(K, V)>) -> Self {
        pairs.into_iter().collect()
    }
}
