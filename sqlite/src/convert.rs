//! Conversion between declared values and SQLite values, and the
//! column-oriented result shape returned by reads.
//!
//! Writes bind [`ColumnValue`]s as positional parameters; reads collect
//! rows into a [`ColumnarResult`], one value sequence per projected
//! column.

use rusqlite::types::Value;
use serde::ser::{Serialize, SerializeMap, Serializer};
use sqlforge_core::ColumnValue;

/// Converts a declared value to the SQLite value bound for it.
///
/// Booleans bind as `0`/`1`; opaque values bind as their printable form
/// and structured values as JSON text.
///
/// # Examples
///
/// ```
/// use rusqlite::types::Value;
/// use sqlforge_core::ColumnValue;
/// use sqlforge_sqlite::to_sql_value;
///
/// assert_eq!(to_sql_value(&ColumnValue::Boolean(false)), Value::Integer(0));
/// assert_eq!(to_sql_value(&"w1".into()), Value::Text("w1".into()));
/// ```
pub fn to_sql_value(value: &ColumnValue) -> Value {
    match value {
        ColumnValue::Boolean(b) => Value::Integer(i64::from(*b)),
        ColumnValue::Integer(i) => Value::Integer(*i),
        ColumnValue::Float(f) => Value::Real(*f),
        ColumnValue::Text(s) => Value::Text(s.clone()),
        ColumnValue::Opaque { opaque } => Value::Text(opaque.clone()),
        ColumnValue::Json(v) => Value::Text(v.to_string()),
    }
}

/// Converts a stored SQLite value to JSON for display.
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::Value::from(*i),
        Value::Real(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Blob(bytes) => serde_json::Value::from(bytes.clone()),
    }
}

/// A read result as one value sequence per column.
///
/// Columns keep the order of the `SELECT` projection. A result with no
/// rows still names every column, each bound to an empty sequence.
///
/// # Examples
///
/// ```
/// use rusqlite::types::Value;
/// use sqlforge_sqlite::ColumnarResult;
///
/// let mut result = ColumnarResult::with_columns(["id", "label"]);
/// assert_eq!(result.get("id").unwrap().len(), 0);
///
/// result.push_row(vec![Value::Text("w1".into()), Value::Text("Button".into())]);
/// assert_eq!(result.row_count(), 1);
/// assert_eq!(result.get("label").unwrap()[0], Value::Text("Button".into()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnarResult {
    columns: Vec<(String, Vec<Value>)>,
}

impl ColumnarResult {
    /// Creates an empty result with the given column names.
    pub fn with_columns<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: names.into_iter().map(|n| (n.into(), Vec::new())).collect(),
        }
    }

    /// Appends one row. Values are matched to columns by position; extra
    /// values are ignored and missing ones are stored as `NULL`.
    pub fn push_row(&mut self, row: Vec<Value>) {
        let mut values = row.into_iter();
        for (_, column) in &mut self.columns {
            column.push(values.next().unwrap_or(Value::Null));
        }
    }

    /// Returns the values of column `name`.
    pub fn get(&self, name: &str) -> Option<&[Value]> {
        self.columns
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, values)| values.as_slice())
    }

    /// Column names in projection order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(n, _)| n.as_str())
    }

    /// Iterates `(name, values)` pairs in projection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Value])> {
        self.columns
            .iter()
            .map(|(n, values)| (n.as_str(), values.as_slice()))
    }

    /// Number of columns.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Number of rows.
    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |(_, values)| values.len())
    }

    /// Returns `true` if no rows matched.
    pub fn is_empty(&self) -> bool {
        self.row_count() == 0
    }

    /// Returns row `index` as values in column order.
    pub fn row(&self, index: usize) -> Option<Vec<&Value>> {
        if index >= self.row_count() {
            return None;
        }
        Some(self.columns.iter().map(|(_, values)| &values[index]).collect())
    }
}

impl Serialize for ColumnarResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.columns.len()))?;
        for (name, values) in &self.columns {
            let values: Vec<serde_json::Value> = values.iter().map(value_to_json).collect();
            map.serialize_entry(name, &values)?;
        }
        map.end()
    }
}
