//! Schema snapshots
//!
//! A snapshot lists the values each column currently holds:
//!
//! ```json
//! { "tables": { "role": { "id": [1, 2] }, "user_roles": { "role_id": [1, null] } } }
//! ```
//!
//! Scalars compare by their text form, so `1` and `"1"` are the same key.
//! Integral floats are written as integers first, so `1.0` matches `1`.
//! `null` marks an unset optional reference and is never checked.

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::relation::ColumnRef;

/// Column values per table
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    #[serde(default)]
    pub tables: BTreeMap<String, BTreeMap<String, Vec<Value>>>,
}

impl SchemaSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a column's values
    pub fn with_column<I, V>(mut self, table: &str, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.tables
            .entry(table.to_string())
            .or_default()
            .insert(column.to_string(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    pub fn has_table(&self, table: &str) -> bool {
        self.tables.contains_key(table)
    }

    /// Normalised non-null values of a column, or `None` when the column is absent
    pub fn values(&self, column: &ColumnRef) -> Option<BTreeSet<String>> {
        let raw = self.tables.get(&column.table)?.get(&column.column)?;
        Some(raw.iter().filter_map(normalize).collect())
    }
}

fn normalize(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(normalize_number(n)),
        other => Some(other.to_string()),
    }
}

/// Integral floats share the integer's text so `1.0` matches `1`
fn normalize_number(n: &Number) -> String {
    if n.is_i64() || n.is_u64() {
        return n.to_string();
    }
    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => {
            (f as i64).to_string()
        }
        _ => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_values_skip_null_and_normalise() {
        let snapshot = SchemaSnapshot::new().with_column(
            "user_roles",
            "role_id",
            vec![json!(1), json!("1"), json!(null), json!("admin")],
        );
        let values = snapshot
            .values(&ColumnRef::new("user_roles", "role_id"))
            .unwrap();
        assert_eq!(values.into_iter().collect::<Vec<_>>(), vec!["1", "admin"]);
    }

    #[test]
    fn test_integral_floats_match_integers() {
        let snapshot = SchemaSnapshot::from_json_str(
            r#"{"tables": {"role": {"id": [1.0, 2.5, -3.0]}, "user_roles": {"role_id": [1, -3]}}}"#,
        )
        .unwrap();
        let parent = snapshot.values(&ColumnRef::new("role", "id")).unwrap();
        let child = snapshot.values(&ColumnRef::new("user_roles", "role_id")).unwrap();
        assert!(child.is_subset(&parent));
        assert!(parent.contains("2.5"));
    }

    #[test]
    fn test_absent_column() {
        let snapshot = SchemaSnapshot::new().with_column("role", "id", vec![1, 2]);
        assert!(snapshot.values(&ColumnRef::new("role", "name")).is_none());
        assert!(snapshot.values(&ColumnRef::new("users", "user_id")).is_none());
        assert!(snapshot.has_table("role"));
    }

    #[test]
    fn test_parse_json() {
        let snapshot = SchemaSnapshot::from_json_str(
            r#"{"tables": {"role": {"id": [1, 2]}, "user_roles": {"role_id": [1, null]}}}"#,
        )
        .unwrap();
        assert_eq!(snapshot.tables.len(), 2);
        assert_eq!(
            snapshot.values(&ColumnRef::new("user_roles", "role_id")).unwrap().len(),
            1
        );
    }
}
