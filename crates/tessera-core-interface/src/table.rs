//! Canonical local row/column table handed to the upload collaborator

use crate::{BridgeError, Result, Value};
use std::collections::HashSet;

/// A named column of values
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub values: Vec<Value>,
}

impl Column {
    pub fn new(name: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Ordered, named columns of equal length.
///
/// Every constructor validates the shape, so a `LocalTable` that exists is always
/// rectangular with unique, non-empty column names.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LocalTable {
    columns: Vec<Column>,
}

impl LocalTable {
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut seen = HashSet::new();
        for column in &columns {
            if column.name.is_empty() {
                return Err(BridgeError::InvalidTable("Column names must not be empty".to_string()));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(BridgeError::InvalidTable(format!(
                    "Duplicate column name: {}",
                    column.name
                )));
            }
        }

        if let Some(first) = columns.first() {
            let rows = first.values.len();
            if let Some(ragged) = columns.iter().find(|c| c.values.len() != rows) {
                return Err(BridgeError::InvalidTable(format!(
                    "Column {} has {} values, expected {}",
                    ragged.name,
                    ragged.values.len(),
                    rows
                )));
            }
        }

        Ok(Self { columns })
    }

    /// Build from `(name, values)` pairs
    pub fn from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Vec<Value>)>,
        S: Into<String>,
    {
        Self::new(
            columns
                .into_iter()
                .map(|(name, values)| Column::new(name, values))
                .collect(),
        )
    }

    /// Build from a header and rows; every row must have one value per column
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Value>>) -> Result<Self> {
        let mut columns: Vec<Column> = names
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(rows.len())))
            .collect();

        for (index, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(BridgeError::InvalidTable(format!(
                    "Row {} has {} values, expected {}",
                    index,
                    row.len(),
                    columns.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }

        Self::new(columns)
    }

    /// Build from JSON records (objects).
    ///
    /// Columns appear in the order keys are first encountered across records (within one
    /// record, serde_json's map order); a record that lacks a key contributes `Null`.
    pub fn from_records(records: Vec<serde_json::Value>) -> Result<Self> {
        let mut names: Vec<String> = Vec::new();
        let mut objects = Vec::with_capacity(records.len());

        for (index, record) in records.into_iter().enumerate() {
            match record {
                serde_json::Value::Object(map) => {
                    for key in map.keys() {
                        if !names.iter().any(|n| n == key) {
                            names.push(key.clone());
                        }
                    }
                    objects.push(map);
                }
                other => {
                    return Err(BridgeError::InvalidTable(format!(
                        "Record {} is not an object: {}",
                        index, other
                    )))
                }
            }
        }

        let mut columns: Vec<Column> = names
            .iter()
            .map(|name| Column::new(name.clone(), Vec::with_capacity(objects.len())))
            .collect();

        for mut object in objects {
            for column in columns.iter_mut() {
                let value = match object.remove(&column.name) {
                    Some(json) => Value::try_from(json)?,
                    None => Value::Null,
                };
                column.values.push(value);
            }
        }

        Self::new(columns)
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.values.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Row `index` as a vector of values in column order
    pub fn row(&self, index: usize) -> Option<Vec<Value>> {
        if index >= self.num_rows() {
            return None;
        }
        Some(self.columns.iter().map(|c| c.values[index].clone()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rejects_ragged_columns() {
        let result = LocalTable::from_columns([
            ("a", vec![Value::Int(1), Value::Int(2)]),
            ("b", vec![Value::Int(1)]),
        ]);
        assert!(matches!(result, Err(BridgeError::InvalidTable(_))));
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = LocalTable::from_columns([("a", vec![]), ("a", vec![])]);
        assert!(matches!(result, Err(BridgeError::InvalidTable(msg)) if msg.contains("Duplicate")));
    }

    #[test]
    fn test_from_rows() {
        let table = LocalTable::from_rows(
            vec!["x".into(), "y".into()],
            vec![
                vec![Value::Int(1), Value::Str("a".into())],
                vec![Value::Int(2), Value::Str("b".into())],
            ],
        )
        .unwrap();

        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.column_names(), vec!["x", "y"]);
        assert_eq!(table.row(1), Some(vec![Value::Int(2), Value::Str("b".into())]));
        assert_eq!(table.row(2), None);
    }

    #[test]
    fn test_from_rows_rejects_short_row() {
        let result = LocalTable::from_rows(vec!["x".into(), "y".into()], vec![vec![Value::Int(1)]]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_records_fills_missing_keys() {
        let table = LocalTable::from_records(vec![
            json!({"a": 1, "b": "x"}),
            json!({"a": 2, "c": true}),
        ])
        .unwrap();

        assert_eq!(table.column_names(), vec!["a", "b", "c"]);
        assert_eq!(
            table.column("b").unwrap().values,
            vec![Value::Str("x".into()), Value::Null]
        );
        assert_eq!(
            table.column("c").unwrap().values,
            vec![Value::Null, Value::Bool(true)]
        );
    }

    #[test]
    fn test_from_records_rejects_scalars() {
        assert!(LocalTable::from_records(vec![json!(1)]).is_err());
    }

    #[test]
    fn test_empty_table() {
        let table = LocalTable::default();
        assert_eq!(table.num_rows(), 0);
        assert_eq!(table.num_columns(), 0);
    }
}
