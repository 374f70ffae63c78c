//! Partitioned in-memory frames and the column expressions evaluated over them

use std::cmp::Ordering;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tessera_core_interface::{BridgeError, LocalTable, Result, Value};

pub(crate) type Row = Vec<Value>;

/// A materialized table split into partitions of rows
#[derive(Debug, Clone, Default)]
pub(crate) struct Frame {
    pub columns: Vec<String>,
    pub partitions: Vec<Vec<Row>>,
    /// Storage level when cached or persisted
    pub storage: Option<String>,
    pub checkpointed: bool,
    pub broadcast: bool,
}

impl Frame {
    pub fn from_table(table: &LocalTable, partitions: usize) -> Self {
        let rows = (0..table.num_rows()).filter_map(|i| table.row(i)).collect();
        Self::sliced(
            table.column_names().into_iter().map(String::from).collect(),
            rows,
            partitions,
        )
    }

    /// Contiguous slices: partition `i` holds rows `[i*n/p, (i+1)*n/p)`
    pub fn sliced(columns: Vec<String>, rows: Vec<Row>, partitions: usize) -> Self {
        let partitions = partitions.max(1);
        let total = rows.len();
        let mut slices: Vec<Vec<Row>> = (0..partitions).map(|_| Vec::new()).collect();
        for (index, row) in rows.into_iter().enumerate() {
            let slice = index * partitions / total.max(1);
            slices[slice.min(partitions - 1)].push(row);
        }
        Self {
            columns,
            partitions: slices,
            ..Default::default()
        }
    }

    /// A fresh frame with this frame's schema and the given partitions; flags are reset
    pub fn derive(&self, partitions: Vec<Vec<Row>>) -> Self {
        Self {
            columns: self.columns.clone(),
            partitions,
            ..Default::default()
        }
    }

    pub fn num_rows(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }

    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.partitions.iter().flatten()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns.iter().position(|c| c == name).ok_or_else(|| {
            BridgeError::Remote(format!(
                "org.apache.spark.sql.AnalysisException: cannot resolve '{}' given input columns: [{}]",
                name,
                self.columns.join(", ")
            ))
        })
    }

    pub fn column_values(&self, name: &str) -> Result<Vec<Value>> {
        let index = self.column_index(name)?;
        Ok(self.rows().map(|row| row[index].clone()).collect())
    }

    /// Replace `name` with `values` (one vector per partition), or append it
    pub fn with_column(&self, name: &str, values: Vec<Vec<Value>>) -> Self {
        let existing = self.columns.iter().position(|c| c == name);
        let mut columns = self.columns.clone();
        if existing.is_none() {
            columns.push(name.to_string());
        }

        let partitions = self
            .partitions
            .iter()
            .zip(values)
            .map(|(rows, column)| {
                rows.iter()
                    .zip(column)
                    .map(|(row, value)| {
                        let mut row = row.clone();
                        match existing {
                            Some(index) => row[index] = value,
                            None => row.push(value),
                        }
                        row
                    })
                    .collect()
            })
            .collect();

        Self {
            columns,
            partitions,
            ..Default::default()
        }
    }

    /// Hash-partition rows on the given key columns
    pub fn hash_partitioned(&self, keys: &[usize], partitions: usize) -> Vec<Vec<Row>> {
        let partitions = partitions.max(1);
        let mut out: Vec<Vec<Row>> = (0..partitions).map(|_| Vec::new()).collect();
        for row in self.rows() {
            let mut hasher = DefaultHasher::new();
            for &key in keys {
                format!("{:?}", row[key]).hash(&mut hasher);
            }
            out[(hasher.finish() % partitions as u64) as usize].push(row.clone());
        }
        out
    }

    /// Round-robin rows across partitions
    pub fn round_robin(&self, partitions: usize) -> Vec<Vec<Row>> {
        let partitions = partitions.max(1);
        let mut out: Vec<Vec<Row>> = (0..partitions).map(|_| Vec::new()).collect();
        for (index, row) in self.rows().enumerate() {
            out[index % partitions].push(row.clone());
        }
        out
    }

    /// Merge adjacent partitions down to at most `target`
    pub fn coalesced(&self, target: usize) -> Vec<Vec<Row>> {
        let current = self.partitions.len();
        let target = target.clamp(1, current.max(1));
        let mut out: Vec<Vec<Row>> = (0..target).map(|_| Vec::new()).collect();
        for (index, partition) in self.partitions.iter().enumerate() {
            out[index * target / current.max(1)].extend(partition.iter().cloned());
        }
        out
    }
}

/// Column expressions produced by `col`, id generators, and `cast`
#[derive(Debug, Clone)]
pub(crate) enum ColumnExpr {
    Ref(String),
    MonotonicId,
    Cast(Box<ColumnExpr>, String),
}

impl ColumnExpr {
    /// Evaluate against `frame`, one vector of values per partition
    pub fn evaluate(&self, frame: &Frame) -> Result<Vec<Vec<Value>>> {
        match self {
            ColumnExpr::Ref(name) => {
                let index = frame.column_index(name)?;
                Ok(frame
                    .partitions
                    .iter()
                    .map(|rows| rows.iter().map(|row| row[index].clone()).collect())
                    .collect())
            }
            // Upper 31 bits: partition index. Lower 33 bits: row position within it.
            ColumnExpr::MonotonicId => Ok(frame
                .partitions
                .iter()
                .enumerate()
                .map(|(partition, rows)| {
                    (0..rows.len())
                        .map(|row| Value::Int(((partition as i64) << 33) + row as i64))
                        .collect()
                })
                .collect()),
            ColumnExpr::Cast(inner, target) => inner
                .evaluate(frame)?
                .into_iter()
                .map(|values| values.iter().map(|v| cast(v, target)).collect::<Result<Vec<_>>>())
                .collect(),
        }
    }
}

pub(crate) fn cast(value: &Value, target: &str) -> Result<Value> {
    let out = match (target, value) {
        (_, Value::Null) => Value::Null,
        ("double", Value::Int(i)) => Value::Double(*i as f64),
        ("double", Value::Double(d)) => Value::Double(*d),
        ("double", Value::Bool(b)) => Value::Double(if *b { 1.0 } else { 0.0 }),
        ("double", Value::Str(s)) => s.trim().parse().map(Value::Double).unwrap_or(Value::Null),
        ("bigint" | "long" | "int", Value::Int(i)) => Value::Int(*i),
        ("bigint" | "long" | "int", Value::Double(d)) => Value::Int(d.trunc() as i64),
        ("bigint" | "long" | "int", Value::Bool(b)) => Value::Int(i64::from(*b)),
        ("bigint" | "long" | "int", Value::Str(s)) => {
            s.trim().parse().map(Value::Int).unwrap_or(Value::Null)
        }
        ("string", Value::Str(s)) => Value::Str(s.clone()),
        ("string", Value::Int(i)) => Value::Str(i.to_string()),
        ("string", Value::Double(d)) => Value::Str(d.to_string()),
        ("string", Value::Bool(b)) => Value::Str(b.to_string()),
        (target, other) => {
            return Err(BridgeError::Remote(format!(
                "org.apache.spark.sql.AnalysisException: cannot cast {} to {}",
                other.type_name(),
                target
            )))
        }
    };
    Ok(out)
}

/// Total order used by `sort`: nulls first, then booleans, numbers, strings
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Double(_) => 2,
            Value::Str(_) => 3,
            Value::Array(_) => 4,
            Value::Handle(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        (x, y) if rank(x) == 2 && rank(y) == 2 => {
            let (x, y) = (x.as_f64().unwrap_or(f64::NAN), y.as_f64().unwrap_or(f64::NAN));
            x.total_cmp(&y)
        }
        (x, y) => rank(x).cmp(&rank(y)),
    }
}

/// Type name reported by `dtypes`, from the first non-null value
pub(crate) fn dtype<'a>(values: impl Iterator<Item = &'a Value>) -> &'static str {
    for value in values {
        match value {
            Value::Null => continue,
            Value::Bool(_) => return "boolean",
            Value::Int(_) => return "bigint",
            Value::Double(_) => return "double",
            Value::Str(_) => return "string",
            Value::Array(_) => return "array",
            Value::Handle(_) => return "binary",
        }
    }
    "null"
}

/// Summary rows (`count`, `mean`, `stddev`, `min`, `max`) rendered as strings
pub(crate) fn describe(frame: &Frame, columns: &[String]) -> Result<Frame> {
    let mut stats: Vec<[Value; 5]> = Vec::with_capacity(columns.len());

    for column in columns {
        let values: Vec<Value> = frame
            .column_values(column)?
            .into_iter()
            .filter(|v| !v.is_null())
            .collect();
        let count = Value::Str(values.len().to_string());
        let numeric: Option<Vec<f64>> = values
            .iter()
            .map(|v| match v {
                Value::Int(_) | Value::Double(_) => v.as_f64().ok(),
                _ => None,
            })
            .collect();

        let row = match numeric {
            Some(nums) if !nums.is_empty() => {
                let n = nums.len() as f64;
                let mean = nums.iter().sum::<f64>() / n;
                let stddev = if nums.len() > 1 {
                    let var = nums.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
                    Value::Str(var.sqrt().to_string())
                } else {
                    Value::Null
                };
                let min = values.iter().min_by(|a, b| compare_values(a, b));
                let max = values.iter().max_by(|a, b| compare_values(a, b));
                [
                    count,
                    Value::Str(mean.to_string()),
                    stddev,
                    min.map(render).unwrap_or(Value::Null),
                    max.map(render).unwrap_or(Value::Null),
                ]
            }
            _ => {
                let min = values.iter().min_by(|a, b| compare_values(a, b));
                let max = values.iter().max_by(|a, b| compare_values(a, b));
                [
                    count,
                    Value::Null,
                    Value::Null,
                    min.map(render).unwrap_or(Value::Null),
                    max.map(render).unwrap_or(Value::Null),
                ]
            }
        };
        stats.push(row);
    }

    let mut names = vec!["summary".to_string()];
    names.extend(columns.iter().cloned());

    let rows = ["count", "mean", "stddev", "min", "max"]
        .iter()
        .enumerate()
        .map(|(stat, label)| {
            let mut row = vec![Value::Str(label.to_string())];
            row.extend(stats.iter().map(|s| s[stat].clone()));
            row
        })
        .collect();

    Ok(Frame::sliced(names, rows, 1))
}

fn render(value: &Value) -> Value {
    match value {
        Value::Str(s) => Value::Str(s.clone()),
        Value::Int(i) => Value::Str(i.to_string()),
        Value::Double(d) => Value::Str(d.to_string()),
        Value::Bool(b) => Value::Str(b.to_string()),
        other => Value::Str(format!("{:?}", other)),
    }
}
