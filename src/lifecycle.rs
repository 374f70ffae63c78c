/*!
 * Persistence, partitioning and sampling
 *
 * Every operation returns a new table registered under a generated name; the table it
 * was called on is left as it was.
 */

use std::fmt;
use std::str::FromStr;
use tessera_core_interface::{entry, RemoteHandle, Value};
use tracing::debug;

use crate::error::{Result, TesseraError};
use crate::table::TableReference;

/// Engine storage level, passed through by name (`MEMORY_ONLY`, `DISK_ONLY`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageLevel(String);

impl StorageLevel {
    pub fn new(level: impl Into<String>) -> Result<Self> {
        let level = level.into();
        if level.trim().is_empty() {
            return Err(TesseraError::invalid("Storage level must not be empty"));
        }
        Ok(Self(level))
    }

    pub fn memory_only() -> Self {
        Self("MEMORY_ONLY".to_string())
    }

    pub fn memory_and_disk() -> Self {
        Self("MEMORY_AND_DISK".to_string())
    }

    pub fn disk_only() -> Self {
        Self("DISK_ONLY".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for StorageLevel {
    type Err = TesseraError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for StorageLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target layout for [`TableReference::repartition`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartitionSpec {
    /// Partition count; 0 lets the engine pick when partitioning by columns
    pub count: u32,
    /// Hash-partition by these columns, in order
    pub by_columns: Vec<String>,
}

impl PartitionSpec {
    pub fn count(count: u32) -> Self {
        Self {
            count,
            by_columns: Vec::new(),
        }
    }

    pub fn by_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            count: 0,
            by_columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    fn args(&self) -> Result<Vec<Value>> {
        match (self.count, self.by_columns.is_empty()) {
            (0, true) => Err(TesseraError::invalid(
                "Partition count must be at least 1 when no columns are given",
            )),
            (count, true) => Ok(vec![Value::from(count)]),
            (0, false) => Ok(vec![Value::strings(self.by_columns.iter().cloned())]),
            (count, false) => Ok(vec![
                Value::from(count),
                Value::strings(self.by_columns.iter().cloned()),
            ]),
        }
    }
}

impl TableReference {
    fn storage_level_handle(&self, level: &StorageLevel) -> Result<RemoteHandle> {
        Ok(self
            .connection()
            .invoke_static(
                entry::STORAGE_LEVEL_CLASS,
                entry::STORAGE_LEVEL_FROM_STRING,
                &[Value::from(level.as_str())],
            )?
            .into_handle()?)
    }

    /// Persist on `handle` at `level`, returning the persisted table's handle
    pub(crate) fn persist_handle(&self, handle: &RemoteHandle, level: &StorageLevel) -> Result<RemoteHandle> {
        let level_handle = self.storage_level_handle(level)?;
        debug!(handle = %handle, level = %level, "persist");
        Ok(self
            .connection()
            .invoke(handle, entry::PERSIST, &[Value::from(level_handle)])?
            .into_handle()?)
    }

    pub fn persist(&self, level: &StorageLevel) -> Result<TableReference> {
        let handle = self.persist_handle(self.handle(), level)?;
        self.derived(handle)
    }

    /// Persist at the connection's default storage level
    pub fn persist_default(&self) -> Result<TableReference> {
        let level = StorageLevel::new(self.connection().config().default_storage_level.clone())?;
        self.persist(&level)
    }

    /// Release cached storage
    pub fn unpersist(&self, blocking: bool) -> Result<TableReference> {
        let handle = self.invoke_handle(entry::UNPERSIST, &[Value::from(blocking)])?;
        self.derived(handle)
    }

    /// Truncate lineage; needs a checkpoint directory on the connection
    pub fn checkpoint(&self, eager: bool) -> Result<TableReference> {
        let handle = self.invoke_handle(entry::CHECKPOINT, &[Value::from(eager)])?;
        self.derived(handle)
    }

    pub fn repartition(&self, spec: &PartitionSpec) -> Result<TableReference> {
        if !spec.by_columns.is_empty() {
            self.connection()
                .require_version("Repartitioning by columns", 2, 0)?;
        }
        let handle = self.invoke_handle(entry::REPARTITION, &spec.args()?)?;
        self.derived(handle)
    }

    pub fn coalesce(&self, partitions: u32) -> Result<TableReference> {
        if partitions < 1 {
            return Err(TesseraError::invalid("Partition count must be at least 1"));
        }
        let handle = self.invoke_handle(entry::COALESCE, &[Value::from(partitions)])?;
        self.derived(handle)
    }

    /// Mark the table for broadcast joins
    pub fn broadcast(&self) -> Result<TableReference> {
        let handle = self
            .connection()
            .invoke_static(entry::FUNCTIONS_CLASS, entry::BROADCAST, &[Value::from(self.handle())])?
            .into_handle()?;
        self.derived(handle)
    }

    /// Sort ascending by each column in turn
    pub fn sort(&self, columns: &[&str]) -> Result<TableReference> {
        let (first, rest) = columns
            .split_first()
            .ok_or_else(|| TesseraError::invalid("must supply one or more column names"))?;
        let handle = self.invoke_handle(
            entry::SORT,
            &[Value::from(*first), Value::strings(rest.iter().copied())],
        )?;
        self.derived(handle)
    }

    /// Random sample; without a seed the result differs between calls
    pub fn sample(&self, fraction: f64, with_replacement: bool, seed: Option<i64>) -> Result<TableReference> {
        if !fraction.is_finite() || fraction < 0.0 {
            return Err(TesseraError::invalid(format!(
                "Sampling fraction must be a non-negative number, got {}",
                fraction
            )));
        }
        if !with_replacement && fraction > 1.0 {
            return Err(TesseraError::invalid(format!(
                "Sampling fraction must be at most 1 without replacement, got {}",
                fraction
            )));
        }

        let mut args = vec![Value::from(with_replacement), Value::from(fraction)];
        args.extend(seed.map(Value::from));
        let handle = self.invoke_handle(entry::SAMPLE, &args)?;
        self.derived(handle)
    }

    /// Split rows randomly by relative weight; one registered table per weight, in order
    pub fn random_split(
        &self,
        weights: &[(&str, f64)],
        seed: Option<i64>,
    ) -> Result<Vec<(String, TableReference)>> {
        if weights.is_empty() {
            return Err(TesseraError::invalid("must supply one or more weights"));
        }
        if let Some((label, weight)) = weights.iter().find(|(_, w)| !w.is_finite() || *w < 0.0) {
            return Err(TesseraError::invalid(format!(
                "Weight {} for {} must be a non-negative number",
                weight, label
            )));
        }
        if weights.iter().map(|(_, w)| w).sum::<f64>() <= 0.0 {
            return Err(TesseraError::invalid("Weights must have a positive sum"));
        }

        let mut args = vec![Value::Array(
            weights.iter().map(|(_, w)| Value::from(*w)).collect(),
        )];
        args.extend(seed.map(Value::from));
        let parts = self.invoke(entry::RANDOM_SPLIT, &args)?.into_array()?;
        if parts.len() != weights.len() {
            return Err(TesseraError::Invocation(format!(
                "randomSplit returned {} tables for {} weights",
                parts.len(),
                weights.len()
            )));
        }

        weights
            .iter()
            .zip(parts)
            .map(|((label, _), part)| -> Result<(String, TableReference)> {
                Ok((label.to_string(), self.derived(part.into_handle()?)?))
            })
            .collect()
    }

    pub fn num_partitions(&self) -> Result<u32> {
        let n = self.invoke(entry::GET_NUM_PARTITIONS, &[])?.as_i64()?;
        u32::try_from(n).map_err(|_| TesseraError::Invocation(format!("Invalid partition count {}", n)))
    }
}
