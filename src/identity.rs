/*!
 * Identifier columns
 */

use tessera_core_interface::{entry, RemoteHandle, Value};
use tracing::debug;

use crate::error::Result;
use crate::lifecycle::StorageLevel;
use crate::table::TableReference;

impl TableReference {
    /// Add a unique, increasing (not contiguous) id column.
    ///
    /// The result is persisted at the connection's unique-id storage level so the
    /// generated ids stay the same every time the table is read.
    pub fn with_unique_id(&self, column: &str) -> Result<TableReference> {
        let level = StorageLevel::new(self.connection().config().unique_id_storage_level.clone())?;
        self.with_unique_id_at(column, &level)
    }

    /// [`with_unique_id`](Self::with_unique_id) with an explicit storage level
    pub fn with_unique_id_at(&self, column: &str, level: &StorageLevel) -> Result<TableReference> {
        let connection = self.connection();
        let ids = connection
            .invoke_static(entry::FUNCTIONS_CLASS, entry::MONOTONICALLY_INCREASING_ID, &[])?
            .into_handle()?;
        let ids = cast_double(self, &ids)?;
        let with_ids = self.invoke_handle(
            entry::WITH_COLUMN,
            &[Value::from(column), Value::from(ids)],
        )?;

        let persisted = self.persist_handle(&with_ids, level)?;
        debug!(column, level = %level, "Unique id column added");
        self.derived(persisted)
    }

    /// Add an id column holding exactly `from, from + 1, ..., from + rows - 1`,
    /// whatever the partitioning
    pub fn with_sequential_id(&self, column: &str, from: i64) -> Result<TableReference> {
        let handle = self
            .connection()
            .invoke_static(
                entry::UTILS_CLASS,
                entry::ADD_SEQUENTIAL_INDEX,
                &[Value::from(self.handle()), Value::from(from), Value::from(column)],
            )?
            .into_handle()?;
        debug!(column, from, "Sequential id column added");
        self.derived(handle)
    }

    /// [`with_sequential_id`](Self::with_sequential_id) starting at the configured offset
    pub fn with_sequential_id_default(&self, column: &str) -> Result<TableReference> {
        self.with_sequential_id(column, self.connection().config().sequential_id_from)
    }

    /// Largest value of `column` in the last non-empty partition; `None` for an empty table
    pub fn last_index(&self, column: &str) -> Result<Option<f64>> {
        self.require_columns(&[column])?;

        let col = self.invoke_handle(entry::COL, &[Value::from(column)])?;
        let numeric = cast_double(self, &col)?;
        let with_numeric = self.invoke_handle(
            entry::WITH_COLUMN,
            &[Value::from(column), Value::from(numeric)],
        )?;

        let last = self.connection().invoke_static(
            entry::UTILS_CLASS,
            entry::GET_LAST_INDEX,
            &[Value::from(with_numeric), Value::from(column)],
        )?;
        match last {
            Value::Null => Ok(None),
            value => Ok(Some(value.as_f64()?)),
        }
    }
}

fn cast_double(table: &TableReference, column: &RemoteHandle) -> Result<RemoteHandle> {
    Ok(table
        .connection()
        .invoke(column, entry::CAST, &[Value::from("double")])?
        .into_handle()?)
}
