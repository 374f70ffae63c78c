/*!
 * Table references and registration targets
 */

use std::fmt;
use tessera_core_interface::{entry, RemoteHandle, Value};

use crate::connection::Connection;
use crate::error::{Result, TesseraError};

/// Where a new table is registered
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Target {
    /// `None` registers under a generated name
    pub name: Option<String>,
    /// Replace an existing table of the same name instead of failing
    pub overwrite: bool,
}

impl Target {
    /// Generated name, no overwrite
    pub fn auto() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            overwrite: false,
        }
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::named(name)
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::named(name)
    }
}

/// A remote table, usually registered under a name in its connection.
///
/// References are immutable; every operation returns a new one.
#[derive(Clone)]
pub struct TableReference {
    connection: Connection,
    name: Option<String>,
    handle: RemoteHandle,
}

impl TableReference {
    pub(crate) fn new(connection: Connection, name: Option<String>, handle: RemoteHandle) -> Self {
        Self {
            connection,
            name,
            handle,
        }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn handle(&self) -> &RemoteHandle {
        &self.handle
    }

    /// Invoke `method` on this table
    pub fn invoke(&self, method: &str, args: &[Value]) -> Result<Value> {
        self.connection.invoke(&self.handle, method, args)
    }

    /// Invoke `method` and expect a remote object back
    pub(crate) fn invoke_handle(&self, method: &str, args: &[Value]) -> Result<RemoteHandle> {
        Ok(self.invoke(method, args)?.into_handle()?)
    }

    /// Register a derived remote table under a generated name
    pub(crate) fn derived(&self, handle: RemoteHandle) -> Result<TableReference> {
        self.connection.register_result(handle, &Target::auto())
    }

    // ═══════════════════════════════════════════════════════════════════════
    // Inspection
    // ═══════════════════════════════════════════════════════════════════════

    /// Column names in table order
    pub fn columns(&self) -> Result<Vec<String>> {
        Ok(self.invoke(entry::COLUMNS, &[])?.into_strings()?)
    }

    /// `(column, type)` pairs in table order
    pub fn schema(&self) -> Result<Vec<(String, String)>> {
        self.invoke(entry::DTYPES, &[])?
            .into_array()?
            .into_iter()
            .map(|pair| -> Result<(String, String)> {
                match pair.into_strings()?.as_slice() {
                    [name, dtype] => Ok((name.clone(), dtype.clone())),
                    other => Err(TesseraError::Invocation(format!(
                        "Expected a (name, type) pair from dtypes, got {} values",
                        other.len()
                    ))),
                }
            })
            .collect()
    }

    pub fn count(&self) -> Result<u64> {
        let count = self.invoke(entry::COUNT, &[])?.as_i64()?;
        u64::try_from(count)
            .map_err(|_| TesseraError::Invocation(format!("Negative row count {}", count)))
    }

    /// All values of `column`, in partition order
    pub fn collect_column(&self, column: &str) -> Result<Vec<Value>> {
        self.require_columns(&[column])?;
        Ok(self
            .invoke(entry::COLLECT_COLUMN, &[Value::from(column)])?
            .into_array()?)
    }

    /// Fail with one `UnknownColumn` naming every entry of `wanted` the table lacks
    pub(crate) fn require_columns(&self, wanted: &[&str]) -> Result<()> {
        let present = self.columns()?;
        let missing: Vec<String> = wanted
            .iter()
            .filter(|w| !present.iter().any(|p| p == **w))
            .map(|w| w.to_string())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(TesseraError::UnknownColumn {
                table: self.name.clone(),
                columns: missing,
            })
        }
    }
}

impl fmt::Debug for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableReference")
            .field("session", &self.connection.session_id())
            .field("name", &self.name)
            .field("handle", &self.handle)
            .finish()
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "{}", name),
            None => write!(f, "<unnamed {}>", self.handle),
        }
    }
}
