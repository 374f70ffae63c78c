/*!
 * Getting tables into a connection: uploading local data and naming remote results
 */

use std::collections::HashSet;
use tessera_core_interface::{entry, LocalTable, RemoteHandle, Value};
use tracing::{info, warn};

use crate::config::TesseraConfig;
use crate::connection::Connection;
use crate::error::{Result, TesseraError};
use crate::table::{TableReference, Target};

/// Local data accepted by [`Connection::copy_to`]
#[derive(Debug, Clone, PartialEq)]
pub enum ImportSource {
    /// Already in canonical form
    Table(LocalTable),
    /// JSON objects, one per row; keys become columns
    Records(Vec<serde_json::Value>),
    /// `(name, values)` pairs of equal length
    Columns(Vec<(String, Vec<Value>)>),
    /// A header plus rows
    Rows {
        names: Vec<String>,
        rows: Vec<Vec<Value>>,
    },
}

impl ImportSource {
    /// Coerce to the canonical local table
    pub fn into_table(self) -> Result<LocalTable> {
        let table = match self {
            ImportSource::Table(table) => table,
            ImportSource::Records(records) => LocalTable::from_records(records)?,
            ImportSource::Columns(columns) => LocalTable::from_columns(columns)?,
            ImportSource::Rows { names, rows } => LocalTable::from_rows(names, rows)?,
        };
        Ok(table)
    }
}

impl From<LocalTable> for ImportSource {
    fn from(table: LocalTable) -> Self {
        ImportSource::Table(table)
    }
}

impl From<Vec<serde_json::Value>> for ImportSource {
    fn from(records: Vec<serde_json::Value>) -> Self {
        ImportSource::Records(records)
    }
}

/// How an import is registered and materialized
#[derive(Debug, Clone, PartialEq)]
pub struct ImportOptions {
    pub target: Target,
    /// Cache the new table in engine memory
    pub memory: bool,
    /// Partition count (0 = engine default)
    pub repartition: u32,
}

impl ImportOptions {
    /// Connection defaults with a generated name
    pub fn from_config(config: &TesseraConfig) -> Self {
        Self {
            target: Target::auto(),
            memory: config.import_memory,
            repartition: config.import_repartition,
        }
    }

    pub fn target(mut self, target: impl Into<Target>) -> Self {
        self.target = target.into();
        self
    }

    pub fn memory(mut self, memory: bool) -> Self {
        self.memory = memory;
        self
    }

    pub fn repartition(mut self, partitions: u32) -> Self {
        self.repartition = partitions;
        self
    }
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::from_config(&TesseraConfig::default())
    }
}

/// Remote tables handed to [`Connection::register`]
#[derive(Debug, Clone, PartialEq)]
pub enum RegisterSource {
    One(RemoteHandle),
    Many(Vec<RemoteHandle>),
}

impl RegisterSource {
    fn into_handles(self) -> Vec<RemoteHandle> {
        match self {
            RegisterSource::One(handle) => vec![handle],
            RegisterSource::Many(handles) => handles,
        }
    }
}

impl From<RemoteHandle> for RegisterSource {
    fn from(handle: RemoteHandle) -> Self {
        RegisterSource::One(handle)
    }
}

impl From<Vec<RemoteHandle>> for RegisterSource {
    fn from(handles: Vec<RemoteHandle>) -> Self {
        RegisterSource::Many(handles)
    }
}

impl From<&TableReference> for RegisterSource {
    fn from(table: &TableReference) -> Self {
        RegisterSource::One(table.handle().clone())
    }
}

impl Connection {
    /// Upload local data as a new named table
    pub fn copy_to(
        &self,
        source: impl Into<ImportSource>,
        options: &ImportOptions,
    ) -> Result<TableReference> {
        let table = source.into().into_table()?;
        let name = self.target_name(&options.target);

        let handle = self.registry().claim(&name, options.target.overwrite, || {
            let handle = self.bridge().upload_table(&table, &name, options.repartition)?;
            if options.memory {
                if let Err(err) = self.invoke(&handle, entry::CACHE, &[]) {
                    self.registry().discard_view(&name);
                    return Err(err);
                }
            }
            Ok(handle)
        })?;

        self.notify_catalog_changed();
        info!(
            table = %name,
            rows = table.num_rows(),
            columns = table.num_columns(),
            memory = options.memory,
            "Table imported"
        );
        Ok(self.wrap(handle, Some(name)))
    }

    /// Name existing remote tables without copying them.
    ///
    /// `names` pair positionally with the handles; an empty list generates every name.
    pub fn register(
        &self,
        source: impl Into<RegisterSource>,
        names: &[&str],
        overwrite: bool,
    ) -> Result<Vec<(String, TableReference)>> {
        let handles = source.into().into_handles();

        if !names.is_empty() && names.len() != handles.len() {
            return Err(TesseraError::invalid(format!(
                "Got {} names for {} tables",
                names.len(),
                handles.len()
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|name| !seen.insert(**name)) {
            return Err(TesseraError::invalid(format!("Duplicate table name {}", dup)));
        }
        for handle in &handles {
            self.ensure_owned(handle)?;
        }
        if !overwrite {
            if let Some(taken) = names.iter().find(|name| self.registry().exists(name)) {
                return Err(TesseraError::TableExists(taken.to_string()));
            }
        }

        let mut registered: Vec<(String, TableReference)> = Vec::with_capacity(handles.len());
        for (index, handle) in handles.into_iter().enumerate() {
            let target = Target {
                name: names.get(index).map(|n| n.to_string()),
                overwrite,
            };
            match self.register_result(handle, &target) {
                Ok(table) => {
                    let name = table.name().unwrap_or_default().to_string();
                    registered.push((name, table));
                }
                Err(err) => {
                    self.unregister_all(&registered);
                    return Err(err);
                }
            }
        }
        Ok(registered)
    }

    /// Undo the names bound by a partially failed [`Connection::register`]
    fn unregister_all(&self, registered: &[(String, TableReference)]) {
        for (name, _) in registered {
            if let Err(err) = self.registry().remove_if_exists(name) {
                warn!(table = %name, error = %err, "Failed to roll back registration");
            }
        }
        if !registered.is_empty() {
            self.notify_catalog_changed();
        }
    }
}
