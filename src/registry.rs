/*!
 * Per-connection table name registry
 *
 * The registry is the authority on which names are bound in a connection. Every change
 * is mirrored into the engine's session catalog (`createOrReplaceTempView` to bind,
 * `dropTempView` to unbind) while the registry lock is held, so check-and-insert is a
 * single critical section even when several threads share the connection.
 */

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tessera_core_interface::{entry, EngineBridge, RemoteHandle, Value};
use tracing::{debug, warn};

use crate::error::{Result, TesseraError};
use crate::naming::validate_table_name;

pub struct TableRegistry {
    bridge: Arc<dyn EngineBridge>,
    tables: Mutex<BTreeMap<String, RemoteHandle>>,
}

impl TableRegistry {
    pub(crate) fn new(bridge: Arc<dyn EngineBridge>) -> Self {
        Self {
            bridge,
            tables: Mutex::new(BTreeMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, RemoteHandle>> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.lock().contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn lookup(&self, name: &str) -> Option<RemoteHandle> {
        self.lock().get(name).cloned()
    }

    /// Unbind `name` locally and in the engine. Returns whether it was bound.
    pub fn remove_if_exists(&self, name: &str) -> Result<bool> {
        let mut tables = self.lock();
        self.unbind(&mut tables, name)
    }

    /// Bind an existing remote table under `name`
    pub fn register(&self, name: &str, handle: &RemoteHandle, overwrite: bool) -> Result<()> {
        self.claim(name, overwrite, || {
            self.bridge.invoke(
                handle,
                entry::CREATE_OR_REPLACE_TEMP_VIEW,
                &[Value::from(name)],
            )?;
            Ok(handle.clone())
        })
        .map(|_| ())
    }

    /// Reserve `name`, let `bind` create the engine-side binding, then record it.
    ///
    /// Nothing is recorded when `bind` fails. With `overwrite`, the previous binding is
    /// dropped before `bind` runs.
    pub(crate) fn claim<F>(&self, name: &str, overwrite: bool, bind: F) -> Result<RemoteHandle>
    where
        F: FnOnce() -> Result<RemoteHandle>,
    {
        validate_table_name(name)?;
        let mut tables = self.lock();

        if tables.contains_key(name) {
            if !overwrite {
                return Err(TesseraError::TableExists(name.to_string()));
            }
            warn!(table = name, "Overwriting existing table");
            self.unbind(&mut tables, name)?;
        }

        let handle = bind()?;
        tables.insert(name.to_string(), handle.clone());
        debug!(table = name, handle = %handle, "Table registered");
        Ok(handle)
    }

    /// Drop an engine view under `name` that was bound but never recorded
    pub(crate) fn discard_view(&self, name: &str) {
        if let Err(err) = self.bridge.invoke_static(
            entry::CATALOG_CLASS,
            entry::DROP_TEMP_VIEW,
            &[Value::from(name)],
        ) {
            warn!(table = name, error = %err, "Failed to drop unrecorded view");
        }
    }

    fn unbind(&self, tables: &mut BTreeMap<String, RemoteHandle>, name: &str) -> Result<bool> {
        if !tables.contains_key(name) {
            return Ok(false);
        }
        self.bridge
            .invoke_static(entry::CATALOG_CLASS, entry::DROP_TEMP_VIEW, &[Value::from(name)])?;
        tables.remove(name);
        debug!(table = name, "Table removed");
        Ok(true)
    }
}

impl std::fmt::Debug for TableRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableRegistry")
            .field("session", &self.bridge.session_id())
            .field("tables", &self.names())
            .finish()
    }
}
