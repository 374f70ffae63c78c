/*!
 * Connection: one engine session and everything scoped to it
 */

use std::fmt;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use tessera_core_interface::{entry, EngineBridge, EngineVersion, RemoteHandle, Value};
use tracing::{debug, info};

use crate::config::TesseraConfig;
use crate::error::{Result, TesseraError};
use crate::naming::{NameGenerator, UuidNameGenerator};
use crate::registry::TableRegistry;
use crate::table::{TableReference, Target};

/// Told whenever a connection's set of registered tables changes
pub trait CatalogListener: Send + Sync {
    fn catalog_changed(&self, session: &str);
}

impl<F> CatalogListener for F
where
    F: Fn(&str) + Send + Sync,
{
    fn catalog_changed(&self, session: &str) {
        self(session)
    }
}

/// Handle to one engine session. Cloning is cheap; clones share the registry.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

struct Inner {
    bridge: Arc<dyn EngineBridge>,
    registry: TableRegistry,
    names: Box<dyn NameGenerator>,
    listeners: RwLock<Vec<Arc<dyn CatalogListener>>>,
    config: TesseraConfig,
    version: OnceLock<EngineVersion>,
}

impl Connection {
    /// Open a connection over `bridge` with uuid-based table names
    pub fn open(bridge: Arc<dyn EngineBridge>, config: TesseraConfig) -> Result<Self> {
        Self::with_name_generator(bridge, config, UuidNameGenerator)
    }

    pub fn with_name_generator(
        bridge: Arc<dyn EngineBridge>,
        config: TesseraConfig,
        names: impl NameGenerator + 'static,
    ) -> Result<Self> {
        config.validate()?;

        let connection = Self {
            inner: Arc::new(Inner {
                registry: TableRegistry::new(bridge.clone()),
                bridge,
                names: Box::new(names),
                listeners: RwLock::new(Vec::new()),
                config,
                version: OnceLock::new(),
            }),
        };

        if let Some(dir) = connection.inner.config.checkpoint_dir.clone() {
            connection.set_checkpoint_dir(&dir)?;
        }

        info!(session = connection.session_id(), "Connection opened");
        Ok(connection)
    }

    pub fn session_id(&self) -> &str {
        self.inner.bridge.session_id()
    }

    pub fn config(&self) -> &TesseraConfig {
        &self.inner.config
    }

    pub fn registry(&self) -> &TableRegistry {
        &self.inner.registry
    }

    pub(crate) fn bridge(&self) -> &dyn EngineBridge {
        self.inner.bridge.as_ref()
    }

    /// Engine version, fetched once per connection
    pub fn engine_version(&self) -> Result<EngineVersion> {
        if let Some(version) = self.inner.version.get() {
            return Ok(*version);
        }
        let version = self.inner.bridge.engine_version()?;
        debug!(session = self.session_id(), %version, "Engine version");
        Ok(*self.inner.version.get_or_init(|| version))
    }

    /// Fail with `UnsupportedVersion` unless the engine is at least `major.minor`
    pub fn require_version(&self, feature: &str, major: u32, minor: u32) -> Result<()> {
        let actual = self.engine_version()?;
        if actual.at_least(major, minor) {
            Ok(())
        } else {
            Err(TesseraError::UnsupportedVersion {
                feature: feature.to_string(),
                required: EngineVersion::new(major, minor, 0),
                actual,
            })
        }
    }

    /// Invoke `method` on a remote object owned by this connection
    pub fn invoke(&self, handle: &RemoteHandle, method: &str, args: &[Value]) -> Result<Value> {
        self.ensure_owned(handle)?;
        debug!(handle = %handle, method, args = args.len(), "invoke");
        Ok(self.inner.bridge.invoke(handle, method, args)?)
    }

    /// Invoke a class-level entry point in this connection's engine
    pub fn invoke_static(&self, class: &str, method: &str, args: &[Value]) -> Result<Value> {
        debug!(class, method, args = args.len(), "invoke_static");
        Ok(self.inner.bridge.invoke_static(class, method, args)?)
    }

    /// Fail with `InvalidArgument` when `handle` came from another session
    pub fn ensure_owned(&self, handle: &RemoteHandle) -> Result<()> {
        handle.ensure_session(self.session_id())?;
        Ok(())
    }

    /// A fresh table name with the configured prefix
    pub fn unique_name(&self) -> String {
        self.inner.names.generate(&self.inner.config.name_prefix)
    }

    pub fn subscribe(&self, listener: impl CatalogListener + 'static) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    pub(crate) fn notify_catalog_changed(&self) {
        let listeners = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener.catalog_changed(self.session_id());
        }
    }

    /// Directory the engine writes checkpoints to
    pub fn set_checkpoint_dir(&self, dir: &str) -> Result<()> {
        if dir.trim().is_empty() {
            return Err(TesseraError::invalid("Checkpoint directory must not be empty"));
        }
        self.invoke_static(entry::UTILS_CLASS, entry::SET_CHECKPOINT_DIR, &[Value::from(dir)])?;
        info!(dir, "Checkpoint directory set");
        Ok(())
    }

    /// Reference to a table registered under `name`
    pub fn table(&self, name: &str) -> Result<TableReference> {
        self.registry()
            .lookup(name)
            .map(|handle| self.wrap(handle, Some(name.to_string())))
            .ok_or_else(|| TesseraError::invalid(format!("No table named {}", name)))
    }

    /// Registered table names, sorted
    pub fn tables(&self) -> Vec<String> {
        self.registry().names()
    }

    /// Unregister `name`. Returns whether it was registered.
    pub fn remove_table(&self, name: &str) -> Result<bool> {
        let removed = self.registry().remove_if_exists(name)?;
        if removed {
            self.notify_catalog_changed();
        }
        Ok(removed)
    }

    pub(crate) fn wrap(&self, handle: RemoteHandle, name: Option<String>) -> TableReference {
        TableReference::new(self.clone(), name, handle)
    }

    /// Resolve the target name (generating one if absent) for a new table
    pub(crate) fn target_name(&self, target: &Target) -> String {
        target.name.clone().unwrap_or_else(|| self.unique_name())
    }

    /// Register a result handle at `target` and hand back its reference
    pub(crate) fn register_result(&self, handle: RemoteHandle, target: &Target) -> Result<TableReference> {
        self.ensure_owned(&handle)?;
        let name = self.target_name(target);
        self.registry().register(&name, &handle, target.overwrite)?;
        self.notify_catalog_changed();
        info!(table = %name, "Table registered");
        Ok(self.wrap(handle, Some(name)))
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("session", &self.session_id())
            .finish_non_exhaustive()
    }
}
