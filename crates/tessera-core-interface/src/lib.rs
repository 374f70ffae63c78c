//! Tessera Core Interface: the contract between the proxy layer and a remote table engine
//!
//! This crate defines the [`EngineBridge`] trait, which abstracts every call the proxy
//! layer makes into the engine's process. The proxy never sees the transport; it only
//! sees handles, values and the engine's diagnostics.
//!
//! # Architecture
//!
//! The bridge exposes three kinds of operations:
//!
//! 1. **Invocation**: instance calls against a remote object (`invoke`) and calls against
//!    class-level entry points with no natural receiver (`invoke_static`)
//! 2. **Session facts**: the session identity that scopes handles and table names, and the
//!    engine version used for feature gates
//! 3. **Upload**: materializing a [`LocalTable`] as a named remote table (the serializer
//!    and transport collaborator)
//!
//! # Example
//!
//! ```rust,no_run
//! use tessera_core_interface::{entry, EngineBridge, RemoteHandle, Value};
//!
//! fn row_count(bridge: &dyn EngineBridge, table: &RemoteHandle) -> tessera_core_interface::Result<i64> {
//!     bridge.invoke(table, entry::COUNT, &[])?.as_i64()
//! }
//! ```
//!
//! # Threading
//!
//! Every call is synchronous and blocks until the engine answers. Implementations must be
//! `Send + Sync`, but callers sharing one bridge across threads must serialize their calls
//! unless the implementation documents that it does so itself.

pub mod entry;
mod table;
mod value;
mod version;

pub use table::{Column, LocalTable};
pub use value::Value;
pub use version::EngineVersion;

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BridgeError {
    /// The engine raised an error; the message is its diagnostic, untouched.
    #[error("{0}")]
    Remote(String),

    #[error("Unexpected value from engine: expected {expected}, got {found}")]
    UnexpectedValue {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Handle {handle} belongs to session {found}, not {expected}")]
    SessionMismatch {
        handle: String,
        expected: String,
        found: String,
    },

    #[error("Invalid table: {0}")]
    InvalidTable(String),

    #[error("Connection closed: {0}")]
    Disconnected(String),
}

pub type Result<T> = std::result::Result<T, BridgeError>;

/// Opaque reference to an object living in the engine's process.
///
/// A handle is only meaningful on the session that produced it. Cloning a handle does not
/// retain the remote object; lifetime belongs to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteHandle {
    session: Arc<str>,
    object_id: u64,
}

impl RemoteHandle {
    pub fn new(session: impl Into<Arc<str>>, object_id: u64) -> Self {
        Self {
            session: session.into(),
            object_id,
        }
    }

    /// Session that owns the remote object
    pub fn session(&self) -> &str {
        &self.session
    }

    pub fn object_id(&self) -> u64 {
        self.object_id
    }

    /// Fail with [`BridgeError::SessionMismatch`] unless this handle belongs to `session`
    pub fn ensure_session(&self, session: &str) -> Result<()> {
        if &*self.session == session {
            Ok(())
        } else {
            Err(BridgeError::SessionMismatch {
                handle: self.to_string(),
                expected: session.to_string(),
                found: self.session.to_string(),
            })
        }
    }
}

impl fmt::Display for RemoteHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.session, self.object_id)
    }
}

/// The calling contract against one remote engine session.
///
/// Implementations:
/// - a transport-backed bridge talking to a live engine
/// - `tessera-sim`'s in-process engine for tests
pub trait EngineBridge: Send + Sync + 'static {
    /// Identity of the session; every handle this bridge returns carries it
    fn session_id(&self) -> &str;

    /// Version reported by the engine for this session
    fn engine_version(&self) -> Result<EngineVersion>;

    /// Call `method` on the remote object behind `handle`.
    ///
    /// Returns [`Value::Handle`] when the remote result is itself an object, otherwise a
    /// decoded scalar or array.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Remote`] carrying the engine diagnostic verbatim.
    fn invoke(&self, handle: &RemoteHandle, method: &str, args: &[Value]) -> Result<Value>;

    /// Call a class-level entry point (utility functions with no receiver object)
    fn invoke_static(&self, class: &str, method: &str, args: &[Value]) -> Result<Value>;

    /// Materialize `table` as a remote table bound to `name`.
    ///
    /// `repartition` is the requested partition count; `0` leaves partitioning to the engine.
    fn upload_table(&self, table: &LocalTable, name: &str, repartition: u32) -> Result<RemoteHandle>;
}
