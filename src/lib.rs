/*!
 * Tessera - remote table proxy
 *
 * Drives tables that live inside a remote engine session:
 * - Importing local data and naming remote results
 * - Per-connection table names with explicit overwrite
 * - Ordered column transformation pipelines
 * - Persistence, checkpoints, partitioning, sorting and sampling
 * - Unique and sequential identifier columns
 * - Approximate quantiles and column summaries
 *
 * The engine is reached only through the `EngineBridge` trait from
 * `tessera-core-interface`; every call is synchronous.
 */

pub mod config;
pub mod connection;
pub mod error;
pub mod identity;
pub mod import;
pub mod lifecycle;
pub mod logging;
pub mod naming;
pub mod pipeline;
pub mod registry;
pub mod stats;
pub mod table;

// Re-export commonly used types
pub use config::{LogLevel, TesseraConfig};
pub use connection::{CatalogListener, Connection};
pub use error::{ErrorCategory, Result, TesseraError};
pub use import::{ImportOptions, ImportSource, RegisterSource};
pub use lifecycle::{PartitionSpec, StorageLevel};
pub use naming::{NameGenerator, SequentialNameGenerator, UuidNameGenerator};
pub use pipeline::TransformStep;
pub use registry::TableRegistry;
pub use stats::Probabilities;
pub use table::{TableReference, Target};
pub use tessera_core_interface::{
    entry, BridgeError, EngineBridge, EngineVersion, LocalTable, RemoteHandle, Value,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
