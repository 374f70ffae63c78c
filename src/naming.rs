/*!
 * Table name generation and validation
 */

use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::error::{Result, TesseraError};

/// Source of fresh table names for results the caller did not name
pub trait NameGenerator: Send + Sync {
    /// Produce a name starting with `prefix` that has not been produced before
    fn generate(&self, prefix: &str) -> String;
}

/// Random names: `prefix` + 32 hex digits of a v4 uuid
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidNameGenerator;

impl NameGenerator for UuidNameGenerator {
    fn generate(&self, prefix: &str) -> String {
        format!("{}{}", prefix, Uuid::new_v4().simple())
    }
}

/// Predictable names: `prefix` + a counter starting at 1.
///
/// Unique within one generator only; useful for logs and tests.
#[derive(Debug, Default)]
pub struct SequentialNameGenerator {
    next: AtomicU64,
}

impl SequentialNameGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NameGenerator for SequentialNameGenerator {
    fn generate(&self, prefix: &str) -> String {
        let n = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        format!("{}{}", prefix, n)
    }
}

/// Table names must be non-blank and free of control characters and backticks
pub(crate) fn validate_table_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(TesseraError::invalid("Table name must not be empty"));
    }
    if name.chars().any(|c| c.is_control() || c == '`') {
        return Err(TesseraError::invalid(format!(
            "Table name {:?} contains an illegal character",
            name
        )));
    }
    Ok(())
}
