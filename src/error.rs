/*!
 * Error types for Tessera
 */

use std::fmt;
use std::io;
use tessera_core_interface::{BridgeError, EngineVersion};

pub type Result<T> = std::result::Result<T, TesseraError>;

#[derive(Debug)]
pub enum TesseraError {
    /// Target table name is already registered and overwrite was not requested
    TableExists(String),

    /// Referenced columns are absent from the table (every missing name is listed)
    UnknownColumn {
        table: Option<String>,
        columns: Vec<String>,
    },

    /// Structurally invalid argument
    InvalidArgument(String),

    /// Feature needs a newer engine than the session reports
    UnsupportedVersion {
        feature: String,
        required: EngineVersion,
        actual: EngineVersion,
    },

    /// The remote call failed; the engine diagnostic is kept verbatim
    Invocation(String),

    /// Configuration error
    Config(String),

    /// I/O error
    Io(io::Error),
}

impl TesseraError {
    /// Check if this error is fatal to the call (caller must change its input)
    pub fn is_fatal(&self) -> bool {
        match self {
            TesseraError::UnknownColumn { .. } => true,
            TesseraError::InvalidArgument(_) => true,
            TesseraError::UnsupportedVersion { .. } => true,
            TesseraError::Config(_) => true,

            // Caller may retry with overwrite or another name
            TesseraError::TableExists(_) => false,
            // Retry policy belongs to the caller
            TesseraError::Invocation(_) => false,
            TesseraError::Io(_) => false,
        }
    }

    /// Check if the caller can recover by retrying differently
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }

    /// Get error category for logging
    pub fn category(&self) -> ErrorCategory {
        match self {
            TesseraError::TableExists(_) => ErrorCategory::Naming,
            TesseraError::UnknownColumn { .. } => ErrorCategory::Schema,
            TesseraError::InvalidArgument(_) => ErrorCategory::Argument,
            TesseraError::UnsupportedVersion { .. } => ErrorCategory::Compatibility,
            TesseraError::Invocation(_) => ErrorCategory::Remote,
            TesseraError::Config(_) => ErrorCategory::Configuration,
            TesseraError::Io(_) => ErrorCategory::IoError,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        TesseraError::InvalidArgument(message.into())
    }
}

/// Error categories for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    Naming,
    Schema,
    Argument,
    Compatibility,
    Remote,
    Configuration,
    IoError,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCategory::Naming => "naming",
            ErrorCategory::Schema => "schema",
            ErrorCategory::Argument => "argument",
            ErrorCategory::Compatibility => "compatibility",
            ErrorCategory::Remote => "remote",
            ErrorCategory::Configuration => "configuration",
            ErrorCategory::IoError => "io_error",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for TesseraError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TesseraError::TableExists(name) => {
                write!(f, "Table {} already exists (set overwrite to replace it)", name)
            }
            TesseraError::UnknownColumn { table, columns } => {
                let noun = if columns.len() == 1 { "column" } else { "columns" };
                match table {
                    Some(table) => write!(
                        f,
                        "Unknown {} in table {}: {}",
                        noun,
                        table,
                        columns.join(", ")
                    ),
                    None => write!(f, "Unknown {}: {}", noun, columns.join(", ")),
                }
            }
            TesseraError::InvalidArgument(msg) => write!(f, "{}", msg),
            TesseraError::UnsupportedVersion {
                feature,
                required,
                actual,
            } => write!(
                f,
                "{} requires engine version {} or newer (connected to {})",
                feature, required, actual
            ),
            TesseraError::Invocation(msg) => write!(f, "{}", msg),
            TesseraError::Config(msg) => write!(f, "Configuration error: {}", msg),
            TesseraError::Io(err) => write!(f, "I/O error: {}", err),
        }
    }
}

impl std::error::Error for TesseraError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TesseraError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for TesseraError {
    fn from(err: io::Error) -> Self {
        TesseraError::Io(err)
    }
}

impl From<BridgeError> for TesseraError {
    fn from(err: BridgeError) -> Self {
        match err {
            BridgeError::Remote(msg) => TesseraError::Invocation(msg),
            BridgeError::SessionMismatch { .. } => TesseraError::InvalidArgument(err.to_string()),
            BridgeError::InvalidTable(msg) => TesseraError::InvalidArgument(msg),
            other => TesseraError::Invocation(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        assert!(TesseraError::InvalidArgument("x".into()).is_fatal());
        assert!(TesseraError::UnknownColumn {
            table: None,
            columns: vec!["a".into()]
        }
        .is_fatal());
        assert!(TesseraError::UnsupportedVersion {
            feature: "f".into(),
            required: EngineVersion::new(2, 0, 0),
            actual: EngineVersion::new(1, 6, 0),
        }
        .is_fatal());
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(TesseraError::TableExists("t".into()).is_recoverable());
        assert!(TesseraError::Invocation("boom".into()).is_recoverable());
    }

    #[test]
    fn test_display_all_variants() {
        assert_eq!(
            TesseraError::TableExists("t1".into()).to_string(),
            "Table t1 already exists (set overwrite to replace it)"
        );
        assert_eq!(
            TesseraError::UnknownColumn {
                table: Some("t1".into()),
                columns: vec!["a".into(), "b".into()]
            }
            .to_string(),
            "Unknown columns in table t1: a, b"
        );
        assert_eq!(
            TesseraError::UnknownColumn {
                table: None,
                columns: vec!["a".into()]
            }
            .to_string(),
            "Unknown column: a"
        );
        assert_eq!(
            TesseraError::InvalidArgument("must supply one or more column names".into()).to_string(),
            "must supply one or more column names"
        );
        assert_eq!(
            TesseraError::UnsupportedVersion {
                feature: "repartition by columns".into(),
                required: EngineVersion::new(2, 0, 0),
                actual: EngineVersion::new(1, 6, 3),
            }
            .to_string(),
            "repartition by columns requires engine version 2.0.0 or newer (connected to 1.6.3)"
        );
        assert_eq!(TesseraError::Invocation("remote boom".into()).to_string(), "remote boom");
        assert_eq!(
            TesseraError::Config("bad".into()).to_string(),
            "Configuration error: bad"
        );
    }

    #[test]
    fn test_error_categories() {
        assert_eq!(TesseraError::TableExists("t".into()).category(), ErrorCategory::Naming);
        assert_eq!(
            TesseraError::Invocation("x".into()).category(),
            ErrorCategory::Remote
        );
        assert_eq!(
            TesseraError::InvalidArgument("x".into()).category(),
            ErrorCategory::Argument
        );
        assert_eq!(ErrorCategory::IoError.to_string(), "io_error");
    }

    #[test]
    fn test_from_bridge_error_keeps_remote_message() {
        let err: TesseraError = BridgeError::Remote("java.lang.RuntimeException: nope".into()).into();
        match err {
            TesseraError::Invocation(msg) => assert_eq!(msg, "java.lang.RuntimeException: nope"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_from_bridge_error_unexpected_value() {
        let err: TesseraError = BridgeError::UnexpectedValue {
            expected: "handle",
            found: "int",
        }
        .into();
        assert!(matches!(err, TesseraError::Invocation(_)));
    }

    #[test]
    fn test_error_source() {
        use std::error::Error;
        let err = TesseraError::from(io::Error::new(io::ErrorKind::NotFound, "gone"));
        assert!(err.source().is_some());
        assert!(TesseraError::TableExists("t".into()).source().is_none());
    }
}
